use serde::{Deserialize, Serialize};

use crate::shared::query_row::QueryRow;

/// Entry of GET /api/reports
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    pub slug: String,
    pub title: String,
    pub description: String,
    /// e.g. "Last 30 days"
    pub period: String,
}

/// Column of a rendered report table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportColumn {
    /// Column name as returned by the query
    pub id: String,
    /// Display header ("margin_pct" -> "Margin Pct")
    pub name: String,
}

/// GET /api/reports/:slug
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportData {
    pub slug: String,
    pub title: String,
    pub period: String,
    pub columns: Vec<ReportColumn>,
    pub rows: Vec<QueryRow>,
    /// Set when the report query failed; rows are empty then.
    pub error: Option<String>,
}
