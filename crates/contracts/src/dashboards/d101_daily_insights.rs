use serde::{Deserialize, Serialize};

use crate::shared::trend::Trend;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightCategory {
    Revenue,
    Orders,
    Salesperson,
    Product,
    Customer,
    Pipeline,
}

/// Headline metric card for the pulse page (GET /api/insights)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    pub id: String,
    pub title: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub change: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub trend: Option<Trend>,
    pub category: InsightCategory,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sparkline_data: Option<Vec<f64>>,
}
