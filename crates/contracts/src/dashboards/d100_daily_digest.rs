use serde::{Deserialize, Serialize};

use crate::shared::trend::Trend;

/// Daily pulse digest returned by GET /api/digest
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyDigest {
    /// Human readable date, e.g. "Friday, 16 October 2026"
    pub date: String,
    pub greeting: String,
    /// Narrative summary (model generated or templated)
    pub summary: String,
    pub sections: Vec<DigestSection>,
    /// RFC 3339 timestamp
    pub generated_at: String,
}

/// One card of the digest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestSection {
    /// Stable identifier, e.g. "monthly-performance"
    pub id: String,
    pub title: String,
    pub icon: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub highlights: Option<Vec<Highlight>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub chart: Option<Chart>,
}

/// Labeled metric shown inside a section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Highlight {
    pub label: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub change: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub trend: Option<Trend>,
}

impl Highlight {
    pub fn plain(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            change: None,
            trend: None,
        }
    }

    pub fn with_change(
        label: impl Into<String>,
        value: impl Into<String>,
        change: f64,
        trend: Trend,
    ) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            change: Some(change),
            trend: Some(trend),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Bar,
    Line,
    Sparkline,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chart {
    #[serde(rename = "type")]
    pub kind: ChartType,
    pub data: Vec<ChartPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
}
