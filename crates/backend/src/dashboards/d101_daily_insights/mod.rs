pub mod repository;
pub mod service;

pub use repository::{InsightSource, PgInsightSource};
pub use service::InsightsService;
