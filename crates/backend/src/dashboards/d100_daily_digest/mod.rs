pub mod repository;
pub mod service;
pub mod summarizer;

pub use repository::{MetricsSource, PgMetricsSource};
pub use service::DigestGenerator;
pub use summarizer::{LlmSummarizer, Summarizer, TemplateSummarizer};
