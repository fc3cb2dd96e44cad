pub mod answer_formatter;
pub mod context_cache;
pub mod errors;
pub mod executor;
pub mod prompt_builder;
pub mod query_executor;
pub mod sql_generator;

pub use context_cache::{PgContextLookup, SchemaContextCache, SystemClock};
pub use errors::AskError;
pub use executor::AskExecutor;
pub use query_executor::{PgQueryRunner, QueryExecutor, QueryRunner};
pub use sql_generator::SqlGenerator;
