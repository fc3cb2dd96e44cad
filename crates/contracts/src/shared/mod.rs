pub mod query_row;
pub mod trend;
