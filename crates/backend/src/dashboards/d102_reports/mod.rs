pub mod registry;
pub mod service;

pub use service::ReportsService;
