pub mod db;
pub mod row;
