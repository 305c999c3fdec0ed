pub mod db;
pub mod query_log;
pub mod schema;
