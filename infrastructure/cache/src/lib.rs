pub mod config;
pub mod errors;
pub mod manager;
pub mod pool;
pub mod sentinel;

#[cfg(test)]
mod resp_stub;

pub use config::{CacheConfig, Topology};
pub use errors::CacheError;
pub use pool::{CacheConnection, CachePool};
