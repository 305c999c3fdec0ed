pub mod cache_config;
pub mod database_config;
pub mod logger_config;
pub mod settings_loader;
