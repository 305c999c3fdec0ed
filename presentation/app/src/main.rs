use std::sync::Arc;

use business::domain::logger::LogField;
use logger::LoggerFactory;

mod config;
mod setup;

use config::{logger_config, settings_loader};
use setup::dependency_injection::DependencyContainer;

/// Flint Entry Point
///
/// Loads configuration, then brings up logging, MySQL and Redis in that order.
/// Any initialization failure aborts the process with a non-zero exit code.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration (.env, then config/config[-<ServerMode>].yml)
    let settings = Arc::new(settings_loader::load_settings()?);

    // 2. Initialize logging
    let factory = LoggerFactory::new();
    let logger = logger_config::init_logger(&factory, &settings.system)?;
    let ctx = logger.trace_context();
    logger.info(&ctx, "logger initialized", &[]);

    // 3. Initialize database and cache
    let container = match DependencyContainer::new(Arc::clone(&settings), Arc::clone(&logger)).await {
        Ok(container) => container,
        Err(err) => {
            logger.error(&ctx, "startup failed", &[LogField::new("error", format!("{err:#}"))]);
            logger.close();
            return Err(err);
        }
    };

    let schema = container.database().schema();
    container.logger().info(
        &ctx,
        "startup complete",
        &[
            LogField::new("db", &container.settings().db.name),
            LogField::new("string_size", schema.default_string_size),
            LogField::new("cache_connections", container.cache().state().connections),
        ],
    );

    logger.close();
    Ok(())
}
