use std::sync::Arc;

use anyhow::Context;
use business::domain::settings::SystemSettings;
use logger::{AppLogger, LoggerFactory};

/// Builds the process logger and installs it as the global `tracing`
/// dispatcher, so statements logged by sqlx and bb8 reach the same files.
pub fn init_logger(factory: &LoggerFactory, system: &SystemSettings) -> anyhow::Result<Arc<AppLogger>> {
    let logger = factory
        .new_logger(system, "")?
        .context("logger already initialized")?;
    logger.install_global()?;
    Ok(logger)
}
