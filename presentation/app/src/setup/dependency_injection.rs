use std::sync::Arc;

use business::domain::settings::Settings;
use cache::CachePool;
use logger::AppLogger;
use persistence::db::Database;

use crate::config::{cache_config, database_config};

/// Everything the process initializes at startup, built once and handed to
/// whatever needs it instead of living in globals.
pub struct DependencyContainer {
    settings: Arc<Settings>,
    logger: Arc<AppLogger>,
    database: Database,
    cache: CachePool,
}

impl DependencyContainer {
    pub async fn new(settings: Arc<Settings>, logger: Arc<AppLogger>) -> anyhow::Result<Self> {
        let ctx = logger.trace_context();

        logger.info(&ctx, "initializing mysql database: start", &[]);
        let database = database_config::init_database(&settings.db).await?;
        logger.info(&ctx, "initializing mysql database: end", &[]);

        logger.info(&ctx, "initializing redis: start", &[]);
        let cache = cache_config::init_cache(&settings.redis).await?;
        logger.info(&ctx, "initializing redis: end", &[]);

        Ok(Self {
            settings,
            logger,
            database,
            cache,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn logger(&self) -> &Arc<AppLogger> {
        &self.logger
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn cache(&self) -> &CachePool {
        &self.cache
    }
}
