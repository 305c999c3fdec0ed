use business::domain::settings::CacheSettings;
use cache::{CacheConfig, CacheError, CachePool};

/// Initialize the Redis connection pool from the `redis` settings section.
///
/// # Errors
/// In direct mode, returns error if the first connection cannot be dialed
pub async fn init_cache(settings: &CacheSettings) -> Result<CachePool, CacheError> {
    CachePool::connect(&CacheConfig::from_settings(settings)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn should_not_block_on_sentinels_at_startup() {
        let settings = CacheSettings {
            host: "127.0.0.1:1,127.0.0.1:2".to_string(),
            port: 26379,
            max_idle: 4,
            master_name: "mymaster".to_string(),
            redis_type: "sentinel".to_string(),
            ..CacheSettings::default()
        };

        let pool = init_cache(&settings).await.unwrap();

        assert_eq!(pool.state().connections, 0);
    }
}
