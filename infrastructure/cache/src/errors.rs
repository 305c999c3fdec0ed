use redis::RedisError;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache.no_sentinels")]
    NoSentinels,
    #[error("cache.sentinel_unreachable: {address}")]
    SentinelUnreachable {
        address: String,
        #[source]
        source: RedisError,
    },
    #[error("cache.sentinel_timeout: {address}")]
    SentinelTimeout { address: String },
    #[error("cache.master_unknown: {master_name}")]
    MasterUnknown { master_name: String },
    #[error("cache.master_resolution: {master_name}")]
    MasterResolution {
        master_name: String,
        #[source]
        source: Box<CacheError>,
    },
    #[error("cache.invalid_address: {address}")]
    InvalidAddress {
        address: String,
        #[source]
        source: RedisError,
    },
    #[error("cache.connection")]
    Connection(#[from] RedisError),
    #[error("cache.role_check_failed: expected {expected}, got {reported}")]
    RoleCheckFailed { expected: String, reported: String },
    #[error("cache.pool_timeout")]
    PoolTimeout,
}

impl From<bb8::RunError<CacheError>> for CacheError {
    fn from(err: bb8::RunError<CacheError>) -> Self {
        match err {
            bb8::RunError::User(inner) => inner,
            bb8::RunError::TimedOut => CacheError::PoolTimeout,
        }
    }
}
