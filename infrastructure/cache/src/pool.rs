use std::sync::Arc;

use bb8::{Pool, PooledConnection};

use crate::config::{CacheConfig, Topology};
use crate::errors::CacheError;
use crate::manager::{CacheConnectionManager, DialTarget};
use crate::sentinel::SentinelResolver;

pub type CacheConnection<'a> = PooledConnection<'a, CacheConnectionManager>;

/// Pooled Redis client.
#[derive(Clone)]
pub struct CachePool {
    inner: Pool<CacheConnectionManager>,
}

impl CachePool {
    /// Builds the pool for the configured topology.
    ///
    /// Direct mode dials one connection up front and fails if it cannot.
    /// Sentinel mode connects lazily, so a sentinel outage at startup only
    /// surfaces on the first checkout.
    pub async fn connect(config: &CacheConfig) -> Result<Self, CacheError> {
        match &config.topology {
            Topology::Direct { address } => {
                let target = DialTarget::Direct(address.clone());
                let manager = CacheConnectionManager::new(target, config.db, config.password.clone());
                let inner = builder(config).min_idle(Some(1)).build(manager).await?;
                tracing::info!(%address, pool_size = config.pool_size, "cache pool ready");
                Ok(Self { inner })
            }
            Topology::Sentinel {
                sentinels,
                master_name,
            } => {
                let resolver = SentinelResolver::new(
                    sentinels.clone(),
                    master_name.clone(),
                    config.sentinel_timeout,
                );
                tracing::info!(?sentinels, %master_name, "cache pool using sentinel discovery");
                Ok(Self::with_target(
                    DialTarget::Sentinel(Arc::new(resolver)),
                    config,
                ))
            }
        }
    }

    /// Lazily connected pool over an explicit dial target.
    pub fn with_target(target: DialTarget, config: &CacheConfig) -> Self {
        let manager = CacheConnectionManager::new(target, config.db, config.password.clone());
        Self {
            inner: builder(config).build_unchecked(manager),
        }
    }

    /// Checks a connection out of the pool.
    pub async fn get(&self) -> Result<CacheConnection<'_>, CacheError> {
        Ok(self.inner.get().await?)
    }

    pub fn state(&self) -> bb8::State {
        self.inner.state()
    }
}

fn builder(config: &CacheConfig) -> bb8::Builder<CacheConnectionManager> {
    Pool::builder()
        .max_size(config.pool_size)
        .idle_timeout(Some(config.idle_timeout))
        .connection_timeout(config.connection_timeout)
        .test_on_check_out(true)
        .retry_connection(false)
}
