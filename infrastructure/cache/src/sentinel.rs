use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::errors::CacheError;

/// Answers "which node is master right now".
#[async_trait]
pub trait MasterResolver: Send + Sync {
    async fn master_addr(&self) -> Result<String, CacheError>;
}

/// Resolves the master through a set of sentinels, trying each in turn.
///
/// The first sentinel that answers is moved to the front of the list so the
/// next lookup asks it first.
pub struct SentinelResolver {
    sentinels: Mutex<Vec<String>>,
    master_name: String,
    timeout: Duration,
}

impl SentinelResolver {
    pub fn new(sentinels: Vec<String>, master_name: impl Into<String>, timeout: Duration) -> Self {
        Self {
            sentinels: Mutex::new(sentinels),
            master_name: master_name.into(),
            timeout,
        }
    }

    pub fn sentinels(&self) -> Vec<String> {
        self.sentinels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn promote(&self, address: &str) {
        let mut sentinels = self.sentinels.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(position) = sentinels.iter().position(|s| s == address) {
            let sentinel = sentinels.remove(position);
            sentinels.insert(0, sentinel);
        }
    }

    async fn ask(&self, address: &str) -> Result<Option<(String, u16)>, CacheError> {
        let unreachable = |source| CacheError::SentinelUnreachable {
            address: address.to_string(),
            source,
        };
        let url = format!("redis://{address}/");
        let client = redis::Client::open(url.as_str()).map_err(unreachable)?;

        let exchange = async {
            let mut conn = client.get_multiplexed_async_connection().await?;
            let reply: Option<(String, u16)> = redis::cmd("SENTINEL")
                .arg("get-master-addr-by-name")
                .arg(&self.master_name)
                .query_async(&mut conn)
                .await?;
            Ok::<_, redis::RedisError>(reply)
        };

        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(reply) => reply.map_err(unreachable),
            Err(_) => Err(CacheError::SentinelTimeout {
                address: address.to_string(),
            }),
        }
    }
}

#[async_trait]
impl MasterResolver for SentinelResolver {
    async fn master_addr(&self) -> Result<String, CacheError> {
        let mut last_error = CacheError::NoSentinels;

        for address in self.sentinels() {
            match self.ask(&address).await {
                Ok(Some((host, port))) => {
                    self.promote(&address);
                    return Ok(format!("{host}:{port}"));
                }
                Ok(None) => {
                    last_error = CacheError::MasterUnknown {
                        master_name: self.master_name.clone(),
                    };
                }
                Err(err) => {
                    tracing::warn!(sentinel = %address, error = %err, "sentinel did not answer");
                    last_error = err;
                }
            }
        }

        Err(CacheError::MasterResolution {
            master_name: self.master_name.clone(),
            source: Box::new(last_error),
        })
    }
}
