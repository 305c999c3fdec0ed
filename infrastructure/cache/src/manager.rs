use std::sync::Arc;

use async_trait::async_trait;
use redis::FromRedisValue;
use redis::aio::MultiplexedConnection;

use crate::config::redis_url;
use crate::errors::CacheError;
use crate::sentinel::MasterResolver;

const MASTER_ROLE: &str = "master";

/// Where a new connection is dialed.
#[derive(Clone)]
pub enum DialTarget {
    Direct(String),
    /// Re-resolved for every new connection.
    Sentinel(Arc<dyn MasterResolver>),
}

impl DialTarget {
    pub async fn resolve(&self) -> Result<String, CacheError> {
        match self {
            Self::Direct(address) => Ok(address.clone()),
            Self::Sentinel(resolver) => resolver.master_addr().await,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        matches!(self, Self::Sentinel(_))
    }
}

/// `bb8` connection manager dialing Redis with a fixed database index and password.
pub struct CacheConnectionManager {
    target: DialTarget,
    db: i64,
    password: Option<String>,
}

impl CacheConnectionManager {
    pub fn new(target: DialTarget, db: i64, password: Option<String>) -> Self {
        Self {
            target,
            db,
            password,
        }
    }
}

#[async_trait]
impl bb8::ManageConnection for CacheConnectionManager {
    type Connection = MultiplexedConnection;
    type Error = CacheError;

    async fn connect(&self) -> Result<Self::Connection, Self::Error> {
        let address = self.target.resolve().await?;
        let url = redis_url(&address, self.db, self.password.as_deref());
        let client = redis::Client::open(url.as_str()).map_err(|source| CacheError::InvalidAddress {
            address: address.clone(),
            source,
        })?;

        let conn = client.get_multiplexed_async_connection().await?;
        tracing::debug!(%address, db = self.db, "cache connection established");
        Ok(conn)
    }

    /// Runs on every checkout. Direct mode sends `PING`, so a connection the
    /// server dropped is replaced. Sentinel mode sends `ROLE`, so a node
    /// demoted since the connection was opened is replaced too.
    async fn is_valid(&self, conn: &mut Self::Connection) -> Result<(), Self::Error> {
        if !self.target.is_sentinel() {
            let _pong: String = redis::cmd("PING").query_async(conn).await?;
            return Ok(());
        }

        let reply: Vec<redis::Value> = redis::cmd("ROLE").query_async(conn).await?;
        let role = reply.first().map(String::from_redis_value).transpose()?;
        ensure_role(role.as_deref(), MASTER_ROLE)
    }

    fn has_broken(&self, _conn: &mut Self::Connection) -> bool {
        false
    }
}

pub fn ensure_role(reported: Option<&str>, expected: &str) -> Result<(), CacheError> {
    match reported {
        Some(role) if role.eq_ignore_ascii_case(expected) => Ok(()),
        other => Err(CacheError::RoleCheckFailed {
            expected: expected.to_string(),
            reported: other.unwrap_or("unknown").to_string(),
        }),
    }
}
