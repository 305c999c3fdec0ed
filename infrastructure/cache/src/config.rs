use std::time::Duration;

use business::domain::settings::CacheSettings;
use url::Url;

pub const IDLE_TIMEOUT: Duration = Duration::from_secs(240);
pub const SENTINEL_TIMEOUT: Duration = Duration::from_millis(500);

/// How the pool finds the node it talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Topology {
    /// A single fixed `host:port`.
    Direct { address: String },
    /// Ask the sentinels which node is master for `master_name`.
    Sentinel {
        sentinels: Vec<String>,
        master_name: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    pub topology: Topology,
    pub db: i64,
    pub password: Option<String>,
    pub pool_size: u32,
    pub idle_timeout: Duration,
    pub connection_timeout: Duration,
    pub sentinel_timeout: Duration,
}

impl CacheConfig {
    pub fn from_settings(settings: &CacheSettings) -> Self {
        let topology = if settings.redis_type.trim().eq_ignore_ascii_case("sentinel") {
            Topology::Sentinel {
                sentinels: sentinel_addresses(&settings.host, settings.port),
                master_name: settings.master_name.clone(),
            }
        } else {
            Topology::Direct {
                address: format!("{}:{}", settings.host, settings.port),
            }
        };

        Self {
            topology,
            db: settings.db,
            password: (!settings.password.is_empty()).then(|| settings.password.clone()),
            pool_size: settings.max_idle.max(1),
            idle_timeout: IDLE_TIMEOUT,
            connection_timeout: Duration::from_secs(30),
            sentinel_timeout: SENTINEL_TIMEOUT,
        }
    }
}

/// Splits a comma-separated host list; entries without a port get `default_port`.
pub fn sentinel_addresses(hosts: &str, default_port: u16) -> Vec<String> {
    hosts
        .split(',')
        .map(str::trim)
        .filter(|host| !host.is_empty())
        .map(|host| {
            let has_port = host
                .rsplit_once(':')
                .is_some_and(|(_, port)| port.parse::<u16>().is_ok());
            if has_port {
                host.to_string()
            } else {
                format!("{host}:{default_port}")
            }
        })
        .collect()
}

/// `redis://[:password@]host:port/db`, with the password percent-encoded.
pub fn redis_url(address: &str, db: i64, password: Option<&str>) -> String {
    let raw = format!("redis://{address}/{db}");
    match (Url::parse(&raw), password) {
        (Ok(mut url), Some(password)) => {
            // redis:// URLs always carry a host, so this cannot fail.
            let _ = url.set_password(Some(password));
            url.to_string()
        }
        _ => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(redis_type: &str, host: &str) -> CacheSettings {
        CacheSettings {
            host: host.to_string(),
            port: 6379,
            max_idle: 8,
            master_name: "mymaster".to_string(),
            redis_type: redis_type.to_string(),
            password: "pw".to_string(),
            db: 3,
        }
    }

    #[test]
    fn should_dial_directly_unless_sentinel_requested() {
        let config = CacheConfig::from_settings(&settings("", "cache.local"));

        assert_eq!(
            config.topology,
            Topology::Direct {
                address: "cache.local:6379".to_string()
            }
        );
        assert_eq!(config.pool_size, 8);
        assert_eq!(config.idle_timeout, Duration::from_secs(240));
        assert_eq!(config.password.as_deref(), Some("pw"));
        assert_eq!(config.db, 3);
    }

    #[test]
    fn should_split_sentinel_hosts() {
        let config = CacheConfig::from_settings(&settings("Sentinel", "a:26379, b ,c:26380"));

        assert_eq!(
            config.topology,
            Topology::Sentinel {
                sentinels: vec![
                    "a:26379".to_string(),
                    "b:6379".to_string(),
                    "c:26380".to_string()
                ],
                master_name: "mymaster".to_string(),
            }
        );
        assert_eq!(config.sentinel_timeout, Duration::from_millis(500));
    }

    #[test]
    fn should_keep_pool_size_at_least_one() {
        let mut settings = settings("", "h");
        settings.max_idle = 0;
        settings.password.clear();

        let config = CacheConfig::from_settings(&settings);

        assert_eq!(config.pool_size, 1);
        assert_eq!(config.password, None);
    }

    #[test]
    fn should_build_redis_url_with_database_and_password() {
        assert_eq!(redis_url("10.0.0.5:6379", 2, None), "redis://10.0.0.5:6379/2");
        assert_eq!(
            redis_url("10.0.0.5:6379", 2, Some("p@ss")),
            "redis://:p%40ss@10.0.0.5:6379/2"
        );
    }
}
