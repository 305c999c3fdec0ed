use serde::{Deserialize, Deserializer};

/// Application settings loaded once at startup.
///
/// Every section and field falls back to its zero value when absent from the
/// configuration file, and unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub system: SystemSettings,
    pub db: DatabaseSettings,
    pub redis: CacheSettings,
}

/// Logging knobs shared by the whole process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SystemSettings {
    /// One of `debug`, `info`, `warn`, `error`.
    pub log_level: String,
    /// Directory for log files. Empty means `./log/`.
    pub log_path: String,
}

/// Relational database connection settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub host: String,
    #[serde(deserialize_with = "string_or_number")]
    pub port: String,
    pub name: String,
    pub username: String,
    pub password: String,
    /// Query-string suffix appended to the connection string, e.g. `charset=utf8mb4`.
    pub config: String,
    pub max_idle: u32,
    pub max_open: u32,
    pub db_log_mode: bool,
    /// Statement log verbosity: `silent`, `error`, `warn`, `info` or `zap`.
    pub log_zap: String,
}

/// Redis connection settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// A single host, or a comma-separated sentinel list in sentinel mode.
    pub host: String,
    pub port: u16,
    pub max_idle: u32,
    pub master_name: String,
    /// `sentinel` selects sentinel discovery; anything else dials directly.
    pub redis_type: String,
    pub password: String,
    pub db: i64,
}

/// Accepts `port: 3306` as well as `port: "3306"`.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
        Missing(()),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
        Raw::Missing(()) => String::new(),
    })
}
