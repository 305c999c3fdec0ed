use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use business::domain::settings::Settings;
use thiserror::Error;

/// Environment variable selecting the configuration profile.
pub const SERVER_MODE_VAR: &str = "ServerMode";
const CONFIG_DIR: &str = "config";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config.file_not_found: {}", path.display())]
    FileNotFound { path: PathBuf },
    #[error("config.read: {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("config.parse: {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// `config.yml` without a mode, `config-<mode>.yml` otherwise.
pub fn config_file_name(mode: Option<&str>) -> String {
    match mode.map(str::trim).filter(|m| !m.is_empty()) {
        Some(mode) => format!("config-{mode}.yml"),
        None => "config.yml".to_string(),
    }
}

/// Loads `.env` if present, then reads `config/<file>` relative to the
/// working directory, picking the file from `ServerMode`.
pub fn load_settings() -> Result<Settings, ConfigError> {
    dotenvy::dotenv().ok();
    let mode = env::var(SERVER_MODE_VAR).ok();
    load_settings_from(Path::new(CONFIG_DIR), mode.as_deref())
}

pub fn load_settings_from(dir: &Path, mode: Option<&str>) -> Result<Settings, ConfigError> {
    let path = dir.join(config_file_name(mode));

    let content = fs::read_to_string(&path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => ConfigError::FileNotFound { path: path.clone() },
        _ => ConfigError::Read {
            path: path.clone(),
            source,
        },
    })?;

    let settings = parse_settings(&content).map_err(|source| ConfigError::Parse {
        path: path.clone(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "configuration loaded");
    Ok(settings)
}

fn parse_settings(content: &str) -> Result<Settings, serde_yaml::Error> {
    if content.trim().is_empty() {
        return Ok(Settings::default());
    }
    serde_yaml::from_str(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use business::domain::settings::DatabaseSettings;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) {
        fs::write(dir.path().join(name), content).unwrap();
    }

    #[test]
    fn should_pick_file_from_server_mode() {
        assert_eq!(config_file_name(None), "config.yml");
        assert_eq!(config_file_name(Some("")), "config.yml");
        assert_eq!(config_file_name(Some("prod")), "config-prod.yml");
    }

    #[test]
    fn should_load_default_file_when_mode_unset() {
        let dir = TempDir::new().unwrap();
        write(&dir, "config.yml", "system:\n  log_level: debug\n");
        write(&dir, "config-prod.yml", "system:\n  log_level: error\n");

        let settings = load_settings_from(dir.path(), None).unwrap();

        assert_eq!(settings.system.log_level, "debug");
    }

    #[test]
    fn should_load_mode_specific_file() {
        let dir = TempDir::new().unwrap();
        write(&dir, "config.yml", "system:\n  log_level: debug\n");
        write(
            &dir,
            "config-prod.yml",
            "system:\n  log_level: error\nredis:\n  host: cache\n  port: 6380\n  redis_type: sentinel\n",
        );

        let settings = load_settings_from(dir.path(), Some("prod")).unwrap();

        assert_eq!(settings.system.log_level, "error");
        assert_eq!(settings.redis.host, "cache");
        assert_eq!(settings.redis.port, 6380);
        assert_eq!(settings.redis.redis_type, "sentinel");
        assert_eq!(settings.db, DatabaseSettings::default());
    }

    #[test]
    fn should_report_missing_file() {
        let dir = TempDir::new().unwrap();

        let result = load_settings_from(dir.path(), Some("staging"));

        match result {
            Err(ConfigError::FileNotFound { path }) => {
                assert!(path.ends_with("config-staging.yml"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn should_report_unparsable_file() {
        let dir = TempDir::new().unwrap();
        write(&dir, "config.yml", "db:\n  max_open: [not, a, number]\n");

        let result = load_settings_from(dir.path(), None);

        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn should_treat_empty_file_as_zero_settings() {
        let dir = TempDir::new().unwrap();
        write(&dir, "config.yml", "\n");

        let settings = load_settings_from(dir.path(), None).unwrap();

        assert_eq!(settings, Settings::default());
    }
}
