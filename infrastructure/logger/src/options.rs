use std::path::PathBuf;

use business::domain::settings::SystemSettings;
use tracing::Level;

use crate::level::LogLevel;
use crate::rolling_file::RollPolicy;

/// Size cap, in megabytes, for files written on behalf of a task.
pub const TASK_MAX_SIZE_MB: u64 = 1024;

/// Knobs for building an [`AppLogger`](crate::AppLogger).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerOptions {
    pub log_file_dir: PathBuf,
    /// Prefix of every log file name.
    pub app_name: String,
    pub error_file_name: String,
    pub warn_file_name: String,
    pub info_file_name: String,
    pub debug_file_name: String,
    pub level: LogLevel,
    /// Megabytes before a file is rotated.
    pub max_size_mb: u64,
    pub max_backups: usize,
    pub max_age_days: u32,
    /// Console mirroring and readable timestamps.
    pub development: bool,
}

impl LoggerOptions {
    pub fn from_settings(system: &SystemSettings) -> Self {
        let log_file_dir = if system.log_path.is_empty() {
            default_log_dir()
        } else {
            PathBuf::from(&system.log_path)
        };

        Self {
            log_file_dir,
            app_name: "app_log".to_string(),
            error_file_name: "error.log".to_string(),
            warn_file_name: "warn.log".to_string(),
            info_file_name: "info.log".to_string(),
            debug_file_name: "debug.log".to_string(),
            level: LogLevel::from_name(&system.log_level),
            max_size_mb: 100,
            max_backups: 10,
            max_age_days: 1,
            development: true,
        }
    }

    fn file_name(&self, sink: Level) -> &str {
        match sink {
            Level::ERROR => &self.error_file_name,
            Level::WARN => &self.warn_file_name,
            Level::INFO => &self.info_file_name,
            _ => &self.debug_file_name,
        }
    }

    /// `<dir>/<app>-<file>`, or `<dir>/<task>/<app>-<file>` for a task logger.
    pub fn sink_path(&self, sink: Level, task_id: Option<&str>) -> PathBuf {
        let name = format!("{}-{}", self.app_name, self.file_name(sink));
        match task_id {
            Some(task) => self.log_file_dir.join(task).join(name),
            None => self.log_file_dir.join(name),
        }
    }

    pub fn roll_policy(&self, task_id: Option<&str>) -> RollPolicy {
        let max_size_mb = if task_id.is_some() {
            TASK_MAX_SIZE_MB
        } else {
            self.max_size_mb
        };
        RollPolicy::megabytes(max_size_mb, self.max_backups, self.max_age_days)
    }
}

fn default_log_dir() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("log")
}
