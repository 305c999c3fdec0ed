use log::LevelFilter;

/// How much SQL the pool logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryLogLevel {
    Silent,
    Error,
    Warn,
    Info,
}

impl QueryLogLevel {
    /// `log_zap` is only consulted when statement logging is switched on.
    /// `zap` is an alias of `info`; unknown values fall back to `info`.
    pub fn from_settings(db_log_mode: bool, log_zap: &str) -> Self {
        if !db_log_mode {
            return Self::Silent;
        }

        match log_zap.trim().to_ascii_lowercase().as_str() {
            "silent" => Self::Silent,
            "error" => Self::Error,
            "warn" => Self::Warn,
            "info" | "zap" => Self::Info,
            _ => Self::Info,
        }
    }

    /// Level filters for `(every statement, slow statements)`.
    pub fn statement_levels(self) -> (LevelFilter, LevelFilter) {
        match self {
            Self::Silent | Self::Error => (LevelFilter::Off, LevelFilter::Off),
            Self::Warn => (LevelFilter::Off, LevelFilter::Warn),
            Self::Info => (LevelFilter::Info, LevelFilter::Warn),
        }
    }
}
