use tracing::Level;

/// Minimum severity written by the logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Parses a configured level name. Anything unrecognized means `Warn`.
    pub fn from_name(name: &str) -> Self {
        let name = name.trim();
        if name.eq_ignore_ascii_case("debug") {
            Self::Debug
        } else if name.eq_ignore_ascii_case("info") {
            Self::Info
        } else if name.eq_ignore_ascii_case("error") {
            Self::Error
        } else {
            Self::Warn
        }
    }

    pub fn as_tracing(self) -> Level {
        match self {
            Self::Debug => Level::DEBUG,
            Self::Info => Level::INFO,
            Self::Warn => Level::WARN,
            Self::Error => Level::ERROR,
        }
    }

    /// Whether a sink dedicated to `sink` should write anything under this threshold.
    pub fn enables(self, sink: Level) -> bool {
        // tracing orders levels by verbosity: ERROR < WARN < INFO < DEBUG.
        sink <= self.as_tracing()
    }
}
