use std::fmt;

use chrono::{Local, Utc};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;

/// Timestamp style for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTimer {
    /// `YYYY-MM-DD HH:MM:SS` in local time.
    Readable,
    /// Milliseconds since the Unix epoch.
    EpochMillis,
}

impl LogTimer {
    pub fn for_profile(development: bool) -> Self {
        if development {
            Self::Readable
        } else {
            Self::EpochMillis
        }
    }
}

impl FormatTime for LogTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        match self {
            Self::Readable => write!(w, "{}", Local::now().format("%Y-%m-%d %H:%M:%S")),
            Self::EpochMillis => write!(w, "{}", Utc::now().timestamp_millis()),
        }
    }
}
