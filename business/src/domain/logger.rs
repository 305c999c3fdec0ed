use std::fmt;

use super::trace::TraceContext;

/// A structured key/value pair attached to a log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogField {
    pub key: &'static str,
    pub value: String,
}

impl LogField {
    pub fn new(key: &'static str, value: impl fmt::Display) -> Self {
        Self {
            key,
            value: value.to_string(),
        }
    }

    pub fn error(err: &dyn std::error::Error) -> Self {
        Self::new("error", err)
    }
}

/// Renders a field list as `key=value` pairs separated by spaces.
pub struct Fields<'a>(pub &'a [LogField]);

impl fmt::Display for Fields<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}={}", field.key, field.value)?;
        }
        Ok(())
    }
}

/// Leveled logging port. Implementations see the call site of the code that
/// invoked the port, also through `dyn Logger`.
pub trait Logger: Send + Sync {
    #[track_caller]
    fn debug(&self, ctx: &TraceContext, message: &str, fields: &[LogField]);
    #[track_caller]
    fn info(&self, ctx: &TraceContext, message: &str, fields: &[LogField]);
    #[track_caller]
    fn warn(&self, ctx: &TraceContext, message: &str, fields: &[LogField]);
    #[track_caller]
    fn error(&self, ctx: &TraceContext, message: &str, fields: &[LogField]);
}
