pub mod app_logger;
pub mod level;
pub mod options;
pub mod rolling_file;
pub mod timer;
mod tracing_logger;

pub use app_logger::{AppLogger, LoggerError, LoggerFactory};
pub use level::LogLevel;
pub use options::LoggerOptions;
