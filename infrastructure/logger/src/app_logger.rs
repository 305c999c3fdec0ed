use std::io;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use business::domain::logger::{Fields, LogField};
use business::domain::settings::SystemSettings;
use business::domain::trace::TraceContext;
use thiserror::Error;
use tracing::{Dispatch, Level, Metadata};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{Layer, Registry, fmt};

use crate::level::LogLevel;
use crate::options::LoggerOptions;
use crate::rolling_file::RollingFile;
use crate::timer::LogTimer;

#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("logger.sink_setup: {path}")]
    SinkSetup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("logger.global_already_set")]
    GlobalAlreadySet,
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

const SINK_LEVELS: [Level; 4] = [Level::ERROR, Level::WARN, Level::INFO, Level::DEBUG];
const TARGET: &str = "flint";

/// Leveled logger fanning out to one rotating file per severity, plus the
/// console in development mode.
///
/// Each instance owns its dispatcher and file sinks, so several loggers can
/// coexist in one process. Call [`AppLogger::install_global`] to also route
/// events emitted by libraries into the same sinks.
pub struct AppLogger {
    dispatch: Dispatch,
    task_id: Option<String>,
    sink_paths: Vec<PathBuf>,
    guards: Mutex<Vec<WorkerGuard>>,
}

impl AppLogger {
    pub fn build(options: &LoggerOptions, task_id: Option<&str>) -> Result<Self, LoggerError> {
        let task_id = task_id.filter(|t| !t.is_empty()).map(str::to_string);
        let timer = LogTimer::for_profile(options.development);
        let policy = options.roll_policy(task_id.as_deref());

        let mut layers: Vec<BoxedLayer> = Vec::with_capacity(SINK_LEVELS.len() * 2);
        let mut sink_paths = Vec::with_capacity(SINK_LEVELS.len());
        let mut guards = Vec::with_capacity(SINK_LEVELS.len());

        for sink in SINK_LEVELS {
            let path = options.sink_path(sink, task_id.as_deref());
            let file = RollingFile::open(&path, policy.clone()).map_err(|source| {
                LoggerError::SinkSetup {
                    path: path.clone(),
                    source,
                }
            })?;
            let (writer, guard) = tracing_appender::non_blocking(file);

            layers.push(file_layer(writer, timer, sink, options.level));
            if options.development {
                layers.push(console_layer(timer, sink, options.level));
            }
            sink_paths.push(path);
            guards.push(guard);
        }

        Ok(Self {
            dispatch: Dispatch::new(Registry::default().with(layers)),
            task_id,
            sink_paths,
            guards: Mutex::new(guards),
        })
    }

    pub fn task_id(&self) -> Option<&str> {
        self.task_id.as_deref()
    }

    /// Files backing the error, warn, info and debug sinks, in that order.
    pub fn sink_paths(&self) -> impl Iterator<Item = &Path> {
        self.sink_paths.iter().map(PathBuf::as_path)
    }

    /// Trace context for work logged on behalf of this logger's task.
    pub fn trace_context(&self) -> TraceContext {
        match &self.task_id {
            Some(task) => TraceContext::for_task(task.as_str()),
            None => TraceContext::new(),
        }
    }

    /// Makes this logger the process-wide default `tracing` dispatcher.
    pub fn install_global(&self) -> Result<(), LoggerError> {
        tracing::dispatcher::set_global_default(self.dispatch.clone())
            .map_err(|_| LoggerError::GlobalAlreadySet)
    }

    #[track_caller]
    pub fn debug(&self, ctx: &TraceContext, message: &str, fields: &[LogField]) {
        self.emit(Level::DEBUG, ctx, message, fields, Location::caller());
    }

    #[track_caller]
    pub fn info(&self, ctx: &TraceContext, message: &str, fields: &[LogField]) {
        self.emit(Level::INFO, ctx, message, fields, Location::caller());
    }

    #[track_caller]
    pub fn warn(&self, ctx: &TraceContext, message: &str, fields: &[LogField]) {
        self.emit(Level::WARN, ctx, message, fields, Location::caller());
    }

    #[track_caller]
    pub fn error(&self, ctx: &TraceContext, message: &str, fields: &[LogField]) {
        self.emit(Level::ERROR, ctx, message, fields, Location::caller());
    }

    pub(crate) fn emit(
        &self,
        level: Level,
        ctx: &TraceContext,
        message: &str,
        fields: &[LogField],
        caller: &Location<'_>,
    ) {
        let caller = format!("{}:{}", caller.file(), caller.line());
        let extra = (!fields.is_empty()).then(|| tracing::field::display(Fields(fields)));

        macro_rules! emit_at {
            ($level:expr) => {
                tracing::event!(
                    target: TARGET,
                    $level,
                    link_id = ctx.link_id(),
                    link_root_span = ctx.link_root_span(),
                    caller = %caller,
                    fields = extra,
                    "{}",
                    message
                )
            };
        }

        tracing::dispatcher::with_default(&self.dispatch, || match level {
            Level::ERROR => emit_at!(Level::ERROR),
            Level::WARN => emit_at!(Level::WARN),
            Level::INFO => emit_at!(Level::INFO),
            _ => emit_at!(Level::DEBUG),
        });
    }

    /// Flushes and releases every file sink. Later calls do nothing.
    pub fn close(&self) {
        let mut guards = self.guards.lock().unwrap_or_else(PoisonError::into_inner);
        guards.clear();
    }
}

fn only(sink: Level, threshold: LogLevel) -> impl Fn(&Metadata<'_>) -> bool + Send + Sync {
    let enabled = threshold.enables(sink);
    move |meta: &Metadata<'_>| enabled && *meta.level() == sink
}

fn file_layer(writer: NonBlocking, timer: LogTimer, sink: Level, threshold: LogLevel) -> BoxedLayer {
    fmt::layer()
        .json()
        .flatten_event(true)
        .with_current_span(false)
        .with_span_list(false)
        .with_timer(timer)
        .with_ansi(false)
        .with_writer(writer)
        .with_filter(filter_fn(only(sink, threshold)))
        .boxed()
}

fn console_layer(timer: LogTimer, sink: Level, threshold: LogLevel) -> BoxedLayer {
    // Event metadata points at `emit`; the `caller` field carries the call site.
    let layer = fmt::layer()
        .with_timer(timer)
        .with_ansi(true)
        .with_target(false);
    let filter = filter_fn(only(sink, threshold));

    if sink == Level::ERROR {
        layer.with_writer(io::stderr).with_filter(filter).boxed()
    } else {
        layer.with_writer(io::stdout).with_filter(filter).boxed()
    }
}

/// Builds the process logger at most once.
#[derive(Default)]
pub struct LoggerFactory {
    current: Mutex<Option<Arc<AppLogger>>>,
}

impl LoggerFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the logger, or returns `None` if this factory already built one.
    pub fn new_logger(
        &self,
        system: &SystemSettings,
        task_id: &str,
    ) -> Result<Option<Arc<AppLogger>>, LoggerError> {
        self.new_logger_with(system, task_id, |_| {})
    }

    /// Like [`LoggerFactory::new_logger`], letting `modify` adjust the
    /// options derived from settings before any sink is created.
    pub fn new_logger_with(
        &self,
        system: &SystemSettings,
        task_id: &str,
        modify: impl FnOnce(&mut LoggerOptions),
    ) -> Result<Option<Arc<AppLogger>>, LoggerError> {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = current.as_ref() {
            existing.info(&TraceContext::new(), "[NewLogger] logger Inited", &[]);
            return Ok(None);
        }

        let mut options = LoggerOptions::from_settings(system);
        modify(&mut options);

        let logger = Arc::new(AppLogger::build(&options, Some(task_id))?);
        logger.info(&logger.trace_context(), "[NewLogger] success", &[]);
        *current = Some(Arc::clone(&logger));
        Ok(Some(logger))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn quiet_options(dir: &Path, level: LogLevel) -> LoggerOptions {
        let mut options = LoggerOptions::from_settings(&SystemSettings::default());
        options.log_file_dir = dir.to_path_buf();
        options.level = level;
        options.development = false;
        options
    }

    fn read(path: &Path) -> String {
        fs::read_to_string(path).unwrap_or_default()
    }

    #[test]
    fn should_route_each_level_to_its_own_file() {
        let dir = tempfile::tempdir().unwrap();
        let logger = AppLogger::build(&quiet_options(dir.path(), LogLevel::Debug), None).unwrap();
        let ctx = TraceContext::new();

        logger.error(&ctx, "disk full", &[]);
        logger.warn(&ctx, "slow query", &[]);
        logger.info(&ctx, "started", &[]);
        logger.debug(&ctx, "tick", &[]);
        logger.close();

        let error = read(&dir.path().join("app_log-error.log"));
        let warn = read(&dir.path().join("app_log-warn.log"));
        let info = read(&dir.path().join("app_log-info.log"));
        let debug = read(&dir.path().join("app_log-debug.log"));
        assert!(error.contains("disk full") && !error.contains("slow query"));
        assert!(warn.contains("slow query") && !warn.contains("started"));
        assert!(info.contains("started") && !info.contains("tick"));
        assert!(debug.contains("tick") && !debug.contains("disk full"));
    }

    #[test]
    fn should_drop_events_below_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let logger = AppLogger::build(&quiet_options(dir.path(), LogLevel::Warn), None).unwrap();
        let ctx = TraceContext::new();

        logger.info(&ctx, "not written", &[]);
        logger.warn(&ctx, "written", &[]);
        logger.close();

        assert!(read(&dir.path().join("app_log-info.log")).is_empty());
        assert!(read(&dir.path().join("app_log-warn.log")).contains("written"));
    }

    #[test]
    fn should_attach_trace_fields_and_caller() {
        let dir = tempfile::tempdir().unwrap();
        let logger = AppLogger::build(&quiet_options(dir.path(), LogLevel::Info), None).unwrap();
        let ctx = TraceContext::new().with_link_id("req-1").with_root_span("root-2");

        let line = line!() + 1;
        logger.info(&ctx, "handled", &[LogField::new("status", 200)]);
        logger.close();

        let info = read(&dir.path().join("app_log-info.log"));
        let event: serde_json::Value = serde_json::from_str(info.trim()).unwrap();
        assert_eq!(event["link_id"], "req-1");
        assert_eq!(event["link_root_span"], "root-2");
        assert_eq!(event["fields"], "status=200");
        assert_eq!(event["message"], "handled");
        assert!(
            event["caller"]
                .as_str()
                .unwrap()
                .ends_with(&format!("app_logger.rs:{line}"))
        );
    }

    #[test]
    fn should_omit_absent_trace_fields() {
        let dir = tempfile::tempdir().unwrap();
        let logger = AppLogger::build(&quiet_options(dir.path(), LogLevel::Info), None).unwrap();

        logger.info(&TraceContext::new(), "plain", &[]);
        logger.close();

        let info = read(&dir.path().join("app_log-info.log"));
        let event: serde_json::Value = serde_json::from_str(info.trim()).unwrap();
        assert!(event.get("link_id").is_none());
        assert!(event.get("fields").is_none());
    }

    #[test]
    fn should_write_task_logs_under_task_directory() {
        let dir = tempfile::tempdir().unwrap();
        let logger =
            AppLogger::build(&quiet_options(dir.path(), LogLevel::Info), Some("job-7")).unwrap();

        logger.info(&logger.trace_context(), "task step", &[]);
        logger.close();

        let info = read(&dir.path().join("job-7").join("app_log-info.log"));
        assert!(info.contains("task step"));
        assert!(info.contains("job-7"));
        assert_eq!(logger.task_id(), Some("job-7"));
    }

    #[test]
    fn should_tolerate_closing_twice() {
        let dir = tempfile::tempdir().unwrap();
        let logger = AppLogger::build(&quiet_options(dir.path(), LogLevel::Info), None).unwrap();

        logger.close();
        logger.close();
    }

    #[test]
    fn should_build_logger_only_once_per_factory() {
        let dir = tempfile::tempdir().unwrap();
        let factory = LoggerFactory::new();
        let system = SystemSettings {
            log_level: "info".to_string(),
            log_path: dir.path().to_string_lossy().into_owned(),
        };
        let quiet = |options: &mut LoggerOptions| options.development = false;

        let first = factory.new_logger_with(&system, "", quiet).unwrap();
        let second = factory.new_logger_with(&system, "", quiet).unwrap();

        assert!(first.is_some());
        assert!(second.is_none());
        let files = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(files, 4);

        let logger = first.unwrap();
        let sinks: Vec<_> = logger.sink_paths().map(Path::to_path_buf).collect();
        let expected: Vec<_> = ["error", "warn", "info", "debug"]
            .iter()
            .map(|level| dir.path().join(format!("app_log-{level}.log")))
            .collect();
        assert_eq!(sinks, expected);
        logger.close();
        let info = read(&dir.path().join("app_log-info.log"));
        assert!(info.contains("[NewLogger] success"));
        assert!(info.contains("[NewLogger] logger Inited"));
    }

    #[test]
    fn should_fail_when_sink_directory_cannot_be_created() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, b"").unwrap();

        let result = AppLogger::build(&quiet_options(&blocker, LogLevel::Info), None);

        assert!(matches!(result, Err(LoggerError::SinkSetup { .. })));
    }
}
