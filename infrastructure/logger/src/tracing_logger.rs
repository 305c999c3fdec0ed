use std::panic::Location;

use business::domain::logger::{LogField, Logger};
use business::domain::trace::TraceContext;
use tracing::Level;

use crate::app_logger::AppLogger;

impl Logger for AppLogger {
    #[track_caller]
    fn debug(&self, ctx: &TraceContext, message: &str, fields: &[LogField]) {
        self.emit(Level::DEBUG, ctx, message, fields, Location::caller());
    }

    #[track_caller]
    fn info(&self, ctx: &TraceContext, message: &str, fields: &[LogField]) {
        self.emit(Level::INFO, ctx, message, fields, Location::caller());
    }

    #[track_caller]
    fn warn(&self, ctx: &TraceContext, message: &str, fields: &[LogField]) {
        self.emit(Level::WARN, ctx, message, fields, Location::caller());
    }

    #[track_caller]
    fn error(&self, ctx: &TraceContext, message: &str, fields: &[LogField]) {
        self.emit(Level::ERROR, ctx, message, fields, Location::caller());
    }
}
