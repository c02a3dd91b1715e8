use serde_json::Value;
use std::sync::Arc;

use crate::record::{Context, LogRecord};

/// Level used by [`Logger::log_custom`].
pub const CUSTOM_LEVEL: &str = "log";

/// `tracing` target of events emitted by [`TracingLogger`].
pub const TRACING_TARGET: &str = "logger";

/// Leveled logging capability.
///
/// Implementations only have to provide [`Logger::log`]; every severity
/// method is a thin wrapper that calls it with a fixed level string.
/// Logging never fails from the caller's point of view: implementations
/// absorb their own errors.
pub trait Logger: Send + Sync {
    /// Record `message` at a free-form `level`.
    fn log(&self, level: &str, message: Value, context: Context);

    /// Record an already captured [`LogRecord`].
    ///
    /// The default implementation re-enters [`Logger::log`], which drops
    /// the captured timestamp. File-backed loggers keep it.
    fn log_record(&self, record: LogRecord) {
        self.log(&record.level, record.message, record.context);
    }

    /// Ad-hoc tagged entry, logged at level `LOG` with `tag` as the message
    /// and `{"args": [...]}` as context.
    fn log_custom(&self, tag: &str, args: Vec<Value>) {
        self.log(CUSTOM_LEVEL, Value::String(tag.to_string()), custom_context(args));
    }

    fn emergency(&self, message: Value, context: Context) {
        self.log("emergency", message, context);
    }

    fn alert(&self, message: Value, context: Context) {
        self.log("alert", message, context);
    }

    fn critical(&self, message: Value, context: Context) {
        self.log("critical", message, context);
    }

    fn error(&self, message: Value, context: Context) {
        self.log("error", message, context);
    }

    fn warning(&self, message: Value, context: Context) {
        self.log("warning", message, context);
    }

    fn notice(&self, message: Value, context: Context) {
        self.log("notice", message, context);
    }

    fn info(&self, message: Value, context: Context) {
        self.log("info", message, context);
    }

    fn debug(&self, message: Value, context: Context) {
        self.log("debug", message, context);
    }

    fn exception(&self, message: Value, context: Context) {
        self.log("exception", message, context);
    }

    fn trace(&self, message: Value, context: Context) {
        self.log("trace", message, context);
    }

    fn exceptor(&self, message: Value, context: Context) {
        self.log("exceptor", message, context);
    }
}

pub(crate) fn custom_context(args: Vec<Value>) -> Context {
    let mut context = Context::new();
    context.insert("args".to_string(), Value::Array(args));
    context
}

impl<L: Logger + ?Sized> Logger for Arc<L> {
    fn log(&self, level: &str, message: Value, context: Context) {
        (**self).log(level, message, context);
    }

    fn log_record(&self, record: LogRecord) {
        (**self).log_record(record);
    }

    fn log_custom(&self, tag: &str, args: Vec<Value>) {
        (**self).log_custom(tag, args);
    }
}

/// A logger that drops everything.
///
/// Useful for measuring the overhead of the bridge layer without any disk
/// I/O, and as a stand-in where a logger is required but unwanted.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn log(&self, _level: &str, _message: Value, _context: Context) {}
}

/// Forwards to the `tracing` ecosystem, so whatever subscriber the
/// application installed receives the record.
///
/// Severity names map onto the five `tracing` levels; unknown names are
/// emitted at `INFO`. The caller's level string travels as the `severity` field.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, level: &str, message: Value, context: Context) {
        let level = crate::record::normalize_level(level);
        let context = Value::Object(context.into_iter().collect());
        let message = match message {
            Value::String(s) => s,
            other => other.to_string(),
        };

        match level.as_str() {
            "EMERGENCY" | "ALERT" | "CRITICAL" | "ERROR" | "EXCEPTION" | "EXCEPTOR" => {
                tracing::error!(target: TRACING_TARGET, severity = %level, context = %context, "{}", message)
            }
            "WARNING" | "WARN" => {
                tracing::warn!(target: TRACING_TARGET, severity = %level, context = %context, "{}", message)
            }
            "DEBUG" => tracing::debug!(target: TRACING_TARGET, severity = %level, context = %context, "{}", message),
            "TRACE" => tracing::trace!(target: TRACING_TARGET, severity = %level, context = %context, "{}", message),
            _ => tracing::info!(target: TRACING_TARGET, severity = %level, context = %context, "{}", message),
        }
    }
}

/// Holder for an explicitly injected logger.
///
/// Components embed a `LoggerAware` and log through it; the concrete
/// logger (file-backed, `tracing`, no-op) is chosen by whoever builds the
/// component. There is no implicit default.
#[derive(Clone)]
pub struct LoggerAware {
    logger: Arc<dyn Logger>,
}

impl LoggerAware {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self { logger }
    }

    pub fn set_logger(&mut self, logger: Arc<dyn Logger>) -> &mut Self {
        self.logger = logger;
        self
    }

    pub fn logger(&self) -> &Arc<dyn Logger> {
        &self.logger
    }
}

impl std::fmt::Debug for LoggerAware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggerAware").finish_non_exhaustive()
    }
}

impl Logger for LoggerAware {
    fn log(&self, level: &str, message: Value, context: Context) {
        self.logger.log(level, message, context);
    }

    fn log_record(&self, record: LogRecord) {
        self.logger.log_record(record);
    }

    fn log_custom(&self, tag: &str, args: Vec<Value>) {
        self.logger.log_custom(tag, args);
    }
}
