use serde_json::Value;
use std::path::PathBuf;

use crate::config::LoggerConfig;
use crate::error::WriteError;
use crate::fallback::FallbackReporter;
use crate::logger::{custom_context, Logger, CUSTOM_LEVEL};
use crate::path::{PathResolver, ProcessIdentity};
use crate::record::{normalize_level, Context, LogRecord};
use crate::writer::{RotatingWriter, WriteOutcome};

/// Leveled logger writing one JSON line per record into per-level files.
///
/// Each call resolves the destination, rotates the live file when it has
/// grown past the threshold, and appends. Every failure is routed to the
/// [`FallbackReporter`]; nothing is returned to the caller.
///
/// ```no_run
/// use file_log_sink::{FileLogger, Logger, LoggerConfig};
/// use serde_json::json;
///
/// let logger = FileLogger::new(
///     LoggerConfig::builder().directory("/var/log/myapp").build(),
/// );
/// logger.error(json!("payment failed"), [("order".to_string(), json!(42))].into());
/// ```
#[derive(Debug, Clone)]
pub struct FileLogger {
    config: LoggerConfig,
    process: ProcessIdentity,
    fallback: FallbackReporter,
}

impl FileLogger {
    /// Logger for the current process, falling back to standard output.
    pub fn new(config: LoggerConfig) -> Self {
        let fallback = FallbackReporter::stdout(config.sos_verbose(), config.separator());
        Self {
            config,
            process: ProcessIdentity::current(),
            fallback,
        }
    }

    /// Write as if running under another pid/user.
    pub fn with_process(mut self, process: ProcessIdentity) -> Self {
        self.process = process;
        self
    }

    /// Replace the fallback sink.
    pub fn with_fallback(mut self, fallback: FallbackReporter) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    pub fn process(&self) -> &ProcessIdentity {
        &self.process
    }

    pub fn resolver(&self) -> PathResolver<'_> {
        PathResolver::new(&self.config, &self.process)
    }

    /// Live file a record at `level` would currently go to. Does no I/O.
    pub fn live_path(&self, level: &str) -> Result<PathBuf, WriteError> {
        Ok(self.resolver().locate(&normalize_level(level), None)?.file)
    }

    /// Write `record`, returning the failure instead of reporting it.
    ///
    /// `debug` overrides the configured debug tag for this record only.
    pub fn write_record(
        &self,
        record: &LogRecord,
        debug: Option<&str>,
    ) -> Result<WriteOutcome, WriteError> {
        let target = self.resolver().resolve(&record.level, debug)?;
        let line = record.entry(self.config.masked_keys()).to_json();
        RotatingWriter::new(&self.config).write(&target, record.timestamp, &line)
    }

    fn dispatch(&self, record: LogRecord, debug: Option<&str>) {
        if let Err(e) = self.write_record(&record, debug) {
            tracing::debug!(target: crate::INTERNAL_TARGET, error = %e, level = %record.level, "log write failed");
            self.fallback
                .report(e.reason(), &record.entry(self.config.masked_keys()));
        }
    }
}

impl Logger for FileLogger {
    fn log(&self, level: &str, message: Value, context: Context) {
        self.dispatch(LogRecord::new(level, message, context), None);
    }

    fn log_record(&self, record: LogRecord) {
        self.dispatch(record, None);
    }

    /// Written to `LOG-{tag}.…` instead of the regular `LOG.…` file.
    fn log_custom(&self, tag: &str, args: Vec<Value>) {
        let record = LogRecord::new(CUSTOM_LEVEL, Value::String(tag.to_string()), custom_context(args));
        let tag = tag.trim();
        self.dispatch(record, (!tag.is_empty()).then_some(tag));
    }
}
