use serde_json::Value;
use std::fmt;
use std::io::Write;
use std::sync::{Arc, Mutex};

use crate::record::LogEntry;

/// Prefix of every fallback diagnostic.
pub const SOS_PREFIX: &str = "FILE_LOG_SOS";

/// Why a record could not reach its log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FallbackReason {
    /// No directory was configured.
    DirectoryMissing,
    /// The per-user directory could not be created.
    DirectoryUnavailable,
    /// The per-user directory exists but is not writable.
    PermissionDeniedDir,
    /// The live file could not be opened or appended to.
    PermissionDeniedFile,
}

impl FallbackReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackReason::DirectoryMissing => "DIRECTORY_MISSING",
            FallbackReason::DirectoryUnavailable => "DIRECTORY_UNAVAILABLE",
            FallbackReason::PermissionDeniedDir => "PERMISSION_DENIED_DIR",
            FallbackReason::PermissionDeniedFile => "PERMISSION_DENIED_FILE",
        }
    }

    /// `SOS_PREFIX:REASON`, the tag written on the fallback sink.
    pub fn tag(&self) -> String {
        format!("{}:{}", SOS_PREFIX, self.as_str())
    }
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

/// Last-resort sink for records whose file write failed.
///
/// Writes to standard output unless built with [`FallbackReporter::new`].
/// Reporting never fails: write errors on the sink are swallowed.
#[derive(Clone)]
pub struct FallbackReporter {
    verbose: bool,
    separator: String,
    sink: SharedWriter,
}

impl FallbackReporter {
    /// Reporter writing to an arbitrary sink.
    pub fn new(verbose: bool, separator: impl Into<String>, sink: Box<dyn Write + Send>) -> Self {
        Self {
            verbose,
            separator: separator.into(),
            sink: Arc::new(Mutex::new(sink)),
        }
    }

    /// Reporter writing to standard output.
    pub fn stdout(verbose: bool, separator: impl Into<String>) -> Self {
        Self::new(verbose, separator, Box::new(std::io::stdout()))
    }

    /// Emit the diagnostic for `reason`.
    ///
    /// Verbose mode writes a pretty-printed `{"SOS_PREFIX:REASON": entry}`
    /// object; terse mode writes only the tag. Both are followed by the
    /// separator.
    pub fn report(&self, reason: FallbackReason, entry: &LogEntry) {
        let text = self.render(reason, entry);

        tracing::warn!(target: crate::INTERNAL_TARGET, reason = %reason, "log record routed to fallback sink");

        // A poisoned lock still guards a usable writer.
        let mut sink = self.sink.lock().unwrap_or_else(|e| e.into_inner());
        let _ = sink.write_all(text.as_bytes());
        let _ = sink.flush();
    }

    fn render(&self, reason: FallbackReason, entry: &LogEntry) -> String {
        let mut text = if self.verbose {
            let mut body = serde_json::Map::new();
            body.insert(
                reason.tag(),
                serde_json::to_value(entry).unwrap_or(Value::Null),
            );
            serde_json::to_string_pretty(&Value::Object(body)).unwrap_or_else(|_| reason.tag())
        } else {
            reason.tag()
        };
        text.push_str(&self.separator);
        text
    }
}

impl fmt::Debug for FallbackReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FallbackReporter")
            .field("verbose", &self.verbose)
            .field("separator", &self.separator)
            .finish_non_exhaustive()
    }
}

/// In-memory writer that can be shared with a [`FallbackReporter`] and
/// inspected afterwards. Mostly useful in tests.
#[derive(Clone, Default, Debug)]
pub struct CaptureBuffer(Arc<Mutex<Vec<u8>>>);

impl CaptureBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded as UTF-8.
    pub fn contents(&self) -> String {
        let buf = self.0.lock().unwrap_or_else(|e| e.into_inner());
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl Write for CaptureBuffer {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        let mut buf = self.0.lock().unwrap_or_else(|e| e.into_inner());
        buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
