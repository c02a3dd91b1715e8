pub mod config;
pub mod env;
pub mod error;
pub mod fallback;
pub mod file;
pub mod init;
pub mod layer;
pub mod logger;
pub mod mask;
pub mod path;
pub mod record;
pub mod writer;

pub use config::{LoggerConfig, LoggerConfigBuilder};
pub use error::{ConfigError, WriteError};
pub use fallback::{FallbackReason, FallbackReporter};
pub use file::FileLogger;
pub use logger::{Logger, LoggerAware, NoopLogger, TracingLogger};
pub use path::{PathResolver, ProcessIdentity};
pub use record::{Context, LogRecord};
pub use writer::RotatingWriter;

/// `tracing` target of the crate's own diagnostics. The bridge layer skips
/// it so that a failing write cannot feed itself.
pub(crate) const INTERNAL_TARGET: &str = "file_log_sink::internal";
