use std::path::PathBuf;

use crate::fallback::FallbackReason;

/// Failure on the write path of a [`FileLogger`](crate::file::FileLogger).
///
/// None of these ever reach the caller of `log`; each one is turned into a
/// fallback diagnostic through [`WriteError::reason`].
#[derive(thiserror::Error, Debug)]
pub enum WriteError {
    #[error("no log directory configured")]
    ConfigurationMissing,

    #[error("cannot create log directory {path}: {source}")]
    DirectoryUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("log directory {path} is not writable")]
    PermissionDeniedDir { path: PathBuf },

    #[error("cannot append to log file {path}: {source}")]
    FileUnwritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl WriteError {
    /// Reason code reported on the fallback sink for this failure.
    pub fn reason(&self) -> FallbackReason {
        match self {
            WriteError::ConfigurationMissing => FallbackReason::DirectoryMissing,
            WriteError::DirectoryUnavailable { .. } => FallbackReason::DirectoryUnavailable,
            WriteError::PermissionDeniedDir { .. } => FallbackReason::PermissionDeniedDir,
            WriteError::FileUnwritable { .. } => FallbackReason::PermissionDeniedFile,
        }
    }
}

/// Error returned when building a [`LoggerConfig`](crate::config::LoggerConfig)
/// from environment variables.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: expected a positive byte count, got {value:?}")]
    InvalidFilesize { key: &'static str, value: String },
}
