use std::path::PathBuf;

use crate::env::{self, confirm, env_opt};
use crate::error::ConfigError;
use crate::mask::DEFAULT_MASKED_KEYS;

/// Default archive sub-directory name.
pub const DEFAULT_ARCHIVE: &str = "archive";

/// Default rotation threshold: 4 MiB.
pub const DEFAULT_FILESIZE: u64 = 4 * 1024 * 1024;

/// Default log file suffix.
pub const DEFAULT_SUFFIX: &str = "log";

/// Debug tag used when debug naming is requested without an explicit tag.
pub const DEFAULT_DEBUG_TAG: &str = "debug";

#[cfg(windows)]
pub const DEFAULT_SEPARATOR: &str = "\r\n";
#[cfg(not(windows))]
pub const DEFAULT_SEPARATOR: &str = "\n";

/// Frozen configuration of a [`FileLogger`](crate::file::FileLogger).
///
/// Build it with [`LoggerConfig::builder`]; fields are read-only once built.
///
/// **Fields**
/// - `directory`: base storage path. `None` makes every call fall back
///   with `DIRECTORY_MISSING` without touching the filesystem.
/// - `archive`: name of the archive sub-directory.
/// - `filesize`: rotation threshold in bytes, always > 0.
/// - `suffix`: file suffix without the dot.
/// - `postfix`: optional tag in the per-user directory name.
/// - `debug`: optional debug tag; switches file naming to `LEVEL-tag`.
/// - `single`: one shared file for all processes instead of one per pid.
/// - `sos_verbose`: fallback output carries the full record.
/// - `separator`: written after every line, may be empty.
/// - `identity`: runtime identity tag used in file names.
/// - `masked_keys`: context keys hidden before serialization.
#[derive(Clone, Debug, PartialEq)]
pub struct LoggerConfig {
    directory: Option<PathBuf>,
    archive: String,
    filesize: u64,
    suffix: String,
    postfix: Option<String>,
    debug: Option<String>,
    single: bool,
    sos_verbose: bool,
    separator: String,
    identity: String,
    masked_keys: Vec<String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            directory: None,
            archive: DEFAULT_ARCHIVE.to_string(),
            filesize: DEFAULT_FILESIZE,
            suffix: DEFAULT_SUFFIX.to_string(),
            postfix: None,
            debug: None,
            single: false,
            sos_verbose: true,
            separator: DEFAULT_SEPARATOR.to_string(),
            identity: env::runtime_identity(),
            masked_keys: DEFAULT_MASKED_KEYS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

impl LoggerConfig {
    pub fn builder() -> LoggerConfigBuilder {
        LoggerConfigBuilder::default()
    }

    /// Build a configuration from `FILE_LOG_*` environment variables.
    ///
    /// Unset or blank variables keep their defaults. Only the filesize is
    /// validated; a non-numeric or zero value is an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut builder = Self::builder();

        if let Some(dir) = env_opt(env::FILE_LOG_DIRECTORY_ENV) {
            builder = builder.directory(dir);
        }
        if let Some(archive) = env_opt(env::FILE_LOG_ARCHIVE_ENV) {
            builder = builder.archive(archive);
        }
        if let Some(raw) = env_opt(env::FILE_LOG_FILESIZE_ENV) {
            let filesize = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| ConfigError::InvalidFilesize {
                    key: env::FILE_LOG_FILESIZE_ENV,
                    value: raw.clone(),
                })?;
            builder = builder.filesize(filesize);
        }
        if let Some(suffix) = env_opt(env::FILE_LOG_SUFFIX_ENV) {
            builder = builder.suffix(suffix);
        }
        if let Some(postfix) = env_opt(env::FILE_LOG_POSTFIX_ENV) {
            builder = builder.postfix(postfix);
        }
        if let Ok(debug) = std::env::var(env::FILE_LOG_DEBUG_ENV) {
            builder = builder.debug(debug);
        }
        if let Some(single) = env_opt(env::FILE_LOG_SINGLE_ENV) {
            builder = builder.single(confirm(&single));
        }
        if let Some(sos) = env_opt(env::FILE_LOG_SOS_ENV) {
            builder = builder.sos_verbose(confirm(&sos));
        }
        if let Ok(separator) = std::env::var(env::FILE_LOG_SEPARATOR_ENV) {
            builder = builder.separator(separator);
        }
        if let Some(identity) = env_opt(env::FILE_LOG_IDENTITY_ENV) {
            builder = builder.identity(identity);
        }

        Ok(builder.build())
    }

    pub fn directory(&self) -> Option<&PathBuf> {
        self.directory.as_ref()
    }

    pub fn archive(&self) -> &str {
        &self.archive
    }

    pub fn filesize(&self) -> u64 {
        self.filesize
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn postfix(&self) -> Option<&str> {
        self.postfix.as_deref()
    }

    pub fn debug(&self) -> Option<&str> {
        self.debug.as_deref()
    }

    pub fn single(&self) -> bool {
        self.single
    }

    pub fn sos_verbose(&self) -> bool {
        self.sos_verbose
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn masked_keys(&self) -> &[String] {
        &self.masked_keys
    }
}

/// Fluent builder for [`LoggerConfig`].
///
/// String setters trim their input and ignore blank values, so a blank
/// environment variable or CLI flag never clobbers a default.
#[derive(Clone, Debug, Default)]
pub struct LoggerConfigBuilder {
    config: LoggerConfig,
}

impl LoggerConfigBuilder {
    pub fn directory(mut self, directory: impl Into<PathBuf>) -> Self {
        let directory = directory.into();
        if !directory.as_os_str().to_string_lossy().trim().is_empty() {
            self.config.directory = Some(directory);
        }
        self
    }

    pub fn archive(mut self, archive: impl AsRef<str>) -> Self {
        if let Some(archive) = non_blank(archive.as_ref()) {
            self.config.archive = archive;
        }
        self
    }

    /// Rotation threshold in bytes; zero is ignored.
    pub fn filesize(mut self, filesize: u64) -> Self {
        if filesize > 0 {
            self.config.filesize = filesize;
        }
        self
    }

    pub fn suffix(mut self, suffix: impl AsRef<str>) -> Self {
        if let Some(suffix) = non_blank(suffix.as_ref()) {
            self.config.suffix = suffix;
        }
        self
    }

    pub fn postfix(mut self, postfix: impl AsRef<str>) -> Self {
        if let Some(postfix) = non_blank(postfix.as_ref()) {
            self.config.postfix = Some(postfix);
        }
        self
    }

    /// Enable debug naming. A blank tag selects [`DEFAULT_DEBUG_TAG`].
    pub fn debug(mut self, tag: impl AsRef<str>) -> Self {
        let tag = non_blank(tag.as_ref()).unwrap_or_else(|| DEFAULT_DEBUG_TAG.to_string());
        self.config.debug = Some(tag);
        self
    }

    pub fn single(mut self, single: bool) -> Self {
        self.config.single = single;
        self
    }

    pub fn sos_verbose(mut self, verbose: bool) -> Self {
        self.config.sos_verbose = verbose;
        self
    }

    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.config.separator = separator.into();
        self
    }

    pub fn identity(mut self, identity: impl AsRef<str>) -> Self {
        if let Some(identity) = non_blank(identity.as_ref()) {
            self.config.identity = identity;
        }
        self
    }

    /// Replace the list of context keys to mask.
    pub fn masked_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.masked_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn build(self) -> LoggerConfig {
        self.config
    }
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = LoggerConfig::default();
        assert_eq!(cfg.directory(), None);
        assert_eq!(cfg.archive(), "archive");
        assert_eq!(cfg.filesize(), 4_194_304);
        assert_eq!(cfg.suffix(), "log");
        assert_eq!(cfg.debug(), None);
        assert!(!cfg.single());
        assert!(cfg.sos_verbose());
        assert_eq!(cfg.separator(), DEFAULT_SEPARATOR);
        assert!(!cfg.identity().is_empty());
    }

    #[test]
    fn blank_and_invalid_values_are_ignored() {
        let cfg = LoggerConfig::builder()
            .directory("  ")
            .archive("")
            .suffix(" ")
            .postfix("")
            .filesize(0)
            .identity("")
            .build();

        assert_eq!(cfg, LoggerConfig::default());
    }

    #[test]
    fn debug_without_tag_uses_sentinel() {
        let cfg = LoggerConfig::builder().debug("").build();
        assert_eq!(cfg.debug(), Some("debug"));

        let cfg = LoggerConfig::builder().debug("worker").build();
        assert_eq!(cfg.debug(), Some("worker"));
    }

    #[test]
    fn setters_trim_values() {
        let cfg = LoggerConfig::builder()
            .directory("/var/log/app")
            .postfix(" api ")
            .suffix(" txt ")
            .separator("")
            .build();
        assert_eq!(cfg.directory(), Some(&PathBuf::from("/var/log/app")));
        assert_eq!(cfg.postfix(), Some("api"));
        assert_eq!(cfg.suffix(), "txt");
        assert_eq!(cfg.separator(), "");
    }
}
