//! Size-based rotation and append.
//!
//! Archived files are moved to
//! `{user_dir}/{archive}/{YYYY}/{MM}/{DD}/{user}/{LEVEL}/{identity}/{stamp}.{user}.{LEVEL}.{identity}.{token}.{suffix}`.
//!
//! No lock is taken. Two writers racing on the same live file may both see
//! it oversized, and one of them may append to the old inode after the other
//! renamed it; both cases end with every line on disk somewhere.

use chrono::{DateTime, Utc};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::LoggerConfig;
use crate::error::WriteError;
use crate::path::ResolvedPath;

/// Timestamp format of archived file names, distinct from the line format.
pub const ARCHIVE_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S-%6f";

/// Result of a successful append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    /// Live file the line was appended to.
    pub file: PathBuf,
    /// Where the previous live file went, if it was rotated.
    pub archived: Option<PathBuf>,
}

/// Appends lines to a live file, archiving it first once it reaches the
/// configured threshold.
#[derive(Debug, Clone, Copy)]
pub struct RotatingWriter<'a> {
    config: &'a LoggerConfig,
}

impl<'a> RotatingWriter<'a> {
    pub fn new(config: &'a LoggerConfig) -> Self {
        Self { config }
    }

    /// Rotate `target` if needed, then append `line` plus the separator.
    ///
    /// Rotation problems never fail the call; only the append can.
    pub fn write(
        &self,
        target: &ResolvedPath,
        timestamp: DateTime<Utc>,
        line: &str,
    ) -> Result<WriteOutcome, WriteError> {
        let archived = self.rotate_if_needed(target, timestamp);
        self.append(&target.file, line)?;
        Ok(WriteOutcome {
            file: target.file.clone(),
            archived,
        })
    }

    /// Move the live file into the archive tree when it is at or above the
    /// threshold. Returns the archived path on success.
    pub fn rotate_if_needed(&self, target: &ResolvedPath, timestamp: DateTime<Utc>) -> Option<PathBuf> {
        let size = match fs::metadata(&target.file) {
            Ok(meta) if meta.is_file() => meta.len(),
            _ => return None,
        };
        if size < self.config.filesize() {
            return None;
        }

        let dir = self.archive_dir(target, timestamp);
        if let Err(e) = fs::create_dir_all(&dir) {
            tracing::warn!(target: crate::INTERNAL_TARGET, path = %dir.display(), error = %e, "cannot create archive directory, skipping rotation");
            return None;
        }

        let archived = dir.join(self.archive_name(target, timestamp));
        if archived.is_file() {
            tracing::warn!(target: crate::INTERNAL_TARGET, path = %archived.display(), "archive already exists, skipping rotation");
            return None;
        }
        if let Err(e) = fs::rename(&target.file, &archived) {
            tracing::warn!(
                target: crate::INTERNAL_TARGET,
                from = %target.file.display(),
                to = %archived.display(),
                error = %e,
                "cannot archive log file, skipping rotation"
            );
            return None;
        }

        tracing::debug!(target: crate::INTERNAL_TARGET, from = %target.file.display(), to = %archived.display(), size, "log file archived");
        Some(archived)
    }

    /// Dated archive directory for `target`.
    pub fn archive_dir(&self, target: &ResolvedPath, timestamp: DateTime<Utc>) -> PathBuf {
        target
            .dir
            .join(self.config.archive())
            .join(timestamp.format("%Y").to_string())
            .join(timestamp.format("%m").to_string())
            .join(timestamp.format("%d").to_string())
            .join(&target.user)
            .join(&target.level)
            .join(self.config.identity())
    }

    /// Archived file name for `target`.
    pub fn archive_name(&self, target: &ResolvedPath, timestamp: DateTime<Utc>) -> String {
        let stamp = timestamp.format(ARCHIVE_TIMESTAMP_FORMAT).to_string();
        [
            stamp.as_str(),
            target.user.as_str(),
            target.level.as_str(),
            self.config.identity(),
            target.token.as_str(),
            self.config.suffix(),
        ]
        .join(".")
    }

    fn append(&self, file: &Path, line: &str) -> Result<(), WriteError> {
        let unwritable = |source| WriteError::FileUnwritable {
            path: file.to_path_buf(),
            source,
        };

        // One write call per record keeps appends from concurrent writers
        // whole on filesystems that honour O_APPEND.
        let mut buf = String::with_capacity(line.len() + self.config.separator().len());
        buf.push_str(line);
        buf.push_str(self.config.separator());

        let mut fp = OpenOptions::new()
            .create(true)
            .append(true)
            .open(file)
            .map_err(unwritable)?;
        fp.write_all(buf.as_bytes()).map_err(unwritable)
    }
}
