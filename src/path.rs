//! Destination path derivation.
//!
//! Live files are laid out as
//! `{directory}/log-{user}[-{postfix}]/{LEVEL}[-{debug}].{identity}.{user}.{pid|single}.{suffix}`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::LoggerConfig;
use crate::env;
use crate::error::WriteError;

/// Prefix of the per-user directory name.
pub const DIR_PREFIX: &str = "log";

/// File identity token used in single-file mode instead of the pid.
pub const SINGLE_TOKEN: &str = "single";

/// Who is writing: process id and owning user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessIdentity {
    pub pid: u32,
    pub user: String,
}

impl ProcessIdentity {
    pub fn new(pid: u32, user: impl Into<String>) -> Self {
        Self { pid, user: user.into() }
    }

    /// Identity of the running process.
    pub fn current() -> Self {
        Self::new(std::process::id(), env::process_user())
    }
}

/// Everything the writer needs to know about one destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Per-user directory, `log-{user}[-{postfix}]`.
    pub dir: PathBuf,
    /// Live file inside `dir`.
    pub file: PathBuf,
    pub level: String,
    pub user: String,
    /// `single` or the pid.
    pub token: String,
}

/// Computes live-file locations for one logger configuration and process.
#[derive(Debug, Clone, Copy)]
pub struct PathResolver<'a> {
    config: &'a LoggerConfig,
    process: &'a ProcessIdentity,
}

impl<'a> PathResolver<'a> {
    pub fn new(config: &'a LoggerConfig, process: &'a ProcessIdentity) -> Self {
        Self { config, process }
    }

    /// `single` in single-file mode, the pid otherwise.
    pub fn file_token(&self) -> String {
        if self.config.single() {
            SINGLE_TOKEN.to_string()
        } else {
            self.process.pid.to_string()
        }
    }

    /// Per-user directory path. Pure; nothing is created.
    pub fn user_dir(&self) -> Result<PathBuf, WriteError> {
        let base = self.config.directory().ok_or(WriteError::ConfigurationMissing)?;
        let name = match self.config.postfix() {
            Some(postfix) => format!("{}-{}-{}", DIR_PREFIX, self.process.user, postfix),
            None => format!("{}-{}", DIR_PREFIX, self.process.user),
        };
        Ok(base.join(name))
    }

    /// Live file name for an already normalized `level`.
    ///
    /// `debug` overrides the configured debug tag for this call. Path
    /// separators in either are replaced, so the name stays one component.
    pub fn file_name(&self, level: &str, debug: Option<&str>) -> String {
        let level = path_segment(level);
        let head = match debug.or(self.config.debug()) {
            Some(tag) => format!("{}-{}", level, path_segment(tag)),
            None => level,
        };
        let token = self.file_token();
        [
            head.as_str(),
            self.config.identity(),
            self.process.user.as_str(),
            token.as_str(),
            self.config.suffix(),
        ]
        .join(".")
    }

    /// Compute the destination without touching the filesystem.
    pub fn locate(&self, level: &str, debug: Option<&str>) -> Result<ResolvedPath, WriteError> {
        let dir = self.user_dir()?;
        let file = dir.join(self.file_name(level, debug));
        Ok(ResolvedPath {
            dir,
            file,
            level: path_segment(level),
            user: self.process.user.clone(),
            token: self.file_token(),
        })
    }

    /// Compute the destination and make sure its directory exists and is
    /// writable.
    pub fn resolve(&self, level: &str, debug: Option<&str>) -> Result<ResolvedPath, WriteError> {
        let resolved = self.locate(level, debug)?;
        ensure_writable_dir(&resolved.dir)?;
        Ok(resolved)
    }
}

/// `raw` made safe to use as a single path component: separators and NUL
/// become `_`, and a bare `.`/`..` is rewritten.
fn path_segment(raw: &str) -> String {
    let segment: String = raw
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect();
    if !segment.is_empty() && segment.chars().all(|c| c == '.') {
        segment.replace('.', "_")
    } else {
        segment
    }
}

fn ensure_writable_dir(dir: &Path) -> Result<(), WriteError> {
    fs::create_dir_all(dir).map_err(|source| WriteError::DirectoryUnavailable {
        path: dir.to_path_buf(),
        source,
    })?;

    if !can_write(dir) {
        return Err(WriteError::PermissionDeniedDir { path: dir.to_path_buf() });
    }
    Ok(())
}

/// Whether the effective user may create files in `dir`, as the kernel
/// decides it.
#[cfg(unix)]
fn can_write(dir: &Path) -> bool {
    use nix::unistd::{access, AccessFlags};

    match access(dir, AccessFlags::W_OK | AccessFlags::X_OK) {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(target: crate::INTERNAL_TARGET, path = %dir.display(), error = %e, "directory not writable");
            false
        }
    }
}

#[cfg(not(unix))]
fn can_write(dir: &Path) -> bool {
    fs::metadata(dir)
        .map(|meta| meta.is_dir() && !meta.permissions().readonly())
        .unwrap_or(false)
}
