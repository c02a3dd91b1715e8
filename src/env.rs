//! Environment variable names read by [`LoggerConfig::from_env`].
//!
//! These are purely helpers; [`LoggerConfig`] itself never touches the
//! environment unless asked to.
//!
//! [`LoggerConfig`]: crate::config::LoggerConfig
//! [`LoggerConfig::from_env`]: crate::config::LoggerConfig::from_env

/// Base directory for log files.
pub const FILE_LOG_DIRECTORY_ENV: &str = "FILE_LOG_DIRECTORY";

/// Name of the archive sub-directory.
pub const FILE_LOG_ARCHIVE_ENV: &str = "FILE_LOG_ARCHIVE";

/// Rotation threshold in bytes.
pub const FILE_LOG_FILESIZE_ENV: &str = "FILE_LOG_FILESIZE";

/// Log file suffix.
pub const FILE_LOG_SUFFIX_ENV: &str = "FILE_LOG_SUFFIX";

/// Optional tag appended to the per-user directory name.
pub const FILE_LOG_POSTFIX_ENV: &str = "FILE_LOG_POSTFIX";

/// Optional debug tag used in file names.
pub const FILE_LOG_DEBUG_ENV: &str = "FILE_LOG_DEBUG";

/// Truthy value switches to one shared file for all processes.
pub const FILE_LOG_SINGLE_ENV: &str = "FILE_LOG_SINGLE";

/// Falsy value makes fallback output terse.
pub const FILE_LOG_SOS_ENV: &str = "FILE_LOG_SOS";

/// Record separator written after each line.
pub const FILE_LOG_SEPARATOR_ENV: &str = "FILE_LOG_SEPARATOR";

/// Runtime identity tag used in file names.
pub const FILE_LOG_IDENTITY_ENV: &str = "FILE_LOG_IDENTITY";

/// Identity tag used when the executable name cannot be determined.
pub const DEFAULT_IDENTITY: &str = "cli";

/// User name used when the process owner cannot be determined.
pub const UNKNOWN_USER: &str = "unknown";

/// Read an environment variable, treating blank values as unset.
pub fn env_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
}

/// Interpret loose boolean strings such as `"yes"`, `"1"` or `"on"`.
pub fn confirm(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

/// Identity of the hosting runtime: the current executable's file stem.
pub fn runtime_identity() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_IDENTITY.to_string())
}

/// Name of the effective user of the current process, looked up in the
/// user database. [`UNKNOWN_USER`] when the uid has no entry.
#[cfg(unix)]
pub fn process_user() -> String {
    use nix::unistd::{geteuid, User};

    let uid = geteuid();
    match User::from_uid(uid) {
        Ok(Some(user)) if !user.name.is_empty() => user.name,
        Ok(_) => UNKNOWN_USER.to_string(),
        Err(e) => {
            tracing::debug!(target: crate::INTERNAL_TARGET, uid = uid.as_raw(), error = %e, "user lookup failed");
            UNKNOWN_USER.to_string()
        }
    }
}

/// Name of the user owning the current process, from `USERNAME`/`USER`.
#[cfg(not(unix))]
pub fn process_user() -> String {
    env_opt("USERNAME")
        .or_else(|| env_opt("USER"))
        .unwrap_or_else(|| UNKNOWN_USER.to_string())
}
