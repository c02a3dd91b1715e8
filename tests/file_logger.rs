use chrono::{DateTime, TimeZone, Utc};
use file_log_sink::fallback::CaptureBuffer;
use file_log_sink::{
    Context, FallbackReporter, FileLogger, LogRecord, Logger, LoggerConfig, ProcessIdentity,
};
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

fn base_config(dir: &Path) -> file_log_sink::LoggerConfigBuilder {
    LoggerConfig::builder()
        .directory(dir)
        .identity("cli")
        .separator("\n")
}

fn logger_with_capture(config: LoggerConfig, pid: u32) -> (FileLogger, CaptureBuffer) {
    let buf = CaptureBuffer::new();
    let logger = FileLogger::new(config)
        .with_process(ProcessIdentity::new(pid, "carol"))
        .with_fallback(FallbackReporter::new(true, "\n", Box::new(buf.clone())));
    (logger, buf)
}

fn files_in(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.is_file())
        .collect();
    files.sort();
    files
}

fn ts(second: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 11, 3, 22, 15, second).unwrap()
}

#[test]
fn first_log_creates_one_live_file_with_terminated_line() {
    let tmp = TempDir::new().unwrap();
    let (logger, fallback) = logger_with_capture(base_config(tmp.path()).build(), 321);

    let mut ctx = Context::new();
    ctx.insert("order".into(), json!(17));
    logger.error(json!("boom"), ctx);

    let user_dir = tmp.path().join("log-carol");
    let files = files_in(&user_dir);
    assert_eq!(files, vec![user_dir.join("ERROR.cli.carol.321.log")]);

    let content = fs::read_to_string(&files[0]).unwrap();
    assert!(content.ends_with('\n'));
    assert_eq!(content.matches('\n').count(), 1);

    let line: Value = serde_json::from_str(content.trim_end()).unwrap();
    let fields = line.as_array().unwrap();
    assert_eq!(fields.len(), 4);
    assert!(fields[0].as_str().unwrap().starts_with("UTC "));
    assert_eq!(fields[1], json!("ERROR"));
    assert_eq!(fields[2], json!("boom"));
    assert_eq!(fields[3], json!({"order": 17}));
    assert_eq!(fallback.contents(), "");
}

#[test]
fn custom_separator_is_written_verbatim() {
    let tmp = TempDir::new().unwrap();
    let (logger, _) = logger_with_capture(base_config(tmp.path()).separator("<<>>").build(), 1);

    logger.info(json!("a"), Context::new());
    logger.info(json!("b"), Context::new());

    let content = fs::read_to_string(logger.live_path("info").unwrap()).unwrap();
    let lines: Vec<_> = content.split("<<>>").collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[2], "");
}

#[test]
fn empty_level_is_logged_as_log() {
    let tmp = TempDir::new().unwrap();
    let (logger, _) = logger_with_capture(base_config(tmp.path()).build(), 5);

    logger.log("", json!("untagged"), Context::new());

    assert!(tmp.path().join("log-carol/LOG.cli.carol.5.log").is_file());
}

#[test]
fn resolution_is_stable_for_same_identity() {
    let tmp = TempDir::new().unwrap();
    let (a, _) = logger_with_capture(base_config(tmp.path()).build(), 10);
    let (b, _) = logger_with_capture(base_config(tmp.path()).build(), 10);

    assert_eq!(a.live_path("error").unwrap(), a.live_path("ERROR").unwrap());
    assert_eq!(a.live_path("error").unwrap(), b.live_path("error").unwrap());
}

#[test]
fn per_process_and_single_modes() {
    let tmp = TempDir::new().unwrap();

    let (p1, _) = logger_with_capture(base_config(tmp.path()).build(), 100);
    let (p2, _) = logger_with_capture(base_config(tmp.path()).build(), 200);
    assert_ne!(p1.live_path("error").unwrap(), p2.live_path("error").unwrap());

    let (s1, _) = logger_with_capture(base_config(tmp.path()).single(true).build(), 100);
    let (s2, _) = logger_with_capture(base_config(tmp.path()).single(true).build(), 200);
    let shared = s1.live_path("error").unwrap();
    assert_eq!(shared, s2.live_path("error").unwrap());

    s1.error(json!("from 100"), Context::new());
    s2.error(json!("from 200"), Context::new());
    let content = fs::read_to_string(&shared).unwrap();
    assert_eq!(content.lines().count(), 2);
    assert!(shared.ends_with("ERROR.cli.carol.single.log"));
}

#[test]
fn debug_tag_changes_level_segment() {
    let tmp = TempDir::new().unwrap();
    let (tagged, _) = logger_with_capture(base_config(tmp.path()).debug("sql").build(), 7);
    let (default_tag, _) = logger_with_capture(base_config(tmp.path()).debug("").build(), 7);
    let (single, _) =
        logger_with_capture(base_config(tmp.path()).debug("sql").single(true).build(), 7);

    tagged.warning(json!("slow query"), Context::new());

    let user_dir = tmp.path().join("log-carol");
    assert!(user_dir.join("WARNING-sql.cli.carol.7.log").is_file());
    assert!(default_tag
        .live_path("warning")
        .unwrap()
        .ends_with("WARNING-debug.cli.carol.7.log"));
    assert!(single
        .live_path("warning")
        .unwrap()
        .ends_with("WARNING-sql.cli.carol.single.log"));
}

#[test]
fn postfix_partitions_user_directory() {
    let tmp = TempDir::new().unwrap();
    let (logger, _) = logger_with_capture(base_config(tmp.path()).postfix("billing").build(), 3);

    logger.notice(json!("hi"), Context::new());

    assert!(tmp
        .path()
        .join("log-carol-billing/NOTICE.cli.carol.3.log")
        .is_file());
}

#[test]
fn rotation_archives_previous_content_byte_for_byte() {
    let tmp = TempDir::new().unwrap();
    let (logger, fallback) =
        logger_with_capture(base_config(tmp.path()).filesize(100).build(), 42);
    let live = logger.live_path("error").unwrap();

    let long = "x".repeat(120);
    logger.log_record(LogRecord::at(ts(1), "error", long.as_str(), Context::new()));
    let before = fs::read(&live).unwrap();
    assert!(before.len() >= 100);

    logger.log_record(LogRecord::at(ts(2), "error", "second", Context::new()));

    let archived = tmp
        .path()
        .join("log-carol/archive/2024/11/03/carol/ERROR/cli")
        .join("20241103-221502-000000.carol.ERROR.cli.42.log");
    assert_eq!(fs::read(&archived).unwrap(), before);

    let content = fs::read_to_string(&live).unwrap();
    assert_eq!(content.lines().count(), 1);
    assert!(content.contains("\"second\""));
    assert_eq!(fallback.contents(), "");
}

#[test]
fn small_records_accumulate_until_threshold() {
    let tmp = TempDir::new().unwrap();
    let (logger, _) = logger_with_capture(base_config(tmp.path()).filesize(200).build(), 8);
    let live = logger.live_path("info").unwrap();

    let mut written = 0;
    let mut second = 0;
    // Fill the live file until it reaches the threshold.
    while fs::metadata(&live).map(|m| m.len()).unwrap_or(0) < 200 {
        second += 1;
        logger.log_record(LogRecord::at(ts(second), "info", "tick", Context::new()));
        written += 1;
    }
    assert!(written > 1);
    let archive_root = tmp.path().join("log-carol/archive");
    assert!(!archive_root.exists());

    second += 1;
    logger.log_record(LogRecord::at(ts(second), "info", "tock", Context::new()));

    let archive_dir = archive_root.join("2024/11/03/carol/INFO/cli");
    let archived = files_in(&archive_dir);
    assert_eq!(archived.len(), 1);
    assert_eq!(
        fs::read_to_string(&archived[0]).unwrap().lines().count(),
        written
    );
    assert_eq!(fs::read_to_string(&live).unwrap().lines().count(), 1);
}

#[test]
fn end_to_end_two_errors_past_threshold() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("x");
    let (logger, _) = logger_with_capture(base_config(&dir).filesize(100).build(), 77);

    let boom = format!("boom {}", "!".repeat(80));
    logger.error(Value::String(boom.clone()), Context::new());
    logger.error(json!("boom"), Context::new());

    let user_dir = dir.join("log-carol");
    let live = files_in(&user_dir);
    assert_eq!(live.len(), 1);
    let content = fs::read_to_string(&live[0]).unwrap();
    assert_eq!(content.lines().count(), 1);
    let line: Value = serde_json::from_str(content.trim_end()).unwrap();
    assert_eq!(line[2], json!("boom"));

    let mut archived = Vec::new();
    let mut stack = vec![user_dir.join("archive")];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                stack.push(path);
            } else {
                archived.push(path);
            }
        }
    }
    assert_eq!(archived.len(), 1);
    assert!(fs::read_to_string(&archived[0]).unwrap().contains(&boom));
}

#[test]
fn missing_directory_falls_back_without_io() {
    let (logger, fallback) = logger_with_capture(LoggerConfig::builder().build(), 1);

    logger.critical(json!("no disk"), Context::new());

    let out = fallback.contents();
    assert!(out.contains("FILE_LOG_SOS:DIRECTORY_MISSING"));
    assert!(out.contains("no disk"));
}

#[test]
fn unusable_directory_falls_back() {
    let tmp = TempDir::new().unwrap();
    let blocker = tmp.path().join("plain-file");
    fs::write(&blocker, b"").unwrap();
    let (logger, fallback) = logger_with_capture(base_config(&blocker).build(), 1);

    logger.error(json!("boom"), Context::new());

    assert!(fallback.contents().contains("FILE_LOG_SOS:DIRECTORY_UNAVAILABLE"));
}

#[cfg(unix)]
#[test]
fn read_only_user_dir_goes_by_effective_access() {
    use nix::unistd::geteuid;
    use std::os::unix::fs::PermissionsExt;

    let tmp = TempDir::new().unwrap();
    let (logger, fallback) = logger_with_capture(base_config(tmp.path()).build(), 12);
    let user_dir = tmp.path().join("log-carol");
    fs::create_dir_all(&user_dir).unwrap();
    fs::set_permissions(&user_dir, fs::Permissions::from_mode(0o555)).unwrap();

    logger.error(json!("boom"), Context::new());
    fs::set_permissions(&user_dir, fs::Permissions::from_mode(0o755)).unwrap();

    let live = user_dir.join("ERROR.cli.carol.12.log");
    if geteuid().is_root() {
        assert!(fs::read_to_string(&live).unwrap().contains("\"boom\""));
        assert_eq!(fallback.contents(), "");
    } else {
        assert!(!live.exists());
        let parsed: Value = serde_json::from_str(fallback.contents().trim_end()).unwrap();
        assert_eq!(parsed["FILE_LOG_SOS:PERMISSION_DENIED_DIR"][2], json!("boom"));
    }
}

#[test]
fn unwritable_live_file_falls_back_with_record() {
    let tmp = TempDir::new().unwrap();
    let (logger, fallback) = logger_with_capture(base_config(tmp.path()).build(), 9);
    fs::create_dir_all(logger.live_path("error").unwrap()).unwrap();

    logger.error(json!("lost?"), Context::new());

    let out = fallback.contents();
    let parsed: Value = serde_json::from_str(out.trim_end()).unwrap();
    assert_eq!(parsed["FILE_LOG_SOS:PERMISSION_DENIED_FILE"][2], json!("lost?"));
}

#[test]
fn terse_fallback_prints_only_the_tag() {
    let buf = CaptureBuffer::new();
    let logger = FileLogger::new(LoggerConfig::builder().sos_verbose(false).build())
        .with_fallback(FallbackReporter::new(false, "\n", Box::new(buf.clone())));

    logger.info(json!("dropped"), Context::new());

    assert_eq!(buf.contents(), "FILE_LOG_SOS:DIRECTORY_MISSING\n");
}

#[test]
fn concurrent_writers_keep_lines_whole() {
    let tmp = TempDir::new().unwrap();
    let (logger, _) = logger_with_capture(base_config(tmp.path()).build(), 55);
    let logger = Arc::new(logger);

    let threads: Vec<_> = (0..8)
        .map(|t| {
            let logger = Arc::clone(&logger);
            std::thread::spawn(move || {
                for i in 0..50 {
                    logger.info(json!(format!("thread {t} line {i}")), Context::new());
                }
            })
        })
        .collect();
    for t in threads {
        t.join().unwrap();
    }

    let content = fs::read_to_string(logger.live_path("info").unwrap()).unwrap();
    let lines: Vec<_> = content.lines().collect();
    assert_eq!(lines.len(), 400);
    for line in lines {
        let parsed: Value = serde_json::from_str(line).unwrap();
        assert_eq!(parsed[1], json!("INFO"));
    }
}
