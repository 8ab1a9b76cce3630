mod common;

use common::{error_files, primary_files, read_all};
use sluice_logger::LoggerExt;
use sluice_logger_file::{ConsoleTarget, FileLogger, FileLoggerConfig};
use std::env;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

const CHILD_DIR_VAR: &str = "SLUICE_FATAL_CHILD_DIR";

/// Runs inside the re-executed test binary
fn fatal_child(dir: &Path) {
    let config = FileLoggerConfig::builder()
        .log_path(dir)
        .queue_capacity(64)
        .console(ConsoleTarget::Stdout)
        .build()
        .unwrap();
    let logger = FileLogger::new(config).unwrap();

    logger.info("before");
    logger.fatal("x");

    // only reached if fatal returned
    std::process::exit(42);
}

#[test]
fn fatal_exits_with_status_one_after_writing() {
    if let Ok(dir) = env::var(CHILD_DIR_VAR) {
        fatal_child(Path::new(&dir));
        return;
    }

    let dir = TempDir::new().unwrap();
    let output = Command::new(env::current_exe().unwrap())
        .args([
            "--exact",
            "fatal_exits_with_status_one_after_writing",
            "--nocapture",
            "--test-threads=1",
        ])
        .env(CHILD_DIR_VAR, dir.path())
        .output()
        .unwrap();

    assert_eq!(
        output.status.code(),
        Some(1),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("][FATAL]["), "{stdout}");
    assert!(stdout.contains("]: x\n"), "{stdout}");

    let errors = read_all(&error_files(dir.path()));
    assert!(errors.ends_with("]: x\n"), "{errors}");

    let primary = read_all(&primary_files(dir.path()));
    assert!(primary.contains("]: before\n"));
    assert!(primary.ends_with("]: x\n"));
}
