// The `log` backend and the default logger are process-wide, so everything
// touching them lives in this one test.

use cascade_logger::{default_logger, init_default, install_log_facade, shutdown_default, LogError, LoggerConfig};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_log_facade_and_default_logger() {
    let tmp = TempDir::new().unwrap();
    let config = LoggerConfig::default()
        .with_directory(tmp.path())
        .with_name("facade")
        .with_debug(true);

    assert!(default_logger().is_none());
    let logger = init_default(config.clone()).unwrap();
    assert!(matches!(init_default(config), Err(LogError::AlreadyInitialized)));
    assert!(default_logger().is_some());

    install_log_facade(logger.clone()).unwrap();
    assert!(
        matches!(install_log_facade(logger.clone()), Err(LogError::AlreadyInitialized)),
        "Only one log backend per process"
    );
    assert_eq!(log::max_level(), log::LevelFilter::Trace);

    log::trace!("trace becomes debug");
    log::info!("answer is {}", 42);
    shutdown_default();
    assert!(default_logger().is_none());
    assert!(logger.is_closed());

    // Read every DEBUG file in case the wall clock crossed an hour.
    let mut debug = String::new();
    for entry in fs::read_dir(tmp.path()).unwrap() {
        let path = entry.unwrap().path();
        if path.to_string_lossy().ends_with(".dbg.log") {
            debug.push_str(&fs::read_to_string(&path).unwrap());
        }
    }
    let lines: Vec<&str> = debug.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with("[D]:trace becomes debug"));
    assert!(lines[1].ends_with("[I]:answer is 42"));
}
