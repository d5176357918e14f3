//! Logging to a file through the configured subscriber

use super::test_utils::{reply, scheduler, with_env};
use quilt::logging::{init_logging, LoggingConfig};
use quilt::ConfigError;
use tempfile::TempDir;

// The only test in this binary that installs a global subscriber.
#[test]
fn test_file_logging_records_sessions() {
    let temp_dir = TempDir::new().unwrap();
    let log_file = temp_dir.path().join("logs").join("quilt.log");
    let config = LoggingConfig {
        level: "debug".to_string(),
        output: "file".to_string(),
        file: log_file.clone(),
        ..LoggingConfig::default()
    };

    with_env(
        &[
            ("QUILT_LOG", None),
            ("QUILT_LOG_FORMAT", None),
            ("QUILT_LOG_OUTPUT", None),
            ("QUILT_LOG_MODULES", None),
        ],
        || init_logging(Some(&config)),
    )
    .unwrap();
    assert!(matches!(
        init_logging(Some(&config)),
        Err(ConfigError::Logging(_))
    ));

    let mut scheduler = scheduler();
    let mut session = scheduler.open_session("Root?").unwrap();
    session.act(reply("42")).unwrap();
    drop(session);

    let contents = std::fs::read_to_string(&log_file).unwrap();
    assert!(contents.contains("Opened session"));
    assert!(contents.contains("Root question answered"));
}
