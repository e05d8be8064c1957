//! Installs the global subscriber, so this file holds a single test.

use ioprof_core::logging::{LogRotation, LoggingError};
use ioprof_core::{LoggerConfig, ProfilingConfig};
use tempfile::TempDir;

#[test]
fn logging_section_installs_subscriber() {
    let dir = TempDir::new().unwrap();
    let log_dir = dir.path().join("logs");

    let config: ProfilingConfig = toml::from_str(&format!(
        r#"
        enabled = true

        [logging]
        log_dir = {:?}
        log_file_prefix = "calls"
        log_level = "debug"
        rotation = "Never"
        "#,
        log_dir.to_string_lossy()
    ))
    .unwrap();
    assert_eq!(
        config.logging,
        LoggerConfig {
            log_dir: log_dir.clone(),
            log_file_prefix: "calls".into(),
            log_level: "debug".into(),
            rotation: LogRotation::Never,
            ..LoggerConfig::default()
        }
    );

    let guard = config.init_logging().unwrap();
    tracing::info!("profiling logs installed");
    assert!(log_dir.is_dir());

    let err = config.init_logging().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LoggingError>(),
        Some(LoggingError::AlreadyInitialized)
    ));

    drop(guard);
}
