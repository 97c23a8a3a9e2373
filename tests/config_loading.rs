//! Config Loading Tests
//!
//! TOML files on disk through `SkollConfig`, including partial files and
//! validation failures.

use skoll_track::config::{ConfigError, SkollConfig};

#[test]
fn partial_file_overrides_only_named_keys() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("skoll_config.toml");
    std::fs::write(
        &path,
        r#"
[alerts]
min_impact_probability = 40.0

[pipeline]
max_stale_forecast_hours = 2
"#,
    )
    .expect("write");

    let config = SkollConfig::load_from_file(&path).expect("load");
    assert_eq!(config.alerts.min_impact_probability, 40.0);
    assert_eq!(config.pipeline.max_stale_forecast_hours, 2);
    assert_eq!(config.forecaster, SkollConfig::default().forecaster);
    assert!(config.validate().is_ok());
}

#[test]
fn saved_config_reloads_identically() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("skoll_config.toml");
    let mut config = SkollConfig::default();
    config.forecaster.ensemble_runs = 12;
    config.dst.tau_hours = 9.5;
    config.save_to_file(&path).expect("save");

    assert_eq!(SkollConfig::load_from_file(&path).expect("reload"), config);
}

#[test]
fn invalid_values_reported_together() {
    let result = SkollConfig::from_toml_str(
        r#"
[dst]
tau_hours = 0.0

[aurora]
confidence_start = 1.5
"#,
    );

    match result {
        Err(ConfigError::Validation(errors)) => {
            assert!(errors.iter().any(|e| e.contains("dst.tau_hours")));
            assert!(errors.iter().any(|e| e.contains("aurora.confidence_start")));
        }
        other => panic!("expected validation errors, got {other:?}"),
    }
}

#[test]
fn missing_file_is_io_error() {
    let err = SkollConfig::load_from_file(std::path::Path::new("/nonexistent/skoll_config.toml"))
        .expect_err("missing file");
    assert!(matches!(err, ConfigError::Io(..)));
}
