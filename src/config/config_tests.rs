use super::*;
use std::time::Duration;

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.interpreter.program, DEFAULT_INTERPRETER_PROGRAM);
    assert_eq!(config.interpreter.args, vec!["-u", "{script}"]);
    assert_eq!(config.bootstrap_path, None);
    assert_eq!(config.poll_interval(), Duration::from_millis(DEFAULT_POLL_INTERVAL_MS));
    assert_eq!(config.kill_grace(), Duration::from_millis(DEFAULT_KILL_GRACE_MS));
    assert_eq!(config.clear_output_on_run(), DEFAULT_CLEAR_OUTPUT_ON_RUN);
    assert_eq!(config.stderr_max_lines(), DEFAULT_STDERR_MAX_LINES);
}

#[test]
fn test_partial_config_fills_defaults() {
    let json = r#"{"pollIntervalMs": 10, "interpreter": {"program": "sh"}}"#;
    let config: Config = serde_json::from_str(json).unwrap();
    assert_eq!(config.poll_interval(), Duration::from_millis(10));
    assert_eq!(config.interpreter.program, "sh");
    // args fall back to the default list
    assert_eq!(config.interpreter.args, vec!["-u", "{script}"]);
}

#[test]
fn test_zero_poll_interval_is_clamped() {
    let config = Config {
        poll_interval_ms: Some(0),
        ..Default::default()
    };
    assert_eq!(config.poll_interval(), Duration::from_millis(1));
}

#[test]
fn test_args_for_substitutes_placeholder() {
    let interp = InterpreterConfig {
        program: "python3".into(),
        args: vec!["-u".into(), "{script}".into()],
        script_extension: "py".into(),
    };
    assert_eq!(interp.args_for("/tmp/a.py"), vec!["-u", "/tmp/a.py"]);
}

#[test]
fn test_args_for_appends_when_no_placeholder() {
    let interp = InterpreterConfig {
        program: "sh".into(),
        args: vec!["-e".into()],
        script_extension: "sh".into(),
    };
    assert_eq!(interp.args_for("/tmp/a.sh"), vec!["-e", "/tmp/a.sh"]);
}

#[test]
fn test_derived_paths_live_under_data_dir() {
    let config = Config {
        data_dir: Some("/tmp/runpad-test".into()),
        ..Default::default()
    };
    assert_eq!(config.settings_path(), std::path::PathBuf::from("/tmp/runpad-test/settings.json"));
    assert_eq!(
        config.snippets_db_path(),
        std::path::PathBuf::from("/tmp/runpad-test/db/snippets.sqlite")
    );
    assert_eq!(config.log_dir(), std::path::PathBuf::from("/tmp/runpad-test/logs"));
}

#[test]
fn test_load_config_from_missing_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_config_from(&dir.path().join("nope.json"));
    assert_eq!(config.interpreter, InterpreterConfig::default());
}

#[test]
fn test_load_config_from_invalid_json_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{"pollIntervalMs": "fast"}"#).unwrap();
    let config = load_config_from(&path);
    assert_eq!(config.poll_interval_ms, None);
}

#[test]
fn test_load_config_from_valid_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{"clearOutputOnRun": false, "bootstrapPath": "/opt/boot.py", "killGraceMs": 5}"#,
    )
    .unwrap();
    let config = load_config_from(&path);
    assert!(!config.clear_output_on_run());
    assert_eq!(config.bootstrap_path(), Some(std::path::PathBuf::from("/opt/boot.py")));
    assert_eq!(config.kill_grace(), Duration::from_millis(5));
}
