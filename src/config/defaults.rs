//! Default configuration values
//!
//! All constants used throughout the config module are defined here.

/// Interpreter used by the process backend
pub const DEFAULT_INTERPRETER_PROGRAM: &str = "python3";

/// Interpreter arguments; `{script}` is replaced by the generated script path.
/// `-u` keeps stdout unbuffered so output streams while the script runs.
pub const DEFAULT_INTERPRETER_ARGS: &[&str] = &["-u", "{script}"];

/// Extension of the generated script file
pub const DEFAULT_SCRIPT_EXTENSION: &str = "py";

/// Placeholder substituted with the script file path
pub const SCRIPT_PLACEHOLDER: &str = "{script}";

/// Data directory (settings, snippet database, logs)
pub const DEFAULT_DATA_DIR: &str = "~/.runpad";

/// Config file location
pub const DEFAULT_CONFIG_PATH: &str = "~/.runpad/config.json";

/// How often the worker checks the cancel flag while waiting on the interpreter
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Grace period between SIGTERM and SIGKILL for cancelled runs
pub const DEFAULT_KILL_GRACE_MS: u64 = 250;

/// Clear the output buffer before each Run
pub const DEFAULT_CLEAR_OUTPUT_ON_RUN: bool = true;

/// Stderr lines retained for diagnostics
pub const DEFAULT_STDERR_MAX_LINES: usize = 500;

/// File names under the data directory
pub const SETTINGS_FILE_NAME: &str = "settings.json";
pub const SNIPPETS_DB_RELATIVE_PATH: &str = "db/snippets.sqlite";
pub const LOGS_DIR_NAME: &str = "logs";
