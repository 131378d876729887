//! Configuration type definitions

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::defaults::*;

// ============================================
// INTERPRETER
// ============================================

/// Interpreter command used by the process backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterpreterConfig {
    /// Program to launch (looked up on PATH)
    #[serde(default = "default_interpreter_program")]
    pub program: String,
    /// Arguments; `{script}` is replaced by the generated script path.
    /// When no argument contains the placeholder, the path is appended.
    #[serde(default = "default_interpreter_args")]
    pub args: Vec<String>,
    /// Extension given to the generated script file
    #[serde(default = "default_script_extension")]
    pub script_extension: String,
}

fn default_interpreter_program() -> String {
    DEFAULT_INTERPRETER_PROGRAM.to_string()
}

fn default_interpreter_args() -> Vec<String> {
    DEFAULT_INTERPRETER_ARGS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_script_extension() -> String {
    DEFAULT_SCRIPT_EXTENSION.to_string()
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        InterpreterConfig {
            program: default_interpreter_program(),
            args: default_interpreter_args(),
            script_extension: default_script_extension(),
        }
    }
}

impl InterpreterConfig {
    /// Build the argument list for a concrete script path
    pub fn args_for(&self, script_path: &str) -> Vec<String> {
        let mut substituted = false;
        let mut args: Vec<String> = self
            .args
            .iter()
            .map(|arg| {
                if arg.contains(SCRIPT_PLACEHOLDER) {
                    substituted = true;
                    arg.replace(SCRIPT_PLACEHOLDER, script_path)
                } else {
                    arg.clone()
                }
            })
            .collect();
        if !substituted {
            args.push(script_path.to_string());
        }
        args
    }
}

// ============================================
// MAIN CONFIG
// ============================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub interpreter: InterpreterConfig,
    /// Bootstrap script run before user code; the embedded one is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bootstrap_path: Option<String>,
    /// Directory for settings, snippet database and logs (default: ~/.runpad)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_interval_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kill_grace_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clear_output_on_run: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stderr_max_lines: Option<usize>,
}

impl Config {
    /// Data directory with `~` expanded
    pub fn data_dir(&self) -> PathBuf {
        let raw = self.data_dir.as_deref().unwrap_or(DEFAULT_DATA_DIR);
        PathBuf::from(shellexpand::tilde(raw).as_ref())
    }

    pub fn settings_path(&self) -> PathBuf {
        self.data_dir().join(SETTINGS_FILE_NAME)
    }

    pub fn snippets_db_path(&self) -> PathBuf {
        self.data_dir().join(SNIPPETS_DB_RELATIVE_PATH)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir().join(LOGS_DIR_NAME)
    }

    /// Bootstrap path with `~` expanded, if configured
    pub fn bootstrap_path(&self) -> Option<PathBuf> {
        self.bootstrap_path
            .as_deref()
            .map(|p| PathBuf::from(shellexpand::tilde(p).as_ref()))
    }

    pub fn poll_interval(&self) -> Duration {
        // Zero would turn the worker's wait loop into a spin
        Duration::from_millis(
            self.poll_interval_ms
                .unwrap_or(DEFAULT_POLL_INTERVAL_MS)
                .max(1),
        )
    }

    pub fn kill_grace(&self) -> Duration {
        Duration::from_millis(self.kill_grace_ms.unwrap_or(DEFAULT_KILL_GRACE_MS))
    }

    pub fn clear_output_on_run(&self) -> bool {
        self.clear_output_on_run
            .unwrap_or(DEFAULT_CLEAR_OUTPUT_ON_RUN)
    }

    pub fn stderr_max_lines(&self) -> usize {
        self.stderr_max_lines.unwrap_or(DEFAULT_STDERR_MAX_LINES)
    }
}
