//! Configuration module - application settings
//!
//! - `defaults` - default constant values
//! - `types` - configuration structs
//! - `loader` - file system loading and parsing

mod defaults;
mod loader;
mod types;

pub use defaults::{
    DEFAULT_CLEAR_OUTPUT_ON_RUN, DEFAULT_CONFIG_PATH, DEFAULT_INTERPRETER_PROGRAM, DEFAULT_KILL_GRACE_MS,
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_STDERR_MAX_LINES,
};
pub use loader::{load_config, load_config_from};
pub use types::{Config, InterpreterConfig};

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
