//! Script execution module
//!
//! This module handles everything that happens off the UI context:
//! - `backend`: the `ScriptBackend` seam, run requests and cancellation
//! - `worker`: the dedicated worker thread and its command/event channels
//! - `process`: the default backend driving an external interpreter
//! - `stderr_buffer`: bounded capture of interpreter diagnostics

mod backend;
mod process;
mod stderr_buffer;
mod worker;

pub use backend::{
    CancelToken, ExecContext, ExecStatus, RunRequest, ScriptBackend, ScriptError,
};
pub use process::{find_executable, ProcessBackend};
pub use stderr_buffer::{spawn_stderr_reader, StderrBuffer};
pub use worker::{ScriptWorker, WorkerCommand, WorkerHandle};

/// Bootstrap shipped with the binary, used when no bootstrap file is configured
pub const DEFAULT_BOOTSTRAP: &str = include_str!("../../scripts/bootstrap.py");

#[cfg(test)]
#[path = "../executor_tests.rs"]
mod tests;
