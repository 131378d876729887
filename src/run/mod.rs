//! Run lifecycle: one script execution at a time
//!
//! - `session`: the per-run record (`RunSession`) and its state
//! - `controller`: `RunController`, which accepts requests, owns the cancel
//!   flag and the worker handle, and tracks which controls are enabled

mod controller;
mod session;

pub use controller::{Controls, RunController};
pub use session::{MarkingContext, RunSession, RunState};
