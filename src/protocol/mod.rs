//! Worker ↔ UI message contract
//!
//! Events flow from the worker thread to the UI context as typed
//! [`WorkerEvent`] values. Scripts rewrite editor buffers by printing control
//! lines (`@@runpad {json}`) which the process backend turns into
//! [`ControlDirective`]s.
//!
//! # Module Structure
//!
//! - `message`: `RunId`, `RunOutcome`, `WorkerEvent`, `ControlDirective`
//! - `io`: control-line parsing and the streaming `OutputAssembler`

mod io;
mod message;

pub use io::*;
pub use message::*;
