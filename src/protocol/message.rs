//! Event and directive types exchanged between the worker and the UI context

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one accepted run. Monotonic per controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RunId(pub u64);

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run#{}", self.0)
    }
}

/// How a run terminated. Carried by `EndRun`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RunOutcome {
    /// The script ran to the end
    Completed,
    /// The cancel flag was observed at a checkpoint
    Cancelled,
    /// The script or the backend failed; the message was already rendered as output
    Failed { message: String },
}

impl RunOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunOutcome::Completed => "completed",
            RunOutcome::Cancelled => "cancelled",
            RunOutcome::Failed { .. } => "failed",
        }
    }
}

/// Messages streamed from the worker thread to the UI context.
///
/// Per run: exactly one `StartRun`, then any number of `Output` and
/// buffer-replacement events, then exactly one `EndRun`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerEvent {
    StartRun { run_id: RunId },
    /// A fragment of script output, appended verbatim
    Output { run_id: RunId, text: String },
    SetCode { run_id: RunId, text: String },
    SetInput { run_id: RunId, text: String },
    SetOutput { run_id: RunId, text: String },
    SetSearchPattern { run_id: RunId, pattern: String },
    EndRun { run_id: RunId, outcome: RunOutcome },
}

impl WorkerEvent {
    pub fn run_id(&self) -> RunId {
        match self {
            WorkerEvent::StartRun { run_id }
            | WorkerEvent::Output { run_id, .. }
            | WorkerEvent::SetCode { run_id, .. }
            | WorkerEvent::SetInput { run_id, .. }
            | WorkerEvent::SetOutput { run_id, .. }
            | WorkerEvent::SetSearchPattern { run_id, .. }
            | WorkerEvent::EndRun { run_id, .. } => *run_id,
        }
    }

    /// Short type name for logging without dumping payloads
    pub fn kind(&self) -> &'static str {
        match self {
            WorkerEvent::StartRun { .. } => "startRun",
            WorkerEvent::Output { .. } => "output",
            WorkerEvent::SetCode { .. } => "setCode",
            WorkerEvent::SetInput { .. } => "setInput",
            WorkerEvent::SetOutput { .. } => "setOutput",
            WorkerEvent::SetSearchPattern { .. } => "setSearchPattern",
            WorkerEvent::EndRun { .. } => "endRun",
        }
    }
}

/// Buffer-replacement directive written by a script (through the bootstrap helpers).
///
/// Wire form is a single stdout line: the control prefix followed by JSON, e.g.
/// `@@runpad {"type":"setCode","text":"print(1)"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ControlDirective {
    SetCode { text: String },
    SetInput { text: String },
    SetOutput { text: String },
    SetSearchPattern { pattern: String },
}

impl ControlDirective {
    /// Attach the directive to a run
    pub fn into_event(self, run_id: RunId) -> WorkerEvent {
        match self {
            ControlDirective::SetCode { text } => WorkerEvent::SetCode { run_id, text },
            ControlDirective::SetInput { text } => WorkerEvent::SetInput { run_id, text },
            ControlDirective::SetOutput { text } => WorkerEvent::SetOutput { run_id, text },
            ControlDirective::SetSearchPattern { pattern } => {
                WorkerEvent::SetSearchPattern { run_id, pattern }
            }
        }
    }
}
