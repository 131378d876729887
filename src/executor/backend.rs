//! The seam between the worker and whatever actually interprets scripts

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, trace};

use crate::error::RunpadError;
use crate::protocol::{ControlDirective, RunId, WorkerEvent};

/// One script execution request. Immutable once submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    /// Runs first, in the same interpreter context as the user source
    pub bootstrap_source: String,
    pub user_source: String,
    /// Fed to the script's standard input
    pub input: String,
}

impl RunRequest {
    pub fn new(
        bootstrap_source: impl Into<String>,
        user_source: impl Into<String>,
        input: impl Into<String>,
    ) -> Self {
        Self {
            bootstrap_source: bootstrap_source.into(),
            user_source: user_source.into(),
            input: input.into(),
        }
    }

    /// Bootstrap followed by user source, as one program text
    pub fn combined_source(&self) -> String {
        if self.bootstrap_source.is_empty() {
            return self.user_source.clone();
        }
        let mut source =
            String::with_capacity(self.bootstrap_source.len() + self.user_source.len() + 1);
        source.push_str(&self.bootstrap_source);
        if !self.bootstrap_source.ends_with('\n') {
            source.push('\n');
        }
        source.push_str(&self.user_source);
        source
    }
}

/// Cooperative cancellation flag shared by the UI context (writer) and the
/// worker (reader). The only state mutated from both sides.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Returns true if this call raised the flag.
    pub fn cancel(&self) -> bool {
        !self.0.swap(true, Ordering::AcqRel)
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Lower the flag before a new run starts
    pub fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// How a backend finished when it did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecStatus {
    Completed,
    Cancelled,
}

/// Failures a backend reports. The worker renders these into the output
/// stream; they never escape the worker thread.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The script itself failed (non-zero exit, unhandled exception)
    #[error("{0}")]
    Runtime(String),
    /// The interpreter could not be started
    #[error("failed to start interpreter: {0}")]
    Spawn(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ScriptError> for RunpadError {
    fn from(err: ScriptError) -> Self {
        match err {
            ScriptError::Runtime(message) => RunpadError::ScriptRuntime(message),
            ScriptError::Spawn(message) => RunpadError::ProcessSpawn(message),
            ScriptError::Io(source) => RunpadError::Io {
                path: "script file".to_string(),
                source,
            },
        }
    }
}

/// Executes scripts on the worker thread.
///
/// Implementations must call [`ExecContext::checkpoint`] at safe points and
/// stop as soon as it returns true. Cancellation latency is bounded only by
/// how often the backend reaches a checkpoint: a backend that runs native
/// work without checkpoints cannot be interrupted.
pub trait ScriptBackend: Send {
    /// Short name for logging
    fn name(&self) -> &str;

    /// Run bootstrap then user source in one fresh interpreter context,
    /// streaming output through `ctx`.
    fn execute(
        &mut self,
        request: &RunRequest,
        ctx: &mut ExecContext<'_>,
    ) -> Result<ExecStatus, ScriptError>;
}

/// Per-run handle a backend uses to stream events and poll for cancellation
pub struct ExecContext<'a> {
    run_id: RunId,
    cancel: &'a CancelToken,
    events: &'a async_channel::Sender<WorkerEvent>,
    at_line_start: bool,
    cancel_seen: bool,
}

impl<'a> ExecContext<'a> {
    pub fn new(
        run_id: RunId,
        cancel: &'a CancelToken,
        events: &'a async_channel::Sender<WorkerEvent>,
    ) -> Self {
        Self {
            run_id,
            cancel,
            events,
            at_line_start: true,
            cancel_seen: false,
        }
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Cancellation checkpoint. Returns true once cancel has been requested.
    pub fn checkpoint(&mut self) -> bool {
        let cancelled = self.cancel.is_cancelled();
        if cancelled && !self.cancel_seen {
            self.cancel_seen = true;
            debug!(run_id = %self.run_id, "Cancel observed at checkpoint");
        }
        cancelled
    }

    /// Append a fragment of output. Empty fragments are dropped.
    pub fn output(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text.is_empty() {
            return;
        }
        self.at_line_start = text.ends_with('\n');
        self.send(WorkerEvent::Output {
            run_id: self.run_id,
            text,
        });
    }

    /// Forward a buffer-replacement directive
    pub fn directive(&mut self, directive: ControlDirective) {
        self.send(directive.into_event(self.run_id));
    }

    /// Render a diagnostic line into the output, starting on a fresh line
    pub fn render_line(&mut self, message: &str) {
        let mut text = String::with_capacity(message.len() + 2);
        if !self.at_line_start {
            text.push('\n');
        }
        text.push_str(message);
        text.push('\n');
        self.output(text);
    }

    fn send(&self, event: WorkerEvent) {
        trace!(run_id = %self.run_id, kind = event.kind(), "Worker event");
        if self.events.send_blocking(event).is_err() {
            // UI side is gone (shutdown); nothing left to deliver to
            debug!(run_id = %self.run_id, "Event receiver closed, dropping event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combined_source_inserts_separator() {
        let req = RunRequest::new("import sys", "print(1)", "");
        assert_eq!(req.combined_source(), "import sys\nprint(1)");
        let req = RunRequest::new("import sys\n", "print(1)", "");
        assert_eq!(req.combined_source(), "import sys\nprint(1)");
        let req = RunRequest::new("", "print(1)", "");
        assert_eq!(req.combined_source(), "print(1)");
    }

    #[test]
    fn test_cancel_token_reports_first_raise_only() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        assert!(token.cancel());
        assert!(!token.cancel());
        assert!(token.is_cancelled());
        token.reset();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn test_cancel_token_is_shared_between_clones() {
        let token = CancelToken::new();
        let worker_side = token.clone();
        token.cancel();
        assert!(worker_side.is_cancelled());
    }

    #[test]
    fn test_render_line_starts_on_fresh_line() {
        let (tx, rx) = async_channel::unbounded();
        let token = CancelToken::new();
        let mut ctx = ExecContext::new(RunId(1), &token, &tx);
        ctx.output("partial");
        ctx.render_line("[error] boom");
        ctx.output("");

        let texts: Vec<String> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|e| match e {
                WorkerEvent::Output { text, .. } => text,
                other => panic!("unexpected event {:?}", other),
            })
            .collect();
        assert_eq!(texts, vec!["partial", "\n[error] boom\n"]);
    }

    #[test]
    fn test_directive_becomes_event() {
        let (tx, rx) = async_channel::unbounded();
        let token = CancelToken::new();
        let mut ctx = ExecContext::new(RunId(4), &token, &tx);
        ctx.directive(ControlDirective::SetInput { text: "7".into() });
        assert_eq!(
            rx.try_recv().unwrap(),
            WorkerEvent::SetInput {
                run_id: RunId(4),
                text: "7".into()
            }
        );
    }

    #[test]
    fn test_script_errors_map_to_domain_errors() {
        use crate::error::ErrorSeverity;

        let err = RunpadError::from(ScriptError::Runtime("NameError: x".into()));
        assert!(matches!(err, RunpadError::ScriptRuntime(ref m) if m == "NameError: x"));
        assert_eq!(err.severity(), ErrorSeverity::Info);

        let err = RunpadError::from(ScriptError::Spawn("'nope': not found".into()));
        assert!(matches!(err, RunpadError::ProcessSpawn(_)));
        assert_eq!(err.severity(), ErrorSeverity::Error);

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = RunpadError::from(ScriptError::Io(io));
        assert!(matches!(err, RunpadError::Io { ref path, .. } if path == "script file"));
    }
}
