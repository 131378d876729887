//! Run controller
//!
//! Guarantees at most one run in flight. `submit` marks the session Running
//! before the request leaves the UI context, so a second submit is rejected
//! even if the worker has not started the first one yet. Controls are
//! re-enabled only when the matching `EndRun` is processed.

use tracing::{debug, error, info, instrument, warn};

use super::session::{MarkingContext, RunSession};
use crate::error::{Result, RunpadError};
use crate::executor::{CancelToken, RunRequest, ScriptBackend, ScriptWorker, WorkerHandle};
use crate::logging;
use crate::protocol::{RunId, WorkerEvent};

/// Enable state of the run-related controls, rendered by the view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    /// Run, run-snippet, mark and the tutorial panel
    pub run_enabled: bool,
    /// Stop
    pub cancel_enabled: bool,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            run_enabled: true,
            cancel_enabled: false,
        }
    }
}

pub struct RunController {
    worker: WorkerHandle,
    events: async_channel::Receiver<WorkerEvent>,
    cancel: CancelToken,
    session: RunSession,
    controls: Controls,
    next_run_id: u64,
    shut_down: bool,
}

impl RunController {
    pub fn new(worker: WorkerHandle, events: async_channel::Receiver<WorkerEvent>) -> Self {
        Self {
            worker,
            events,
            cancel: CancelToken::new(),
            session: RunSession::default(),
            controls: Controls::default(),
            next_run_id: 1,
            shut_down: false,
        }
    }

    /// Start a worker thread for `backend` and wrap it
    pub fn spawn(backend: Box<dyn ScriptBackend>) -> Result<Self> {
        let (worker, events) = ScriptWorker::spawn(backend)?;
        Ok(Self::new(worker, events))
    }

    pub fn session(&self) -> &RunSession {
        &self.session
    }

    pub fn is_running(&self) -> bool {
        self.session.is_running()
    }

    pub fn controls(&self) -> Controls {
        self.controls
    }

    /// Whether cancel has been requested for the current run
    pub fn cancel_requested(&self) -> bool {
        self.session.is_running() && self.cancel.is_cancelled()
    }

    /// Accept a run request. Fails with `InvalidState` while a run is active.
    #[instrument(skip_all, fields(marking = ?marking))]
    pub fn submit(
        &mut self,
        request: RunRequest,
        marking: Option<MarkingContext>,
    ) -> Result<RunId> {
        if self.shut_down {
            return Err(RunpadError::InvalidState(
                "run controller has been shut down".to_string(),
            ));
        }
        if !self.worker.is_running() {
            error!("Script worker thread is gone");
            return Err(RunpadError::InvalidState(
                "script worker is not running".to_string(),
            ));
        }
        if let Some(active) = self.session.run_id().filter(|_| self.session.is_running()) {
            warn!(active = %active, "Run requested while another is active");
            return Err(RunpadError::InvalidState(format!(
                "{} is still running",
                active
            )));
        }

        let run_id = RunId(self.next_run_id);
        self.cancel.reset();
        self.worker.dispatch(run_id, request, self.cancel.clone())?;
        self.next_run_id += 1;
        self.session.begin(run_id, marking);

        info!(run_id = %run_id, "Run submitted");
        logging::log("RUN", &format!("Submitted {}", run_id));
        Ok(run_id)
    }

    /// Request cancellation of the active run. Returns false when idle.
    pub fn cancel(&mut self) -> bool {
        if !self.session.is_running() {
            debug!("Cancel requested while idle, ignoring");
            return false;
        }
        if self.cancel.cancel() {
            info!(run_id = ?self.session.run_id(), "Cancel requested");
            logging::log("RUN", "Cancel requested");
        }
        true
    }

    /// Next worker event, if one is waiting. Never blocks.
    pub fn try_next_event(&self) -> Option<WorkerEvent> {
        self.events.try_recv().ok()
    }

    /// Worker reported the start of `run_id`. Returns false for stale events.
    pub fn on_start_run(&mut self, run_id: RunId) -> bool {
        if !self.session.owns(run_id) {
            debug!(run_id = %run_id, "Ignoring StartRun for inactive run");
            return false;
        }
        self.controls = Controls {
            run_enabled: false,
            cancel_enabled: true,
        };
        true
    }

    /// Worker reported the end of `run_id`.
    ///
    /// If the run carried a marking context, `grade` is called exactly once
    /// with the question index. Returns false for stale events.
    pub fn on_end_run(&mut self, run_id: RunId, grade: impl FnOnce(usize)) -> bool {
        if !self.session.owns(run_id) {
            debug!(run_id = %run_id, "Ignoring EndRun for inactive run");
            return false;
        }
        let (marking, elapsed_ms) = self.session.finish();
        if let Some(ctx) = marking {
            grade(ctx.question_index);
        }
        self.controls = Controls::default();
        info!(run_id = %run_id, duration_ms = elapsed_ms, "Run finished");
        true
    }

    /// Raise cancel, stop the worker and join it. Idempotent.
    #[instrument(skip_all)]
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        if self.session.is_running() {
            self.cancel.cancel();
        }
        self.worker.shutdown();
        self.controls = Controls {
            run_enabled: false,
            cancel_enabled: false,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{ExecContext, ExecStatus, ScriptError};
    use std::time::{Duration, Instant};

    /// Waits on checkpoints until the input says "done" or cancel is raised
    struct GateBackend;

    impl ScriptBackend for GateBackend {
        fn name(&self) -> &str {
            "gate"
        }

        fn execute(
            &mut self,
            request: &RunRequest,
            ctx: &mut ExecContext<'_>,
        ) -> std::result::Result<ExecStatus, ScriptError> {
            ctx.output(request.user_source.clone());
            if request.input == "done" {
                return Ok(ExecStatus::Completed);
            }
            while !ctx.checkpoint() {
                std::thread::sleep(Duration::from_millis(2));
            }
            Ok(ExecStatus::Cancelled)
        }
    }

    fn next_event(controller: &RunController) -> WorkerEvent {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(event) = controller.try_next_event() {
                return event;
            }
            assert!(Instant::now() < deadline, "no worker event");
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    /// Feed events to the controller until the run ends; returns graded indexes
    fn drive_to_end(controller: &mut RunController) -> Vec<usize> {
        let mut graded = Vec::new();
        loop {
            match next_event(controller) {
                WorkerEvent::StartRun { run_id } => {
                    controller.on_start_run(run_id);
                }
                WorkerEvent::EndRun { run_id, .. } => {
                    controller.on_end_run(run_id, |i| graded.push(i));
                    return graded;
                }
                _ => {}
            }
        }
    }

    #[test]
    fn test_second_submit_is_rejected_while_running() {
        let mut controller = RunController::spawn(Box::new(GateBackend)).unwrap();
        let first = controller
            .submit(RunRequest::new("", "one", "wait"), None)
            .unwrap();

        let err = controller
            .submit(RunRequest::new("", "two", "done"), None)
            .unwrap_err();
        assert!(matches!(err, RunpadError::InvalidState(_)));
        assert_eq!(controller.session().run_id(), Some(first));
        assert!(controller.is_running());

        controller.cancel();
        drive_to_end(&mut controller);
        assert!(!controller.is_running());
        controller.shutdown();
    }

    #[test]
    fn test_submit_fails_once_worker_thread_is_gone() {
        let (mut worker, events) = ScriptWorker::spawn(Box::new(GateBackend)).unwrap();
        worker.shutdown();
        let mut controller = RunController::new(worker, events);

        let err = controller
            .submit(RunRequest::new("", "x", "done"), None)
            .unwrap_err();
        assert!(matches!(err, RunpadError::InvalidState(ref m) if m.contains("not running")));
        assert!(!controller.is_running());
    }

    #[test]
    fn test_controls_follow_start_and_end() {
        let mut controller = RunController::spawn(Box::new(GateBackend)).unwrap();
        assert_eq!(controller.controls(), Controls::default());

        let run_id = controller
            .submit(RunRequest::new("", "x", "wait"), None)
            .unwrap();
        match next_event(&controller) {
            WorkerEvent::StartRun { run_id: id } => assert!(controller.on_start_run(id)),
            other => panic!("expected StartRun, got {:?}", other),
        }
        assert_eq!(
            controller.controls(),
            Controls {
                run_enabled: false,
                cancel_enabled: true
            }
        );

        assert!(controller.cancel());
        drive_to_end(&mut controller);
        assert_eq!(controller.controls(), Controls::default());

        // Events for a finished run are stale
        assert!(!controller.on_end_run(run_id, |_| panic!("graded twice")));
        controller.shutdown();
    }

    #[test]
    fn test_repeated_cancel_is_same_as_once() {
        let mut controller = RunController::spawn(Box::new(GateBackend)).unwrap();
        controller
            .submit(RunRequest::new("", "x", "wait"), None)
            .unwrap();
        for _ in 0..10 {
            assert!(controller.cancel());
        }
        assert!(controller.cancel_requested());
        drive_to_end(&mut controller);
        assert!(!controller.cancel());

        // The flag is cleared for the next run
        controller
            .submit(RunRequest::new("", "y", "done"), None)
            .unwrap();
        assert!(!controller.cancel_requested());
        drive_to_end(&mut controller);
        controller.shutdown();
    }

    #[test]
    fn test_marking_context_graded_exactly_once() {
        let mut controller = RunController::spawn(Box::new(GateBackend)).unwrap();
        controller
            .submit(
                RunRequest::new("", "answer", "done"),
                Some(MarkingContext { question_index: 2 }),
            )
            .unwrap();
        assert_eq!(drive_to_end(&mut controller), vec![2]);

        controller
            .submit(RunRequest::new("", "plain", "done"), None)
            .unwrap();
        assert!(drive_to_end(&mut controller).is_empty());
        controller.shutdown();
    }

    #[test]
    fn test_submit_after_shutdown_fails() {
        let mut controller = RunController::spawn(Box::new(GateBackend)).unwrap();
        controller.shutdown();
        controller.shutdown();
        assert!(matches!(
            controller.submit(RunRequest::new("", "x", "done"), None),
            Err(RunpadError::InvalidState(_))
        ));
    }
}
