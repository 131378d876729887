use std::time::Instant;

use crate::protocol::RunId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Running,
}

/// Set on a run that grades a tutorial question when it ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkingContext {
    pub question_index: usize,
}

/// The live run, if any. Owned by the UI context.
#[derive(Debug, Default)]
pub struct RunSession {
    state: RunState,
    run_id: Option<RunId>,
    marking: Option<MarkingContext>,
    started_at: Option<Instant>,
}

impl RunSession {
    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    pub fn run_id(&self) -> Option<RunId> {
        self.run_id
    }

    pub fn marking(&self) -> Option<MarkingContext> {
        self.marking
    }

    /// Whether `run_id` is the run this session is tracking
    pub fn owns(&self, run_id: RunId) -> bool {
        self.is_running() && self.run_id == Some(run_id)
    }

    pub(crate) fn begin(&mut self, run_id: RunId, marking: Option<MarkingContext>) {
        self.state = RunState::Running;
        self.run_id = Some(run_id);
        self.marking = marking;
        self.started_at = Some(Instant::now());
    }

    /// Back to Idle. Returns the marking context (taken) and elapsed milliseconds.
    pub(crate) fn finish(&mut self) -> (Option<MarkingContext>, u64) {
        let elapsed = self
            .started_at
            .take()
            .map(|t| t.elapsed().as_millis() as u64)
            .unwrap_or(0);
        self.state = RunState::Idle;
        (self.marking.take(), elapsed)
    }
}
