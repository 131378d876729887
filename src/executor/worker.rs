//! Dedicated script worker thread
//!
//! The worker owns the backend and processes one `Run` command at a time.
//! For every run it emits `StartRun`, whatever the backend streams, and then
//! exactly one `EndRun`, including when the backend returns an error or
//! panics.

use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, error, info, warn};

use super::backend::{CancelToken, ExecContext, ExecStatus, RunRequest, ScriptBackend};
use crate::error::{Result, ResultExt, RunpadError};
use crate::logging;
use crate::protocol::{RunId, RunOutcome, WorkerEvent};

/// Commands sent from the UI context to the worker
#[derive(Debug)]
pub enum WorkerCommand {
    Run {
        run_id: RunId,
        request: RunRequest,
        cancel: CancelToken,
    },
    Shutdown,
}

pub struct ScriptWorker;

impl ScriptWorker {
    /// Start the worker thread. Returns the command side and the event stream.
    pub fn spawn(
        backend: Box<dyn ScriptBackend>,
    ) -> Result<(WorkerHandle, async_channel::Receiver<WorkerEvent>)> {
        let (cmd_tx, cmd_rx) = async_channel::unbounded::<WorkerCommand>();
        let (event_tx, event_rx) = async_channel::unbounded::<WorkerEvent>();

        let thread = thread::Builder::new()
            .name("runpad-worker".to_string())
            .spawn(move || worker_loop(backend, cmd_rx, event_tx))
            .map_err(|e| RunpadError::InvalidState(format!("failed to start worker thread: {}", e)))?;

        Ok((
            WorkerHandle {
                commands: cmd_tx,
                thread: Some(thread),
            },
            event_rx,
        ))
    }
}

/// UI-side handle to the worker thread
pub struct WorkerHandle {
    commands: async_channel::Sender<WorkerCommand>,
    thread: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    /// Queue a run. Fails only if the worker is gone.
    pub fn dispatch(&self, run_id: RunId, request: RunRequest, cancel: CancelToken) -> Result<()> {
        self.commands
            .try_send(WorkerCommand::Run {
                run_id,
                request,
                cancel,
            })
            .map_err(|_| RunpadError::InvalidState("script worker is not running".to_string()))
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Ask the worker to stop after the current run and wait for it.
    /// Callers raise the run's cancel flag first.
    pub fn shutdown(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        if self.commands.try_send(WorkerCommand::Shutdown).is_err() {
            debug!("Worker command channel already closed");
        }
        self.commands.close();
        if thread.join().log_err().is_some() {
            info!("Script worker stopped");
        }
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        // Never block in drop; the worker exits once it sees the closed channel
        self.commands.close();
    }
}

fn worker_loop(
    mut backend: Box<dyn ScriptBackend>,
    commands: async_channel::Receiver<WorkerCommand>,
    events: async_channel::Sender<WorkerEvent>,
) {
    info!(backend = backend.name(), "Script worker started");
    while let Ok(command) = commands.recv_blocking() {
        match command {
            WorkerCommand::Run {
                run_id,
                request,
                cancel,
            } => run_one(backend.as_mut(), run_id, &request, &cancel, &events),
            WorkerCommand::Shutdown => {
                debug!("Shutdown command received");
                break;
            }
        }
    }
    info!("Script worker exiting");
}

fn run_one(
    backend: &mut dyn ScriptBackend,
    run_id: RunId,
    request: &RunRequest,
    cancel: &CancelToken,
    events: &async_channel::Sender<WorkerEvent>,
) {
    let started = Instant::now();
    logging::log_run_event(run_id.0, "start", None, None);
    send(events, WorkerEvent::StartRun { run_id });

    let mut ctx = ExecContext::new(run_id, cancel, events);
    let result = panic::catch_unwind(AssertUnwindSafe(|| backend.execute(request, &mut ctx)));

    let outcome = match result {
        Ok(Ok(ExecStatus::Completed)) => RunOutcome::Completed,
        Ok(Ok(ExecStatus::Cancelled)) => {
            ctx.render_line("[cancelled]");
            RunOutcome::Cancelled
        }
        Ok(Err(e)) => {
            let message = e.to_string();
            let severity = RunpadError::from(e).severity();
            warn!(run_id = %run_id, error = %message, severity = ?severity, "Script failed");
            ctx.render_line(&message);
            RunOutcome::Failed { message }
        }
        Err(payload) => {
            let message = format!("[internal error] {}", panic_message(payload.as_ref()));
            error!(run_id = %run_id, error = %message, "Script backend panicked");
            ctx.render_line(&message);
            RunOutcome::Failed { message }
        }
    };

    let duration_ms = started.elapsed().as_millis() as u64;
    logging::log_run_event(run_id.0, "end", Some(duration_ms), Some(outcome.as_str()));
    send(events, WorkerEvent::EndRun { run_id, outcome });
}

fn send(events: &async_channel::Sender<WorkerEvent>, event: WorkerEvent) {
    if events.send_blocking(event).is_err() {
        debug!("Event receiver closed");
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "backend panicked".to_string()
    }
}
