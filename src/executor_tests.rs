use super::*;
use crate::config::InterpreterConfig;
use crate::protocol::{RunId, RunOutcome, WorkerEvent};
use std::time::{Duration, Instant};

/// Collect events until the EndRun for `run_id`, failing after `timeout`
fn collect_run(
    rx: &async_channel::Receiver<WorkerEvent>,
    run_id: RunId,
    timeout: Duration,
) -> Vec<WorkerEvent> {
    let deadline = Instant::now() + timeout;
    let mut events = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => {
                let done = matches!(&event, WorkerEvent::EndRun { run_id: id, .. } if *id == run_id);
                events.push(event);
                if done {
                    return events;
                }
            }
            Err(_) => {
                assert!(
                    Instant::now() < deadline,
                    "timed out waiting for EndRun, got {:?}",
                    events
                );
                std::thread::sleep(Duration::from_millis(5));
            }
        }
    }
}

fn output_text(events: &[WorkerEvent]) -> String {
    events
        .iter()
        .filter_map(|e| match e {
            WorkerEvent::Output { text, .. } => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

fn outcome(events: &[WorkerEvent]) -> RunOutcome {
    match events.last() {
        Some(WorkerEvent::EndRun { outcome, .. }) => outcome.clone(),
        other => panic!("last event is not EndRun: {:?}", other),
    }
}

/// Emits the user source line by line
struct EchoBackend;

impl ScriptBackend for EchoBackend {
    fn name(&self) -> &str {
        "echo"
    }

    fn execute(
        &mut self,
        request: &RunRequest,
        ctx: &mut ExecContext<'_>,
    ) -> Result<ExecStatus, ScriptError> {
        for line in request.user_source.lines() {
            if ctx.checkpoint() {
                return Ok(ExecStatus::Cancelled);
            }
            ctx.output(format!("{}\n", line));
        }
        Ok(ExecStatus::Completed)
    }
}

/// Spins on checkpoints until cancelled
struct SpinBackend;

impl ScriptBackend for SpinBackend {
    fn name(&self) -> &str {
        "spin"
    }

    fn execute(
        &mut self,
        _request: &RunRequest,
        ctx: &mut ExecContext<'_>,
    ) -> Result<ExecStatus, ScriptError> {
        ctx.output("working\n");
        while !ctx.checkpoint() {
            std::thread::sleep(Duration::from_millis(2));
        }
        Ok(ExecStatus::Cancelled)
    }
}

struct PanicBackend;

impl ScriptBackend for PanicBackend {
    fn name(&self) -> &str {
        "panic"
    }

    fn execute(
        &mut self,
        request: &RunRequest,
        ctx: &mut ExecContext<'_>,
    ) -> Result<ExecStatus, ScriptError> {
        ctx.output("before");
        if request.user_source == "boom" {
            panic!("interpreter blew up");
        }
        Err(ScriptError::Runtime("NameError: x".to_string()))
    }
}

#[test]
fn test_worker_emits_start_output_end_in_order() {
    let (mut worker, rx) = ScriptWorker::spawn(Box::new(EchoBackend)).unwrap();
    worker
        .dispatch(RunId(1), RunRequest::new("", "a\nb\nc", ""), CancelToken::new())
        .unwrap();

    let events = collect_run(&rx, RunId(1), Duration::from_secs(5));
    assert_eq!(events.first(), Some(&WorkerEvent::StartRun { run_id: RunId(1) }));
    assert_eq!(output_text(&events), "a\nb\nc\n");
    assert_eq!(outcome(&events), RunOutcome::Completed);
    let ends = events
        .iter()
        .filter(|e| matches!(e, WorkerEvent::EndRun { .. }))
        .count();
    assert_eq!(ends, 1);
    assert!(events.iter().all(|e| e.run_id() == RunId(1)));

    worker.shutdown();
    assert!(!worker.is_running());
}

#[test]
fn test_worker_processes_runs_sequentially() {
    let (mut worker, rx) = ScriptWorker::spawn(Box::new(EchoBackend)).unwrap();
    worker
        .dispatch(RunId(1), RunRequest::new("", "first", ""), CancelToken::new())
        .unwrap();
    worker
        .dispatch(RunId(2), RunRequest::new("", "second", ""), CancelToken::new())
        .unwrap();

    let first = collect_run(&rx, RunId(1), Duration::from_secs(5));
    let second = collect_run(&rx, RunId(2), Duration::from_secs(5));
    assert_eq!(output_text(&first), "first\n");
    assert_eq!(output_text(&second), "second\n");
    assert_eq!(second.first(), Some(&WorkerEvent::StartRun { run_id: RunId(2) }));
    worker.shutdown();
}

#[test]
fn test_cancel_ends_run_with_cancelled_outcome() {
    let (mut worker, rx) = ScriptWorker::spawn(Box::new(SpinBackend)).unwrap();
    let cancel = CancelToken::new();
    worker
        .dispatch(RunId(7), RunRequest::new("", "", ""), cancel.clone())
        .unwrap();

    // Wait for the backend to be inside its loop
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut seen = Vec::new();
    while !seen.iter().any(|e| matches!(e, WorkerEvent::Output { .. })) {
        assert!(Instant::now() < deadline);
        if let Ok(e) = rx.try_recv() {
            seen.push(e);
        }
    }
    for _ in 0..5 {
        cancel.cancel();
    }

    seen.extend(collect_run(&rx, RunId(7), Duration::from_secs(5)));
    assert_eq!(outcome(&seen), RunOutcome::Cancelled);
    assert!(output_text(&seen).ends_with("[cancelled]\n"));
    worker.shutdown();
}

#[test]
fn test_backend_error_is_rendered_and_run_still_ends() {
    let (mut worker, rx) = ScriptWorker::spawn(Box::new(PanicBackend)).unwrap();
    worker
        .dispatch(RunId(3), RunRequest::new("", "err", ""), CancelToken::new())
        .unwrap();
    let events = collect_run(&rx, RunId(3), Duration::from_secs(5));
    assert_eq!(output_text(&events), "before\nNameError: x\n");
    assert!(matches!(outcome(&events), RunOutcome::Failed { .. }));
    worker.shutdown();
}

#[test]
fn test_backend_panic_is_caught_and_worker_survives() {
    let (mut worker, rx) = ScriptWorker::spawn(Box::new(PanicBackend)).unwrap();
    worker
        .dispatch(RunId(1), RunRequest::new("", "boom", ""), CancelToken::new())
        .unwrap();
    let events = collect_run(&rx, RunId(1), Duration::from_secs(5));
    match outcome(&events) {
        RunOutcome::Failed { message } => assert!(message.contains("interpreter blew up")),
        other => panic!("expected failure, got {:?}", other),
    }
    assert!(output_text(&events).contains("[internal error] interpreter blew up"));

    // Same worker keeps serving runs
    worker
        .dispatch(RunId(2), RunRequest::new("", "err", ""), CancelToken::new())
        .unwrap();
    let events = collect_run(&rx, RunId(2), Duration::from_secs(5));
    assert!(matches!(outcome(&events), RunOutcome::Failed { .. }));
    worker.shutdown();
}

#[test]
fn test_dispatch_after_shutdown_fails() {
    let (mut worker, _rx) = ScriptWorker::spawn(Box::new(EchoBackend)).unwrap();
    worker.shutdown();
    let err = worker
        .dispatch(RunId(1), RunRequest::new("", "x", ""), CancelToken::new())
        .unwrap_err();
    assert!(matches!(err, crate::error::RunpadError::InvalidState(_)));
}

#[test]
fn test_default_bootstrap_defines_helpers() {
    for helper in ["def set_code", "def set_input", "def set_output", "def set_search"] {
        assert!(DEFAULT_BOOTSTRAP.contains(helper), "missing {}", helper);
    }
    assert!(DEFAULT_BOOTSTRAP.contains(crate::protocol::CONTROL_PREFIX.trim_end()));
}

// ============================================================
// Process backend (runs /bin/sh)
// ============================================================

#[cfg(unix)]
mod process_backend {
    use super::*;

    fn sh_backend(dir: &std::path::Path) -> ProcessBackend {
        ProcessBackend::new(InterpreterConfig {
            program: "/bin/sh".to_string(),
            args: vec!["{script}".to_string()],
            script_extension: "sh".to_string(),
        })
        .with_script_dir(dir)
        .with_poll_interval(Duration::from_millis(10))
        .with_kill_grace(Duration::from_millis(100))
    }

    fn run(backend: ProcessBackend, request: RunRequest) -> Vec<WorkerEvent> {
        let (mut worker, rx) = ScriptWorker::spawn(Box::new(backend)).unwrap();
        worker.dispatch(RunId(1), request, CancelToken::new()).unwrap();
        let events = collect_run(&rx, RunId(1), Duration::from_secs(10));
        worker.shutdown();
        events
    }

    #[test]
    fn test_bootstrap_and_user_source_share_one_shell() {
        let dir = tempfile::tempdir().unwrap();
        let events = run(
            sh_backend(dir.path()),
            RunRequest::new("GREETING=hello", "echo \"$GREETING world\"", ""),
        );
        assert_eq!(output_text(&events), "hello world\n");
        assert_eq!(outcome(&events), RunOutcome::Completed);
    }

    #[test]
    fn test_input_is_fed_to_stdin() {
        let dir = tempfile::tempdir().unwrap();
        let events = run(
            sh_backend(dir.path()),
            RunRequest::new("", "read a b\necho $((a + b))", "3 4\n"),
        );
        assert_eq!(output_text(&events), "7\n");
    }

    #[test]
    fn test_control_lines_become_set_events() {
        let dir = tempfile::tempdir().unwrap();
        let source = r#"echo before
echo '@@runpad {"type":"setCode","text":"print(42)"}'
echo '@@runpad {"type":"setSearchPattern","pattern":"err"}'
echo '@@runpad {"type":"bogus"}'
echo after"#;
        let events = run(sh_backend(dir.path()), RunRequest::new("", source, ""));

        assert!(events.contains(&WorkerEvent::SetCode {
            run_id: RunId(1),
            text: "print(42)".to_string()
        }));
        assert!(events.contains(&WorkerEvent::SetSearchPattern {
            run_id: RunId(1),
            pattern: "err".to_string()
        }));
        assert_eq!(
            output_text(&events),
            "before\n@@runpad {\"type\":\"bogus\"}\nafter\n"
        );
    }

    #[test]
    fn test_stderr_is_forwarded_and_nonzero_exit_rendered() {
        let dir = tempfile::tempdir().unwrap();
        let events = run(
            sh_backend(dir.path()),
            RunRequest::new("", "echo oops >&2\nexit 3", ""),
        );
        let text = output_text(&events);
        assert!(text.contains("oops\n"), "output was {:?}", text);
        assert!(text.ends_with("[process exited with status 3]\n"));
        assert_eq!(
            outcome(&events),
            RunOutcome::Failed {
                message: "[process exited with status 3]".to_string()
            }
        );
    }

    #[test]
    fn test_missing_interpreter_reports_spawn_failure() {
        let dir = tempfile::tempdir().unwrap();
        let backend = ProcessBackend::new(InterpreterConfig {
            program: "runpad-no-such-interpreter".to_string(),
            args: vec![],
            script_extension: "txt".to_string(),
        })
        .with_script_dir(dir.path());
        let events = run(backend, RunRequest::new("", "x", ""));
        match outcome(&events) {
            RunOutcome::Failed { message } => {
                assert!(message.starts_with("failed to start interpreter"))
            }
            other => panic!("expected spawn failure, got {:?}", other),
        }
    }

    #[test]
    fn test_cancel_terminates_long_running_process() {
        let dir = tempfile::tempdir().unwrap();
        let (mut worker, rx) = ScriptWorker::spawn(Box::new(sh_backend(dir.path()))).unwrap();
        let cancel = CancelToken::new();
        worker
            .dispatch(
                RunId(9),
                RunRequest::new("", "echo started\nsleep 30\necho never", ""),
                cancel.clone(),
            )
            .unwrap();

        let deadline = Instant::now() + Duration::from_secs(10);
        let mut seen = Vec::new();
        while !output_text(&seen).contains("started") {
            assert!(Instant::now() < deadline, "script never started");
            match rx.try_recv() {
                Ok(e) => seen.push(e),
                Err(_) => std::thread::sleep(Duration::from_millis(5)),
            }
        }

        let cancelled_at = Instant::now();
        cancel.cancel();
        seen.extend(collect_run(&rx, RunId(9), Duration::from_secs(10)));
        assert!(cancelled_at.elapsed() < Duration::from_secs(5));
        assert_eq!(outcome(&seen), RunOutcome::Cancelled);
        assert!(!output_text(&seen).contains("never"));
        worker.shutdown();
    }

    #[test]
    fn test_cancel_escalates_when_group_ignores_sigterm() {
        let dir = tempfile::tempdir().unwrap();
        let (mut worker, rx) = ScriptWorker::spawn(Box::new(sh_backend(dir.path()))).unwrap();
        let cancel = CancelToken::new();
        // The background sleep inherits the ignored TERM and keeps stdout open
        worker
            .dispatch(
                RunId(3),
                RunRequest::new("", "trap '' TERM\necho started\nsleep 30 &\nwait", ""),
                cancel.clone(),
            )
            .unwrap();

        let deadline = Instant::now() + Duration::from_secs(10);
        let mut seen = Vec::new();
        while !output_text(&seen).contains("started") {
            assert!(Instant::now() < deadline, "script never started");
            match rx.try_recv() {
                Ok(e) => seen.push(e),
                Err(_) => std::thread::sleep(Duration::from_millis(5)),
            }
        }

        let cancelled_at = Instant::now();
        cancel.cancel();
        seen.extend(collect_run(&rx, RunId(3), Duration::from_secs(10)));
        assert!(cancelled_at.elapsed() < Duration::from_secs(5));
        assert_eq!(outcome(&seen), RunOutcome::Cancelled);
        worker.shutdown();
    }

    #[test]
    fn test_script_file_is_removed_after_run() {
        let dir = tempfile::tempdir().unwrap();
        run(sh_backend(dir.path()), RunRequest::new("", "echo hi", ""));
        let leftovers: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert!(leftovers.is_empty());
    }
}
