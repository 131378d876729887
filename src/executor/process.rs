//! External-interpreter backend
//!
//! Each run writes bootstrap + user source into one temporary script file and
//! launches the configured interpreter on it. Stdout and stderr are read on
//! their own threads and merged onto a channel; the execution loop waits on
//! that channel with a timeout so the cancel flag is polled between reads.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

#[cfg(unix)]
use std::os::unix::process::CommandExt;

use super::backend::{ExecContext, ExecStatus, RunRequest, ScriptBackend, ScriptError};
use super::stderr_buffer::{spawn_stderr_reader, StderrBuffer, DEFAULT_MAX_BYTES};
use crate::config::{Config, InterpreterConfig};
use crate::logging;
use crate::protocol::{Fragment, OutputAssembler};

/// How long to keep collecting buffered output after a cancelled child is reaped
const CANCEL_DRAIN_WINDOW: Duration = Duration::from_millis(200);

/// Stderr tail included in the log when a run fails
const STDERR_TAIL_LINES: usize = 20;

const STDOUT_CHUNK_SIZE: usize = 8 * 1024;

/// Find an executable in common install locations that a desktop launch may
/// not have on PATH. Names containing a path separator are returned as-is.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    if name.contains(std::path::MAIN_SEPARATOR) {
        let path = PathBuf::from(name);
        return path.exists().then_some(path);
    }

    let common_paths = [
        dirs::home_dir().map(|h| h.join(".local/bin")),
        dirs::home_dir().map(|h| h.join(".pyenv/shims")),
        dirs::home_dir().map(|h| h.join("bin")),
        Some(PathBuf::from("/opt/homebrew/bin")),
        Some(PathBuf::from("/usr/local/bin")),
        Some(PathBuf::from("/usr/bin")),
        Some(PathBuf::from("/bin")),
    ];

    for dir in common_paths.iter().flatten() {
        let candidate = dir.join(name);
        if candidate.is_file() {
            debug!(executable = %candidate.display(), "Found interpreter");
            return Some(candidate);
        }
    }

    debug!(name, "Interpreter not in common paths, relying on PATH");
    None
}

/// Temporary script file, removed on drop
#[derive(Debug)]
struct ScriptFile {
    path: PathBuf,
}

impl ScriptFile {
    fn create(dir: &Path, extension: &str, source: &str) -> std::io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        let name = if extension.is_empty() {
            format!("runpad-{}", uuid::Uuid::new_v4())
        } else {
            format!("runpad-{}.{}", uuid::Uuid::new_v4(), extension)
        };
        let path = dir.join(name);
        std::fs::write(&path, source)?;
        Ok(Self { path })
    }
}

impl Drop for ScriptFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            debug!(path = %self.path.display(), error = %e, "Failed to remove script file");
        }
    }
}

/// Owns a spawned interpreter and guarantees its process group is gone on drop
struct ProcessSession {
    child: Child,
    pid: u32,
    kill_grace: Duration,
    poll_interval: Duration,
    reaped: bool,
}

impl ProcessSession {
    fn try_wait(&mut self) -> std::io::Result<Option<ExitStatus>> {
        let status = self.child.try_wait()?;
        if status.is_some() {
            self.reaped = true;
        }
        Ok(status)
    }

    fn wait(&mut self) -> std::io::Result<ExitStatus> {
        let status = self.child.wait()?;
        self.reaped = true;
        Ok(status)
    }

    /// Send `signal` to the interpreter's whole group. Spawned with
    /// `process_group(0)`, so the group id is the leader's pid.
    #[cfg(unix)]
    fn signal_group(&self, signal: libc::c_int) -> std::io::Result<()> {
        // Safety: kill(2) only takes integers
        if unsafe { libc::kill(-(self.pid as libc::pid_t), signal) } == 0 {
            Ok(())
        } else {
            Err(std::io::Error::last_os_error())
        }
    }

    /// Signal 0 checks existence; EPERM still means a member is alive
    #[cfg(unix)]
    fn group_alive(&self) -> bool {
        match self.signal_group(0) {
            Ok(()) => true,
            Err(e) => e.raw_os_error() != Some(libc::ESRCH),
        }
    }

    /// SIGTERM the group, wait out the grace period, then SIGKILL.
    fn terminate(&mut self) {
        #[cfg(unix)]
        {
            match self.signal_group(libc::SIGTERM) {
                Ok(()) => debug!(pid = self.pid, "SIGTERM sent to interpreter group"),
                Err(e) if e.raw_os_error() == Some(libc::ESRCH) => {
                    debug!(pid = self.pid, "Interpreter group already gone")
                }
                Err(e) => warn!(pid = self.pid, error = %e, "SIGTERM failed"),
            }

            let deadline = Instant::now() + self.kill_grace;
            while Instant::now() < deadline {
                if matches!(self.try_wait(), Ok(Some(_))) && !self.group_alive() {
                    debug!(pid = self.pid, "Interpreter group exited after SIGTERM");
                    return;
                }
                thread::sleep(self.poll_interval.min(self.kill_grace));
            }

            if self.group_alive() {
                info!(
                    pid = self.pid,
                    grace_ms = self.kill_grace.as_millis() as u64,
                    "Grace period over, sending SIGKILL"
                );
                if let Err(e) = self.signal_group(libc::SIGKILL) {
                    debug!(pid = self.pid, error = %e, "SIGKILL failed");
                }
            }
        }

        if !self.reaped {
            if let Err(e) = self.child.kill() {
                debug!(pid = self.pid, error = %e, "Child::kill failed");
            }
            if let Err(e) = self.wait() {
                warn!(pid = self.pid, error = %e, "Failed to reap interpreter");
            }
        }
    }
}

impl Drop for ProcessSession {
    fn drop(&mut self) {
        if !self.reaped {
            debug!(pid = self.pid, "Interpreter still running on drop, terminating");
            self.terminate();
        }
    }
}

/// Data arriving from the reader threads
enum Chunk {
    Stdout(Vec<u8>),
    Stderr(String),
}

/// Runs scripts by launching an interpreter process per run
#[derive(Debug, Clone)]
pub struct ProcessBackend {
    interpreter: InterpreterConfig,
    script_dir: PathBuf,
    poll_interval: Duration,
    kill_grace: Duration,
    stderr_max_lines: usize,
}

impl ProcessBackend {
    pub fn new(interpreter: InterpreterConfig) -> Self {
        let defaults = Config::default();
        Self {
            interpreter,
            script_dir: std::env::temp_dir(),
            poll_interval: defaults.poll_interval(),
            kill_grace: defaults.kill_grace(),
            stderr_max_lines: defaults.stderr_max_lines(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            interpreter: config.interpreter.clone(),
            script_dir: std::env::temp_dir(),
            poll_interval: config.poll_interval(),
            kill_grace: config.kill_grace(),
            stderr_max_lines: config.stderr_max_lines(),
        }
    }

    /// Directory for the generated script files (default: system temp dir)
    pub fn with_script_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.script_dir = dir.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(Duration::from_millis(1));
        self
    }

    pub fn with_kill_grace(mut self, grace: Duration) -> Self {
        self.kill_grace = grace;
        self
    }

    fn spawn(&self, script: &ScriptFile) -> Result<ProcessSession, ScriptError> {
        let program = &self.interpreter.program;
        let executable = find_executable(program)
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|| program.clone());
        let args = self
            .interpreter
            .args_for(&script.path.to_string_lossy());

        debug!(executable = %executable, args = ?args, "Spawning interpreter");

        let mut command = Command::new(&executable);
        command
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // New process group so cancel reaches anything the script spawns
        #[cfg(unix)]
        command.process_group(0);

        let child = command
            .spawn()
            .map_err(|e| ScriptError::Spawn(format!("'{}': {}", executable, e)))?;
        let pid = child.id();
        info!(pid, executable = %executable, "Interpreter spawned");

        Ok(ProcessSession {
            child,
            pid,
            kill_grace: self.kill_grace,
            poll_interval: self.poll_interval,
            reaped: false,
        })
    }
}

impl ScriptBackend for ProcessBackend {
    fn name(&self) -> &str {
        "process"
    }

    #[instrument(skip_all, fields(run_id = %ctx.run_id(), program = %self.interpreter.program))]
    fn execute(
        &mut self,
        request: &RunRequest,
        ctx: &mut ExecContext<'_>,
    ) -> Result<ExecStatus, ScriptError> {
        let script = ScriptFile::create(
            &self.script_dir,
            &self.interpreter.script_extension,
            &request.combined_source(),
        )?;
        let mut session = self.spawn(&script)?;

        let (tx, rx) = mpsc::channel::<Chunk>();

        if let Some(mut stdin) = session.child.stdin.take() {
            let input = request.input.clone();
            thread::spawn(move || {
                // Scripts that never read stdin close the pipe early; not an error
                if let Err(e) = stdin.write_all(input.as_bytes()) {
                    debug!(error = %e, "stdin write ended early");
                }
            });
        }

        if let Some(mut stdout) = session.child.stdout.take() {
            let tx = tx.clone();
            thread::spawn(move || {
                let mut buf = vec![0u8; STDOUT_CHUNK_SIZE];
                loop {
                    match stdout.read(&mut buf) {
                        Ok(0) => break,
                        Ok(n) => {
                            if tx.send(Chunk::Stdout(buf[..n].to_vec())).is_err() {
                                break;
                            }
                        }
                        Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                        Err(e) => {
                            warn!(error = %e, "stdout read error");
                            break;
                        }
                    }
                }
            });
        }

        let stderr_buffer = StderrBuffer::new(self.stderr_max_lines, DEFAULT_MAX_BYTES);
        if let Some(stderr) = session.child.stderr.take() {
            let tx = tx.clone();
            spawn_stderr_reader(stderr, stderr_buffer.clone(), move |line| {
                let _ = tx.send(Chunk::Stderr(line));
            });
        }
        // Only the reader threads hold senders now; disconnect means both streams hit EOF
        drop(tx);

        let mut assembler = OutputAssembler::new();
        let mut cancel_deadline: Option<Instant> = None;

        loop {
            if cancel_deadline.is_none() && ctx.checkpoint() {
                logging::log("EXEC", &format!("Cancelling {} (pid {})", ctx.run_id(), session.pid));
                session.terminate();
                cancel_deadline = Some(Instant::now() + CANCEL_DRAIN_WINDOW);
            }

            let wait = match cancel_deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        debug!("Drain window elapsed after cancel");
                        break;
                    }
                    (deadline - now).min(self.poll_interval)
                }
                None => self.poll_interval,
            };

            match rx.recv_timeout(wait) {
                Ok(Chunk::Stdout(bytes)) => emit(ctx, assembler.push(&bytes)),
                Ok(Chunk::Stderr(line)) => ctx.output(line),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        emit(ctx, assembler.finish());

        if cancel_deadline.is_some() {
            return Ok(ExecStatus::Cancelled);
        }

        let status = session.wait()?;
        if status.success() {
            if !stderr_buffer.is_empty() {
                debug!(stderr = %stderr_buffer.get_contents(), "Interpreter wrote to stderr");
            }
            return Ok(ExecStatus::Completed);
        }

        let tail = stderr_buffer.get_last_n_lines(STDERR_TAIL_LINES).join("\n");
        warn!(
            status = %status,
            stderr_lines = stderr_buffer.len(),
            stderr_tail = %tail,
            "Interpreter exited unsuccessfully"
        );
        let message = match status.code() {
            Some(code) => format!("[process exited with status {}]", code),
            None => "[process terminated by signal]".to_string(),
        };
        Err(ScriptError::Runtime(message))
    }
}

fn emit(ctx: &mut ExecContext<'_>, fragments: Vec<Fragment>) {
    for fragment in fragments {
        match fragment {
            Fragment::Text(text) => ctx.output(text),
            Fragment::Control(directive) => ctx.directive(directive),
        }
    }
}
