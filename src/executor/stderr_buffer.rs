//! Stderr ring buffer for interpreter diagnostics
//!
//! The stderr reader tees every line two ways: forwarded into the run's output
//! stream (tracebacks are what the user needs to see) and kept in a bounded
//! ring buffer so the tail can be logged when a run fails.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Read};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// Default maximum total bytes to buffer (4KB)
pub const DEFAULT_MAX_BYTES: usize = 4 * 1024;

#[derive(Debug, Default)]
struct Inner {
    lines: VecDeque<String>,
    bytes: usize,
}

/// A thread-safe ring buffer for stderr lines
#[derive(Debug, Clone)]
pub struct StderrBuffer {
    inner: Arc<Mutex<Inner>>,
    max_lines: usize,
    max_bytes: usize,
}

impl StderrBuffer {
    pub fn new(max_lines: usize, max_bytes: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                lines: VecDeque::with_capacity(max_lines.min(1024)),
                bytes: 0,
            })),
            max_lines: max_lines.max(1),
            max_bytes,
        }
    }

    /// Add a line, evicting the oldest lines past either limit
    pub fn push_line(&self, line: String) {
        let mut inner = self.inner.lock();
        let line_bytes = line.len();

        while inner.bytes + line_bytes > self.max_bytes || inner.lines.len() >= self.max_lines {
            match inner.lines.pop_front() {
                Some(old) => inner.bytes = inner.bytes.saturating_sub(old.len()),
                None => break,
            }
        }

        inner.bytes += line_bytes;
        inner.lines.push_back(line);
    }

    /// All buffered lines joined with newlines
    pub fn get_contents(&self) -> String {
        let inner = self.inner.lock();
        inner.lines.iter().cloned().collect::<Vec<_>>().join("\n")
    }

    /// The last `n` lines (or all if fewer exist)
    pub fn get_last_n_lines(&self, n: usize) -> Vec<String> {
        let inner = self.inner.lock();
        let skip = inner.lines.len().saturating_sub(n);
        inner.lines.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().lines.is_empty()
    }
}

/// Spawn a thread reading `stderr` line by line.
///
/// Each line (with its newline restored) is handed to `forward` and pushed
/// into `buffer`. The thread exits at end of stream.
pub fn spawn_stderr_reader<R, F>(stderr: R, buffer: StderrBuffer, forward: F) -> JoinHandle<()>
where
    R: Read + Send + 'static,
    F: Fn(String) + Send + 'static,
{
    thread::spawn(move || {
        let mut reader = BufReader::new(stderr);
        let mut raw = Vec::new();
        loop {
            raw.clear();
            match reader.read_until(b'\n', &mut raw) {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&raw).into_owned();
                    debug!(target: "SCRIPT", "{}", line.trim_end());
                    buffer.push_line(line.trim_end_matches(['\n', '\r']).to_string());
                    forward(line);
                }
                Err(e) => {
                    warn!(target: "SCRIPT", error = %e, "stderr read error");
                    break;
                }
            }
        }
        debug!(target: "SCRIPT", "stderr reader exiting");
    })
}
