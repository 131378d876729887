//! Structured JSONL logging plus human-readable stderr output.
//!
//! - **JSONL to file** (`<data dir>/logs/runpad.jsonl`) for tooling
//! - **Compact to stderr** for developers
//!
//! # Usage
//!
//! ```rust,ignore
//! use runpad::logging;
//!
//! // MUST keep the guard alive for the duration of the program
//! let _guard = logging::init(&config.log_dir());
//!
//! tracing::info!(event_type = "app_start", "Application started");
//! ```
//!
//! # JSONL Output Format
//!
//! ```json
//! {"timestamp":"2026-10-16T10:30:45.123Z","level":"INFO","target":"runpad::run::controller","fields":{"message":"Run submitted","run_id":3}}
//! ```

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// File name of the JSONL log inside the log directory
pub const LOG_FILE_NAME: &str = "runpad.jsonl";

/// Guard that must be kept alive for the duration of the program.
/// Dropping this guard will flush and close the log file.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Initialize the dual-output logging system.
///
/// Returns a guard that MUST be kept alive for the duration of the program.
pub fn init(log_dir: &Path) -> LoggingGuard {
    if let Err(e) = fs::create_dir_all(log_dir) {
        eprintln!("[LOGGING] Failed to create log directory: {}", e);
    }
    let log_path = log_dir.join(LOG_FILE_NAME);

    // Non-blocking writer so a slow disk never stalls the UI context
    let (non_blocking_file, file_guard) = match OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => tracing_appender::non_blocking(file),
        Err(e) => {
            eprintln!("[LOGGING] Failed to open log file: {}", e);
            tracing_appender::non_blocking(std::io::sink())
        }
    };

    // Default to info, allow override via RUST_LOG
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_layer = fmt::layer()
        .json()
        .with_writer(non_blocking_file)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_target(true)
        .with_level(true)
        .with_thread_names(true)
        .with_file(false)
        .with_line_number(false)
        .with_span_events(FmtSpan::NONE);

    let pretty_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .compact();

    // try_init: tests and embedders may already have a global subscriber
    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(pretty_layer)
        .try_init()
        .is_ok();

    tracing::info!(
        event_type = "app_lifecycle",
        action = "started",
        log_path = %log_path.display(),
        installed,
        "Application logging initialized"
    );

    LoggingGuard {
        _file_guard: file_guard,
    }
}

/// Get the path to the JSONL log file inside `log_dir`
pub fn log_path(log_dir: &Path) -> PathBuf {
    log_dir.join(LOG_FILE_NAME)
}

/// Log a categorized message.
///
/// Prefer tracing macros directly for structured fields.
pub fn log(category: &str, message: &str) {
    tracing::info!(category = category, "{}", message);
}

/// Log a run lifecycle event with structured fields
pub fn log_run_event(run_id: u64, action: &str, duration_ms: Option<u64>, outcome: Option<&str>) {
    match duration_ms {
        Some(duration) => {
            tracing::info!(
                event_type = "run_event",
                run_id,
                action,
                duration_ms = duration,
                outcome,
                "Run {} {}", run_id, action
            );
        }
        None => {
            tracing::info!(
                event_type = "run_event",
                run_id,
                action,
                outcome,
                "Run {} {}", run_id, action
            );
        }
    }
}
