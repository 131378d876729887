use thiserror::Error;
use tracing::{error, warn};

/// Error severity for UI display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,    // informational
    Warning, // recoverable
    Error,   // operation failed
}

/// Domain-specific errors for runpad
#[derive(Error, Debug)]
pub enum RunpadError {
    /// An operation was requested in a state that forbids it
    /// (a run while one is already active, marking with no tutorial loaded).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Settings or snippet persistence could not be read or written.
    #[error("Storage unavailable: {message}")]
    StorageUnavailable {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// A tutorial file could not be parsed.
    #[error("Failed to parse '{path}': {message}")]
    Parse { path: String, message: String },

    /// An unhandled error inside the executed script.
    #[error("Script error: {0}")]
    ScriptRuntime(String),

    #[error("Process spawn failed: {0}")]
    ProcessSpawn(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl RunpadError {
    pub fn storage(message: impl Into<String>, source: anyhow::Error) -> Self {
        Self::StorageUnavailable {
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::InvalidState(_) => ErrorSeverity::Warning,
            Self::StorageUnavailable { .. } => ErrorSeverity::Error,
            Self::Parse { .. } => ErrorSeverity::Warning,
            Self::ScriptRuntime(_) => ErrorSeverity::Info,
            Self::ProcessSpawn(_) => ErrorSeverity::Error,
            Self::Config(_) => ErrorSeverity::Warning,
            Self::Io { .. } => ErrorSeverity::Error,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidState(msg) => msg.clone(),
            Self::StorageUnavailable { message, .. } => format!("Storage failed: {}", message),
            Self::Parse { path, .. } => format!("Cannot read file {}", path),
            Self::ScriptRuntime(msg) => msg.clone(),
            Self::ProcessSpawn(msg) => format!("Could not start interpreter: {}", msg),
            Self::Config(msg) => format!("Configuration issue: {}", msg),
            Self::Io { path, source } => format!("Cannot access file {}: {}", path, source),
        }
    }
}

pub type Result<T> = std::result::Result<T, RunpadError>;

/// Extension trait for silent error logging with caller location tracking.
/// Use when the operation is recoverable and the user doesn't need to know.
///
/// # Examples
///
/// ```ignore
/// use runpad::error::ResultExt;
///
/// snippets.flush().warn_on_err();
/// ```
pub trait ResultExt<T> {
    /// Log error with caller location and return None.
    fn log_err(self) -> Option<T>;
    /// Log as warning with caller location and return None.
    fn warn_on_err(self) -> Option<T>;
}

impl<T, E: std::fmt::Debug> ResultExt<T> for std::result::Result<T, E> {
    #[track_caller]
    fn log_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                error!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation failed"
                );
                None
            }
        }
    }

    #[track_caller]
    fn warn_on_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                warn!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation had warning"
                );
                None
            }
        }
    }
}
