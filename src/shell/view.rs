//! Boundary between the session shell and whatever draws it

use std::path::PathBuf;

use super::buffers::BufferKind;
use crate::error::{ErrorSeverity, RunpadError};
use crate::run::Controls;

/// What a file dialog is choosing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// Script source (code, snippet)
    Script,
    /// Plain text (input, output, notes)
    Text,
    Tutorial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathMode {
    Open,
    Save,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Non-blocking message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }
}

impl From<&RunpadError> for Notice {
    fn from(err: &RunpadError) -> Self {
        let level = match err.severity() {
            ErrorSeverity::Info => NoticeLevel::Info,
            ErrorSeverity::Warning => NoticeLevel::Warning,
            ErrorSeverity::Error => NoticeLevel::Error,
        };
        Self {
            level,
            message: err.user_message(),
        }
    }
}

/// Dockable panels whose visibility is persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Notes,
    Snippets,
    Tutorial,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PanelVisibility {
    pub notes: bool,
    pub snippets: bool,
    pub tutorial: bool,
}

impl PanelVisibility {
    pub fn get(&self, panel: Panel) -> bool {
        match panel {
            Panel::Notes => self.notes,
            Panel::Snippets => self.snippets,
            Panel::Tutorial => self.tutorial,
        }
    }

    pub fn set(&mut self, panel: Panel, visible: bool) {
        match panel {
            Panel::Notes => self.notes = visible,
            Panel::Snippets => self.snippets = visible,
            Panel::Tutorial => self.tutorial = visible,
        }
    }
}

/// Snapshot of tutorial progress for the tutorial panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TutorialView {
    pub titles: Vec<String>,
    /// Per question: None = not marked, Some(passed)
    pub marks: Vec<Option<bool>>,
    pub current: Option<usize>,
    pub score: usize,
}

/// State changes pushed to the view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewUpdate {
    OutputAppended(String),
    BufferReplaced { kind: BufferKind, text: String },
    ControlsChanged(Controls),
    SearchPatternChanged(String),
    TutorialChanged(TutorialView),
    PanelsChanged(PanelVisibility),
    TerminalToggled(bool),
    SnippetsChanged(Vec<String>),
    FontChanged { family: String, point_size: u32 },
    /// Opaque blobs the view handed over in `SetWindowState` last session
    WindowStateRestored {
        geometry: Option<Vec<u8>>,
        layout: Option<Vec<u8>>,
    },
}

/// Implemented by the UI. All calls happen on the UI context.
pub trait ShellView {
    /// Yes/no question; false means "leave things as they are"
    fn confirm(&mut self, question: &str) -> bool;

    /// Single-line text entry; None when dismissed
    fn prompt_text(&mut self, label: &str) -> Option<String>;

    fn choose_path(&mut self, kind: PathKind, mode: PathMode) -> Option<PathBuf>;

    /// Show a message without waiting for the user
    fn notify(&mut self, notice: Notice);

    fn render(&mut self, update: ViewUpdate);
}
