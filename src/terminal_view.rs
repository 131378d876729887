//! Line-oriented `ShellView` for the command-line front end
//!
//! Script output goes to stdout as it streams; notices and prompts go to
//! stderr so stdout stays clean for piping.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::debug;

use runpad::shell::{
    BufferKind, Notice, NoticeLevel, PathKind, PathMode, ShellView, ViewUpdate,
};

pub struct TerminalView {
    /// Answer yes to every confirm without asking
    assume_yes: bool,
}

impl TerminalView {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }

    fn read_line(&self, prompt: &str) -> Option<String> {
        eprint!("{} ", prompt);
        let _ = std::io::stderr().flush();
        let mut line = String::new();
        match std::io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }
}

impl ShellView for TerminalView {
    fn confirm(&mut self, question: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        matches!(
            self.read_line(&format!("{} [y/N]", question))
                .map(|a| a.trim().to_ascii_lowercase())
                .as_deref(),
            Some("y") | Some("yes")
        )
    }

    fn prompt_text(&mut self, label: &str) -> Option<String> {
        self.read_line(label)
    }

    fn choose_path(&mut self, kind: PathKind, mode: PathMode) -> Option<PathBuf> {
        let verb = match mode {
            PathMode::Open => "Open",
            PathMode::Save => "Save",
        };
        let what = match kind {
            PathKind::Script => "script",
            PathKind::Text => "text file",
            PathKind::Tutorial => "tutorial",
        };
        self.read_line(&format!("{} {} (path):", verb, what))
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
    }

    fn notify(&mut self, notice: Notice) {
        let tag = match notice.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Error => "error",
        };
        eprintln!("[{}] {}", tag, notice.message);
    }

    fn render(&mut self, update: ViewUpdate) {
        match update {
            ViewUpdate::OutputAppended(text) => {
                let mut out = std::io::stdout().lock();
                let _ = out.write_all(text.as_bytes());
                let _ = out.flush();
            }
            // A script replacing its own output mid-run: start the new text on a fresh line
            ViewUpdate::BufferReplaced {
                kind: BufferKind::Output,
                text,
            } if !text.is_empty() => {
                let mut out = std::io::stdout().lock();
                let _ = writeln!(out);
                let _ = out.write_all(text.as_bytes());
                let _ = out.flush();
            }
            ViewUpdate::TutorialChanged(view) => {
                debug!(score = view.score, questions = view.titles.len(), "Tutorial progress")
            }
            other => debug!(update = ?other, "View update"),
        }
    }
}
