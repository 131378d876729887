//! Session shell: the UI-context side of the application
//!
//! - `session`: `SessionShell`, which owns stores, controller and buffers
//! - `command`: `ShellCommand`, one variant per user action
//! - `view`: the `ShellView` trait a UI implements, plus notices and updates
//! - `buffers`: the five editable text areas
//! - `font`: editor font selection

mod buffers;
mod command;
mod font;
mod session;
mod view;

pub use buffers::{BufferKind, Buffers};
pub use command::ShellCommand;
pub use font::{FontChoice, FONT_SIZES};
pub use session::SessionShell;
pub use view::{
    Notice, NoticeLevel, Panel, PanelVisibility, PathKind, PathMode, ShellView, TutorialView,
    ViewUpdate,
};

#[cfg(test)]
#[path = "shell_tests.rs"]
mod tests;
