//! runpad - a script scratchpad shell
//!
//! Runs user code on a background worker while the UI context stays
//! responsive, and keeps the session's text, snippets and tutorial progress
//! across restarts.

pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod protocol;

// Run lifecycle: controller + session state
pub mod run;

// Persistence
pub mod settings;
pub mod snippets;

pub mod tutorial;

// UI-context coordinator and the view boundary
pub mod shell;
