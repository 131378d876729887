//! Guided exercises
//!
//! A tutorial is an ordered list of questions loaded wholesale from a JSON or
//! YAML file. Each question has a prompt, starting code and input, and an
//! expected-output criterion used to grade the output of a marking run.
//!
//! - `model`: `Question`, `ExpectedOutput`, `TutorialSet`, `Progress`
//! - `loader`: file parsing and validation
//! - `session`: `TutorialSession`, the load/select/mark state machine

mod loader;
mod model;
mod session;

pub use loader::{load_tutorial, parse_tutorial, TutorialFormat};
pub use model::{normalize_output, ExpectedOutput, Progress, Question, QuestionProgress, TutorialSet};
pub use session::TutorialSession;

#[cfg(test)]
#[path = "tutorial_tests.rs"]
mod tests;
