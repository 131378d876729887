//! Tutorial state machine
//!
//! Unloaded -> `load` -> Loaded (no current question) -> `select_question(i)`
//! -> QuestionActive(i) -> `mark(i, output)` -> graded, and so on. A failed
//! load leaves the previous set and its progress untouched; a successful one
//! resets progress.

use std::path::Path;
use tracing::{debug, info};

use super::loader::load_tutorial;
use super::model::{Progress, Question, TutorialSet};
use crate::error::{Result, RunpadError};

#[derive(Debug)]
struct Loaded {
    set: TutorialSet,
    progress: Progress,
    current: Option<usize>,
}

#[derive(Debug, Default)]
pub struct TutorialSession {
    loaded: Option<Loaded>,
}

impl TutorialSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a file, replacing the current set on success only
    pub fn load(&mut self, path: &Path) -> Result<()> {
        let set = load_tutorial(path)?;
        self.replace(set);
        Ok(())
    }

    /// Install an already-parsed set, resetting progress
    pub fn replace(&mut self, set: TutorialSet) {
        info!(questions = set.len(), title = ?set.title, "Tutorial set installed");
        let progress = Progress::new(set.len());
        self.loaded = Some(Loaded {
            set,
            progress,
            current: None,
        });
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    pub fn set(&self) -> Option<&TutorialSet> {
        self.loaded.as_ref().map(|l| &l.set)
    }

    pub fn progress(&self) -> Option<&Progress> {
        self.loaded.as_ref().map(|l| &l.progress)
    }

    pub fn current(&self) -> Option<usize> {
        self.loaded.as_ref().and_then(|l| l.current)
    }

    pub fn question(&self, index: usize) -> Option<&Question> {
        self.loaded.as_ref()?.set.questions.get(index)
    }

    /// Number of questions currently passed (0 when unloaded)
    pub fn score(&self) -> usize {
        self.loaded.as_ref().map_or(0, |l| l.progress.score())
    }

    /// Make question `index` current and return it
    pub fn select_question(&mut self, index: usize) -> Result<&Question> {
        let loaded = self.loaded_mut()?;
        if index >= loaded.set.len() {
            return Err(RunpadError::InvalidState(format!(
                "question {} out of range (tutorial has {})",
                index + 1,
                loaded.set.len()
            )));
        }
        loaded.current = Some(index);
        debug!(index, "Question selected");
        Ok(&loaded.set.questions[index])
    }

    /// Grade `output` for question `index`, record the result, return pass/fail
    pub fn mark(&mut self, index: usize, output: &str) -> Result<bool> {
        let loaded = self.loaded_mut()?;
        let question = loaded.set.questions.get(index).ok_or_else(|| {
            RunpadError::InvalidState(format!("question {} out of range", index + 1))
        })?;
        let passed = question.expected.matches(output);
        loaded.progress.record(index, passed);
        info!(
            index,
            passed,
            criterion = question.expected.kind(),
            score = loaded.progress.score(),
            "Question marked"
        );
        Ok(passed)
    }

    fn loaded_mut(&mut self) -> Result<&mut Loaded> {
        self.loaded
            .as_mut()
            .ok_or_else(|| RunpadError::InvalidState("no tutorial loaded".to_string()))
    }
}
