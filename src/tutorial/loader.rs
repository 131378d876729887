//! Tutorial file parsing
//!
//! Accepted shape (JSON or YAML):
//!
//! ```yaml
//! title: Loops
//! questions:
//!   - title: Count up
//!     prompt: Print 1 to 3, one per line.
//!     startingCode: "# your code here"
//!     startingInput: ""
//!     expected:
//!       exact: "1\n2\n3"
//! ```
//!
//! `expected` is either `{ exact: "..." }` or `{ pattern: "..." }`.

use regex::Regex;
use serde::Deserialize;
use std::path::Path;
use tracing::{info, instrument, warn};

use super::model::{ExpectedOutput, Question, TutorialSet};
use crate::error::{Result, RunpadError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TutorialFormat {
    Json,
    Yaml,
}

impl TutorialFormat {
    /// `.yaml` / `.yml` are YAML, everything else is read as JSON
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("yaml") | Some("yml") => TutorialFormat::Yaml,
            _ => TutorialFormat::Json,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TutorialFile {
    #[serde(default)]
    title: Option<String>,
    questions: Vec<QuestionFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuestionFile {
    #[serde(default)]
    title: Option<String>,
    prompt: String,
    #[serde(default)]
    starting_code: String,
    #[serde(default)]
    starting_input: String,
    /// `{ exact: ... }` or `{ pattern: ... }`; a plain map in both JSON and YAML
    #[serde(with = "serde_yaml::with::singleton_map")]
    expected: ExpectedFile,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ExpectedFile {
    Exact(String),
    Pattern(String),
}

/// Read and validate a tutorial file
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_tutorial(path: &Path) -> Result<TutorialSet> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        warn!(error = %e, "Cannot read tutorial file");
        RunpadError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        }
    })?;

    let mut set = parse_tutorial(&content, TutorialFormat::from_path(path)).map_err(|message| {
        warn!(error = %message, "Tutorial file rejected");
        RunpadError::Parse {
            path: path.display().to_string(),
            message,
        }
    })?;
    set.source = Some(path.to_path_buf());
    info!(questions = set.len(), "Tutorial loaded");
    Ok(set)
}

/// Parse tutorial text. The error is a human-readable reason.
pub fn parse_tutorial(content: &str, format: TutorialFormat) -> std::result::Result<TutorialSet, String> {
    let file: TutorialFile = match format {
        TutorialFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string())?,
        TutorialFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string())?,
    };

    if file.questions.is_empty() {
        return Err("tutorial has no questions".to_string());
    }

    let questions = file
        .questions
        .into_iter()
        .enumerate()
        .map(|(i, q)| {
            let expected = match q.expected {
                ExpectedFile::Exact(text) => ExpectedOutput::Exact(text),
                ExpectedFile::Pattern(pattern) => ExpectedOutput::Pattern(
                    Regex::new(&pattern)
                        .map_err(|e| format!("question {}: invalid pattern: {}", i + 1, e))?,
                ),
            };
            Ok(Question {
                title: q
                    .title
                    .filter(|t| !t.trim().is_empty())
                    .unwrap_or_else(|| format!("Question {}", i + 1)),
                prompt: q.prompt,
                starting_code: q.starting_code,
                starting_input: q.starting_input,
                expected,
            })
        })
        .collect::<std::result::Result<Vec<_>, String>>()?;

    Ok(TutorialSet {
        title: file.title,
        source: None,
        questions,
    })
}
