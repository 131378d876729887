use regex::Regex;
use std::path::PathBuf;

/// Grading criterion for a question's output
#[derive(Debug, Clone)]
pub enum ExpectedOutput {
    /// Output must equal this text after [`normalize_output`] on both sides
    Exact(String),
    /// Output must contain a match for this pattern
    Pattern(Regex),
}

impl ExpectedOutput {
    pub fn matches(&self, output: &str) -> bool {
        match self {
            ExpectedOutput::Exact(expected) => {
                normalize_output(expected) == normalize_output(output)
            }
            ExpectedOutput::Pattern(re) => re.is_match(&output.replace("\r\n", "\n")),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ExpectedOutput::Exact(_) => "exact",
            ExpectedOutput::Pattern(_) => "pattern",
        }
    }
}

/// Normalise line endings to `\n`, strip trailing whitespace from every line
/// and drop trailing blank lines.
pub fn normalize_output(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");
    let lines: Vec<&str> = unified.lines().map(str::trim_end).collect();
    let end = lines
        .iter()
        .rposition(|line| !line.is_empty())
        .map_or(0, |i| i + 1);
    lines[..end].join("\n")
}

#[derive(Debug, Clone)]
pub struct Question {
    pub title: String,
    /// Shown in the notes panel when the question is loaded
    pub prompt: String,
    pub starting_code: String,
    pub starting_input: String,
    pub expected: ExpectedOutput,
}

#[derive(Debug, Clone)]
pub struct TutorialSet {
    pub title: Option<String>,
    pub source: Option<PathBuf>,
    pub questions: Vec<Question>,
}

impl TutorialSet {
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuestionProgress {
    pub marked: bool,
    pub passed: bool,
}

/// Per-question marks for the loaded set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Progress {
    entries: Vec<QuestionProgress>,
}

impl Progress {
    pub fn new(len: usize) -> Self {
        Self {
            entries: vec![QuestionProgress::default(); len],
        }
    }

    pub fn get(&self, index: usize) -> Option<QuestionProgress> {
        self.entries.get(index).copied()
    }

    pub fn entries(&self) -> &[QuestionProgress] {
        &self.entries
    }

    pub(crate) fn record(&mut self, index: usize, passed: bool) {
        if let Some(entry) = self.entries.get_mut(index) {
            entry.marked = true;
            entry.passed = passed;
        }
    }

    /// Number of questions currently passed
    pub fn score(&self) -> usize {
        self.entries.iter().filter(|e| e.passed).count()
    }

    pub fn total(&self) -> usize {
        self.entries.len()
    }
}
