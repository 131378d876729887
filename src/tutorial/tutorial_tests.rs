use super::*;
use crate::error::RunpadError;
use std::fs;
use tempfile::TempDir;

const THREE_QUESTIONS: &str = r##"{
    "title": "Basics",
    "questions": [
        { "title": "Hello", "prompt": "Print hello", "expected": { "exact": "hello" } },
        {
            "prompt": "Print the expected text",
            "startingCode": "# write here",
            "startingInput": "1 2",
            "expected": { "exact": "expected text" }
        },
        { "prompt": "Print a number", "expected": { "pattern": "^\\d+$" } }
    ]
}"##;

fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_three_question_scenario() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "basics.json", THREE_QUESTIONS);

    let mut session = TutorialSession::new();
    session.load(&path).unwrap();
    assert_eq!(session.set().unwrap().len(), 3);
    assert_eq!(session.current(), None);

    let question = session.select_question(1).unwrap();
    assert_eq!(question.title, "Question 2");
    assert_eq!(question.starting_code, "# write here");
    assert_eq!(question.starting_input, "1 2");
    assert_eq!(session.current(), Some(1));

    let before = session.score();
    assert!(session.mark(1, "expected text").unwrap());
    assert_eq!(session.score(), before + 1);
    assert_eq!(
        session.progress().unwrap().get(1),
        Some(QuestionProgress {
            marked: true,
            passed: true
        })
    );
}

#[test]
fn test_remarking_a_pass_does_not_double_count() {
    let mut session = TutorialSession::new();
    session.replace(parse_tutorial(THREE_QUESTIONS, TutorialFormat::Json).unwrap());
    assert!(session.mark(0, "hello\n").unwrap());
    assert!(session.mark(0, "hello").unwrap());
    assert_eq!(session.score(), 1);

    // A later failure withdraws the pass
    assert!(!session.mark(0, "goodbye").unwrap());
    assert_eq!(session.score(), 0);
    assert!(session.progress().unwrap().get(0).unwrap().marked);
}

#[test]
fn test_exact_match_ignores_line_endings_and_trailing_space() {
    let expected = ExpectedOutput::Exact("1\n2\n3".to_string());
    assert!(expected.matches("1  \r\n2\r\n3\r\n\r\n"));
    assert!(!expected.matches("1\n2\n"));
    assert!(!expected.matches(" 1\n2\n3"));
    assert_eq!(normalize_output("a \r\nb\t\n\n"), "a\nb");
}

#[test]
fn test_pattern_criterion() {
    let mut session = TutorialSession::new();
    session.replace(parse_tutorial(THREE_QUESTIONS, TutorialFormat::Json).unwrap());
    assert!(session.mark(2, "42").unwrap());
    assert!(!session.mark(2, "forty-two").unwrap());
}

#[test]
fn test_failed_load_preserves_prior_state() {
    let dir = TempDir::new().unwrap();
    let good = write(&dir, "good.json", THREE_QUESTIONS);
    let bad = write(&dir, "bad.json", "{ \"questions\": [ { \"prompt\": ");

    let mut session = TutorialSession::new();
    session.load(&good).unwrap();
    session.select_question(1).unwrap();
    session.mark(1, "expected text").unwrap();

    let err = session.load(&bad).unwrap_err();
    assert!(matches!(err, RunpadError::Parse { .. }));
    assert_eq!(session.set().unwrap().len(), 3);
    assert_eq!(session.current(), Some(1));
    assert_eq!(session.score(), 1);
}

#[test]
fn test_successful_reload_resets_progress() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "basics.json", THREE_QUESTIONS);
    let mut session = TutorialSession::new();
    session.load(&path).unwrap();
    session.mark(0, "hello").unwrap();
    session.load(&path).unwrap();
    assert_eq!(session.score(), 0);
    assert_eq!(session.current(), None);
}

#[test]
fn test_yaml_tutorial() {
    let yaml = r#"
title: Loops
questions:
  - title: Count up
    prompt: Print 1 to 3
    startingCode: "for i in range(1, 4):\n    pass"
    expected:
      exact: "1\n2\n3"
  - prompt: Print anything numeric
    expected:
      pattern: '^\d+$'
"#;
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "loops.yml", yaml);
    let set = load_tutorial(&path).unwrap();
    assert_eq!(set.title.as_deref(), Some("Loops"));
    assert_eq!(set.questions[0].title, "Count up");
    assert_eq!(set.questions[1].expected.kind(), "pattern");
    assert_eq!(set.source.as_deref(), Some(path.as_path()));

    let mut session = TutorialSession::new();
    session.load(&path).unwrap();
    assert!(session.mark(0, "1\n2\n3\n").unwrap());
    assert!(session.mark(1, "42").unwrap());
    assert!(!session.mark(1, "forty-two").unwrap());
    assert_eq!(session.score(), 1);
}

#[test]
fn test_invalid_pattern_and_empty_set_are_parse_errors() {
    let bad_regex = r#"{ "questions": [ { "prompt": "p", "expected": { "pattern": "(" } } ] }"#;
    let err = parse_tutorial(bad_regex, TutorialFormat::Json).unwrap_err();
    assert!(err.contains("invalid pattern"));

    let empty = r#"{ "questions": [] }"#;
    assert!(parse_tutorial(empty, TutorialFormat::Json).is_err());

    let unknown_criterion = r#"{ "questions": [ { "prompt": "p", "expected": { "fuzzy": "x" } } ] }"#;
    assert!(parse_tutorial(unknown_criterion, TutorialFormat::Json).is_err());
}

#[test]
fn test_operations_require_loaded_set_and_valid_index() {
    let mut session = TutorialSession::new();
    assert!(matches!(
        session.select_question(0),
        Err(RunpadError::InvalidState(_))
    ));
    assert!(matches!(
        session.mark(0, ""),
        Err(RunpadError::InvalidState(_))
    ));

    session.replace(parse_tutorial(THREE_QUESTIONS, TutorialFormat::Json).unwrap());
    assert!(session.select_question(3).is_err());
    assert!(session.mark(5, "").is_err());
    assert_eq!(session.current(), None);
}

#[test]
fn test_unreadable_file_is_parse_error_with_path() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.json");
    match load_tutorial(&missing) {
        Err(err @ RunpadError::Parse { .. }) => {
            assert!(err.user_message().contains("missing.json"));
        }
        other => panic!("expected parse error, got {:?}", other.map(|s| s.len())),
    }
}
