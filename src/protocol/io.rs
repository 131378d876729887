//! Control-line parsing and output stream assembly
//!
//! This module provides:
//! - `parse_directive` for graceful classification of control directives
//! - `format_directive` for producing a control line
//! - `OutputAssembler` for turning raw stdout bytes into output fragments and directives

use tracing::{debug, warn};

use super::message::ControlDirective;

/// Prefix marking a stdout line as a control directive.
/// Only recognised at the start of a line.
pub const CONTROL_PREFIX: &str = "@@runpad ";

/// Longest control line held while waiting for its newline; past this the
/// line is forwarded as plain text
pub const MAX_CONTROL_LINE: usize = 64 * 1024;

/// Maximum length for raw JSON in logs
const MAX_RAW_LOG_PREVIEW: usize = 200;

/// Get a truncated preview of raw text for logging
pub fn log_preview(raw: &str) -> (&str, usize) {
    let len = raw.len();
    if len > MAX_RAW_LOG_PREVIEW {
        let mut end = MAX_RAW_LOG_PREVIEW;
        while !raw.is_char_boundary(end) {
            end -= 1;
        }
        (&raw[..end], len)
    } else {
        (raw, len)
    }
}

/// Result of classifying a directive payload
#[derive(Debug)]
pub enum ParseResult {
    Ok(ControlDirective),
    /// JSON object without a "type" field
    MissingType { raw: String },
    /// Valid JSON with a "type" we don't recognize
    UnknownType { message_type: String, raw: String },
    /// Known type, wrong fields
    InvalidPayload {
        message_type: String,
        error: String,
        raw: String,
    },
    /// JSON syntax error
    ParseError(serde_json::Error),
}

/// Parse the JSON payload of a control line (prefix already stripped).
///
/// Parses to `serde_json::Value` once, then converts, so unknown types are
/// classified without a second parse.
pub fn parse_directive(payload: &str) -> ParseResult {
    let (preview, _) = log_preview(payload);

    let value: serde_json::Value = match serde_json::from_str(payload) {
        Ok(v) => v,
        Err(e) => return ParseResult::ParseError(e),
    };

    let msg_type = match value.get("type").and_then(|t| t.as_str()) {
        Some(t) => t.to_string(),
        None => {
            return ParseResult::MissingType {
                raw: preview.to_string(),
            }
        }
    };

    match serde_json::from_value::<ControlDirective>(value) {
        Ok(directive) => ParseResult::Ok(directive),
        Err(e) => {
            let error_str = e.to_string();
            if error_str.contains("unknown variant") {
                ParseResult::UnknownType {
                    message_type: msg_type,
                    raw: preview.to_string(),
                }
            } else {
                ParseResult::InvalidPayload {
                    message_type: msg_type,
                    error: error_str,
                    raw: preview.to_string(),
                }
            }
        }
    }
}

/// Serialize a directive as a complete control line (with trailing newline)
pub fn format_directive(directive: &ControlDirective) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(directive)?;
    Ok(format!("{}{}\n", CONTROL_PREFIX, json))
}

/// A unit produced by the assembler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Text(String),
    Control(ControlDirective),
}

/// Incremental decoder for an interpreter's stdout.
///
/// Plain text is forwarded as soon as it arrives, including partial lines,
/// so output stays live while a script runs. A line that starts with
/// [`CONTROL_PREFIX`] is held until complete and then parsed; text that
/// could still grow into the prefix is held as well. Directives that fail to
/// parse are passed through as text, as is a control line that grows past
/// [`MAX_CONTROL_LINE`] without a newline.
#[derive(Debug)]
pub struct OutputAssembler {
    pending_bytes: Vec<u8>,
    text: String,
    at_line_start: bool,
}

impl Default for OutputAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputAssembler {
    pub fn new() -> Self {
        Self {
            pending_bytes: Vec::new(),
            text: String::new(),
            at_line_start: true,
        }
    }

    /// Feed raw bytes, returning fragments that are ready
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Fragment> {
        self.pending_bytes.extend_from_slice(bytes);
        self.decode_pending();
        self.split(false)
    }

    /// Flush everything held back (end of stream)
    pub fn finish(&mut self) -> Vec<Fragment> {
        if !self.pending_bytes.is_empty() {
            let tail = std::mem::take(&mut self.pending_bytes);
            self.text.push_str(&String::from_utf8_lossy(&tail));
        }
        self.split(true)
    }

    /// Move complete UTF-8 sequences from `pending_bytes` into `text`,
    /// keeping an incomplete trailing sequence for the next read.
    fn decode_pending(&mut self) {
        loop {
            match std::str::from_utf8(&self.pending_bytes) {
                Ok(s) => {
                    self.text.push_str(s);
                    self.pending_bytes.clear();
                    return;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    self.text
                        .push_str(&String::from_utf8_lossy(&self.pending_bytes[..valid]));
                    match e.error_len() {
                        Some(bad) => {
                            self.text.push(char::REPLACEMENT_CHARACTER);
                            self.pending_bytes.drain(..valid + bad);
                        }
                        None => {
                            self.pending_bytes.drain(..valid);
                            return;
                        }
                    }
                }
            }
        }
    }

    fn split(&mut self, eof: bool) -> Vec<Fragment> {
        let mut out = Vec::new();
        while !self.text.is_empty() {
            if self.at_line_start {
                if self.text.starts_with(CONTROL_PREFIX) {
                    match self.text.find('\n') {
                        Some(idx) => {
                            let line: String = self.text.drain(..=idx).collect();
                            push_fragment(&mut out, classify_control_line(line));
                            continue;
                        }
                        None if eof => {
                            let line = std::mem::take(&mut self.text);
                            push_fragment(&mut out, classify_control_line(line));
                            break;
                        }
                        None if self.text.len() > MAX_CONTROL_LINE => {
                            let (preview, len) = log_preview(&self.text);
                            warn!(
                                raw = %preview,
                                raw_len = len,
                                "Control line exceeds limit, passing through as text"
                            );
                        }
                        None => break,
                    }
                }
                if !eof && CONTROL_PREFIX.starts_with(self.text.as_str()) {
                    break;
                }
            }

            match self.text.find('\n') {
                Some(idx) => {
                    let chunk: String = self.text.drain(..=idx).collect();
                    push_fragment(&mut out, Fragment::Text(chunk));
                    self.at_line_start = true;
                }
                None => {
                    let chunk = std::mem::take(&mut self.text);
                    push_fragment(&mut out, Fragment::Text(chunk));
                    self.at_line_start = false;
                }
            }
        }
        out
    }
}

/// Append, merging adjacent text fragments
fn push_fragment(out: &mut Vec<Fragment>, fragment: Fragment) {
    if let (Some(Fragment::Text(last)), Fragment::Text(text)) = (out.last_mut(), &fragment) {
        last.push_str(text);
        return;
    }
    out.push(fragment);
}

fn classify_control_line(line: String) -> Fragment {
    let payload = line
        .strip_prefix(CONTROL_PREFIX)
        .unwrap_or(&line)
        .trim_end_matches(['\n', '\r']);

    match parse_directive(payload) {
        ParseResult::Ok(directive) => {
            debug!(directive = ?directive, "Control directive received");
            Fragment::Control(directive)
        }
        ParseResult::UnknownType { message_type, raw } => {
            warn!(message_type = %message_type, raw = %raw, "Unknown control directive, passing through");
            Fragment::Text(line)
        }
        ParseResult::MissingType { raw } => {
            warn!(raw = %raw, "Control directive without type, passing through");
            Fragment::Text(line)
        }
        ParseResult::InvalidPayload {
            message_type,
            error,
            raw,
        } => {
            warn!(message_type = %message_type, error = %error, raw = %raw, "Invalid control directive payload");
            Fragment::Text(line)
        }
        ParseResult::ParseError(e) => {
            let (preview, len) = log_preview(payload);
            warn!(error = %e, raw = %preview, raw_len = len, "Control directive is not JSON");
            Fragment::Text(line)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Fragment {
        Fragment::Text(s.to_string())
    }

    #[test]
    fn test_plain_lines_pass_through() {
        let mut asm = OutputAssembler::new();
        assert_eq!(asm.push(b"hello\nworld\n"), vec![text("hello\nworld\n")]);
        assert!(asm.finish().is_empty());
    }

    #[test]
    fn test_partial_line_is_forwarded_immediately() {
        let mut asm = OutputAssembler::new();
        assert_eq!(asm.push(b"Enter a number: "), vec![text("Enter a number: ")]);
        // mid-line text that looks like the prefix is not a directive
        assert_eq!(asm.push(b"@@runpad x\n"), vec![text("@@runpad x\n")]);
    }

    #[test]
    fn test_control_line_becomes_directive() {
        let mut asm = OutputAssembler::new();
        let frags = asm.push(b"before\n@@runpad {\"type\":\"setCode\",\"text\":\"x = 1\"}\nafter\n");
        assert_eq!(
            frags,
            vec![
                text("before\n"),
                Fragment::Control(ControlDirective::SetCode {
                    text: "x = 1".into()
                }),
                text("after\n"),
            ]
        );
    }

    #[test]
    fn test_control_line_split_across_reads() {
        let mut asm = OutputAssembler::new();
        assert!(asm.push(b"@@run").is_empty());
        assert!(asm.push(b"pad {\"type\":\"setSearchPattern\",").is_empty());
        let frags = asm.push(b"\"pattern\":\"foo\"}\r\n");
        assert_eq!(
            frags,
            vec![Fragment::Control(ControlDirective::SetSearchPattern {
                pattern: "foo".into()
            })]
        );
    }

    #[test]
    fn test_prefix_lookalike_released_once_it_diverges() {
        let mut asm = OutputAssembler::new();
        assert!(asm.push(b"@@").is_empty());
        assert_eq!(asm.push(b"x\n"), vec![text("@@x\n")]);
    }

    #[test]
    fn test_unknown_directive_is_passed_through_as_text() {
        let mut asm = OutputAssembler::new();
        let frags = asm.push(b"@@runpad {\"type\":\"explode\"}\n");
        assert_eq!(frags, vec![text("@@runpad {\"type\":\"explode\"}\n")]);
    }

    #[test]
    fn test_multibyte_char_split_across_reads() {
        let mut asm = OutputAssembler::new();
        let bytes = "é\n".as_bytes();
        assert!(asm.push(&bytes[..1]).is_empty());
        assert_eq!(asm.push(&bytes[1..]), vec![text("é\n")]);
    }

    #[test]
    fn test_oversized_control_line_is_released_as_text() {
        let mut asm = OutputAssembler::new();
        let head = format!("{}{{\"type\":\"setOutput\",\"text\":\"", CONTROL_PREFIX);
        assert!(asm.push(head.as_bytes()).is_empty());

        let filler = "a".repeat(MAX_CONTROL_LINE);
        let released = asm.push(filler.as_bytes());
        assert_eq!(released, vec![text(&format!("{}{}", head, filler))]);

        // The rest of that line stays text, and the next line is parsed again
        let frags = asm.push(b"\"}\n@@runpad {\"type\":\"setInput\",\"text\":\"1\"}\n");
        assert_eq!(
            frags,
            vec![
                text("\"}\n"),
                Fragment::Control(ControlDirective::SetInput { text: "1".into() }),
            ]
        );
    }

    #[test]
    fn test_finish_flushes_held_prefix() {
        let mut asm = OutputAssembler::new();
        assert!(asm.push(b"@@run").is_empty());
        assert_eq!(asm.finish(), vec![text("@@run")]);
    }

    #[test]
    fn test_parse_directive_classification() {
        assert!(matches!(
            parse_directive(r#"{"type":"setInput","text":"1 2"}"#),
            ParseResult::Ok(ControlDirective::SetInput { .. })
        ));
        assert!(matches!(
            parse_directive(r#"{"text":"1"}"#),
            ParseResult::MissingType { .. }
        ));
        assert!(matches!(
            parse_directive(r#"{"type":"nope"}"#),
            ParseResult::UnknownType { .. }
        ));
        assert!(matches!(
            parse_directive(r#"{"type":"setOutput"}"#),
            ParseResult::InvalidPayload { .. }
        ));
        assert!(matches!(parse_directive("{"), ParseResult::ParseError(_)));
    }

    #[test]
    fn test_format_directive_is_parseable() {
        let directive = ControlDirective::SetOutput {
            text: "a\nb".into(),
        };
        let line = format_directive(&directive).unwrap();
        assert!(line.starts_with(CONTROL_PREFIX));
        let mut asm = OutputAssembler::new();
        assert_eq!(asm.push(line.as_bytes()), vec![Fragment::Control(directive)]);
    }

    #[test]
    fn test_log_preview_truncates_on_char_boundary() {
        let long = "é".repeat(150);
        let (preview, len) = log_preview(&long);
        assert_eq!(len, 300);
        assert!(preview.len() <= MAX_RAW_LOG_PREVIEW);
    }
}
