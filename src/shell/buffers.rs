use crate::settings::SettingsKey;

use super::view::PathKind;

/// The editable text areas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    Code,
    Input,
    Output,
    Snippet,
    Notes,
}

impl BufferKind {
    pub const ALL: [BufferKind; 5] = [
        BufferKind::Code,
        BufferKind::Input,
        BufferKind::Output,
        BufferKind::Snippet,
        BufferKind::Notes,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            BufferKind::Code => "code",
            BufferKind::Input => "input",
            BufferKind::Output => "output",
            BufferKind::Snippet => "snippet area",
            BufferKind::Notes => "notes",
        }
    }

    pub fn settings_key(&self) -> SettingsKey {
        match self {
            BufferKind::Code => SettingsKey::CodeBox,
            BufferKind::Input => SettingsKey::InputBox,
            BufferKind::Output => SettingsKey::OutputBox,
            BufferKind::Snippet => SettingsKey::SnippetBox,
            BufferKind::Notes => SettingsKey::NotesBox,
        }
    }

    pub fn path_kind(&self) -> PathKind {
        match self {
            BufferKind::Code | BufferKind::Snippet => PathKind::Script,
            BufferKind::Input | BufferKind::Output | BufferKind::Notes => PathKind::Text,
        }
    }

    /// Loading over unsaved work offers to save it first; for the others the
    /// user just confirms the overwrite.
    pub fn offers_save_before_load(&self) -> bool {
        matches!(self, BufferKind::Code | BufferKind::Snippet | BufferKind::Notes)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buffers {
    code: String,
    input: String,
    output: String,
    snippet: String,
    notes: String,
}

impl Buffers {
    pub fn get(&self, kind: BufferKind) -> &str {
        match kind {
            BufferKind::Code => &self.code,
            BufferKind::Input => &self.input,
            BufferKind::Output => &self.output,
            BufferKind::Snippet => &self.snippet,
            BufferKind::Notes => &self.notes,
        }
    }

    fn slot(&mut self, kind: BufferKind) -> &mut String {
        match kind {
            BufferKind::Code => &mut self.code,
            BufferKind::Input => &mut self.input,
            BufferKind::Output => &mut self.output,
            BufferKind::Snippet => &mut self.snippet,
            BufferKind::Notes => &mut self.notes,
        }
    }

    pub fn set(&mut self, kind: BufferKind, text: impl Into<String>) {
        *self.slot(kind) = text.into();
    }

    pub fn clear(&mut self, kind: BufferKind) {
        self.slot(kind).clear();
    }

    pub fn append_output(&mut self, text: &str) {
        self.output.push_str(text);
    }

    pub fn is_empty(&self, kind: BufferKind) -> bool {
        self.get(kind).is_empty()
    }
}
