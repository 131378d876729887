use super::buffers::BufferKind;
use super::view::Panel;

/// Every user action the shell understands, one per control in the UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    /// Run the code buffer
    Run,
    /// Run the snippet area
    RunSnippet,
    /// Run the snippet selected in the snippet list
    RunSnippetFromSelection,
    Stop,
    Load(BufferKind),
    Save(BufferKind),
    Clear(BufferKind),
    /// The user typed into a buffer
    Edit { kind: BufferKind, text: String },
    AddSnippet,
    UpdateSnippet,
    RemoveSnippet,
    LoadSnippet,
    SaveSnippets,
    SelectSnippet(Option<String>),
    OpenTutorial,
    SelectQuestion(Option<usize>),
    LoadQuestion,
    MarkQuestion,
    ToggleTerminal,
    TogglePanel(Panel),
    SetFont { family: String, size_index: i32 },
    /// Opaque window geometry and dock layout captured by the view
    SetWindowState { geometry: Vec<u8>, layout: Vec<u8> },
}
