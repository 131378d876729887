//! Session shell
//!
//! The UI-context coordinator. Owns the stores, the run controller and the
//! buffers; turns user commands into run requests and store operations, and
//! applies worker events to visible state. Nothing here is shared with the
//! worker thread except the cancel flag inside the controller.

use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

use super::buffers::{BufferKind, Buffers};
use super::command::ShellCommand;
use super::font::{FontChoice, DEFAULT_FONT_FAMILY, DEFAULT_FONT_SIZE_INDEX};
use super::view::{
    Notice, Panel, PanelVisibility, PathKind, PathMode, ShellView, TutorialView, ViewUpdate,
};
use crate::config::Config;
use crate::error::{Result, ResultExt, RunpadError};
use crate::executor::{ProcessBackend, RunRequest, DEFAULT_BOOTSTRAP};
use crate::logging;
use crate::protocol::{RunId, RunOutcome, WorkerEvent};
use crate::run::{MarkingContext, RunController};
use crate::settings::{SettingsKey, SettingsStore};
use crate::snippets::SnippetStore;
use crate::tutorial::TutorialSession;

/// Idle wait between event polls in `run_until_idle`
const IDLE_POLL: Duration = Duration::from_millis(5);

pub struct SessionShell<V: ShellView> {
    view: V,
    controller: RunController,
    settings: SettingsStore,
    snippets: SnippetStore,
    tutorial: TutorialSession,
    buffers: Buffers,
    search_pattern: String,
    bootstrap: String,
    clear_output_on_run: bool,
    panels: PanelVisibility,
    terminal_visible: bool,
    font: FontChoice,
    selected_snippet: Option<String>,
    selected_question: Option<usize>,
    last_outcome: Option<RunOutcome>,
    shut_down: bool,
}

impl<V: ShellView> SessionShell<V> {
    /// Restore the previous session from `settings` and push it to the view
    pub fn new(
        config: &Config,
        settings: SettingsStore,
        snippets: SnippetStore,
        controller: RunController,
        mut view: V,
    ) -> Self {
        let bootstrap = load_bootstrap(config, &mut view);

        let mut buffers = Buffers::default();
        for kind in BufferKind::ALL {
            buffers.set(kind, settings.get(kind.settings_key(), String::new()));
        }
        let panels = PanelVisibility {
            notes: settings.get(SettingsKey::ShowNote, false),
            snippets: settings.get(SettingsKey::ShowSnippets, false),
            tutorial: settings.get(SettingsKey::ShowTute, false),
        };
        let font = FontChoice::from_stored(
            settings.get(SettingsKey::Font, DEFAULT_FONT_FAMILY.to_string()),
            settings.get(SettingsKey::FontSize, DEFAULT_FONT_SIZE_INDEX),
        );

        let mut shell = Self {
            view,
            controller,
            settings,
            snippets,
            tutorial: TutorialSession::new(),
            buffers,
            search_pattern: String::new(),
            bootstrap,
            clear_output_on_run: config.clear_output_on_run(),
            panels,
            // The terminal always starts hidden
            terminal_visible: false,
            font,
            selected_snippet: None,
            selected_question: None,
            last_outcome: None,
            shut_down: false,
        };
        shell.refresh_view();
        info!("Session restored");
        shell
    }

    /// Build the stores and a process-backed controller from `config`.
    ///
    /// An unavailable snippet database degrades to an in-memory one with a
    /// notice; a worker that cannot start is an error.
    #[instrument(skip_all)]
    pub fn open(config: &Config, mut view: V) -> Result<Self> {
        let settings = SettingsStore::open(&config.settings_path());
        let snippets = match SnippetStore::open(&config.snippets_db_path()) {
            Ok(store) => store,
            Err(e) => {
                warn!(error = %e, "Snippet database unavailable, using in-memory store");
                view.notify(Notice::from(&e));
                SnippetStore::open_in_memory()?
            }
        };
        let controller = RunController::spawn(Box::new(ProcessBackend::from_config(config)))?;
        Ok(Self::new(config, settings, snippets, controller, view))
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn buffer(&self, kind: BufferKind) -> &str {
        self.buffers.get(kind)
    }

    pub fn search_pattern(&self) -> &str {
        &self.search_pattern
    }

    pub fn controller(&self) -> &RunController {
        &self.controller
    }

    pub fn is_running(&self) -> bool {
        self.controller.is_running()
    }

    pub fn tutorial(&self) -> &TutorialSession {
        &self.tutorial
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    pub fn panels(&self) -> PanelVisibility {
        self.panels
    }

    pub fn terminal_visible(&self) -> bool {
        self.terminal_visible
    }

    pub fn font(&self) -> &FontChoice {
        &self.font
    }

    pub fn selected_snippet(&self) -> Option<&str> {
        self.selected_snippet.as_deref()
    }

    /// Outcome of the most recently finished run
    pub fn last_outcome(&self) -> Option<&RunOutcome> {
        self.last_outcome.as_ref()
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    pub fn handle(&mut self, command: ShellCommand) {
        debug!(command = command_name(&command), "Shell command");
        match command {
            ShellCommand::Run => self.run(),
            ShellCommand::RunSnippet => self.run_snippet(),
            ShellCommand::RunSnippetFromSelection => self.run_snippet_from_selection(),
            ShellCommand::Stop => self.stop(),
            ShellCommand::Load(kind) => self.load_buffer(kind),
            ShellCommand::Save(kind) => self.save_buffer(kind),
            ShellCommand::Clear(kind) => self.clear_buffer(kind),
            ShellCommand::Edit { kind, text } => self.buffers.set(kind, text),
            ShellCommand::AddSnippet => self.add_snippet(),
            ShellCommand::UpdateSnippet => self.update_snippet(),
            ShellCommand::RemoveSnippet => self.remove_snippet(),
            ShellCommand::LoadSnippet => self.load_snippet(),
            ShellCommand::SaveSnippets => self.save_snippets(),
            ShellCommand::SelectSnippet(name) => self.selected_snippet = name,
            ShellCommand::OpenTutorial => self.open_tutorial(),
            ShellCommand::SelectQuestion(index) => self.selected_question = index,
            ShellCommand::LoadQuestion => self.load_question(),
            ShellCommand::MarkQuestion => self.mark_question(),
            ShellCommand::ToggleTerminal => self.toggle_terminal(),
            ShellCommand::TogglePanel(panel) => self.toggle_panel(panel),
            ShellCommand::SetFont { family, size_index } => self.set_font(family, size_index),
            ShellCommand::SetWindowState { geometry, layout } => {
                self.settings.set_blob(SettingsKey::Geometry, &geometry);
                self.settings.set_layout(&layout);
            }
        }
    }

    /// Run the code buffer
    pub fn run(&mut self) {
        if !self.ensure_idle() {
            return;
        }
        if self.clear_output_on_run {
            self.replace_buffer(BufferKind::Output, String::new());
        }
        let code = self.buffers.get(BufferKind::Code).to_string();
        self.start_run(code, None);
    }

    pub fn run_snippet(&mut self) {
        if !self.ensure_idle() {
            return;
        }
        if !self
            .view
            .confirm("Are you sure you want to run this snippet (from snippet area) ?")
        {
            return;
        }
        let code = self.buffers.get(BufferKind::Snippet).to_string();
        self.start_run(code, None);
    }

    pub fn run_snippet_from_selection(&mut self) {
        if !self.ensure_idle() {
            return;
        }
        if !self
            .view
            .confirm("Are you sure you want to run this snippet (from snippet list) ?")
        {
            return;
        }
        let Some(name) = self.selected_snippet.clone() else {
            self.view.notify(Notice::warning("No snippet selected."));
            return;
        };
        match self.snippets.get(&name) {
            Ok(Some(code)) => self.start_run(code, None),
            Ok(None) => self
                .view
                .notify(Notice::warning(format!("Snippet '{}' not found.", name))),
            Err(e) => self.report(&e),
        }
    }

    pub fn stop(&mut self) {
        self.controller.cancel();
    }

    /// Report and return false while a run is active. Checked before any
    /// buffer is touched so a rejected run leaves the session as it was.
    fn ensure_idle(&mut self) -> bool {
        if !self.controller.is_running() {
            return true;
        }
        let active = self
            .controller
            .session()
            .run_id()
            .map(|id| id.to_string())
            .unwrap_or_else(|| "a run".to_string());
        self.report(&RunpadError::InvalidState(format!(
            "{} is still running",
            active
        )));
        false
    }

    fn start_run(&mut self, user_source: String, marking: Option<MarkingContext>) {
        let request = RunRequest::new(
            self.bootstrap.clone(),
            user_source,
            self.buffers.get(BufferKind::Input).to_string(),
        );
        match self.controller.submit(request, marking) {
            Ok(run_id) => debug!(run_id = %run_id, "Run dispatched"),
            Err(e) => self.report(&e),
        }
    }

    pub fn load_buffer(&mut self, kind: BufferKind) {
        if !self.buffers.is_empty(kind) {
            if kind.offers_save_before_load() {
                let question = format!("Would you like to save {} ?", kind.label());
                if self.view.confirm(&question) {
                    self.save_buffer(kind);
                }
            } else {
                let question = format!(
                    "Are you sure you want to replace {} ? Current content will be lost.",
                    kind.label()
                );
                if !self.view.confirm(&question) {
                    return;
                }
            }
        }

        let Some(path) = self.view.choose_path(kind.path_kind(), PathMode::Open) else {
            return;
        };
        match read_text(&path) {
            Ok(text) => {
                self.save_before_overwrite();
                self.replace_buffer(kind, text);
            }
            Err(e) => self.report(&e),
        }
    }

    pub fn save_buffer(&mut self, kind: BufferKind) {
        let Some(path) = self.view.choose_path(kind.path_kind(), PathMode::Save) else {
            return;
        };
        match std::fs::write(&path, self.buffers.get(kind)) {
            Ok(()) => info!(path = %path.display(), buffer = kind.label(), "Buffer saved"),
            Err(source) => self.report(&RunpadError::Io {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    pub fn clear_buffer(&mut self, kind: BufferKind) {
        let question = format!("Are you sure you want to clear {} ?", kind.label());
        if self.view.confirm(&question) {
            self.save_before_overwrite();
            self.replace_buffer(kind, String::new());
        }
    }

    // ------------------------------------------------------------------
    // Snippets
    // ------------------------------------------------------------------

    pub fn add_snippet(&mut self) {
        if self.buffers.is_empty(BufferKind::Snippet) {
            self.view
                .notify(Notice::warning("Snippet area is empty, nothing to add."));
            return;
        }
        let name = match self.view.prompt_text("Snippet name:") {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            Some(_) => {
                self.view
                    .notify(Notice::warning("Snippet name must not be empty."));
                return;
            }
            None => return,
        };

        match self.snippets.exists_conflict(&name) {
            Ok(true) => {
                if !self
                    .view
                    .confirm("This snippet already exists, do you want to overwrite ?")
                {
                    return;
                }
            }
            Ok(false) => {}
            Err(e) => {
                self.report(&e);
                return;
            }
        }

        let body = self.buffers.get(BufferKind::Snippet).to_string();
        match self.snippets.upsert(&name, &body) {
            Ok(()) => {
                self.view.notify(Notice::info("Snippet added."));
                self.selected_snippet = Some(name);
            }
            Err(e) => self.report(&e),
        }
        self.refresh_snippet_list();
    }

    pub fn update_snippet(&mut self) {
        if self.buffers.is_empty(BufferKind::Snippet) {
            return;
        }
        let Some(name) = self.selected_snippet.clone() else {
            self.view.notify(Notice::warning("No snippet selected."));
            return;
        };
        if !self
            .view
            .confirm("Are you sure you want to overwrite selected snippet ?")
        {
            return;
        }
        let body = self.buffers.get(BufferKind::Snippet).to_string();
        match self.snippets.upsert(&name, &body) {
            Ok(()) => self.view.notify(Notice::info("Snippet updated.")),
            Err(e) => self.report(&e),
        }
        self.refresh_snippet_list();
    }

    pub fn remove_snippet(&mut self) {
        let Some(name) = self.selected_snippet.clone() else {
            self.view.notify(Notice::warning("No snippet selected."));
            return;
        };
        if !self
            .view
            .confirm("Are you sure you want to delete the selected snippet ?")
        {
            return;
        }
        match self.snippets.remove(&name) {
            Ok(true) => {
                self.selected_snippet = None;
                self.view.notify(Notice::info("Snippet removed."));
            }
            Ok(false) => self
                .view
                .notify(Notice::warning(format!("Snippet '{}' not found.", name))),
            Err(e) => self.report(&e),
        }
        self.refresh_snippet_list();
    }

    pub fn load_snippet(&mut self) {
        let Some(name) = self.selected_snippet.clone() else {
            self.view.notify(Notice::warning("No snippet selected."));
            return;
        };
        if !self
            .view
            .confirm("Are you sure you want to load snippet to snippet area ?")
        {
            return;
        }
        match self.snippets.get(&name) {
            Ok(Some(body)) => {
                self.save_before_overwrite();
                self.replace_buffer(BufferKind::Snippet, body);
            }
            Ok(None) => self
                .view
                .notify(Notice::warning(format!("Snippet '{}' not found.", name))),
            Err(e) => self.report(&e),
        }
    }

    pub fn save_snippets(&mut self) {
        match self.snippets.flush() {
            Ok(()) => self.view.notify(Notice::info("Snippets database saved.")),
            Err(e) => self.report(&e),
        }
    }

    pub fn snippet_names(&self) -> Result<Vec<String>> {
        self.snippets.list()
    }

    fn refresh_snippet_list(&mut self) {
        match self.snippets.list() {
            Ok(names) => self.view.render(ViewUpdate::SnippetsChanged(names)),
            Err(e) => self.report(&e),
        }
    }

    // ------------------------------------------------------------------
    // Tutorial
    // ------------------------------------------------------------------

    pub fn open_tutorial(&mut self) {
        if !self.view.confirm(
            "Are you sure you want to load a tute, this will reset current progress (if any) ?",
        ) {
            return;
        }
        let Some(path) = self.view.choose_path(PathKind::Tutorial, PathMode::Open) else {
            return;
        };
        self.open_tutorial_path(&path);
    }

    /// Load a tutorial file without prompting. Prior state survives a failure.
    pub fn open_tutorial_path(&mut self, path: &Path) -> bool {
        match self.tutorial.load(path) {
            Ok(()) => {
                self.selected_question = None;
                logging::log("TUTE", &format!("Loaded {}", path.display()));
                self.render_tutorial();
                true
            }
            Err(e) => {
                self.report(&e);
                false
            }
        }
    }

    /// Put the selected question's prompt, code and input into the buffers
    pub fn load_question(&mut self) {
        if !self.view.confirm(
            "Are you sure you want to load a question, this will reset current progress (if any) ?",
        ) {
            return;
        }
        let Some(index) = self.selected_question else {
            return;
        };
        let question = match self.tutorial.select_question(index) {
            Ok(q) => q.clone(),
            Err(e) => {
                self.report(&e);
                return;
            }
        };
        self.save_before_overwrite();
        self.replace_buffer(BufferKind::Input, question.starting_input);
        self.replace_buffer(BufferKind::Notes, question.prompt);
        self.replace_buffer(BufferKind::Code, question.starting_code);
        self.render_tutorial();
    }

    /// Run the code buffer against the selected question's input and grade
    /// the output when the run ends
    pub fn mark_question(&mut self) {
        let Some(index) = self.selected_question else {
            return;
        };
        let starting_input = match self.tutorial.question(index) {
            Some(q) => q.starting_input.clone(),
            None => {
                self.report(&RunpadError::InvalidState(
                    "select a question from a loaded tutorial first".to_string(),
                ));
                return;
            }
        };
        if !self.ensure_idle() {
            return;
        }
        self.save_before_overwrite();
        self.replace_buffer(BufferKind::Input, starting_input);
        self.replace_buffer(BufferKind::Output, String::new());
        let code = self.buffers.get(BufferKind::Code).to_string();
        self.start_run(
            code,
            Some(MarkingContext {
                question_index: index,
            }),
        );
    }

    fn render_tutorial(&mut self) {
        let Some(set) = self.tutorial.set() else {
            return;
        };
        let titles = set.questions.iter().map(|q| q.title.clone()).collect();
        let marks = self
            .tutorial
            .progress()
            .map(|p| {
                p.entries()
                    .iter()
                    .map(|e| e.marked.then_some(e.passed))
                    .collect()
            })
            .unwrap_or_default();
        let update = TutorialView {
            titles,
            marks,
            current: self.tutorial.current(),
            score: self.tutorial.score(),
        };
        self.view.render(ViewUpdate::TutorialChanged(update));
    }

    // ------------------------------------------------------------------
    // Panels and appearance
    // ------------------------------------------------------------------

    pub fn toggle_terminal(&mut self) {
        self.terminal_visible = !self.terminal_visible;
        self.view
            .render(ViewUpdate::TerminalToggled(self.terminal_visible));
    }

    pub fn toggle_panel(&mut self, panel: Panel) {
        let visible = !self.panels.get(panel);
        self.panels.set(panel, visible);
        self.view.render(ViewUpdate::PanelsChanged(self.panels));
    }

    pub fn set_font(&mut self, family: String, size_index: i32) {
        self.font = FontChoice::from_stored(family, size_index);
        self.render_font();
    }

    fn render_font(&mut self) {
        self.view.render(ViewUpdate::FontChanged {
            family: self.font.family.clone(),
            point_size: self.font.point_size(),
        });
    }

    /// Push the complete state to the view
    pub fn refresh_view(&mut self) {
        for kind in BufferKind::ALL {
            let text = self.buffers.get(kind).to_string();
            self.view.render(ViewUpdate::BufferReplaced { kind, text });
        }
        self.view.render(ViewUpdate::PanelsChanged(self.panels));
        self.view
            .render(ViewUpdate::TerminalToggled(self.terminal_visible));
        self.view
            .render(ViewUpdate::ControlsChanged(self.controller.controls()));
        self.render_font();
        self.render_window_state();
        self.refresh_snippet_list();
        self.render_tutorial();
    }

    /// Hand the stored geometry and dock layout back to the view. A layout
    /// written by another version is dropped from the store.
    fn render_window_state(&mut self) {
        let geometry = self.settings.get_blob(SettingsKey::Geometry);
        let layout = self.settings.get_layout();
        if geometry.is_none() && layout.is_none() {
            return;
        }
        debug!(
            geometry = geometry.is_some(),
            layout = layout.is_some(),
            "Window state restored"
        );
        self.view
            .render(ViewUpdate::WindowStateRestored { geometry, layout });
    }

    // ------------------------------------------------------------------
    // Worker events
    // ------------------------------------------------------------------

    /// Apply every waiting worker event. Never blocks. Returns how many ran.
    pub fn pump_events(&mut self) -> usize {
        let mut applied = 0;
        while let Some(event) = self.controller.try_next_event() {
            self.apply_event(event);
            applied += 1;
        }
        applied
    }

    /// Pump events until no run is active. Returns false on timeout.
    pub fn run_until_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.pump_events();
            if !self.controller.is_running() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(IDLE_POLL);
        }
    }

    fn apply_event(&mut self, event: WorkerEvent) {
        let run_id = event.run_id();
        if self.controller.session().run_id() != Some(run_id) {
            debug!(run_id = %run_id, kind = event.kind(), "Dropping event from stale run");
            return;
        }
        match event {
            WorkerEvent::StartRun { run_id } => self.on_start_run(run_id),
            WorkerEvent::Output { text, .. } => {
                self.buffers.append_output(&text);
                self.view.render(ViewUpdate::OutputAppended(text));
            }
            WorkerEvent::SetCode { text, .. } => self.replace_buffer(BufferKind::Code, text),
            WorkerEvent::SetInput { text, .. } => self.replace_buffer(BufferKind::Input, text),
            WorkerEvent::SetOutput { text, .. } => self.replace_buffer(BufferKind::Output, text),
            WorkerEvent::SetSearchPattern { pattern, .. } => {
                self.search_pattern = pattern.clone();
                self.view
                    .render(ViewUpdate::SearchPatternChanged(pattern));
            }
            WorkerEvent::EndRun { run_id, outcome } => self.on_end_run(run_id, outcome),
        }
    }

    fn on_start_run(&mut self, run_id: RunId) {
        // Back up typed content before the script can touch anything
        self.save_before_overwrite();
        if self.controller.on_start_run(run_id) {
            self.view
                .render(ViewUpdate::ControlsChanged(self.controller.controls()));
        }
    }

    fn on_end_run(&mut self, run_id: RunId, outcome: RunOutcome) {
        let mut graded = None;
        if !self
            .controller
            .on_end_run(run_id, |index| graded = Some(index))
        {
            return;
        }
        debug!(run_id = %run_id, outcome = outcome.as_str(), "Run ended");
        self.last_outcome = Some(outcome);

        if let Some(index) = graded {
            let output = self.buffers.get(BufferKind::Output).to_string();
            match self.tutorial.mark(index, &output) {
                Ok(passed) => {
                    let message = if passed {
                        format!("Question {} passed.", index + 1)
                    } else {
                        format!("Question {} failed.", index + 1)
                    };
                    self.view.notify(Notice::info(message));
                    self.render_tutorial();
                }
                Err(e) => self.report(&e),
            }
        }
        self.view
            .render(ViewUpdate::ControlsChanged(self.controller.controls()));
    }

    // ------------------------------------------------------------------
    // Persistence and teardown
    // ------------------------------------------------------------------

    /// Write buffers, panels and font to the settings store and save it
    pub fn save_content(&mut self) -> Result<()> {
        for kind in BufferKind::ALL {
            self.settings
                .set(kind.settings_key(), self.buffers.get(kind));
        }
        self.settings.set(SettingsKey::ShowNote, self.panels.notes);
        self.settings
            .set(SettingsKey::ShowSnippets, self.panels.snippets);
        self.settings
            .set(SettingsKey::ShowTute, self.panels.tutorial);
        self.settings.set(SettingsKey::Font, &self.font.family);
        self.settings
            .set(SettingsKey::FontSize, self.font.size_index as i64);
        self.settings.save()
    }

    /// Persist the session ahead of a load, clear or run that replaces buffer text
    fn save_before_overwrite(&mut self) {
        if let Err(e) = self.save_content() {
            self.report(&e);
        }
    }

    /// Save content, cancel any run, stop and join the worker. Idempotent.
    #[instrument(skip_all)]
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        if let Err(e) = self.save_content() {
            self.report(&e);
        }
        self.controller.shutdown();
        self.snippets.flush().warn_on_err();
        info!("Session shut down");
    }

    fn replace_buffer(&mut self, kind: BufferKind, text: String) {
        self.buffers.set(kind, text.clone());
        self.view.render(ViewUpdate::BufferReplaced { kind, text });
    }

    fn report(&mut self, err: &RunpadError) {
        warn!(error = %err, severity = ?err.severity(), "Shell operation failed");
        self.view.notify(Notice::from(err));
    }
}

impl<V: ShellView> Drop for SessionShell<V> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn load_bootstrap<V: ShellView>(config: &Config, view: &mut V) -> String {
    let Some(path) = config.bootstrap_path() else {
        return DEFAULT_BOOTSTRAP.to_string();
    };
    match std::fs::read_to_string(&path) {
        Ok(source) => {
            info!(path = %path.display(), "Custom bootstrap loaded");
            source
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Bootstrap unreadable, using built-in");
            view.notify(Notice::from(&RunpadError::Config(format!(
                "cannot read bootstrap {}, using the built-in one",
                path.display()
            ))));
            DEFAULT_BOOTSTRAP.to_string()
        }
    }
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| RunpadError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Command name without payloads, for logs
fn command_name(command: &ShellCommand) -> &'static str {
    match command {
        ShellCommand::Run => "run",
        ShellCommand::RunSnippet => "runSnippet",
        ShellCommand::RunSnippetFromSelection => "runSnippetFromSelection",
        ShellCommand::Stop => "stop",
        ShellCommand::Load(_) => "load",
        ShellCommand::Save(_) => "save",
        ShellCommand::Clear(_) => "clear",
        ShellCommand::Edit { .. } => "edit",
        ShellCommand::AddSnippet => "addSnippet",
        ShellCommand::UpdateSnippet => "updateSnippet",
        ShellCommand::RemoveSnippet => "removeSnippet",
        ShellCommand::LoadSnippet => "loadSnippet",
        ShellCommand::SaveSnippets => "saveSnippets",
        ShellCommand::SelectSnippet(_) => "selectSnippet",
        ShellCommand::OpenTutorial => "openTutorial",
        ShellCommand::SelectQuestion(_) => "selectQuestion",
        ShellCommand::LoadQuestion => "loadQuestion",
        ShellCommand::MarkQuestion => "markQuestion",
        ShellCommand::ToggleTerminal => "toggleTerminal",
        ShellCommand::TogglePanel(_) => "togglePanel",
        ShellCommand::SetFont { .. } => "setFont",
        ShellCommand::SetWindowState { .. } => "setWindowState",
    }
}
