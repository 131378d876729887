//! Settings persistence
//!
//! Key-value store for panel visibility, window layout, editor contents and
//! font choice, kept in `settings.json` under the data directory. Saves are
//! explicit and atomic (temp file then rename). A missing file loads as
//! empty; a corrupt one loads as empty with a warning.
//!
//! Binary blobs (window geometry, dock layout) are opaque to this module and
//! stored base64-encoded. Layout blobs carry [`LAYOUT_VERSION`] and are
//! discarded on read when the version does not match.

use anyhow::Context;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, RunpadError};
use crate::logging;

/// Version tag for persisted dock layouts. Bump when panel structure changes.
pub const LAYOUT_VERSION: u32 = 1;

/// Every key the application persists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingsKey {
    ShowNote,
    ShowSnippets,
    ShowTute,
    Geometry,
    DockLocations,
    CodeBox,
    InputBox,
    OutputBox,
    SnippetBox,
    NotesBox,
    Font,
    FontSize,
}

impl SettingsKey {
    pub const ALL: [SettingsKey; 12] = [
        SettingsKey::ShowNote,
        SettingsKey::ShowSnippets,
        SettingsKey::ShowTute,
        SettingsKey::Geometry,
        SettingsKey::DockLocations,
        SettingsKey::CodeBox,
        SettingsKey::InputBox,
        SettingsKey::OutputBox,
        SettingsKey::SnippetBox,
        SettingsKey::NotesBox,
        SettingsKey::Font,
        SettingsKey::FontSize,
    ];

    /// Key as written to the settings file
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingsKey::ShowNote => "showNote",
            SettingsKey::ShowSnippets => "showSnippets",
            SettingsKey::ShowTute => "showTute",
            SettingsKey::Geometry => "geometry",
            SettingsKey::DockLocations => "dockLocations",
            SettingsKey::CodeBox => "codeBox",
            SettingsKey::InputBox => "inputBox",
            SettingsKey::OutputBox => "outputBox",
            SettingsKey::SnippetBox => "snippetBox",
            SettingsKey::NotesBox => "notesBox",
            SettingsKey::Font => "font",
            SettingsKey::FontSize => "fontSize",
        }
    }
}

/// Versioned layout blob as stored on disk
#[derive(Debug, Serialize, Deserialize)]
struct LayoutEntry {
    version: u32,
    data: String,
}

#[derive(Debug, Default)]
pub struct SettingsStore {
    /// None for an in-memory store (tests, headless runs)
    path: Option<PathBuf>,
    values: Map<String, Value>,
    dirty: bool,
}

impl SettingsStore {
    /// Load the settings file at `path`. Never fails: unreadable or corrupt
    /// files produce an empty store.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn open(path: &Path) -> Self {
        let values = match read_values(path) {
            Ok(Some(values)) => {
                debug!(keys = values.len(), "Settings loaded");
                values
            }
            Ok(None) => {
                info!("No settings file, starting empty");
                Map::new()
            }
            Err(e) => {
                warn!(error = %format!("{:#}", e), "Settings file unreadable, starting empty");
                logging::log("SETTINGS", &format!("Ignoring corrupt settings: {}", e));
                Map::new()
            }
        };
        Self {
            path: Some(path.to_path_buf()),
            values,
            dirty: false,
        }
    }

    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Whether there are changes since the last save
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn contains(&self, key: SettingsKey) -> bool {
        self.values.contains_key(key.as_str())
    }

    /// Typed read. Missing keys and values of the wrong type yield `default`.
    pub fn get<T: DeserializeOwned>(&self, key: SettingsKey, default: T) -> T {
        match self.values.get(key.as_str()) {
            Some(value) => match T::deserialize(value) {
                Ok(v) => v,
                Err(e) => {
                    debug!(key = key.as_str(), error = %e, "Setting has unexpected type, using default");
                    default
                }
            },
            None => default,
        }
    }

    pub fn set<T: Serialize>(&mut self, key: SettingsKey, value: T) {
        match serde_json::to_value(value) {
            Ok(value) => {
                if self.values.get(key.as_str()) != Some(&value) {
                    self.values.insert(key.as_str().to_string(), value);
                    self.dirty = true;
                }
            }
            Err(e) => warn!(key = key.as_str(), error = %e, "Setting not serializable"),
        }
    }

    pub fn remove(&mut self, key: SettingsKey) -> bool {
        let removed = self.values.remove(key.as_str()).is_some();
        self.dirty |= removed;
        removed
    }

    /// Opaque binary value (e.g. window geometry)
    pub fn get_blob(&self, key: SettingsKey) -> Option<Vec<u8>> {
        let encoded = self.values.get(key.as_str())?.as_str()?;
        match base64::engine::general_purpose::STANDARD.decode(encoded) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(key = key.as_str(), error = %e, "Stored blob is not valid base64");
                None
            }
        }
    }

    pub fn set_blob(&mut self, key: SettingsKey, bytes: &[u8]) {
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        self.set(key, encoded);
    }

    /// Dock layout blob, only if it was saved with the current `LAYOUT_VERSION`.
    /// A stale layout is dropped from the store.
    pub fn get_layout(&mut self) -> Option<Vec<u8>> {
        let key = SettingsKey::DockLocations;
        let value = self.values.get(key.as_str())?.clone();
        let entry = match serde_json::from_value::<LayoutEntry>(value) {
            Ok(entry) if entry.version == LAYOUT_VERSION => entry,
            Ok(entry) => {
                info!(
                    stored = entry.version,
                    current = LAYOUT_VERSION,
                    "Discarding layout saved by another version"
                );
                self.remove(key);
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Discarding malformed layout entry");
                self.remove(key);
                return None;
            }
        };
        match base64::engine::general_purpose::STANDARD.decode(entry.data) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(error = %e, "Discarding layout with invalid base64");
                self.remove(key);
                None
            }
        }
    }

    pub fn set_layout(&mut self, bytes: &[u8]) {
        let entry = LayoutEntry {
            version: LAYOUT_VERSION,
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
        };
        self.set(SettingsKey::DockLocations, entry);
    }

    /// Write the store to disk (atomic). In-memory stores succeed trivially.
    #[instrument(skip_all)]
    pub fn save(&mut self) -> Result<()> {
        let Some(path) = self.path.as_deref() else {
            self.dirty = false;
            return Ok(());
        };
        write_atomic(path, &self.values)
            .map_err(|e| RunpadError::storage(format!("cannot save {}", path.display()), e))?;
        self.dirty = false;
        debug!(path = %path.display(), "Settings saved");
        Ok(())
    }
}

fn read_values(path: &Path) -> anyhow::Result<Option<Map<String, Value>>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).context("failed to read settings file"),
    };
    if content.trim().is_empty() {
        return Ok(None);
    }
    let values: Map<String, Value> =
        serde_json::from_str(&content).context("settings file is not a JSON object")?;
    Ok(Some(values))
}

/// Temp file then rename, so a crash mid-write never truncates the settings
fn write_atomic(path: &Path, values: &Map<String, Value>) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(values).context("failed to serialize settings")?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, json).context("failed to write temp file")?;
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e).context("failed to rename temp file");
    }
    Ok(())
}
