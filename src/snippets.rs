//! Snippet storage
//!
//! SQLite-backed named-text store. Names are unique keys; `upsert` creates or
//! overwrites. Every failure of the database maps to
//! `RunpadError::StorageUnavailable`; a missing name is not an error.

use anyhow::Context;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

use crate::error::{Result, RunpadError};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS snippets (
    name TEXT PRIMARY KEY,
    body TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;

pub struct SnippetStore {
    conn: Connection,
    /// None for in-memory databases
    path: Option<PathBuf>,
}

impl SnippetStore {
    /// Open (creating if needed) the snippet database at `path`
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn open(path: &Path) -> Result<Self> {
        let conn = open_file(path)
            .map_err(|e| RunpadError::storage(format!("cannot open {}", path.display()), e))?;
        info!("Snippet database opened");
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .context("failed to open in-memory database")
            .and_then(|conn| {
                conn.execute_batch(SCHEMA)
                    .context("failed to create snippets table")?;
                Ok(conn)
            })
            .map_err(|e| RunpadError::storage("cannot open in-memory snippet database", e))?;
        Ok(Self { conn, path: None })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// All snippet names, sorted for display
    pub fn list(&self) -> Result<Vec<String>> {
        self.query_names()
            .map_err(|e| RunpadError::storage("cannot list snippets", e))
    }

    pub fn get(&self, name: &str) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT body FROM snippets WHERE name = ?1",
                params![name],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .context("query failed")
            .map_err(|e| RunpadError::storage(format!("cannot read snippet '{}'", name), e))
    }

    /// Create or overwrite `name`
    pub fn upsert(&mut self, name: &str, body: &str) -> Result<()> {
        if name.is_empty() {
            return Err(RunpadError::InvalidState(
                "snippet name must not be empty".to_string(),
            ));
        }
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                r#"
                INSERT INTO snippets (name, body, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?3)
                ON CONFLICT(name) DO UPDATE SET
                    body = excluded.body,
                    updated_at = excluded.updated_at
                "#,
                params![name, body, now],
            )
            .context("insert failed")
            .map_err(|e| RunpadError::storage(format!("cannot save snippet '{}'", name), e))?;
        debug!(name, bytes = body.len(), "Snippet saved");
        Ok(())
    }

    /// Delete `name`. Returns false if it did not exist.
    pub fn remove(&mut self, name: &str) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM snippets WHERE name = ?1", params![name])
            .context("delete failed")
            .map_err(|e| RunpadError::storage(format!("cannot remove snippet '{}'", name), e))?;
        debug!(name, removed = affected > 0, "Snippet remove");
        Ok(affected > 0)
    }

    /// True if saving under `name` would overwrite an existing snippet
    pub fn exists_conflict(&self, name: &str) -> Result<bool> {
        self.conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM snippets WHERE name = ?1)",
                params![name],
                |row| row.get::<_, bool>(0),
            )
            .context("query failed")
            .map_err(|e| RunpadError::storage(format!("cannot check snippet '{}'", name), e))
    }

    /// Push committed changes into the main database file
    pub fn flush(&self) -> Result<()> {
        if self.path.is_none() {
            return Ok(());
        }
        self.conn
            .execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
            .context("checkpoint failed")
            .map_err(|e| RunpadError::storage("cannot flush snippet database", e))?;
        debug!("Snippet database flushed");
        Ok(())
    }

    fn query_names(&self) -> anyhow::Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM snippets ORDER BY name COLLATE NOCASE, name")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(names)
    }
}

fn open_file(path: &Path) -> anyhow::Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context("failed to create snippet db directory")?;
    }
    let conn = Connection::open(path).context("failed to open snippet database")?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")
        .context("failed to enable WAL mode")?;
    conn.execute_batch(SCHEMA)
        .context("failed to create snippets table")?;
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_then_get() {
        let mut store = SnippetStore::open_in_memory().unwrap();
        store.upsert("loop", "for i in range(3):\n    print(i)").unwrap();
        assert_eq!(
            store.get("loop").unwrap().as_deref(),
            Some("for i in range(3):\n    print(i)")
        );
        assert_eq!(store.get("missing").unwrap(), None);
    }

    #[test]
    fn test_upsert_overwrites() {
        let mut store = SnippetStore::open_in_memory().unwrap();
        store.upsert("a", "one").unwrap();
        assert!(store.exists_conflict("a").unwrap());
        store.upsert("a", "two").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("two"));
        assert_eq!(store.list().unwrap(), vec!["a"]);
    }

    #[test]
    fn test_remove_then_get_is_none() {
        let mut store = SnippetStore::open_in_memory().unwrap();
        store.upsert("gone", "x").unwrap();
        assert!(store.remove("gone").unwrap());
        assert_eq!(store.get("gone").unwrap(), None);
        assert!(!store.remove("gone").unwrap());
        assert!(!store.exists_conflict("gone").unwrap());
    }

    #[test]
    fn test_list_is_sorted_case_insensitively() {
        let mut store = SnippetStore::open_in_memory().unwrap();
        for name in ["beta", "Alpha", "gamma"] {
            store.upsert(name, "").unwrap();
        }
        assert_eq!(store.list().unwrap(), vec!["Alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let mut store = SnippetStore::open_in_memory().unwrap();
        assert!(matches!(
            store.upsert("", "body"),
            Err(RunpadError::InvalidState(_))
        ));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_file_store_persists_after_flush() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db").join("snippets.sqlite");
        {
            let mut store = SnippetStore::open(&path).unwrap();
            store.upsert("saved", "print(1)").unwrap();
            store.flush().unwrap();
        }
        let store = SnippetStore::open(&path).unwrap();
        assert_eq!(store.get("saved").unwrap().as_deref(), Some("print(1)"));
    }

    #[test]
    fn test_unopenable_path_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        assert!(matches!(
            SnippetStore::open(&blocker.join("snippets.sqlite")),
            Err(RunpadError::StorageUnavailable { .. })
        ));
    }
}
