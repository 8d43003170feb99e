//! Draft store backed by a SQLite `drafts` table.

use std::path::Path;
use std::sync::mpsc as std_mpsc;
use std::thread::JoinHandle;

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use celwrite_core::draft::{draft_key, DraftStore, DRAFT_KEY_PREFIX};
use celwrite_core::error::StorageError;

/// A stored draft as listed by [`SqliteDraftStore::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftEntry {
    pub question_id: String,
    pub text: String,
    /// RFC 3339 timestamp of the last save.
    pub updated_at: String,
}

enum Command {
    Save {
        key: String,
        text: String,
    },
    Load {
        key: String,
        reply: oneshot::Sender<Option<String>>,
    },
    List {
        reply: oneshot::Sender<Vec<DraftEntry>>,
    },
    Remove {
        key: String,
        reply: oneshot::Sender<bool>,
    },
}

/// SQLite draft store. The connection lives on a dedicated thread.
pub struct SqliteDraftStore {
    tx: Option<std_mpsc::Sender<Command>>,
    worker: Option<JoinHandle<()>>,
}

impl SqliteDraftStore {
    /// Open (or create) the database at `path`, creating parent directories.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StorageError::Unavailable(format!("cannot create {}: {e}", parent.display()))
            })?;
        }
        let conn = Connection::open(path).map_err(|e| {
            StorageError::Unavailable(format!("cannot open {}: {e}", path.display()))
        })?;
        Self::from_connection(conn)
    }

    /// Ephemeral database, for tests.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(
            "PRAGMA busy_timeout = 5000;
             CREATE TABLE IF NOT EXISTS drafts (
                 key        TEXT PRIMARY KEY,
                 value      TEXT NOT NULL,
                 updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
             );",
        )
        .map_err(|e| StorageError::Backend(format!("failed to create drafts table: {e}")))?;

        let (tx, rx) = std_mpsc::channel();
        let worker = std::thread::Builder::new()
            .name("celwrite-drafts".into())
            .spawn(move || serve(conn, rx))
            .map_err(|e| StorageError::Unavailable(format!("cannot start draft writer: {e}")))?;

        Ok(Self {
            tx: Some(tx),
            worker: Some(worker),
        })
    }

    fn send(&self, command: Command) -> bool {
        match &self.tx {
            Some(tx) => tx.send(command).is_ok(),
            None => false,
        }
    }

    /// All stored drafts, most recently saved first.
    pub async fn list(&self) -> Vec<DraftEntry> {
        let (reply, rx) = oneshot::channel();
        if !self.send(Command::List { reply }) {
            warn!("draft writer is gone; cannot list drafts");
            return Vec::new();
        }
        rx.await.unwrap_or_default()
    }

    /// Delete the draft for `question_id`. Returns whether one existed.
    pub async fn remove(&self, question_id: &str) -> bool {
        let (reply, rx) = oneshot::channel();
        let key = draft_key(question_id);
        if !self.send(Command::Remove { key, reply }) {
            warn!(question_id, "draft writer is gone; draft not removed");
            return false;
        }
        rx.await.unwrap_or(false)
    }
}

#[async_trait]
impl DraftStore for SqliteDraftStore {
    fn save(&self, question_id: &str, text: &str) {
        let command = Command::Save {
            key: draft_key(question_id),
            text: text.to_string(),
        };
        if !self.send(command) {
            warn!(question_id, "draft writer is gone; draft not saved");
        }
    }

    async fn load(&self, question_id: &str) -> Option<String> {
        let (reply, rx) = oneshot::channel();
        let key = draft_key(question_id);
        if !self.send(Command::Load { key, reply }) {
            warn!(question_id, "draft writer is gone; no draft loaded");
            return None;
        }
        rx.await.ok().flatten()
    }
}

impl Drop for SqliteDraftStore {
    /// Close the queue and wait for pending writes to land.
    fn drop(&mut self) {
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("draft writer thread panicked");
            }
        }
    }
}

fn serve(conn: Connection, rx: std_mpsc::Receiver<Command>) {
    while let Ok(command) = rx.recv() {
        match command {
            Command::Save { key, text } => {
                if let Err(e) = save(&conn, &key, &text) {
                    warn!(%key, "failed to save draft: {e}");
                }
            }
            Command::Load { key, reply } => {
                let text = load(&conn, &key).unwrap_or_else(|e| {
                    warn!(%key, "failed to load draft: {e}");
                    None
                });
                let _ = reply.send(text);
            }
            Command::List { reply } => {
                let entries = list(&conn).unwrap_or_else(|e| {
                    warn!("failed to list drafts: {e}");
                    Vec::new()
                });
                let _ = reply.send(entries);
            }
            Command::Remove { key, reply } => {
                let removed = conn
                    .execute("DELETE FROM drafts WHERE key = ?1", params![key])
                    .map(|n| n > 0)
                    .unwrap_or_else(|e| {
                        warn!(%key, "failed to remove draft: {e}");
                        false
                    });
                let _ = reply.send(removed);
            }
        }
    }
    debug!("draft writer stopped");
}

fn save(conn: &Connection, key: &str, text: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO drafts (key, value, updated_at)
         VALUES (?1, ?2, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))",
        params![key, text],
    )?;
    Ok(())
}

fn load(conn: &Connection, key: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM drafts WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
}

fn list(conn: &Connection) -> rusqlite::Result<Vec<DraftEntry>> {
    let mut stmt = conn.prepare(
        "SELECT key, value, updated_at FROM drafts
         WHERE key LIKE ?1 ORDER BY updated_at DESC, key",
    )?;
    let rows = stmt.query_map(params![format!("{DRAFT_KEY_PREFIX}%")], |row| {
        let key: String = row.get(0)?;
        Ok(DraftEntry {
            question_id: key
                .strip_prefix(DRAFT_KEY_PREFIX)
                .unwrap_or(&key)
                .to_string(),
            text: row.get(1)?,
            updated_at: row.get(2)?,
        })
    })?;
    let entries = rows.collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn load_sees_preceding_save() {
        let store = SqliteDraftStore::open_in_memory().unwrap();
        assert_eq!(store.load("t1-1").await, None);

        store.save("t1-1", "Dear neighbour");
        store.save("t1-1", "Dear neighbour, I am writing");
        assert_eq!(
            store.load("t1-1").await.as_deref(),
            Some("Dear neighbour, I am writing")
        );
    }

    #[tokio::test]
    async fn empty_draft_is_stored() {
        let store = SqliteDraftStore::open_in_memory().unwrap();
        store.save("t2-1", "");
        assert_eq!(store.load("t2-1").await, Some(String::new()));
    }

    #[tokio::test]
    async fn list_and_remove() {
        let store = SqliteDraftStore::open_in_memory().unwrap();
        store.save("t1-1", "email draft");
        store.save("t2-3", "survey draft");

        let mut ids: Vec<String> = store.list().await.into_iter().map(|e| e.question_id).collect();
        ids.sort();
        assert_eq!(ids, vec!["t1-1", "t2-3"]);

        assert!(store.remove("t1-1").await);
        assert!(!store.remove("t1-1").await);
        assert_eq!(store.load("t1-1").await, None);
        assert_eq!(store.list().await.len(), 1);
    }

    #[tokio::test]
    async fn drafts_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("drafts.db");
        {
            let store = SqliteDraftStore::open(&path).unwrap();
            store.save("custom-1", "persisted text");
        }
        let store = SqliteDraftStore::open(&path).unwrap();
        assert_eq!(store.load("custom-1").await.as_deref(), Some("persisted text"));
    }

    #[tokio::test]
    async fn backend_failures_degrade_to_no_draft() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drafts.db");
        let store = SqliteDraftStore::open(&path).unwrap();
        store.save("t1-1", "before");
        assert_eq!(store.load("t1-1").await.as_deref(), Some("before"));

        Connection::open(&path)
            .unwrap()
            .execute_batch("DROP TABLE drafts;")
            .unwrap();

        store.save("t1-1", "after");
        assert_eq!(store.load("t1-1").await, None);
        assert!(store.list().await.is_empty());
        assert!(!store.remove("t1-1").await);
    }

    #[test]
    fn open_fails_for_unwritable_location() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("not-a-dir");
        std::fs::write(&file, "x").unwrap();
        assert!(SqliteDraftStore::open(&file.join("drafts.db")).is_err());
    }
}
