//! Shared SQLite persistence for the durable stores
//!
//! One database file holds the tool library, research vault, learnings,
//! and todos. The connection sits behind a mutex: readers are cheap,
//! writers serialize, and last-writer-wins per key is acceptable since no
//! cross-store transaction spans multiple keys.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

use crate::error::{QuestorError, Result};

/// Handle to the shared SQLite database. Cloning is cheap; all clones
/// share one connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create the database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path.as_ref())
            .map_err(|e| QuestorError::Storage(format!("failed to open database: {}", e)))?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database. Useful for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| QuestorError::Storage(format!("failed to open in-memory database: {}", e)))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Lock the underlying connection for one operation.
    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| QuestorError::Storage(format!("database lock poisoned: {}", e)))
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS library_tools (
            name TEXT PRIMARY KEY,
            description TEXT NOT NULL,
            kind TEXT NOT NULL,
            body TEXT NOT NULL,
            args_schema TEXT NOT NULL,
            metadata TEXT NOT NULL,
            timeout_seconds INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS vault_notes (
            namespace TEXT NOT NULL,
            key TEXT NOT NULL,
            content TEXT NOT NULL,
            metadata TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (namespace, key)
        );

        CREATE TABLE IF NOT EXISTS learnings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            category TEXT NOT NULL,
            task_description TEXT NOT NULL,
            content TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_learnings_category ON learnings(category);

        CREATE TABLE IF NOT EXISTS todos (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            content TEXT NOT NULL,
            status TEXT NOT NULL
        );
        "#,
    )
    .map_err(|e| QuestorError::Storage(format!("failed to initialize schema: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.lock().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM library_tools", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("questor.db");
        let db = Database::open(&path).unwrap();
        drop(db);
        assert!(path.exists());
    }

    #[test]
    fn test_schema_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("questor.db");

        {
            let db = Database::open(&path).unwrap();
            let conn = db.lock().unwrap();
            conn.execute(
                "INSERT INTO vault_notes (namespace, key, content, metadata, created_at, updated_at)
                 VALUES ('global', 'k', 'v', '{}', 'now', 'now')",
                [],
            )
            .unwrap();
        }

        let db = Database::open(&path).unwrap();
        let conn = db.lock().unwrap();
        let content: String = conn
            .query_row(
                "SELECT content FROM vault_notes WHERE namespace = 'global' AND key = 'k'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(content, "v");
    }

    #[test]
    fn test_clones_share_connection() {
        let db = Database::open_in_memory().unwrap();
        let clone = db.clone();

        db.lock()
            .unwrap()
            .execute("INSERT INTO todos (content, status) VALUES ('x', 'pending')", [])
            .unwrap();

        let count: i64 = clone
            .lock()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM todos", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
