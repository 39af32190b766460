//! Research vault - durable namespaced note store
//!
//! Notes are keyed by `(namespace, key)`; the namespace is an implicit
//! grouping that exists only through the notes that reference it. There is
//! no versioning: `set` and `append` destroy prior content state.

use chrono::Utc;
use log::info;
use rusqlite::{OptionalExtension, params};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{QuestorError, Result};
use crate::store::Database;

/// Namespace used when none is given
pub const DEFAULT_NAMESPACE: &str = "global";

/// One persisted note
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultNote {
    pub namespace: String,
    pub key: String,
    pub content: String,
    pub metadata: serde_json::Map<String, Value>,
    pub created_at: String,
    pub updated_at: String,
}

/// CRUD + append interface over the `vault_notes` table.
#[derive(Clone)]
pub struct ResearchVault {
    db: Database,
}

impl ResearchVault {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn namespace_or_default(namespace: Option<&str>) -> &str {
        match namespace {
            Some(ns) if !ns.is_empty() => ns,
            _ => DEFAULT_NAMESPACE,
        }
    }

    /// Upsert: create the note or replace its content.
    pub fn set(&self, namespace: Option<&str>, key: &str, content: &str) -> Result<VaultNote> {
        let ns = Self::namespace_or_default(namespace);
        let now = Utc::now().to_rfc3339();
        let conn = self.db.lock()?;

        conn.execute(
            "INSERT INTO vault_notes (namespace, key, content, metadata, created_at, updated_at)
             VALUES (?1, ?2, ?3, '{}', ?4, ?4)
             ON CONFLICT (namespace, key)
             DO UPDATE SET content = ?3, updated_at = ?4",
            params![ns, key, content, now],
        )?;
        drop(conn);

        info!("vault: set {}/{}", ns, key);
        self.get(Some(ns), key)
    }

    /// Upsert by concatenation: create the note if absent, otherwise
    /// append `content` to the existing content in call order.
    pub fn append(&self, namespace: Option<&str>, key: &str, content: &str) -> Result<VaultNote> {
        let ns = Self::namespace_or_default(namespace);
        let now = Utc::now().to_rfc3339();
        let conn = self.db.lock()?;

        conn.execute(
            "INSERT INTO vault_notes (namespace, key, content, metadata, created_at, updated_at)
             VALUES (?1, ?2, ?3, '{}', ?4, ?4)
             ON CONFLICT (namespace, key)
             DO UPDATE SET content = content || ?3, updated_at = ?4",
            params![ns, key, content, now],
        )?;
        drop(conn);

        self.get(Some(ns), key)
    }

    /// Fetch one note. Fails with NotFound if absent.
    pub fn get(&self, namespace: Option<&str>, key: &str) -> Result<VaultNote> {
        let ns = Self::namespace_or_default(namespace);
        let conn = self.db.lock()?;

        conn.query_row(
            "SELECT namespace, key, content, metadata, created_at, updated_at
             FROM vault_notes WHERE namespace = ?1 AND key = ?2",
            params![ns, key],
            row_to_note,
        )
        .optional()?
        .ok_or_else(|| QuestorError::NotFound(format!("note '{}/{}'", ns, key)))
    }

    /// List all notes in a namespace, key order. Empty for an unused
    /// namespace.
    pub fn list(&self, namespace: Option<&str>) -> Result<Vec<VaultNote>> {
        let ns = Self::namespace_or_default(namespace);
        let conn = self.db.lock()?;

        let mut stmt = conn.prepare(
            "SELECT namespace, key, content, metadata, created_at, updated_at
             FROM vault_notes WHERE namespace = ?1 ORDER BY key",
        )?;
        let notes = stmt
            .query_map(params![ns], row_to_note)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(notes)
    }

    /// Delete one note. Fails with NotFound if absent.
    pub fn delete(&self, namespace: Option<&str>, key: &str) -> Result<()> {
        let ns = Self::namespace_or_default(namespace);
        let conn = self.db.lock()?;

        let affected = conn.execute(
            "DELETE FROM vault_notes WHERE namespace = ?1 AND key = ?2",
            params![ns, key],
        )?;
        if affected == 0 {
            return Err(QuestorError::NotFound(format!("note '{}/{}'", ns, key)));
        }

        info!("vault: deleted {}/{}", ns, key);
        Ok(())
    }
}

fn row_to_note(row: &rusqlite::Row<'_>) -> rusqlite::Result<VaultNote> {
    let metadata_text: String = row.get(3)?;
    Ok(VaultNote {
        namespace: row.get(0)?,
        key: row.get(1)?,
        content: row.get(2)?,
        metadata: serde_json::from_str(&metadata_text).unwrap_or_default(),
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}
