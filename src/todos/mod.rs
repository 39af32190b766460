//! Todo store - workflow tracking for agent task decomposition
//!
//! Todos are ephemeral in spirit but persisted so a restarted agent keeps
//! its working list. Status transitions are unrestricted: the loop does
//! not enforce ordering between pending, in-progress, and completed.

use rusqlite::params;
use serde::{Deserialize, Serialize};

use crate::error::{QuestorError, Result};
use crate::store::Database;

/// Todo lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    Pending,
    InProgress,
    Completed,
}

impl TodoStatus {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }
}

/// One todo item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Todo {
    pub id: i64,
    pub content: String,
    pub status: TodoStatus,
}

/// Interface over the `todos` table.
#[derive(Clone)]
pub struct TodoStore {
    db: Database,
}

impl TodoStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Add a new todo with PENDING status, returning it with its id.
    pub fn add(&self, content: &str) -> Result<Todo> {
        let conn = self.db.lock()?;
        conn.execute(
            "INSERT INTO todos (content, status) VALUES (?1, ?2)",
            params![content, TodoStatus::Pending.as_str()],
        )?;
        let id = conn.last_insert_rowid();

        Ok(Todo {
            id,
            content: content.to_string(),
            status: TodoStatus::Pending,
        })
    }

    /// Update status and/or content of an existing todo.
    pub fn update(&self, id: i64, status: Option<TodoStatus>, content: Option<&str>) -> Result<Todo> {
        let conn = self.db.lock()?;

        if let Some(status) = status {
            conn.execute(
                "UPDATE todos SET status = ?2 WHERE id = ?1",
                params![id, status.as_str()],
            )?;
        }
        if let Some(content) = content {
            conn.execute("UPDATE todos SET content = ?2 WHERE id = ?1", params![id, content])?;
        }

        let todo = conn
            .query_row(
                "SELECT id, content, status FROM todos WHERE id = ?1",
                params![id],
                row_to_todo,
            )
            .map_err(|_| QuestorError::NotFound(format!("todo #{}", id)))?;
        Ok(todo)
    }

    /// List todos in id order, optionally filtered by status.
    pub fn list(&self, filter: Option<TodoStatus>) -> Result<Vec<Todo>> {
        let conn = self.db.lock()?;
        let mut stmt = conn.prepare("SELECT id, content, status FROM todos ORDER BY id")?;
        let todos = stmt
            .query_map([], row_to_todo)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(match filter {
            Some(status) => todos.into_iter().filter(|t| t.status == status).collect(),
            None => todos,
        })
    }

    /// Delete all COMPLETED todos, returning how many were removed. A
    /// no-op when there are none.
    pub fn clear_completed(&self) -> Result<usize> {
        let conn = self.db.lock()?;
        let removed = conn.execute(
            "DELETE FROM todos WHERE status = ?1",
            params![TodoStatus::Completed.as_str()],
        )?;
        Ok(removed)
    }
}

fn row_to_todo(row: &rusqlite::Row<'_>) -> rusqlite::Result<Todo> {
    let status_text: String = row.get(2)?;
    Ok(Todo {
        id: row.get(0)?,
        content: row.get(1)?,
        status: TodoStatus::from_str(&status_text).unwrap_or(TodoStatus::Pending),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> TodoStore {
        TodoStore::new(Database::open_in_memory().unwrap())
    }

    #[test]
    fn test_add_assigns_monotonic_ids() {
        let store = store();
        let a = store.add("first").unwrap();
        let b = store.add("second").unwrap();

        assert!(b.id > a.id);
        assert_eq!(a.status, TodoStatus::Pending);
    }

    #[test]
    fn test_update_status() {
        let store = store();
        let todo = store.add("task").unwrap();

        let updated = store.update(todo.id, Some(TodoStatus::InProgress), None).unwrap();
        assert_eq!(updated.status, TodoStatus::InProgress);
        assert_eq!(updated.content, "task");
    }

    #[test]
    fn test_update_allows_any_transition() {
        let store = store();
        let todo = store.add("task").unwrap();

        store.update(todo.id, Some(TodoStatus::Completed), None).unwrap();
        let back = store.update(todo.id, Some(TodoStatus::Pending), None).unwrap();
        assert_eq!(back.status, TodoStatus::Pending);
    }

    #[test]
    fn test_update_missing() {
        let err = store().update(99, Some(TodoStatus::Completed), None).unwrap_err();
        assert!(matches!(err, QuestorError::NotFound(_)));
    }

    #[test]
    fn test_list_with_filter() {
        let store = store();
        let a = store.add("a").unwrap();
        store.add("b").unwrap();
        store.update(a.id, Some(TodoStatus::Completed), None).unwrap();

        assert_eq!(store.list(None).unwrap().len(), 2);
        let completed = store.list(Some(TodoStatus::Completed)).unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].content, "a");
    }

    #[test]
    fn test_clear_completed() {
        let store = store();
        let a = store.add("a").unwrap();
        store.add("b").unwrap();
        store.update(a.id, Some(TodoStatus::Completed), None).unwrap();

        assert_eq!(store.clear_completed().unwrap(), 1);
        let remaining = store.list(None).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].content, "b");

        // No-op when nothing is completed
        assert_eq!(store.clear_completed().unwrap(), 0);
    }

    #[test]
    fn test_status_round_trip() {
        for status in [TodoStatus::Pending, TodoStatus::InProgress, TodoStatus::Completed] {
            assert_eq!(TodoStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(TodoStatus::from_str("done"), None);
    }
}
