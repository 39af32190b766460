//! Tool execution context - scoped to one agent's workspace
//!
//! All file operations resolve against the workspace root and may not
//! escape it. The context also carries the todo store handle so workflow
//! tools reach persistence without global state.

use std::path::{Path, PathBuf};

use crate::error::{QuestorError, Result};
use crate::todos::TodoStore;

/// Execution context shared by all tool invocations of one agent.
#[derive(Clone)]
pub struct ToolContext {
    root: PathBuf,
    todos: TodoStore,
}

impl ToolContext {
    pub fn new(root: PathBuf, todos: TodoStore) -> Self {
        Self { root, todos }
    }

    /// The workspace root all file operations are constrained to
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Todo store handle
    pub fn todos(&self) -> &TodoStore {
        &self.todos
    }

    /// Resolve a path against the workspace root, rejecting escapes.
    ///
    /// Paths that do not exist yet (write targets) are checked against the
    /// normalized form since they cannot be canonicalized.
    pub fn resolve(&self, path: &Path) -> Result<PathBuf> {
        if path.components().any(|c| matches!(c, std::path::Component::ParentDir)) {
            return Err(QuestorError::Validation(format!(
                "path '{}' may not contain '..'",
                path.display()
            )));
        }

        let normalized = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };

        let root = self.root.canonicalize().map_err(|e| {
            QuestorError::Tool(format!("workspace root unavailable: {}", e))
        })?;
        let resolved = normalized.canonicalize().unwrap_or_else(|_| normalized.clone());

        if resolved.starts_with(&root) || normalized.starts_with(&root) {
            Ok(resolved)
        } else {
            Err(QuestorError::Validation(format!(
                "path '{}' escapes the workspace",
                path.display()
            )))
        }
    }
}
