//! edit_file tool - Exact string replacement in a file
//!
//! Replacement requires the target string to be unique unless
//! `replace_all` is set, which keeps blind multi-site edits from slipping
//! through.

use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;

use super::{BuiltinTool, ToolContext, ToolOutput};
use crate::catalog::{RiskLevel, ToolDescriptor};
use crate::error::{QuestorError, Result};

pub struct EditFileTool;

#[async_trait]
impl BuiltinTool for EditFileTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new("edit_file", "Perform exact string replacement in a file.")
            .with_tags(["files", "edit"])
            .with_risk(RiskLevel::Medium)
            .with_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "File path relative to the workspace"
                    },
                    "old_string": {
                        "type": "string",
                        "description": "Exact string to find and replace"
                    },
                    "new_string": {
                        "type": "string",
                        "description": "Replacement string"
                    },
                    "replace_all": {
                        "type": "boolean",
                        "description": "Replace every occurrence instead of requiring uniqueness"
                    }
                },
                "required": ["path", "old_string", "new_string"]
            }))
    }

    async fn execute(&self, args: &Value, ctx: &ToolContext) -> Result<ToolOutput> {
        let path = args["path"]
            .as_str()
            .ok_or_else(|| QuestorError::Validation("path is required".to_string()))?;
        let old_string = args["old_string"]
            .as_str()
            .ok_or_else(|| QuestorError::Validation("old_string is required".to_string()))?;
        let new_string = args["new_string"].as_str().unwrap_or("");
        let replace_all = args["replace_all"].as_bool().unwrap_or(false);

        if old_string.is_empty() {
            return Ok(ToolOutput::error("edit_file: old_string must not be empty"));
        }

        let full_path = ctx.resolve(Path::new(path))?;
        if full_path.is_dir() {
            return Ok(ToolOutput::error(format!("edit_file: {} is a directory", path)));
        }

        let content = match tokio::fs::read_to_string(&full_path).await {
            Ok(content) => content,
            Err(e) => return Ok(ToolOutput::error(format!("edit_file: failed to read '{}': {}", path, e))),
        };

        let occurrences = content.matches(old_string).count();
        if occurrences == 0 {
            return Ok(ToolOutput::error(format!("edit_file: old_string not found in {}", path)));
        }
        if !replace_all && occurrences > 1 {
            return Ok(ToolOutput::error(format!(
                "edit_file: old_string appears {} times in {}. Provide a longer, unique string or set replace_all=true.",
                occurrences, path
            )));
        }

        let new_content = if replace_all {
            content.replace(old_string, new_string)
        } else {
            content.replacen(old_string, new_string, 1)
        };
        tokio::fs::write(&full_path, new_content).await?;

        let replaced = if replace_all { occurrences } else { 1 };
        Ok(ToolOutput::success(format!(
            "edit_file: replaced {} occurrence(s) in {}",
            replaced, path
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Database;
    use crate::todos::TodoStore;
    use tempfile::tempdir;

    fn context(root: &Path) -> ToolContext {
        ToolContext::new(root.to_path_buf(), TodoStore::new(Database::open_in_memory().unwrap()))
    }

    #[tokio::test]
    async fn test_edit_file_unique_replacement() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("f.txt"), "hello world").unwrap();
        let ctx = context(dir.path());

        let result = EditFileTool
            .execute(
                &serde_json::json!({"path": "f.txt", "old_string": "world", "new_string": "there"}),
                &ctx,
            )
            .await
            .unwrap();

        assert!(!result.is_error);
        assert_eq!(std::fs::read_to_string(dir.path().join("f.txt")).unwrap(), "hello there");
    }

    #[tokio::test]
    async fn test_edit_file_ambiguous_without_replace_all() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("f.txt"), "aaa bbb aaa").unwrap();
        let ctx = context(dir.path());

        let result = EditFileTool
            .execute(
                &serde_json::json!({"path": "f.txt", "old_string": "aaa", "new_string": "x"}),
                &ctx,
            )
            .await
            .unwrap();

        assert!(result.is_error);
        assert!(result.content.contains("2 times"));
        // File untouched
        assert_eq!(std::fs::read_to_string(dir.path().join("f.txt")).unwrap(), "aaa bbb aaa");
    }

    #[tokio::test]
    async fn test_edit_file_replace_all() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("f.txt"), "aaa bbb aaa").unwrap();
        let ctx = context(dir.path());

        let result = EditFileTool
            .execute(
                &serde_json::json!({"path": "f.txt", "old_string": "aaa", "new_string": "x", "replace_all": true}),
                &ctx,
            )
            .await
            .unwrap();

        assert!(!result.is_error);
        assert!(result.content.contains("2 occurrence(s)"));
        assert_eq!(std::fs::read_to_string(dir.path().join("f.txt")).unwrap(), "x bbb x");
    }

    #[tokio::test]
    async fn test_edit_file_not_found_string() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("f.txt"), "content").unwrap();
        let ctx = context(dir.path());

        let result = EditFileTool
            .execute(
                &serde_json::json!({"path": "f.txt", "old_string": "missing", "new_string": "x"}),
                &ctx,
            )
            .await
            .unwrap();

        assert!(result.is_error);
        assert!(result.content.contains("not found"));
    }

    #[tokio::test]
    async fn test_edit_file_missing_file() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path());

        let result = EditFileTool
            .execute(
                &serde_json::json!({"path": "ghost.txt", "old_string": "a", "new_string": "b"}),
                &ctx,
            )
            .await
            .unwrap();

        assert!(result.is_error);
    }
}
