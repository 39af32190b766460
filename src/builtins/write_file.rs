//! write_file tool - Write content to a file, creating parents as needed

use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;

use super::{BuiltinTool, ToolContext, ToolOutput};
use crate::catalog::{RiskLevel, ToolDescriptor};
use crate::error::{QuestorError, Result};

pub struct WriteFileTool;

#[async_trait]
impl BuiltinTool for WriteFileTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new("write_file", "Write content to a file, creating it (and parent directories) if needed.")
            .with_tags(["files", "write"])
            .with_risk(RiskLevel::Medium)
            .with_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "File path relative to the workspace"
                    },
                    "content": {
                        "type": "string",
                        "description": "Content to write"
                    }
                },
                "required": ["path", "content"]
            }))
    }

    async fn execute(&self, args: &Value, ctx: &ToolContext) -> Result<ToolOutput> {
        let path = args["path"]
            .as_str()
            .ok_or_else(|| QuestorError::Validation("path is required".to_string()))?;
        let content = args["content"]
            .as_str()
            .ok_or_else(|| QuestorError::Validation("content is required".to_string()))?;

        let full_path = ctx.resolve(Path::new(path))?;

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full_path, content).await?;

        Ok(ToolOutput::success(format!(
            "write_file: wrote {} bytes to {}",
            content.len(),
            path
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
    async fn test_write_file_basic() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path());

        let result = WriteFileTool
            .execute(&serde_json::json!({"path": "out.txt", "content": "hello"}), &ctx)
            .await
            .unwrap();

        assert!(!result.is_error);
        assert_eq!(std::fs::read_to_string(dir.path().join("out.txt")).unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_write_file_creates_parents() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path());

        WriteFileTool
            .execute(&serde_json::json!({"path": "a/b/c.txt", "content": "nested"}), &ctx)
            .await
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(dir.path().join("a/b/c.txt")).unwrap(),
            "nested"
        );
    }

    #[tokio::test]
    async fn test_write_file_overwrites() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("out.txt"), "old").unwrap();
        let ctx = context(dir.path());

        WriteFileTool
            .execute(&serde_json::json!({"path": "out.txt", "content": "new"}), &ctx)
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(dir.path().join("out.txt")).unwrap(), "new");
    }

    #[tokio::test]
    async fn test_write_file_requires_content() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path());

        let result = WriteFileTool.execute(&serde_json::json!({"path": "x.txt"}), &ctx).await;
        assert!(result.is_err());
    }
}
