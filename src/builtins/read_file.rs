//! read_file tool - Read file contents with line numbers

use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;

use super::{BuiltinTool, ToolContext, ToolOutput};
use crate::catalog::{RiskLevel, ToolDescriptor};
use crate::error::{QuestorError, Result};

pub struct ReadFileTool;

#[async_trait]
impl BuiltinTool for ReadFileTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new("read_file", "Read a file's contents with line numbers. Required before editing.")
            .with_tags(["files", "read"])
            .with_risk(RiskLevel::Low)
            .with_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "File path relative to the workspace"
                    },
                    "offset": {
                        "type": "integer",
                        "description": "Line number to start reading from (1-indexed)"
                    },
                    "limit": {
                        "type": "integer",
                        "description": "Max lines to read (default: 2000)"
                    }
                },
                "required": ["path"]
            }))
    }

    async fn execute(&self, args: &Value, ctx: &ToolContext) -> Result<ToolOutput> {
        let path = args["path"]
            .as_str()
            .ok_or_else(|| QuestorError::Validation("path is required".to_string()))?;
        let offset = args["offset"].as_u64().unwrap_or(1) as usize;
        let limit = args["limit"].as_u64().unwrap_or(2000) as usize;

        let full_path = ctx.resolve(Path::new(path))?;

        let content = match tokio::fs::read_to_string(&full_path).await {
            Ok(content) => content,
            Err(e) => return Ok(ToolOutput::error(format!("read_file: failed to read '{}': {}", path, e))),
        };

        // cat -n style
        let lines: Vec<_> = content
            .lines()
            .skip(offset.saturating_sub(1))
            .take(limit)
            .enumerate()
            .map(|(i, line)| {
                let line_num = offset + i;
                let truncated = if line.len() > 2000 {
                    let mut cut = 2000;
                    while !line.is_char_boundary(cut) {
                        cut -= 1;
                    }
                    format!("{}...", &line[..cut])
                } else {
                    line.to_string()
                };
                format!("{:>6}|{}", line_num, truncated)
            })
            .collect();

        Ok(ToolOutput::success(lines.join("\n")))
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
    async fn test_read_file_basic() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("test.txt"), "line 1\nline 2\nline 3").unwrap();
        let ctx = context(dir.path());

        let result = ReadFileTool
            .execute(&serde_json::json!({"path": "test.txt"}), &ctx)
            .await
            .unwrap();

        assert!(!result.is_error);
        assert!(result.content.contains("1|line 1"));
        assert!(result.content.contains("3|line 3"));
    }

    #[tokio::test]
    async fn test_read_file_offset_and_limit() {
        let dir = tempdir().unwrap();
        let content: String = (1..=10).map(|i| format!("line {}\n", i)).collect();
        std::fs::write(dir.path().join("test.txt"), content).unwrap();
        let ctx = context(dir.path());

        let result = ReadFileTool
            .execute(&serde_json::json!({"path": "test.txt", "offset": 3, "limit": 2}), &ctx)
            .await
            .unwrap();

        assert!(result.content.contains("3|line 3"));
        assert!(result.content.contains("4|line 4"));
        assert!(!result.content.contains("line 5"));
        assert!(!result.content.contains("line 2"));
    }

    #[tokio::test]
    async fn test_read_file_long_multibyte_line_truncated() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("wide.txt"), "€".repeat(1000)).unwrap();
        let ctx = context(dir.path());

        let result = ReadFileTool
            .execute(&serde_json::json!({"path": "wide.txt"}), &ctx)
            .await
            .unwrap();

        assert!(!result.is_error);
        assert!(result.content.ends_with("..."));
        assert!(result.content.contains('€'));
    }

    #[tokio::test]
    async fn test_read_file_missing() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path());

        let result = ReadFileTool
            .execute(&serde_json::json!({"path": "ghost.txt"}), &ctx)
            .await
            .unwrap();

        assert!(result.is_error);
        assert!(result.content.contains("failed to read"));
    }

    #[tokio::test]
    async fn test_read_file_requires_path() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path());

        let result = ReadFileTool.execute(&serde_json::json!({}), &ctx).await;
        assert!(result.is_err());
    }
}
