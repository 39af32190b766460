//! list_directory tool - List files and directories in a path

use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;

use super::{BuiltinTool, ToolContext, ToolOutput};
use crate::catalog::{RiskLevel, ToolDescriptor};
use crate::error::Result;

pub struct ListDirectoryTool;

#[async_trait]
impl BuiltinTool for ListDirectoryTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new("list_directory", "List files and directories in a path.")
            .with_tags(["files", "directory", "list"])
            .with_risk(RiskLevel::Low)
            .sticky()
            .with_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "Directory path relative to the workspace (default: .)"
                    }
                }
            }))
    }

    async fn execute(&self, args: &Value, ctx: &ToolContext) -> Result<ToolOutput> {
        let path = args["path"].as_str().unwrap_or(".");
        let full_path = ctx.resolve(Path::new(path))?;

        let mut dir = match tokio::fs::read_dir(&full_path).await {
            Ok(dir) => dir,
            Err(e) => return Ok(ToolOutput::error(format!("list_directory: failed to read '{}': {}", path, e))),
        };

        let mut entries = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            let metadata = entry.metadata().await?;
            let suffix = if metadata.is_dir() { "/" } else { "" };
            entries.push(format!("{}{}", name, suffix));
        }

        entries.sort();

        if entries.is_empty() {
            Ok(ToolOutput::success("(empty directory)"))
        } else {
            Ok(ToolOutput::success(entries.join("\n")))
        }
    }
}
