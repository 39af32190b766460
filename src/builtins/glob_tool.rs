//! glob tool - Find files matching a glob pattern
//!
//! Matches are ordered by modification time, most recent first.

use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use std::time::SystemTime;

use super::{BuiltinTool, ToolContext, ToolOutput};
use crate::catalog::{RiskLevel, ToolDescriptor};
use crate::error::{QuestorError, Result};

pub struct GlobTool;

#[async_trait]
impl BuiltinTool for GlobTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new("glob", "Find files matching a glob pattern (e.g., **/*.rs), most recently modified first.")
            .with_tags(["files", "search", "glob"])
            .with_risk(RiskLevel::Low)
            .with_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "pattern": {
                        "type": "string",
                        "description": "Glob pattern to match"
                    },
                    "path": {
                        "type": "string",
                        "description": "Base directory (default: workspace root)"
                    }
                },
                "required": ["pattern"]
            }))
    }

    async fn execute(&self, args: &Value, ctx: &ToolContext) -> Result<ToolOutput> {
        let pattern = args["pattern"]
            .as_str()
            .ok_or_else(|| QuestorError::Validation("pattern is required".to_string()))?;
        let base = args["path"].as_str().unwrap_or(".");

        let base_path = ctx.resolve(Path::new(base))?;
        if !base_path.is_dir() {
            return Ok(ToolOutput::error(format!("glob: {} is not a directory", base)));
        }

        let full_pattern = base_path.join(pattern);
        let Some(pattern_str) = full_pattern.to_str() else {
            return Ok(ToolOutput::error("glob: pattern is not valid UTF-8"));
        };

        let paths = match glob::glob(pattern_str) {
            Ok(paths) => paths,
            Err(e) => return Ok(ToolOutput::error(format!("glob: invalid pattern: {}", e))),
        };

        let mut matches: Vec<(std::path::PathBuf, SystemTime)> = paths
            .filter_map(|r| r.ok())
            .filter(|p| p.starts_with(&base_path))
            .map(|p| {
                let mtime = p
                    .metadata()
                    .and_then(|m| m.modified())
                    .unwrap_or(SystemTime::UNIX_EPOCH);
                (p, mtime)
            })
            .take(1000)
            .collect();

        // Most recently modified first; path tiebreak keeps output stable
        matches.sort_by(|(pa, ta), (pb, tb)| tb.cmp(ta).then_with(|| pa.cmp(pb)));

        if matches.is_empty() {
            return Ok(ToolOutput::success(format!("glob: no files matching '{}'", pattern)));
        }

        let listing: Vec<String> = matches
            .iter()
            .map(|(p, _)| {
                p.strip_prefix(&base_path)
                    .unwrap_or(p)
                    .to_string_lossy()
                    .to_string()
            })
            .collect();

        Ok(ToolOutput::success(listing.join("\n")))
    }
}
