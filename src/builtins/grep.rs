//! grep tool - Search file contents with a regular expression
//!
//! Walks the workspace in-process rather than shelling out, so results
//! stay sandboxed and deterministic across platforms.

use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;

use super::{BuiltinTool, ToolContext, ToolOutput};
use crate::catalog::{RiskLevel, ToolDescriptor};
use crate::error::{QuestorError, Result};

const DEFAULT_MAX_RESULTS: usize = 100;

pub struct GrepTool;

#[async_trait]
impl BuiltinTool for GrepTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new("grep", "Search file contents for a regex pattern. Modes: files (paths), matches (lines), count.")
            .with_tags(["files", "search", "regex"])
            .with_risk(RiskLevel::Low)
            .with_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "pattern": {
                        "type": "string",
                        "description": "Regular expression to search for"
                    },
                    "path": {
                        "type": "string",
                        "description": "Base directory (default: workspace root)"
                    },
                    "mode": {
                        "type": "string",
                        "description": "Output mode: files, matches, or count (default: matches)"
                    },
                    "file_pattern": {
                        "type": "string",
                        "description": "Glob filter on file names, e.g. *.rs"
                    },
                    "case_insensitive": {
                        "type": "boolean",
                        "description": "Ignore case when matching"
                    },
                    "max_results": {
                        "type": "integer",
                        "description": "Cap on reported results (default: 100)"
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
        let mode = args["mode"].as_str().unwrap_or("matches");
        let file_pattern = args["file_pattern"].as_str();
        let case_insensitive = args["case_insensitive"].as_bool().unwrap_or(false);
        let max_results = args["max_results"].as_u64().unwrap_or(DEFAULT_MAX_RESULTS as u64) as usize;

        if !matches!(mode, "files" | "matches" | "count") {
            return Ok(ToolOutput::error(format!(
                "grep: unknown mode '{}' (expected files, matches, or count)",
                mode
            )));
        }

        let regex = match regex::RegexBuilder::new(pattern)
            .case_insensitive(case_insensitive)
            .build()
        {
            Ok(re) => re,
            Err(e) => return Ok(ToolOutput::error(format!("grep: invalid pattern: {}", e))),
        };

        let name_filter = match file_pattern {
            Some(fp) => match glob::Pattern::new(fp) {
                Ok(p) => Some(p),
                Err(e) => return Ok(ToolOutput::error(format!("grep: invalid file_pattern: {}", e))),
            },
            None => None,
        };

        let base_path = ctx.resolve(Path::new(base))?;
        if !base_path.is_dir() {
            return Ok(ToolOutput::error(format!("grep: {} is not a directory", base)));
        }

        let walk_pattern = base_path.join("**/*");
        let Some(walk_str) = walk_pattern.to_str() else {
            return Ok(ToolOutput::error("grep: base path is not valid UTF-8"));
        };
        let walker = match glob::glob(walk_str) {
            Ok(w) => w,
            Err(e) => return Ok(ToolOutput::error(format!("grep: walk failed: {}", e))),
        };

        let mut files = Vec::new();
        let mut lines = Vec::new();
        let mut total_matches = 0usize;

        'outer: for path in walker.filter_map(|r| r.ok()) {
            if !path.is_file() {
                continue;
            }
            if let Some(ref filter) = name_filter {
                let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
                if !filter.matches(&name) {
                    continue;
                }
            }
            // Binary files fail the UTF-8 read; skip them
            let Ok(content) = std::fs::read_to_string(&path) else {
                continue;
            };

            let rel = path
                .strip_prefix(&base_path)
                .unwrap_or(&path)
                .to_string_lossy()
                .to_string();

            let mut file_hit = false;
            for (idx, line) in content.lines().enumerate() {
                if regex.is_match(line) {
                    total_matches += 1;
                    file_hit = true;
                    if mode == "matches" {
                        lines.push(format!("{}:{}:{}", rel, idx + 1, line));
                        if lines.len() >= max_results {
                            break 'outer;
                        }
                    } else if mode == "files" {
                        break;
                    }
                }
            }
            if file_hit {
                files.push(rel);
                if mode == "files" && files.len() >= max_results {
                    break;
                }
            }
        }

        let output = match mode {
            "files" => {
                if files.is_empty() {
                    format!("grep: no files matching '{}'", pattern)
                } else {
                    files.join("\n")
                }
            }
            "count" => format!("{} matches in {} files", total_matches, files.len()),
            _ => {
                if lines.is_empty() {
                    format!("grep: no matches for '{}'", pattern)
                } else {
                    lines.join("\n")
                }
            }
        };

        Ok(ToolOutput::success(output))
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

    fn seed(dir: &Path) {
        std::fs::write(dir.join("a.rs"), "fn main() {\n    println!(\"hi\");\n}\n").unwrap();
        std::fs::write(dir.join("b.txt"), "nothing to see\nfn helper\n").unwrap();
        std::fs::create_dir(dir.join("sub")).unwrap();
        std::fs::write(dir.join("sub/c.rs"), "fn nested() {}\n").unwrap();
    }

    #[tokio::test]
    async fn test_grep_matches_mode() {
        let dir = tempdir().unwrap();
        seed(dir.path());
        let ctx = context(dir.path());

        let result = GrepTool
            .execute(&serde_json::json!({"pattern": "fn \\w+"}), &ctx)
            .await
            .unwrap();

        assert!(!result.is_error);
        assert!(result.content.contains("a.rs:1:fn main() {"));
        assert!(result.content.contains("sub/c.rs:1:fn nested() {}"));
        assert!(result.content.contains("b.txt:2:fn helper"));
    }

    #[tokio::test]
    async fn test_grep_files_mode_with_filter() {
        let dir = tempdir().unwrap();
        seed(dir.path());
        let ctx = context(dir.path());

        let result = GrepTool
            .execute(
                &serde_json::json!({"pattern": "fn", "mode": "files", "file_pattern": "*.rs"}),
                &ctx,
            )
            .await
            .unwrap();

        assert!(result.content.contains("a.rs"));
        assert!(result.content.contains("sub/c.rs"));
        assert!(!result.content.contains("b.txt"));
    }

    #[tokio::test]
    async fn test_grep_count_mode() {
        let dir = tempdir().unwrap();
        seed(dir.path());
        let ctx = context(dir.path());

        let result = GrepTool
            .execute(&serde_json::json!({"pattern": "fn", "mode": "count"}), &ctx)
            .await
            .unwrap();

        assert!(result.content.contains("3 matches in 3 files"));
    }

    #[tokio::test]
    async fn test_grep_case_insensitive() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("f.txt"), "Hello World\n").unwrap();
        let ctx = context(dir.path());

        let sensitive = GrepTool
            .execute(&serde_json::json!({"pattern": "hello"}), &ctx)
            .await
            .unwrap();
        assert!(sensitive.content.contains("no matches"));

        let insensitive = GrepTool
            .execute(&serde_json::json!({"pattern": "hello", "case_insensitive": true}), &ctx)
            .await
            .unwrap();
        assert!(insensitive.content.contains("Hello World"));
    }

    #[tokio::test]
    async fn test_grep_invalid_pattern() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path());

        let result = GrepTool
            .execute(&serde_json::json!({"pattern": "[unclosed"}), &ctx)
            .await
            .unwrap();
        assert!(result.is_error);
        assert!(result.content.contains("invalid pattern"));
    }

    #[tokio::test]
    async fn test_grep_max_results() {
        let dir = tempdir().unwrap();
        let content: String = (0..20).map(|i| format!("match {}\n", i)).collect();
        std::fs::write(dir.path().join("f.txt"), content).unwrap();
        let ctx = context(dir.path());

        let result = GrepTool
            .execute(&serde_json::json!({"pattern": "match", "max_results": 5}), &ctx)
            .await
            .unwrap();

        assert_eq!(result.content.lines().count(), 5);
    }
}
