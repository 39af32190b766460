//! git_ops tool - Common git operations on the workspace repository
//!
//! Covers status, diff, log, and commit. Anything beyond these goes
//! through run_command.

use async_trait::async_trait;
use serde_json::Value;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use super::{BuiltinTool, ToolContext, ToolOutput};
use crate::catalog::{RiskLevel, ToolDescriptor};
use crate::error::{QuestorError, Result};

const GIT_TIMEOUT: Duration = Duration::from_secs(60);

pub struct GitOpsTool;

impl GitOpsTool {
    async fn git(&self, ctx: &ToolContext, args: &[&str]) -> ToolOutput {
        let child = Command::new("git")
            .args(args)
            .current_dir(ctx.root())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match child {
            Ok(child) => child,
            Err(e) => return ToolOutput::error(format!("git_ops: failed to spawn git: {}", e)),
        };

        let output = match tokio::time::timeout(GIT_TIMEOUT, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return ToolOutput::error(format!("git_ops: {}", e)),
            Err(_) => return ToolOutput::error("git_ops: git command timed out"),
        };

        let stdout = String::from_utf8_lossy(&output.stdout).trim_end().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim_end().to_string();

        if output.status.success() {
            ToolOutput::success(if stdout.is_empty() { stderr } else { stdout })
        } else {
            let detail = if stderr.is_empty() { stdout } else { stderr };
            ToolOutput::error(format!("git_ops: git {} failed: {}", args[0], detail))
        }
    }
}

#[async_trait]
impl BuiltinTool for GitOpsTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new("git_ops", "Run a git operation: status, diff, log, or commit.")
            .with_tags(["git", "commit"])
            .with_risk(RiskLevel::High)
            .with_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "operation": {
                        "type": "string",
                        "description": "One of: status, diff, log, commit"
                    },
                    "message": {
                        "type": "string",
                        "description": "Commit message (commit only)"
                    },
                    "add_all": {
                        "type": "boolean",
                        "description": "Stage all changes before committing (commit only)"
                    },
                    "staged": {
                        "type": "boolean",
                        "description": "Show staged changes (diff only)"
                    },
                    "max_commits": {
                        "type": "integer",
                        "description": "Number of commits to show (log only, default: 10)"
                    }
                },
                "required": ["operation"]
            }))
    }

    async fn execute(&self, args: &Value, ctx: &ToolContext) -> Result<ToolOutput> {
        let operation = args["operation"]
            .as_str()
            .ok_or_else(|| QuestorError::Validation("operation is required".to_string()))?;

        let output = match operation {
            "status" => {
                let out = self.git(ctx, &["status", "--porcelain"]).await;
                if !out.is_error && out.content.is_empty() {
                    ToolOutput::success("(working tree clean)")
                } else {
                    out
                }
            }
            "diff" => {
                let staged = args["staged"].as_bool().unwrap_or(false);
                let out = if staged {
                    self.git(ctx, &["diff", "--staged"]).await
                } else {
                    self.git(ctx, &["diff"]).await
                };
                if !out.is_error && out.content.is_empty() {
                    ToolOutput::success("(no changes)")
                } else {
                    out
                }
            }
            "log" => {
                let max = args["max_commits"].as_u64().unwrap_or(10);
                let count = format!("-{}", max);
                self.git(ctx, &["log", "--oneline", "--decorate", &count]).await
            }
            "commit" => {
                let message = args["message"]
                    .as_str()
                    .ok_or_else(|| QuestorError::Validation("message is required for commit".to_string()))?;
                if args["add_all"].as_bool().unwrap_or(false) {
                    let staged = self.git(ctx, &["add", "-A"]).await;
                    if staged.is_error {
                        return Ok(staged);
                    }
                }
                self.git(ctx, &["commit", "-m", message]).await
            }
            other => ToolOutput::error(format!(
                "git_ops: unknown operation '{}' (expected status, diff, log, or commit)",
                other
            )),
        };

        Ok(output)
    }
}
