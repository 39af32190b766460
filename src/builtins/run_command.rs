//! run_command tool - Execute a shell command in the workspace

use async_trait::async_trait;
use serde_json::Value;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use super::{BuiltinTool, ToolContext, ToolOutput};
use crate::catalog::{RiskLevel, ToolDescriptor};
use crate::error::{QuestorError, Result};

const DEFAULT_TIMEOUT_MS: u64 = 120_000;

pub struct RunCommandTool;

#[async_trait]
impl BuiltinTool for RunCommandTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new("run_command", "Execute a shell command in the workspace and return its output.")
            .with_tags(["shell", "command"])
            .with_risk(RiskLevel::High)
            .with_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "command": {
                        "type": "string",
                        "description": "Shell command to execute"
                    },
                    "timeout_ms": {
                        "type": "integer",
                        "description": "Timeout in milliseconds (default: 120000)"
                    }
                },
                "required": ["command"]
            }))
    }

    async fn execute(&self, args: &Value, ctx: &ToolContext) -> Result<ToolOutput> {
        let command = args["command"]
            .as_str()
            .ok_or_else(|| QuestorError::Validation("command is required".to_string()))?;
        let timeout_ms = args["timeout_ms"].as_u64().unwrap_or(DEFAULT_TIMEOUT_MS);

        let child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(ctx.root())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match child {
            Ok(child) => child,
            Err(e) => return Ok(ToolOutput::error(format!("run_command: failed to spawn: {}", e))),
        };

        let output = match tokio::time::timeout(Duration::from_millis(timeout_ms), child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Ok(ToolOutput::error(format!("run_command: {}", e))),
            Err(_) => {
                return Ok(ToolOutput::error(format!(
                    "run_command: timed out after {}ms",
                    timeout_ms
                )));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        let mut combined = String::new();
        if !stdout.is_empty() {
            combined.push_str(&stdout);
        }
        if !stderr.is_empty() {
            if !combined.is_empty() {
                combined.push_str("\n\nSTDERR:\n");
            }
            combined.push_str(&stderr);
        }

        if output.status.success() {
            Ok(ToolOutput::success(combined))
        } else {
            let code = output.status.code().unwrap_or(-1);
            Ok(ToolOutput::error(format!(
                "run_command: exit code {}\n{}",
                code, combined
            )))
        }
    }
}
