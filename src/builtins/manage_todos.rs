//! manage_todos tool - Agent-facing interface to the todo store

use async_trait::async_trait;
use serde_json::Value;

use super::{BuiltinTool, ToolContext, ToolOutput};
use crate::catalog::{RiskLevel, ToolDescriptor};
use crate::error::{QuestorError, Result};
use crate::todos::{Todo, TodoStatus};

pub struct ManageTodosTool;

fn render(todos: &[Todo]) -> String {
    if todos.is_empty() {
        return "(no todos)".to_string();
    }
    todos
        .iter()
        .map(|t| {
            let symbol = match t.status {
                TodoStatus::Pending => "[ ]",
                TodoStatus::InProgress => "[~]",
                TodoStatus::Completed => "[x]",
            };
            format!("{} #{} {}", symbol, t.id, t.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl BuiltinTool for ManageTodosTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new("manage_todos", "Track task progress with a todo list: add, update, list, clear_completed.")
            .with_tags(["todos", "planning"])
            .with_risk(RiskLevel::Low)
            .sticky()
            .with_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "action": {
                        "type": "string",
                        "description": "One of: add, update, list, clear_completed"
                    },
                    "content": {
                        "type": "string",
                        "description": "Todo text (add; optional for update)"
                    },
                    "todo_id": {
                        "type": "integer",
                        "description": "Target todo id (update only)"
                    },
                    "status": {
                        "type": "string",
                        "description": "New status: pending, in_progress, or completed (update only)"
                    }
                },
                "required": ["action"]
            }))
    }

    async fn execute(&self, args: &Value, ctx: &ToolContext) -> Result<ToolOutput> {
        let action = args["action"]
            .as_str()
            .ok_or_else(|| QuestorError::Validation("action is required".to_string()))?;
        let todos = ctx.todos();

        let output = match action {
            "add" => {
                let content = args["content"]
                    .as_str()
                    .ok_or_else(|| QuestorError::Validation("content is required for add".to_string()))?;
                let todo = todos.add(content)?;
                ToolOutput::success(format!("added todo #{}: {}", todo.id, todo.content))
            }
            "update" => {
                let id = args["todo_id"]
                    .as_i64()
                    .ok_or_else(|| QuestorError::Validation("todo_id is required for update".to_string()))?;
                let status = match args["status"].as_str() {
                    Some(s) => Some(TodoStatus::from_str(s).ok_or_else(|| {
                        QuestorError::Validation(format!("unknown status '{}'", s))
                    })?),
                    None => None,
                };
                let content = args["content"].as_str();
                match todos.update(id, status, content) {
                    Ok(todo) => ToolOutput::success(format!(
                        "updated todo #{}: {} ({})",
                        todo.id,
                        todo.content,
                        todo.status.as_str()
                    )),
                    Err(QuestorError::NotFound(what)) => {
                        ToolOutput::error(format!("manage_todos: {} not found", what))
                    }
                    Err(e) => return Err(e),
                }
            }
            "list" => {
                let filter = match args["status"].as_str() {
                    Some(s) => Some(TodoStatus::from_str(s).ok_or_else(|| {
                        QuestorError::Validation(format!("unknown status '{}'", s))
                    })?),
                    None => None,
                };
                ToolOutput::success(render(&todos.list(filter)?))
            }
            "clear_completed" => {
                let removed = todos.clear_completed()?;
                ToolOutput::success(format!("cleared {} completed todo(s)", removed))
            }
            other => ToolOutput::error(format!(
                "manage_todos: unknown action '{}' (expected add, update, list, or clear_completed)",
                other
            )),
        };

        Ok(output)
    }
}
