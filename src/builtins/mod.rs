//! Built-in tool suite
//!
//! In-process capabilities registered at startup: file operations, search,
//! command execution, git, and todo management. Each tool owns its
//! descriptor (name, tags, risk, schema) so the catalog projection and the
//! implementation cannot drift apart.

mod context;
mod edit_file;
mod git_ops;
mod glob_tool;
mod grep;
mod list_directory;
mod manage_todos;
mod read_file;
mod run_command;
mod write_file;

pub use context::ToolContext;
pub use edit_file::EditFileTool;
pub use git_ops::GitOpsTool;
pub use glob_tool::GlobTool;
pub use grep::GrepTool;
pub use list_directory::ListDirectoryTool;
pub use manage_todos::ManageTodosTool;
pub use read_file::ReadFileTool;
pub use run_command::RunCommandTool;
pub use write_file::WriteFileTool;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::catalog::ToolDescriptor;
use crate::error::Result;

/// Result from one builtin execution, before normalization into an
/// observation.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub content: String,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
        }
    }
}

/// An in-process tool callable by the agent
#[async_trait]
pub trait BuiltinTool: Send + Sync {
    /// Catalog descriptor for this tool
    fn descriptor(&self) -> ToolDescriptor;

    /// Execute the tool
    async fn execute(&self, args: &Value, ctx: &ToolContext) -> Result<ToolOutput>;
}

/// Registry of builtin tools, iterated in name order.
pub struct BuiltinRegistry {
    tools: BTreeMap<String, Box<dyn BuiltinTool>>,
}

impl BuiltinRegistry {
    /// Create an empty registry (for custom tool sets)
    pub fn new() -> Self {
        Self { tools: BTreeMap::new() }
    }

    /// Add a tool to the registry
    pub fn add(&mut self, tool: Box<dyn BuiltinTool>) {
        self.tools.insert(tool.descriptor().name, tool);
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<&dyn BuiltinTool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// Check if a tool exists
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Descriptors for all registered tools, in name order
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools.values().map(|t| t.descriptor()).collect()
    }

    /// Registered tool names
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for BuiltinRegistry {
    fn default() -> Self {
        standard_registry()
    }
}

/// Registry with the full standard tool suite.
pub fn standard_registry() -> BuiltinRegistry {
    let mut registry = BuiltinRegistry::new();

    // File system
    registry.add(Box::new(ReadFileTool));
    registry.add(Box::new(WriteFileTool));
    registry.add(Box::new(EditFileTool));
    registry.add(Box::new(ListDirectoryTool));
    registry.add(Box::new(GlobTool));

    // Search
    registry.add(Box::new(GrepTool));

    // Command execution
    registry.add(Box::new(RunCommandTool));
    registry.add(Box::new(GitOpsTool));

    // Workflow tracking
    registry.add(Box::new(ManageTodosTool));

    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::RiskLevel;

    #[test]
    fn test_standard_registry_has_all_tools() {
        let registry = standard_registry();

        for name in [
            "read_file",
            "write_file",
            "edit_file",
            "list_directory",
            "glob",
            "grep",
            "run_command",
            "git_ops",
            "manage_todos",
        ] {
            assert!(registry.contains(name), "missing builtin '{}'", name);
        }
    }

    #[test]
    fn test_descriptors_are_name_ordered() {
        let registry = standard_registry();
        let names: Vec<String> = registry.descriptors().iter().map(|d| d.name.clone()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_risky_tools_are_marked_high() {
        let registry = standard_registry();
        assert_eq!(registry.get("run_command").unwrap().descriptor().risk, RiskLevel::High);
        assert_eq!(registry.get("git_ops").unwrap().descriptor().risk, RiskLevel::High);
        assert_eq!(registry.get("read_file").unwrap().descriptor().risk, RiskLevel::Low);
    }

    #[test]
    fn test_sticky_tools() {
        let registry = standard_registry();
        assert!(registry.get("list_directory").unwrap().descriptor().sticky);
        assert!(registry.get("manage_todos").unwrap().descriptor().sticky);
        assert!(!registry.get("run_command").unwrap().descriptor().sticky);
    }

    #[test]
    fn test_empty_registry() {
        let registry = BuiltinRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.descriptors().is_empty());
    }

    #[test]
    fn test_tool_output_constructors() {
        let ok = ToolOutput::success("done");
        assert!(!ok.is_error);
        let err = ToolOutput::error("failed");
        assert!(err.is_error);
    }
}
