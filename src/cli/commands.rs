//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - retrieve: preview the candidate tools for a task
//! - tool: manage and run library tools
//! - vault: manage research notes
//! - todo: manage the todo list
//! - learnings: show stored learnings

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Questor - an autonomous task-execution agent core
#[derive(Parser, Debug)]
#[command(name = "questor")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Preview which tools would be retrieved for a task
    Retrieve {
        /// Task description to rank tools against
        task: String,
    },

    /// Tool library management
    Tool {
        #[command(subcommand)]
        command: ToolCommands,
    },

    /// Research vault notes
    Vault {
        #[command(subcommand)]
        command: VaultCommands,
    },

    /// Todo list management
    Todo {
        #[command(subcommand)]
        command: TodoCommands,
    },

    /// Show stored learnings
    Learnings {
        /// Only show learnings for this category
        #[arg(short = 'C', long)]
        category: Option<String>,
    },
}

/// Tool library subcommands
#[derive(Subcommand, Debug)]
pub enum ToolCommands {
    /// Create a new library tool
    Create {
        /// Tool name
        name: String,

        /// One-line description
        #[arg(short, long)]
        description: String,

        /// Script kind (shell or python)
        #[arg(short, long, default_value = "shell")]
        kind: String,

        /// Script body
        #[arg(short, long)]
        body: String,

        /// Argument schema as JSON
        #[arg(short, long)]
        schema: Option<String>,

        /// Timeout in seconds
        #[arg(short, long)]
        timeout: Option<u64>,
    },

    /// Show one tool
    Show {
        /// Tool name
        name: String,
    },

    /// List all tools
    List {
        /// Filter by kind (shell or python)
        #[arg(short, long)]
        kind: Option<String>,
    },

    /// Update fields of an existing tool
    Update {
        /// Tool name
        name: String,

        /// New description
        #[arg(short, long)]
        description: Option<String>,

        /// New script kind (shell or python)
        #[arg(short, long)]
        kind: Option<String>,

        /// New script body
        #[arg(short, long)]
        body: Option<String>,

        /// New argument schema as JSON
        #[arg(short, long)]
        schema: Option<String>,

        /// New timeout in seconds
        #[arg(short, long)]
        timeout: Option<u64>,
    },

    /// Delete a tool
    Delete {
        /// Tool name
        name: String,
    },

    /// Run a tool with JSON arguments
    Run {
        /// Tool name
        name: String,

        /// Arguments as a JSON object
        #[arg(short, long, default_value = "{}")]
        args: String,

        /// Timeout override in seconds for this call
        #[arg(short, long)]
        timeout: Option<u64>,
    },
}

/// Vault subcommands
#[derive(Subcommand, Debug)]
pub enum VaultCommands {
    /// Set (create or replace) a note
    Set {
        /// Note key
        key: String,

        /// Note content
        content: String,

        /// Namespace (default: global)
        #[arg(short, long)]
        namespace: Option<String>,
    },

    /// Append content to a note, creating it if absent
    Append {
        /// Note key
        key: String,

        /// Content to append
        content: String,

        /// Namespace (default: global)
        #[arg(short, long)]
        namespace: Option<String>,
    },

    /// Show one note
    Get {
        /// Note key
        key: String,

        /// Namespace (default: global)
        #[arg(short, long)]
        namespace: Option<String>,
    },

    /// List notes in a namespace
    List {
        /// Namespace (default: global)
        #[arg(short, long)]
        namespace: Option<String>,
    },

    /// Delete a note
    Delete {
        /// Note key
        key: String,

        /// Namespace (default: global)
        #[arg(short, long)]
        namespace: Option<String>,
    },
}

/// Todo subcommands
#[derive(Subcommand, Debug)]
pub enum TodoCommands {
    /// Add a new todo
    Add {
        /// Todo text
        content: String,
    },

    /// Update a todo's status or content
    Update {
        /// Todo id
        id: i64,

        /// New status (pending, in_progress, completed)
        #[arg(short, long)]
        status: Option<String>,

        /// New content
        #[arg(long)]
        content: Option<String>,
    },

    /// List todos
    List {
        /// Filter by status (pending, in_progress, completed)
        #[arg(short, long)]
        status: Option<String>,
    },

    /// Remove all completed todos
    ClearCompleted,
}
