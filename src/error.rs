//! Error types for Questor
//!
//! Centralized error handling using thiserror. The variants mirror the
//! failure taxonomy of the agent core: validation and schema problems stay
//! non-fatal (they become observations), store key errors surface to the
//! caller of that operation, and only storage loss or malformed task input
//! aborts a task attempt.

use thiserror::Error;

/// All error types that can occur in Questor
#[derive(Debug, Error)]
pub enum QuestorError {
    /// Bad arguments or malformed input
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Arguments do not satisfy a tool's args schema
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Record not found in a durable store
    #[error("Not found: {0}")]
    NotFound(String),

    /// Record already exists in a durable store
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Storage/persistence error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Reasoning engine boundary error
    #[error("Reasoner error: {0}")]
    Reasoner(String),

    /// Tool execution error
    #[error("Tool error: {0}")]
    Tool(String),

    /// Step or wall-clock budget exhausted for a task attempt
    #[error("Budget exceeded: {0}")]
    BudgetExceeded(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<rusqlite::Error> for QuestorError {
    fn from(err: rusqlite::Error) -> Self {
        QuestorError::Storage(err.to_string())
    }
}

/// Result type alias for Questor operations
pub type Result<T> = std::result::Result<T, QuestorError>;
