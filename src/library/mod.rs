//! Persistent tool library
//!
//! Durable store of agent-authored tool definitions (shell or python
//! bodies with argument schemas). The library owns the `LibraryTool`
//! records exclusively: all CRUD goes through it, and every successful
//! mutation bumps a generation counter so the cached catalog projection is
//! rebuilt before the next retrieval pass.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use log::info;
use rusqlite::{OptionalExtension, params};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::builtins::ToolContext;
use crate::catalog::{RiskLevel, ToolDescriptor, ToolSource};
use crate::error::{QuestorError, Result};
use crate::exec::{ExecutionAdapter, Observation};
use crate::schema::validate_args;
use crate::store::Database;

/// Script flavor of a library tool body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    Shell,
    Python,
}

impl ToolKind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "shell" | "sh" => Some(Self::Shell),
            "python" | "py" => Some(Self::Python),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Shell => "shell",
            Self::Python => "python",
        }
    }
}

/// A persisted tool definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryTool {
    pub name: String,
    pub description: String,
    pub kind: ToolKind,
    pub body: String,
    pub args_schema: Value,
    pub metadata: serde_json::Map<String, Value>,
    pub timeout_seconds: u64,
    pub created_at: String,
    pub updated_at: String,
}

impl LibraryTool {
    /// Project this record into a catalog descriptor. Risk, tags, and
    /// stickiness come from the open metadata map (`risk`, `tags`,
    /// `sticky` keys); risk defaults to MEDIUM for persisted scripts.
    pub fn descriptor(&self) -> ToolDescriptor {
        let risk = self
            .metadata
            .get("risk")
            .and_then(|v| v.as_str())
            .and_then(RiskLevel::from_str)
            .unwrap_or(RiskLevel::Medium);

        let tags: Vec<String> = self
            .metadata
            .get("tags")
            .and_then(|v| v.as_array())
            .map(|arr| arr.iter().filter_map(|t| t.as_str().map(str::to_string)).collect())
            .unwrap_or_default();

        let sticky = self
            .metadata
            .get("sticky")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        let mut descriptor = ToolDescriptor::new(&self.name, &self.description)
            .with_tags(tags)
            .with_risk(risk)
            .with_schema(self.args_schema.clone())
            .with_source(ToolSource::Library);
        if sticky {
            descriptor = descriptor.sticky();
        }
        descriptor
    }
}

/// Partial update for `ToolLibrary::update`. Unset fields keep their
/// stored values.
#[derive(Debug, Clone, Default)]
pub struct LibraryToolUpdate {
    pub description: Option<String>,
    pub kind: Option<ToolKind>,
    pub body: Option<String>,
    pub args_schema: Option<Value>,
    pub metadata: Option<serde_json::Map<String, Value>>,
    pub timeout_seconds: Option<u64>,
}

/// Default timeout for newly created library tools
pub const DEFAULT_TOOL_TIMEOUT_SECONDS: u64 = 60;

/// CRUD interface over the `library_tools` table.
#[derive(Clone)]
pub struct ToolLibrary {
    db: Database,
    generation: Arc<AtomicU64>,
}

impl ToolLibrary {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Current catalog generation. Bumped by every successful mutation.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn bump_generation(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Create a new tool. Fails with AlreadyExists if the name is taken.
    pub fn create(&self, tool: LibraryTool) -> Result<()> {
        let conn = self.db.lock()?;

        let exists: Option<String> = conn
            .query_row(
                "SELECT name FROM library_tools WHERE name = ?1",
                params![tool.name],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_some() {
            return Err(QuestorError::AlreadyExists(format!("tool '{}'", tool.name)));
        }

        conn.execute(
            "INSERT INTO library_tools
                (name, description, kind, body, args_schema, metadata, timeout_seconds, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                tool.name,
                tool.description,
                tool.kind.as_str(),
                tool.body,
                serde_json::to_string(&tool.args_schema)?,
                serde_json::to_string(&tool.metadata)?,
                tool.timeout_seconds as i64,
                tool.created_at,
                tool.updated_at,
            ],
        )?;
        drop(conn);

        info!("library: created tool '{}'", tool.name);
        self.bump_generation();
        Ok(())
    }

    /// Fetch one tool by name. Fails with NotFound if absent.
    pub fn show(&self, name: &str) -> Result<LibraryTool> {
        let conn = self.db.lock()?;
        conn.query_row(
            "SELECT name, description, kind, body, args_schema, metadata, timeout_seconds, created_at, updated_at
             FROM library_tools WHERE name = ?1",
            params![name],
            row_to_tool,
        )
        .optional()?
        .ok_or_else(|| QuestorError::NotFound(format!("tool '{}'", name)))
    }

    /// List all tools, optionally filtered by kind, in name order.
    pub fn list(&self, kind: Option<ToolKind>) -> Result<Vec<LibraryTool>> {
        let conn = self.db.lock()?;
        let mut stmt = conn.prepare(
            "SELECT name, description, kind, body, args_schema, metadata, timeout_seconds, created_at, updated_at
             FROM library_tools ORDER BY name",
        )?;
        let tools = stmt
            .query_map([], row_to_tool)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(match kind {
            Some(kind) => tools.into_iter().filter(|t| t.kind == kind).collect(),
            None => tools,
        })
    }

    /// Apply a partial update. Fails with NotFound if the tool is absent;
    /// `updated_at` is refreshed, `created_at` is preserved.
    pub fn update(&self, name: &str, update: LibraryToolUpdate) -> Result<LibraryTool> {
        let mut tool = self.show(name)?;

        if let Some(description) = update.description {
            tool.description = description;
        }
        if let Some(kind) = update.kind {
            tool.kind = kind;
        }
        if let Some(body) = update.body {
            tool.body = body;
        }
        if let Some(args_schema) = update.args_schema {
            tool.args_schema = args_schema;
        }
        if let Some(metadata) = update.metadata {
            tool.metadata = metadata;
        }
        if let Some(timeout_seconds) = update.timeout_seconds {
            tool.timeout_seconds = timeout_seconds;
        }
        tool.updated_at = Utc::now().to_rfc3339();

        let conn = self.db.lock()?;
        conn.execute(
            "UPDATE library_tools
             SET description = ?2, kind = ?3, body = ?4, args_schema = ?5,
                 metadata = ?6, timeout_seconds = ?7, updated_at = ?8
             WHERE name = ?1",
            params![
                tool.name,
                tool.description,
                tool.kind.as_str(),
                tool.body,
                serde_json::to_string(&tool.args_schema)?,
                serde_json::to_string(&tool.metadata)?,
                tool.timeout_seconds as i64,
                tool.updated_at,
            ],
        )?;
        drop(conn);

        info!("library: updated tool '{}'", name);
        self.bump_generation();
        Ok(tool)
    }

    /// Delete a tool. Fails with NotFound if absent; a second delete of the
    /// same name fails the same way.
    pub fn delete(&self, name: &str) -> Result<()> {
        let conn = self.db.lock()?;
        let affected = conn.execute("DELETE FROM library_tools WHERE name = ?1", params![name])?;
        drop(conn);

        if affected == 0 {
            return Err(QuestorError::NotFound(format!("tool '{}'", name)));
        }

        info!("library: deleted tool '{}'", name);
        self.bump_generation();
        Ok(())
    }

    /// Project all records into catalog descriptors.
    pub fn descriptors(&self) -> Result<Vec<ToolDescriptor>> {
        Ok(self.list(None)?.iter().map(LibraryTool::descriptor).collect())
    }

    /// Run a stored tool by name through the execution adapter.
    ///
    /// Fails with NotFound if absent and SchemaMismatch if the arguments
    /// violate the stored schema. `timeout_override` replaces the stored
    /// timeout for this call only; the record is not mutated.
    pub async fn run(
        &self,
        name: &str,
        args: &Value,
        timeout_override: Option<u64>,
        adapter: &ExecutionAdapter,
        ctx: &ToolContext,
    ) -> Result<Observation> {
        let mut tool = self.show(name)?;
        validate_args(&tool.args_schema, args)?;

        if let Some(timeout) = timeout_override {
            tool.timeout_seconds = timeout;
        }

        Ok(adapter.run_library_record(&tool, args, ctx).await)
    }
}

/// Convenience constructor for a new record with fresh timestamps.
pub fn new_tool(
    name: impl Into<String>,
    description: impl Into<String>,
    kind: ToolKind,
    body: impl Into<String>,
) -> LibraryTool {
    let now = Utc::now().to_rfc3339();
    LibraryTool {
        name: name.into(),
        description: description.into(),
        kind,
        body: body.into(),
        args_schema: serde_json::json!({
            "type": "object",
            "properties": {},
            "required": []
        }),
        metadata: serde_json::Map::new(),
        timeout_seconds: DEFAULT_TOOL_TIMEOUT_SECONDS,
        created_at: now.clone(),
        updated_at: now,
    }
}

fn row_to_tool(row: &rusqlite::Row<'_>) -> rusqlite::Result<LibraryTool> {
    let kind_text: String = row.get(2)?;
    let schema_text: String = row.get(4)?;
    let metadata_text: String = row.get(5)?;
    let timeout: i64 = row.get(6)?;

    Ok(LibraryTool {
        name: row.get(0)?,
        description: row.get(1)?,
        kind: ToolKind::from_str(&kind_text).unwrap_or(ToolKind::Shell),
        body: row.get(3)?,
        args_schema: serde_json::from_str(&schema_text).unwrap_or(Value::Null),
        metadata: serde_json::from_str(&metadata_text).unwrap_or_default(),
        timeout_seconds: timeout.max(0) as u64,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}
