//! Self-improvement engine
//!
//! After a failed attempt the engine asks the reasoner to diagnose the
//! trace, stores the diagnosis as a durable learning, and produces a
//! revised strategy for the next attempt. Learnings are scoped by
//! category so unrelated task families do not pollute each other's
//! context.

use std::sync::Arc;

use chrono::Utc;
use log::info;
use rusqlite::params;
use serde::{Deserialize, Serialize};

use crate::agent::ExecutionTrace;
use crate::error::Result;
use crate::llm::Reasoner;
use crate::store::Database;

/// A durable lesson extracted from a failed attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Learning {
    pub id: i64,
    pub category: String,
    pub task_description: String,
    pub content: String,
    pub created_at: String,
}

/// Interface over the `learnings` table.
#[derive(Clone)]
pub struct LearningStore {
    db: Database,
}

impl LearningStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Append a learning under a category.
    pub fn append(&self, category: &str, task_description: &str, content: &str) -> Result<Learning> {
        let created_at = Utc::now().to_rfc3339();
        let conn = self.db.lock()?;
        conn.execute(
            "INSERT INTO learnings (category, task_description, content, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![category, task_description, content, created_at],
        )?;
        let id = conn.last_insert_rowid();

        Ok(Learning {
            id,
            category: category.to_string(),
            task_description: task_description.to_string(),
            content: content.to_string(),
            created_at,
        })
    }

    /// Learnings for one category, newest first.
    pub fn for_category(&self, category: &str) -> Result<Vec<Learning>> {
        let conn = self.db.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, category, task_description, content, created_at
             FROM learnings WHERE category = ?1 ORDER BY id DESC",
        )?;
        let learnings = stmt
            .query_map(params![category], row_to_learning)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(learnings)
    }

    /// All learnings, newest first.
    pub fn all(&self) -> Result<Vec<Learning>> {
        let conn = self.db.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, category, task_description, content, created_at
             FROM learnings ORDER BY id DESC",
        )?;
        let learnings = stmt
            .query_map([], row_to_learning)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(learnings)
    }
}

fn row_to_learning(row: &rusqlite::Row<'_>) -> rusqlite::Result<Learning> {
    Ok(Learning {
        id: row.get(0)?,
        category: row.get(1)?,
        task_description: row.get(2)?,
        content: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Diagnose-store-revise cycle driven by the reasoner.
pub struct SelfImprovementEngine {
    reasoner: Arc<dyn Reasoner>,
    store: LearningStore,
}

impl SelfImprovementEngine {
    pub fn new(reasoner: Arc<dyn Reasoner>, store: LearningStore) -> Self {
        Self { reasoner, store }
    }

    pub fn store(&self) -> &LearningStore {
        &self.store
    }

    /// Ask the reasoner why an attempt failed.
    pub async fn analyze(&self, task: &str, trace: &ExecutionTrace, failure: &str) -> Result<String> {
        let prompt = format!(
            "The following task attempt failed.\n\nTask: {}\nFailure: {}\n\nExecution trace:\n{}\n\n\
             Diagnose the most likely root cause in one or two sentences.",
            task,
            failure,
            trace.render()
        );
        self.reasoner.reflect(&prompt).await
    }

    /// Persist a diagnosis as a learning for future attempts.
    pub fn store_learning(&self, category: &str, task: &str, diagnosis: &str) -> Result<Learning> {
        let learning = self.store.append(category, task, diagnosis)?;
        info!("improve: stored learning #{} under '{}'", learning.id, category);
        Ok(learning)
    }

    /// Produce a revised strategy for the next attempt, seeded with the
    /// accumulated learnings for the category.
    pub async fn iterate(&self, category: &str, task: &str, diagnosis: &str) -> Result<String> {
        let prior = self.store.for_category(category)?;
        let mut prompt = format!(
            "Task: {}\nLatest diagnosis: {}\n\nPrior lessons for this kind of task:\n",
            task, diagnosis
        );
        if prior.is_empty() {
            prompt.push_str("(none)\n");
        } else {
            for learning in &prior {
                prompt.push_str("- ");
                prompt.push_str(&learning.content);
                prompt.push('\n');
            }
        }
        prompt.push_str("\nPropose a revised strategy for the next attempt in one paragraph.");

        self.reasoner.reflect(&prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedReasoner;

    fn store() -> LearningStore {
        LearningStore::new(Database::open_in_memory().unwrap())
    }

    #[test]
    fn test_append_and_fetch_by_category() {
        let store = store();
        store.append("files", "list the repo", "glob before grep").unwrap();
        store.append("network", "fetch a url", "check DNS first").unwrap();

        let files = store.for_category("files").unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].content, "glob before grep");

        assert!(store.for_category("deploy").unwrap().is_empty());
    }

    #[test]
    fn test_learnings_are_newest_first() {
        let store = store();
        store.append("general", "t", "first lesson").unwrap();
        store.append("general", "t", "second lesson").unwrap();

        let learnings = store.for_category("general").unwrap();
        assert_eq!(learnings[0].content, "second lesson");
        assert_eq!(learnings[1].content, "first lesson");
    }

    #[test]
    fn test_all_spans_categories() {
        let store = store();
        store.append("a", "t", "x").unwrap();
        store.append("b", "t", "y").unwrap();
        assert_eq!(store.all().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_analyze_uses_reflection() {
        let reasoner = Arc::new(ScriptedReasoner::with_reflections(
            vec![],
            vec!["the command was not installed".to_string()],
        ));
        let engine = SelfImprovementEngine::new(reasoner, store());

        let diagnosis = engine
            .analyze("build the project", &ExecutionTrace::new(), "exit code 127")
            .await
            .unwrap();
        assert_eq!(diagnosis, "the command was not installed");
    }

    #[tokio::test]
    async fn test_iterate_includes_prior_learnings() {
        let reasoner = Arc::new(ScriptedReasoner::with_reflections(
            vec![],
            vec!["install the toolchain first".to_string()],
        ));
        let engine = SelfImprovementEngine::new(reasoner, store());

        engine.store_learning("build", "build the project", "cc was missing").unwrap();
        let strategy = engine
            .iterate("build", "build the project", "linker failed")
            .await
            .unwrap();

        assert_eq!(strategy, "install the toolchain first");
        assert_eq!(engine.store().for_category("build").unwrap().len(), 1);
    }
}
