//! Reasoning engine boundary
//!
//! The core treats the reasoning engine as an opaque, possibly
//! nondeterministic collaborator: given the task, the execution history,
//! and the candidate descriptors, it returns either a tool invocation
//! request or a final answer. No retry logic lives at this boundary -
//! retries happen by re-entering the control loop with new context.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::agent::ExecutionTrace;
use crate::catalog::ToolDescriptor;
use crate::error::{QuestorError, Result};

/// A tool invocation requested by the reasoning engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRequest {
    pub tool: String,
    pub args: Value,
}

impl ActionRequest {
    pub fn new(tool: impl Into<String>, args: Value) -> Self {
        Self {
            tool: tool.into(),
            args,
        }
    }
}

/// One reasoning step outcome: act, or finish with an answer
#[derive(Debug, Clone)]
pub enum Decision {
    Act(ActionRequest),
    Finish(String),
}

/// The external reasoning engine.
#[async_trait]
pub trait Reasoner: Send + Sync {
    /// Pick the next action (or the final answer) for a task given the
    /// accumulated trace and the retrieved candidate tools.
    async fn decide(
        &self,
        task: &str,
        trace: &ExecutionTrace,
        candidates: &[ToolDescriptor],
    ) -> Result<Decision>;

    /// Free-form reflection used by the self-improvement engine for
    /// diagnosis and strategy revision.
    async fn reflect(&self, prompt: &str) -> Result<String>;
}

/// Scripted reasoner for tests and offline runs: replays a fixed sequence
/// of decisions and canned reflections.
pub struct ScriptedReasoner {
    decisions: Mutex<VecDeque<Decision>>,
    reflections: Mutex<VecDeque<String>>,
}

impl ScriptedReasoner {
    pub fn new(decisions: Vec<Decision>) -> Self {
        Self {
            decisions: Mutex::new(decisions.into()),
            reflections: Mutex::new(VecDeque::new()),
        }
    }

    pub fn with_reflections(decisions: Vec<Decision>, reflections: Vec<String>) -> Self {
        Self {
            decisions: Mutex::new(decisions.into()),
            reflections: Mutex::new(reflections.into()),
        }
    }

    /// Number of decisions not yet consumed
    pub fn remaining(&self) -> usize {
        self.decisions.lock().map(|q| q.len()).unwrap_or(0)
    }
}

#[async_trait]
impl Reasoner for ScriptedReasoner {
    async fn decide(
        &self,
        _task: &str,
        _trace: &ExecutionTrace,
        _candidates: &[ToolDescriptor],
    ) -> Result<Decision> {
        self.decisions
            .lock()
            .map_err(|e| QuestorError::Reasoner(format!("script lock poisoned: {}", e)))?
            .pop_front()
            .ok_or_else(|| QuestorError::Reasoner("script exhausted".to_string()))
    }

    async fn reflect(&self, _prompt: &str) -> Result<String> {
        Ok(self
            .reflections
            .lock()
            .map_err(|e| QuestorError::Reasoner(format!("script lock poisoned: {}", e)))?
            .pop_front()
            .unwrap_or_else(|| "no further insight".to_string()))
    }
}
