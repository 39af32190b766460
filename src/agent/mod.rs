//! Task control loop
//!
//! Drives one task from start to finish: retrieve candidate tools,
//! ask the reasoner for the next step, execute the chosen action, feed the
//! observation back, and repeat until the reasoner finishes or a budget
//! runs out. Exhausted attempts flow through the self-improvement engine,
//! which diagnoses the trace, persists a learning, and supplies a revised
//! strategy for the next attempt.

mod trace;

pub use trace::{ExecutionTrace, TraceStep};

use std::sync::{Arc, Mutex};
use std::time::Instant;

use log::{debug, info, warn};
use tokio::sync::watch;

use crate::builtins::{BuiltinRegistry, ToolContext};
use crate::catalog::{ToolCatalog, ToolDescriptor};
use crate::error::{QuestorError, Result};
use crate::exec::{ExecutionAdapter, Observation, ToolBridge};
use crate::improve::SelfImprovementEngine;
use crate::library::ToolLibrary;
use crate::llm::{ActionRequest, Decision, Reasoner};
use crate::retrieval::{RetrievalConfig, RetrievalEngine};
use crate::schema::validate_args;

/// Budgets for one task.
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Maximum reasoning steps per attempt
    pub max_steps: usize,
    /// Wall-clock budget per attempt, in milliseconds
    pub max_wall_ms: u64,
    /// Additional attempts after the first one fails
    pub retry_budget: usize,
    /// Learning category for the self-improvement engine
    pub category: String,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_steps: 16,
            max_wall_ms: 300_000,
            retry_budget: 1,
            category: "general".to_string(),
        }
    }
}

/// Terminal state of a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The reasoner produced a final answer
    Completed { answer: String },
    /// All attempts exhausted their budgets, or the task was cancelled
    Failed { reason: String },
}

/// Result of running a task: outcome, attempts used, and the trace of the
/// final attempt.
#[derive(Debug, Clone)]
pub struct TaskReport {
    pub outcome: TaskOutcome,
    pub attempts: usize,
    pub trace: ExecutionTrace,
}

enum AttemptEnd {
    Finished(String),
    Exhausted(String),
    Cancelled,
}

/// The agent core. Owns the catalog projection, the retrieval engine, the
/// execution adapter, and the improvement cycle.
pub struct TaskLoop {
    reasoner: Arc<dyn Reasoner>,
    builtins: Arc<BuiltinRegistry>,
    library: ToolLibrary,
    bridges: Vec<Arc<dyn ToolBridge>>,
    adapter: ExecutionAdapter,
    retrieval: RetrievalEngine,
    improver: SelfImprovementEngine,
    ctx: ToolContext,
    config: LoopConfig,
    cancel: Option<watch::Receiver<bool>>,
    // Catalog snapshot keyed by library generation
    catalog_cache: Mutex<Option<(u64, ToolCatalog)>>,
}

impl TaskLoop {
    pub fn new(
        reasoner: Arc<dyn Reasoner>,
        builtins: Arc<BuiltinRegistry>,
        library: ToolLibrary,
        improver: SelfImprovementEngine,
        ctx: ToolContext,
    ) -> Self {
        let adapter = ExecutionAdapter::new(builtins.clone(), library.clone());
        Self {
            reasoner,
            builtins,
            library,
            bridges: Vec::new(),
            adapter,
            retrieval: RetrievalEngine::new(RetrievalConfig::default()),
            improver,
            ctx,
            config: LoopConfig::default(),
            cancel: None,
            catalog_cache: Mutex::new(None),
        }
    }

    pub fn with_bridges(mut self, bridges: Vec<Arc<dyn ToolBridge>>) -> Self {
        self.adapter = ExecutionAdapter::new(self.builtins.clone(), self.library.clone())
            .with_bridges(bridges.clone());
        self.bridges = bridges;
        self
    }

    pub fn with_config(mut self, config: LoopConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_retrieval(mut self, config: RetrievalConfig) -> Self {
        self.retrieval = RetrievalEngine::new(config);
        self
    }

    /// Attach a cancellation signal. Setting the watched value to true
    /// stops the task at the next step boundary and aborts any in-flight
    /// action.
    pub fn with_cancel(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Run one task to a terminal outcome.
    ///
    /// An empty task description is rejected up front. Each attempt gets a
    /// fresh trace; exhausted attempts are diagnosed and, while the retry
    /// budget lasts, retried with a revised strategy.
    pub async fn run(&self, task: &str) -> Result<TaskReport> {
        if task.trim().is_empty() {
            return Err(QuestorError::Validation("task description is empty".to_string()));
        }

        let max_attempts = self.config.retry_budget + 1;
        let mut strategy: Option<String> = None;

        for attempt in 1..=max_attempts {
            info!("task attempt {}/{}: {}", attempt, max_attempts, task);
            let mut trace = ExecutionTrace::new();
            let end = self.attempt(task, strategy.as_deref(), &mut trace).await?;

            match end {
                AttemptEnd::Finished(answer) => {
                    return Ok(TaskReport {
                        outcome: TaskOutcome::Completed { answer },
                        attempts: attempt,
                        trace,
                    });
                }
                AttemptEnd::Cancelled => {
                    return Ok(TaskReport {
                        outcome: TaskOutcome::Failed {
                            reason: "cancelled".to_string(),
                        },
                        attempts: attempt,
                        trace,
                    });
                }
                AttemptEnd::Exhausted(reason) => {
                    warn!("attempt {} exhausted: {}", attempt, reason);
                    let diagnosis = self.improver.analyze(task, &trace, &reason).await?;
                    self.improver.store_learning(&self.config.category, task, &diagnosis)?;

                    if attempt < max_attempts {
                        let revised = self.improver.iterate(&self.config.category, task, &diagnosis).await?;
                        strategy = Some(revised);
                    } else {
                        return Ok(TaskReport {
                            outcome: TaskOutcome::Failed { reason },
                            attempts: attempt,
                            trace,
                        });
                    }
                }
            }
        }

        // retry_budget + 1 >= 1, so the loop always returns
        Ok(TaskReport {
            outcome: TaskOutcome::Failed {
                reason: "no attempts were made".to_string(),
            },
            attempts: 0,
            trace: ExecutionTrace::new(),
        })
    }

    async fn attempt(
        &self,
        task: &str,
        strategy: Option<&str>,
        trace: &mut ExecutionTrace,
    ) -> Result<AttemptEnd> {
        let started = Instant::now();
        let prompt_task = match strategy {
            Some(strategy) => format!("{}\n\nRevised strategy: {}", task, strategy),
            None => task.to_string(),
        };

        for step in 1..=self.config.max_steps {
            if self.is_cancelled() {
                return Ok(AttemptEnd::Cancelled);
            }
            let elapsed_ms = started.elapsed().as_millis() as u64;
            if elapsed_ms >= self.config.max_wall_ms {
                return Ok(AttemptEnd::Exhausted(format!(
                    "wall-clock budget of {}ms exceeded",
                    self.config.max_wall_ms
                )));
            }

            let catalog = self.catalog()?;
            let candidates = self.retrieval.retrieve(&prompt_task, &catalog);
            debug!("step {}: {} candidate tools", step, candidates.len());

            match self.reasoner.decide(&prompt_task, trace, &candidates).await? {
                Decision::Finish(answer) => return Ok(AttemptEnd::Finished(answer)),
                Decision::Act(request) => {
                    let observation = match self.perform(&request, &candidates).await {
                        Some(observation) => observation,
                        None => return Ok(AttemptEnd::Cancelled),
                    };
                    trace.record(request, observation);
                }
            }
        }

        Ok(AttemptEnd::Exhausted(format!(
            "step budget of {} exceeded",
            self.config.max_steps
        )))
    }

    /// Validate and execute one action request. Rejections become
    /// observations; None means the task was cancelled mid-action.
    async fn perform(
        &self,
        request: &ActionRequest,
        candidates: &[ToolDescriptor],
    ) -> Option<Observation> {
        let Some(descriptor) = candidates.iter().find(|d| d.name == request.tool) else {
            return Some(Observation::rejected(format!(
                "tool '{}' is not in the candidate set",
                request.tool
            )));
        };

        if let Err(e) = validate_args(&descriptor.args_schema, &request.args) {
            return Some(Observation::rejected(e.to_string()));
        }

        match self.cancel.clone() {
            Some(mut cancel) => {
                tokio::select! {
                    observation = self.adapter.execute(descriptor, &request.args, &self.ctx) => {
                        Some(observation)
                    }
                    _ = wait_cancelled(&mut cancel) => None,
                }
            }
            None => Some(self.adapter.execute(descriptor, &request.args, &self.ctx).await),
        }
    }

    /// Catalog snapshot: builtins, bridged tools, and library projections.
    /// Rebuilt only when the library generation has moved.
    fn catalog(&self) -> Result<ToolCatalog> {
        let generation = self.library.generation();
        let mut cache = self
            .catalog_cache
            .lock()
            .map_err(|e| QuestorError::Storage(format!("catalog cache lock poisoned: {}", e)))?;

        if let Some((cached_generation, catalog)) = cache.as_ref() {
            if *cached_generation == generation {
                return Ok(catalog.clone());
            }
        }

        let mut catalog: ToolCatalog = self.builtins.descriptors().into_iter().collect();
        for bridge in &self.bridges {
            for descriptor in bridge.descriptors() {
                catalog.add(descriptor);
            }
        }
        for descriptor in self.library.descriptors()? {
            catalog.add(descriptor);
        }

        debug!("catalog rebuilt at generation {}: {} tools", generation, catalog.len());
        *cache = Some((generation, catalog.clone()));
        Ok(catalog)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|rx| *rx.borrow())
    }
}

async fn wait_cancelled(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow() {
            return;
        }
        if rx.changed().await.is_err() {
            // Sender gone: cancellation can never fire
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::standard_registry;
    use crate::improve::LearningStore;
    use crate::llm::ScriptedReasoner;
    use crate::store::Database;
    use crate::todos::TodoStore;
    use serde_json::json;
    use tempfile::tempdir;

    struct Fixture {
        db: Database,
        _dir: tempfile::TempDir,
        root: std::path::PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempdir().unwrap();
            let root = dir.path().to_path_buf();
            Self {
                db: Database::open_in_memory().unwrap(),
                _dir: dir,
                root,
            }
        }

        fn task_loop(&self, reasoner: ScriptedReasoner) -> TaskLoop {
            let reasoner: Arc<dyn Reasoner> = Arc::new(reasoner);
            let builtins = Arc::new(standard_registry());
            let library = ToolLibrary::new(self.db.clone());
            let improver =
                SelfImprovementEngine::new(reasoner.clone(), LearningStore::new(self.db.clone()));
            let ctx = ToolContext::new(self.root.clone(), TodoStore::new(self.db.clone()));
            TaskLoop::new(reasoner, builtins, library, improver, ctx)
        }

        fn learnings(&self) -> LearningStore {
            LearningStore::new(self.db.clone())
        }
    }

    #[tokio::test]
    async fn test_empty_task_is_rejected() {
        let fixture = Fixture::new();
        let task_loop = fixture.task_loop(ScriptedReasoner::new(vec![]));

        let err = task_loop.run("   ").await.unwrap_err();
        assert!(matches!(err, QuestorError::Validation(_)));
    }

    #[tokio::test]
    async fn test_act_then_finish() {
        let fixture = Fixture::new();
        std::fs::write(fixture.root.join("notes.txt"), "hello").unwrap();

        let task_loop = fixture.task_loop(ScriptedReasoner::new(vec![
            Decision::Act(ActionRequest::new("list_directory", json!({"path": "."}))),
            Decision::Finish("the directory contains notes.txt".to_string()),
        ]));

        let report = task_loop.run("list the files in the workspace").await.unwrap();

        assert_eq!(report.attempts, 1);
        assert_eq!(report.trace.len(), 1);
        assert!(report.trace.steps()[0].observation.ok);
        assert!(report.trace.steps()[0].observation.output.contains("notes.txt"));
        match report.outcome {
            TaskOutcome::Completed { answer } => assert!(answer.contains("notes.txt")),
            other => panic!("expected Completed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_tool_becomes_rejection_observation() {
        let fixture = Fixture::new();
        let task_loop = fixture.task_loop(ScriptedReasoner::new(vec![
            Decision::Act(ActionRequest::new("teleport", json!({}))),
            Decision::Finish("gave up on teleporting".to_string()),
        ]));

        let report = task_loop.run("list the files in the workspace").await.unwrap();

        assert_eq!(report.trace.len(), 1);
        let step = &report.trace.steps()[0];
        assert!(!step.observation.ok);
        assert!(step.observation.error.as_deref().unwrap().contains("candidate set"));
        assert!(matches!(report.outcome, TaskOutcome::Completed { .. }));
    }

    #[tokio::test]
    async fn test_schema_mismatch_becomes_rejection_observation() {
        let fixture = Fixture::new();
        let task_loop = fixture.task_loop(ScriptedReasoner::new(vec![
            Decision::Act(ActionRequest::new("read_file", json!({"filename": "a.txt"}))),
            Decision::Finish("done".to_string()),
        ]));

        let report = task_loop.run("read the file in the workspace").await.unwrap();

        let step = &report.trace.steps()[0];
        assert!(!step.observation.ok);
        assert!(step.observation.error.is_some());
        assert!(matches!(report.outcome, TaskOutcome::Completed { .. }));
    }

    #[tokio::test]
    async fn test_step_budget_failure_stores_learning() {
        let fixture = Fixture::new();
        let decisions: Vec<Decision> = (0..4)
            .map(|_| Decision::Act(ActionRequest::new("list_directory", json!({"path": "."}))))
            .collect();
        let task_loop = fixture
            .task_loop(ScriptedReasoner::with_reflections(
                decisions,
                vec!["looping without progress".to_string()],
            ))
            .with_config(LoopConfig {
                max_steps: 2,
                retry_budget: 0,
                category: "listing".to_string(),
                ..LoopConfig::default()
            });

        let report = task_loop.run("list the files in the workspace").await.unwrap();

        assert_eq!(report.attempts, 1);
        assert_eq!(report.trace.len(), 2);
        match report.outcome {
            TaskOutcome::Failed { reason } => assert!(reason.contains("step budget")),
            other => panic!("expected Failed, got {:?}", other),
        }

        let learnings = fixture.learnings().for_category("listing").unwrap();
        assert_eq!(learnings.len(), 1);
        assert_eq!(learnings[0].content, "looping without progress");
    }

    #[tokio::test]
    async fn test_retry_after_exhaustion_succeeds() {
        let fixture = Fixture::new();
        let task_loop = fixture
            .task_loop(ScriptedReasoner::with_reflections(
                vec![
                    Decision::Act(ActionRequest::new("list_directory", json!({"path": "."}))),
                    Decision::Finish("finished on the second attempt".to_string()),
                ],
                vec![
                    "the first attempt ran out of steps".to_string(),
                    "finish immediately".to_string(),
                ],
            ))
            .with_config(LoopConfig {
                max_steps: 1,
                retry_budget: 1,
                ..LoopConfig::default()
            });

        let report = task_loop.run("list the files in the workspace").await.unwrap();

        assert_eq!(report.attempts, 2);
        assert!(matches!(report.outcome, TaskOutcome::Completed { .. }));
        // The exhausted first attempt left a learning behind
        assert_eq!(fixture.learnings().for_category("general").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cancellation_before_first_step() {
        let fixture = Fixture::new();
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();

        let task_loop = fixture
            .task_loop(ScriptedReasoner::new(vec![Decision::Finish("unreachable".to_string())]))
            .with_cancel(rx);

        let report = task_loop.run("list the files in the workspace").await.unwrap();
        assert_eq!(report.outcome, TaskOutcome::Failed { reason: "cancelled".to_string() });
        assert!(report.trace.is_empty());
    }

    #[tokio::test]
    async fn test_library_tool_visible_after_creation() {
        let fixture = Fixture::new();
        let library = ToolLibrary::new(fixture.db.clone());

        let task_loop = fixture.task_loop(ScriptedReasoner::new(vec![
            Decision::Act(ActionRequest::new("shout", json!({}))),
            Decision::Finish("HELLO".to_string()),
        ]));

        // Created after the loop exists; the generation bump invalidates
        // the cached catalog.
        let _ = task_loop.catalog().unwrap();
        library
            .create(crate::library::new_tool(
                "shout",
                "Print a loud greeting",
                crate::library::ToolKind::Shell,
                "echo HELLO",
            ))
            .unwrap();

        let report = task_loop.run("shout a loud greeting").await.unwrap();

        assert_eq!(report.trace.len(), 1);
        assert!(report.trace.steps()[0].observation.ok, "observation: {:?}", report.trace.steps()[0].observation);
        assert!(report.trace.steps()[0].observation.output.contains("HELLO"));
    }
}
