//! Tool retrieval engine
//!
//! Narrows a catalog snapshot down to a small, relevant, risk-appropriate
//! candidate set for one task. Ranking combines BM25 lexical overlap with
//! hashed-embedding cosine similarity under fixed weights, then applies
//! two overrides in order: sticky descriptors are always included, and
//! HIGH-risk descriptors are dropped unless the task text carries a
//! matching signal term.

mod lexical;
mod semantic;

pub use lexical::{LexicalIndex, tokenize};
pub use semantic::{Embedder, HashEmbedder, cosine};

use std::cmp::Ordering;
use std::sync::Arc;

use log::debug;

use crate::catalog::{RiskLevel, ToolCatalog, ToolDescriptor};

/// Fixed ranking weights and candidate cap. The weights are tunable
/// constants of the engine, not per-call parameters.
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    pub lexical_weight: f64,
    pub semantic_weight: f64,
    pub max_candidates: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            lexical_weight: 0.6,
            semantic_weight: 0.4,
            max_candidates: 8,
        }
    }
}

/// Ranks catalog entries against a task description.
pub struct RetrievalEngine {
    config: RetrievalConfig,
    embedder: Arc<dyn Embedder>,
}

impl RetrievalEngine {
    pub fn new(config: RetrievalConfig) -> Self {
        Self {
            config,
            embedder: Arc::new(HashEmbedder::default()),
        }
    }

    pub fn with_embedder(config: RetrievalConfig, embedder: Arc<dyn Embedder>) -> Self {
        Self { config, embedder }
    }

    /// Rank the catalog against the task text and return the candidate set.
    ///
    /// Deterministic for a fixed catalog snapshot and task text: equal
    /// scores break ties by name. An empty catalog yields an empty result.
    /// Task text with no usable tokens degrades to sticky-only output.
    pub fn retrieve(&self, task: &str, catalog: &ToolCatalog) -> Vec<ToolDescriptor> {
        if catalog.is_empty() {
            return Vec::new();
        }

        let query = tokenize(task);
        let descriptors: Vec<&ToolDescriptor> = catalog.iter().collect();

        let index = LexicalIndex::build(
            descriptors.iter().map(|d| tokenize(&d.retrieval_text())).collect(),
        );
        let task_vector = self.embedder.embed(task);

        let lexical: Vec<f64> = (0..descriptors.len()).map(|i| index.score(i, &query)).collect();
        let max_lexical = lexical.iter().cloned().fold(0.0f64, f64::max);

        let mut ranked: Vec<(f64, &ToolDescriptor)> = descriptors
            .iter()
            .enumerate()
            .map(|(i, desc)| {
                let lex = if max_lexical > 0.0 { lexical[i] / max_lexical } else { 0.0 };
                let sem = cosine(&task_vector, &self.embedder.embed(&desc.retrieval_text()));
                let combined = self.config.lexical_weight * lex + self.config.semantic_weight * sem;
                (combined, *desc)
            })
            .collect();

        ranked.sort_by(|(sa, da), (sb, db)| {
            sb.partial_cmp(sa).unwrap_or(Ordering::Equal).then_with(|| da.name.cmp(&db.name))
        });

        // Override order: sticky inclusion first, then the HIGH-risk gate.
        // A sticky HIGH tool without a task signal is still excluded.
        let eligible: Vec<(f64, &ToolDescriptor)> = ranked
            .into_iter()
            .filter(|(_, desc)| desc.risk != RiskLevel::High || has_risk_signal(&query, desc))
            .collect();

        // The cap is a soft target: sticky descriptors and HIGH-risk
        // descriptors that carried a task signal are still appended below
        // the cutoff, in rank order.
        let mut selected: Vec<ToolDescriptor> = Vec::new();
        for (_, desc) in &eligible {
            if selected.len() < self.config.max_candidates
                || desc.sticky
                || desc.risk == RiskLevel::High
            {
                selected.push((*desc).clone());
            }
        }

        debug!(
            "retrieval: {} candidates from {} catalog entries for task '{}'",
            selected.len(),
            catalog.len(),
            task
        );

        selected
    }
}

/// Risk-signal rule for HIGH-risk tools: some task token must match one of
/// the descriptor's name tokens or tags.
fn has_risk_signal(query: &[String], descriptor: &ToolDescriptor) -> bool {
    let mut signals: Vec<String> = tokenize(&descriptor.name.replace(['_', '-'], " "));
    signals.extend(descriptor.tags.iter().map(|t| t.to_lowercase()));
    query.iter().any(|token| signals.iter().any(|s| s == token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ToolSource;

    fn sample_catalog() -> ToolCatalog {
        [
            ToolDescriptor::new("list_directory", "List entries in a directory")
                .with_tags(["files", "directory"])
                .sticky(),
            ToolDescriptor::new("read_file", "Read file contents with line numbers")
                .with_tags(["files", "read"]),
            ToolDescriptor::new("run_shell", "Execute a shell command")
                .with_tags(["shell", "command"])
                .with_risk(RiskLevel::High),
            ToolDescriptor::new("git_ops", "Run git status, diff, log, and commit")
                .with_tags(["git", "commit"])
                .with_risk(RiskLevel::High),
            ToolDescriptor::new("fetch_weather", "Fetch the weather forecast for a city")
                .with_tags(["weather"])
                .with_source(ToolSource::Bridged),
        ]
        .into_iter()
        .collect()
    }

    fn engine() -> RetrievalEngine {
        RetrievalEngine::new(RetrievalConfig::default())
    }

    fn names(result: &[ToolDescriptor]) -> Vec<&str> {
        result.iter().map(|d| d.name.as_str()).collect()
    }

    #[test]
    fn test_empty_catalog_yields_empty_result() {
        let result = engine().retrieve("do anything", &ToolCatalog::new());
        assert!(result.is_empty());
    }

    #[test]
    fn test_retrieval_is_deterministic() {
        let catalog = sample_catalog();
        let a = engine().retrieve("list files in the current directory", &catalog);
        let b = engine().retrieve("list files in the current directory", &catalog);
        assert_eq!(names(&a), names(&b));
    }

    #[test]
    fn test_relevant_tool_ranks_first() {
        let result = engine().retrieve("list files in the current directory", &sample_catalog());
        assert_eq!(result[0].name, "list_directory");
    }

    #[test]
    fn test_sticky_included_for_unrelated_task() {
        let result = engine().retrieve("fetch the weather forecast", &sample_catalog());
        assert!(names(&result).contains(&"list_directory"));
    }

    #[test]
    fn test_sticky_included_for_empty_task() {
        let result = engine().retrieve("", &sample_catalog());
        assert!(names(&result).contains(&"list_directory"));
    }

    #[test]
    fn test_high_risk_excluded_without_signal() {
        let result = engine().retrieve("list files in the current directory", &sample_catalog());
        assert!(!names(&result).contains(&"run_shell"));
        assert!(!names(&result).contains(&"git_ops"));
    }

    #[test]
    fn test_high_risk_included_with_name_signal() {
        let result = engine().retrieve("run a shell command to inspect disk usage", &sample_catalog());
        assert!(names(&result).contains(&"run_shell"));
        assert!(!names(&result).contains(&"git_ops"));
    }

    #[test]
    fn test_high_risk_included_with_tag_signal() {
        let result = engine().retrieve("commit the staged changes", &sample_catalog());
        assert!(names(&result).contains(&"git_ops"));
        assert!(!names(&result).contains(&"run_shell"));
    }

    #[test]
    fn test_sticky_high_risk_still_gated() {
        let mut catalog = sample_catalog();
        catalog.add(
            ToolDescriptor::new("wipe_disk", "Erase a disk partition")
                .with_risk(RiskLevel::High)
                .sticky(),
        );

        let result = engine().retrieve("list files in the current directory", &catalog);
        assert!(!names(&result).contains(&"wipe_disk"));
    }

    #[test]
    fn test_candidate_cap_is_soft_for_sticky() {
        let mut catalog = ToolCatalog::new();
        for i in 0..12 {
            catalog.add(
                ToolDescriptor::new(format!("search_tool_{:02}", i), "Search project files for text")
                    .with_tags(["search"]),
            );
        }
        catalog.add(ToolDescriptor::new("zz_pinned", "Unrelated pinned helper").sticky());

        let engine = RetrievalEngine::new(RetrievalConfig {
            max_candidates: 4,
            ..RetrievalConfig::default()
        });
        let result = engine.retrieve("search project files", &catalog);

        assert_eq!(result.len(), 5);
        assert!(names(&result).contains(&"zz_pinned"));
    }

    #[test]
    fn test_signal_matched_high_risk_survives_the_cap() {
        let mut catalog = ToolCatalog::new();
        for i in 0..12 {
            catalog.add(
                ToolDescriptor::new(format!("search_tool_{:02}", i), "Search project files for text")
                    .with_tags(["search"]),
            );
        }
        catalog.add(
            ToolDescriptor::new("danger_exec", "Execute a raw command")
                .with_tags(["shell"])
                .with_risk(RiskLevel::High),
        );

        let result = engine().retrieve("search project files for text using shell", &catalog);

        assert!(names(&result).contains(&"danger_exec"));
    }

    #[test]
    fn test_ties_break_by_name() {
        let mut catalog = ToolCatalog::new();
        catalog.add(ToolDescriptor::new("beta_tool", "identical description"));
        catalog.add(ToolDescriptor::new("alpha_tool", "identical description"));

        let result = engine().retrieve("identical description", &catalog);
        assert_eq!(names(&result), vec!["alpha_tool", "beta_tool"]);
    }
}
