//! Execution trace - the ordered action/observation history of one attempt

use serde::{Deserialize, Serialize};

use crate::exec::Observation;
use crate::llm::ActionRequest;

/// One action paired with the observation it produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceStep {
    pub action: ActionRequest,
    pub observation: Observation,
}

/// Ordered history of a task attempt. Every recorded action carries
/// exactly one observation, including rejections and timeouts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionTrace {
    steps: Vec<TraceStep>,
}

impl ExecutionTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, action: ActionRequest, observation: Observation) {
        self.steps.push(TraceStep { action, observation });
    }

    pub fn steps(&self) -> &[TraceStep] {
        &self.steps
    }

    pub fn last(&self) -> Option<&TraceStep> {
        self.steps.last()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Render the trace as text for reasoner prompts.
    pub fn render(&self) -> String {
        if self.steps.is_empty() {
            return "(no steps yet)".to_string();
        }

        let mut out = String::new();
        for (i, step) in self.steps.iter().enumerate() {
            let status = if step.observation.ok { "ok" } else { "failed" };
            out.push_str(&format!(
                "step {}: {} {} -> {} ({}ms)\n",
                i + 1,
                step.action.tool,
                step.action.args,
                status,
                step.observation.duration_ms
            ));
            if let Some(error) = &step.observation.error {
                out.push_str(&format!("  error: {}\n", error));
            }
            if !step.observation.output.is_empty() {
                out.push_str(&format!("  output: {}\n", step.observation.output));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_pairs_action_with_observation() {
        let mut trace = ExecutionTrace::new();
        assert!(trace.is_empty());

        trace.record(
            ActionRequest::new("read_file", json!({"path": "a.txt"})),
            Observation::success("contents"),
        );
        trace.record(
            ActionRequest::new("run_command", json!({"command": "false"})),
            Observation::failure("exit code 1", ""),
        );

        assert_eq!(trace.len(), 2);
        assert!(trace.steps()[0].observation.ok);
        assert!(!trace.last().unwrap().observation.ok);
    }

    #[test]
    fn test_render_includes_errors() {
        let mut trace = ExecutionTrace::new();
        trace.record(
            ActionRequest::new("run_command", json!({"command": "sleep 99"})),
            Observation::timeout(),
        );

        let rendered = trace.render();
        assert!(rendered.contains("step 1: run_command"));
        assert!(rendered.contains("error: timeout"));
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(ExecutionTrace::new().render(), "(no steps yet)");
    }
}
