//! Execution adapter - one normalized invocation path per tool origin
//!
//! Dispatch follows the descriptor's source: BUILTIN runs an in-process
//! capability, LIBRARY runs a persisted script body in a subprocess, and
//! BRIDGED forwards to an external protocol boundary. All three normalize
//! to the same `Observation` shape so the control loop never branches on
//! tool origin. Timeouts are enforced here, at the adapter boundary, so a
//! stuck invocation cannot wedge the loop.

mod bridge;
mod script;

pub use bridge::{BridgeResponse, ToolBridge};
pub use script::run_script;

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::builtins::{BuiltinRegistry, ToolContext};
use crate::catalog::{ToolDescriptor, ToolSource};
use crate::library::{LibraryTool, ToolLibrary};

/// Output beyond this many bytes is truncated before entering the trace.
pub const MAX_OUTPUT_BYTES: usize = 30_000;

/// Normalized result of one tool invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    pub ok: bool,
    pub output: String,
    pub error: Option<String>,
    pub duration_ms: u64,
}

impl Observation {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            ok: true,
            output: truncate_output(output.into()),
            error: None,
            duration_ms: 0,
        }
    }

    pub fn failure(error: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            ok: false,
            output: truncate_output(output.into()),
            error: Some(error.into()),
            duration_ms: 0,
        }
    }

    /// Timeout expiry is an observation, not a process-level fault.
    pub fn timeout() -> Self {
        Self::failure("timeout", "")
    }

    /// A tool call rejected before dispatch (unknown tool, bad arguments).
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::failure(reason, "")
    }
}

/// Truncate long output, keeping a note of the original size.
pub fn truncate_output(output: String) -> String {
    if output.len() <= MAX_OUTPUT_BYTES {
        return output;
    }
    let mut cut = MAX_OUTPUT_BYTES;
    while !output.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...\n[truncated, {} chars total]", &output[..cut], output.len())
}

/// Adapter-level timeouts for origins without a per-record timeout.
#[derive(Debug, Clone)]
pub struct ExecConfig {
    pub builtin_timeout_ms: u64,
    pub bridge_timeout_ms: u64,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            builtin_timeout_ms: 60_000,
            bridge_timeout_ms: 30_000,
        }
    }
}

/// Dispatches a selected descriptor to its concrete implementation.
pub struct ExecutionAdapter {
    builtins: Arc<BuiltinRegistry>,
    library: ToolLibrary,
    bridges: Vec<Arc<dyn ToolBridge>>,
    config: ExecConfig,
}

impl ExecutionAdapter {
    pub fn new(builtins: Arc<BuiltinRegistry>, library: ToolLibrary) -> Self {
        Self {
            builtins,
            library,
            bridges: Vec::new(),
            config: ExecConfig::default(),
        }
    }

    pub fn with_bridges(mut self, bridges: Vec<Arc<dyn ToolBridge>>) -> Self {
        self.bridges = bridges;
        self
    }

    pub fn with_config(mut self, config: ExecConfig) -> Self {
        self.config = config;
        self
    }

    /// Execute one descriptor. Never returns an error: every failure mode
    /// becomes an observation the loop can feed back to the reasoner.
    pub async fn execute(&self, descriptor: &ToolDescriptor, args: &Value, ctx: &ToolContext) -> Observation {
        let start = Instant::now();
        let mut observation = match descriptor.source {
            ToolSource::Builtin => self.execute_builtin(descriptor, args, ctx).await,
            ToolSource::Library => self.execute_library(descriptor, args, ctx).await,
            ToolSource::Bridged => self.execute_bridged(descriptor, args).await,
        };
        observation.duration_ms = start.elapsed().as_millis() as u64;

        debug!(
            "executed '{}' ({:?}): ok={} in {}ms",
            descriptor.name, descriptor.source, observation.ok, observation.duration_ms
        );
        observation
    }

    /// Run a library record directly, bypassing the catalog lookup. Used
    /// by `ToolLibrary::run` so per-call timeout overrides can flow
    /// through without mutating the stored record.
    pub async fn run_library_record(&self, record: &LibraryTool, args: &Value, ctx: &ToolContext) -> Observation {
        let start = Instant::now();
        let timeout = Duration::from_secs(record.timeout_seconds.max(1));
        let mut observation = run_script(record.kind, &record.body, args, timeout, ctx.root()).await;
        observation.duration_ms = start.elapsed().as_millis() as u64;
        observation
    }

    async fn execute_builtin(&self, descriptor: &ToolDescriptor, args: &Value, ctx: &ToolContext) -> Observation {
        let Some(tool) = self.builtins.get(&descriptor.name) else {
            return Observation::rejected(format!("unknown builtin tool '{}'", descriptor.name));
        };

        let timeout = Duration::from_millis(self.config.builtin_timeout_ms);
        match tokio::time::timeout(timeout, tool.execute(args, ctx)).await {
            Ok(Ok(output)) => {
                if output.is_error {
                    Observation::failure(output.content, "")
                } else {
                    Observation::success(output.content)
                }
            }
            Ok(Err(e)) => Observation::failure(e.to_string(), ""),
            Err(_) => {
                warn!("builtin '{}' timed out after {:?}", descriptor.name, timeout);
                Observation::timeout()
            }
        }
    }

    async fn execute_library(&self, descriptor: &ToolDescriptor, args: &Value, ctx: &ToolContext) -> Observation {
        match self.library.show(&descriptor.name) {
            Ok(record) => self.run_library_record(&record, args, ctx).await,
            Err(e) => Observation::failure(e.to_string(), ""),
        }
    }

    async fn execute_bridged(&self, descriptor: &ToolDescriptor, args: &Value) -> Observation {
        let Some(bridge) = self
            .bridges
            .iter()
            .find(|b| b.descriptors().iter().any(|d| d.name == descriptor.name))
        else {
            return Observation::rejected(format!("no bridge provides tool '{}'", descriptor.name));
        };

        let timeout = Duration::from_millis(self.config.bridge_timeout_ms);
        match tokio::time::timeout(timeout, bridge.invoke(&descriptor.name, args)).await {
            Ok(Ok(response)) => Observation {
                ok: response.ok,
                output: truncate_output(response.output),
                error: response.error,
                duration_ms: 0,
            },
            Ok(Err(e)) => Observation::failure(e.to_string(), ""),
            Err(_) => {
                warn!("bridged '{}' timed out after {:?}", descriptor.name, timeout);
                Observation::timeout()
            }
        }
    }
}
