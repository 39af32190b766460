//! Bridged-tool protocol boundary
//!
//! A bridge exposes externally hosted tools: discovery returns
//! descriptor-shaped records, invocation follows the same normalized
//! contract as every other origin. The protocol itself (transport,
//! serialization) lives behind this trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::ToolDescriptor;
use crate::error::Result;

/// Raw response from a bridged invocation, before normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeResponse {
    pub ok: bool,
    pub output: String,
    pub error: Option<String>,
}

/// External tool provider.
#[async_trait]
pub trait ToolBridge: Send + Sync {
    /// Identifier for logging
    fn name(&self) -> &str;

    /// Discovered tool descriptors. Expected to be cached by the
    /// implementation; this is called on every catalog rebuild.
    fn descriptors(&self) -> Vec<ToolDescriptor>;

    /// Invoke one of this bridge's tools.
    async fn invoke(&self, tool: &str, args: &Value) -> Result<BridgeResponse>;
}
