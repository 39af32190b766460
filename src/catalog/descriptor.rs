//! Tool descriptors - the metadata records ranked by retrieval
//!
//! A descriptor describes a callable capability independent of its
//! implementation. Descriptors are immutable for the duration of one
//! retrieval pass and are regenerated whenever the tool library changes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How destructive a tool can be. HIGH-risk tools are held back by
/// retrieval unless the task text explicitly signals them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl Default for RiskLevel {
    fn default() -> Self {
        Self::Low
    }
}

impl RiskLevel {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Origin of a tool implementation. A closed set: new origins are new
/// variants, each with one normalized execution path in the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolSource {
    /// In-process capability registered at startup
    Builtin,
    /// Persisted script from the tool library
    Library,
    /// Forwarded to an external protocol boundary
    Bridged,
}

/// Metadata record describing one callable tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Unique, stable identifier
    pub name: String,
    /// Natural-language description used for retrieval
    pub description: String,
    /// Tags used for retrieval and risk-signal matching
    #[serde(default)]
    pub tags: Vec<String>,
    /// Risk classification
    #[serde(default)]
    pub risk: RiskLevel,
    /// Always included in retrieval output regardless of ranking
    #[serde(default)]
    pub sticky: bool,
    /// JSON schema for accepted arguments
    pub args_schema: Value,
    /// Where the implementation lives
    pub source: ToolSource,
}

impl ToolDescriptor {
    /// Create a new builtin descriptor with an empty object schema
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            tags: Vec::new(),
            risk: RiskLevel::Low,
            sticky: false,
            args_schema: serde_json::json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
            source: ToolSource::Builtin,
        }
    }

    /// Set tags
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Set risk level
    pub fn with_risk(mut self, risk: RiskLevel) -> Self {
        self.risk = risk;
        self
    }

    /// Mark as sticky
    pub fn sticky(mut self) -> Self {
        self.sticky = true;
        self
    }

    /// Set args schema
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.args_schema = schema;
        self
    }

    /// Set source
    pub fn with_source(mut self, source: ToolSource) -> Self {
        self.source = source;
        self
    }

    /// Text used for relevance scoring: description plus tags plus the
    /// name split into words.
    pub fn retrieval_text(&self) -> String {
        let name_words = self.name.replace(['_', '-'], " ");
        format!("{} {} {}", name_words, self.description, self.tags.join(" "))
    }
}
