//! Descriptor catalog - the queryable collection retrieval ranks against
//!
//! A catalog is a snapshot: built from builtin registrations, the persisted
//! tool library, and any bridged discovery results, then passed explicitly
//! into retrieval. Library mutations bump a generation counter so the next
//! snapshot is rebuilt (read-after-write visibility for the owning process).

mod descriptor;

pub use descriptor::{RiskLevel, ToolDescriptor, ToolSource};

use std::collections::BTreeMap;

/// Snapshot of tool descriptors, keyed by name. Iteration order is name
/// order, which keeps downstream ranking deterministic.
#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    tools: BTreeMap<String, ToolDescriptor>,
}

impl ToolCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self { tools: BTreeMap::new() }
    }

    /// Add a descriptor, replacing any previous entry with the same name
    pub fn add(&mut self, descriptor: ToolDescriptor) {
        self.tools.insert(descriptor.name.clone(), descriptor);
    }

    /// Remove a descriptor by name
    pub fn remove(&mut self, name: &str) -> Option<ToolDescriptor> {
        self.tools.remove(name)
    }

    /// Get a descriptor by name
    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.get(name)
    }

    /// Check if a tool exists
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Iterate descriptors in name order
    pub fn iter(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.values()
    }

    /// List all tool names in name order
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    /// Number of descriptors
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if catalog is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl FromIterator<ToolDescriptor> for ToolCatalog {
    fn from_iter<I: IntoIterator<Item = ToolDescriptor>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for descriptor in iter {
            catalog.add(descriptor);
        }
        catalog
    }
}
