use crate::error::{AgentError, Result};
use crate::page::NodeRef;
use indexmap::IndexMap;

/// Prefix of every agent-id
pub const AGENT_ID_PREFIX: &str = "agent-id-";

/// Data attribute stamped on bound elements
pub const AGENT_ID_ATTRIBUTE: &str = "data-agent-id";

/// Format the agent-id for a 1-based sequence number
pub fn format_agent_id(n: usize) -> String {
    format!("{}{}", AGENT_ID_PREFIX, n)
}

/// Numeric suffix of an agent-id
pub fn agent_id_number(agent_id: &str) -> Option<usize> {
    agent_id.strip_prefix(AGENT_ID_PREFIX)?.parse().ok()
}

/// A live element bound to an agent-id
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub node: NodeRef,
    pub tag: String,
}

/// Map of agent-ids to live elements for the current observation
/// Uses IndexMap to preserve assignment order
#[derive(Debug, Clone)]
pub struct BindingTable {
    map: IndexMap<String, Binding>,

    /// Next sequence number, 1-based
    next: usize,
}

impl Default for BindingTable {
    fn default() -> Self {
        Self::new()
    }
}

impl BindingTable {
    pub fn new() -> Self {
        Self {
            map: IndexMap::new(),
            next: 1,
        }
    }

    /// Bind a node to the next agent-id and return the id
    pub fn register(&mut self, node: NodeRef, tag: impl Into<String>) -> String {
        let agent_id = format_agent_id(self.next);
        self.map.insert(agent_id.clone(), Binding { node, tag: tag.into() });
        self.next += 1;
        agent_id
    }

    pub fn get(&self, agent_id: &str) -> Option<&Binding> {
        self.map.get(agent_id)
    }

    /// Resolve an agent-id or fail with a stale binding
    pub fn resolve(&self, agent_id: &str) -> Result<NodeRef> {
        self.map
            .get(agent_id)
            .map(|b| b.node)
            .ok_or_else(|| AgentError::StaleBinding(agent_id.to_string()))
    }

    pub fn contains(&self, agent_id: &str) -> bool {
        self.map.contains_key(agent_id)
    }

    /// Whether a node already has an agent-id in this table
    pub fn is_bound(&self, node: NodeRef) -> bool {
        self.map.values().any(|b| b.node == node)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Drop every binding and restart numbering at 1
    pub fn clear(&mut self) {
        self.map.clear();
        self.next = 1;
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Binding)> {
        self.map.iter()
    }

    pub fn agent_ids(&self) -> impl Iterator<Item = &String> {
        self.map.keys()
    }
}
