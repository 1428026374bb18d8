//! Output document model
//!
//! The target platform's workflow JSON: a node list plus a connection map
//! keyed by source node name, then output port type, then output index.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

/// Connection map: source node → port type → output index → targets
pub type Connections = BTreeMap<String, BTreeMap<String, Vec<Vec<ConnectionTarget>>>>;

/// A complete generated workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDocument {
    /// Nodes in generation order
    pub nodes: Vec<GraphNode>,

    /// Edges between nodes
    pub connections: Connections,

    /// Per-generation metadata
    pub meta: WorkflowMeta,

    /// Workflow name
    pub name: String,

    /// Always `false` for freshly generated workflows
    pub active: bool,

    /// Fixed execution settings
    pub settings: WorkflowSettings,
}

/// One node in the output graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    /// Opaque unique id
    pub id: String,

    /// User-facing name from the source
    pub name: String,

    /// Target node type identifier
    #[serde(rename = "type")]
    pub node_type: String,

    /// Canvas position `[x, y]`
    pub position: [f64; 2],

    /// Reshaped parameters
    pub parameters: Map<String, Value>,

    /// Schema version of the node type
    pub type_version: f64,
}

/// A single connection target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionTarget {
    /// Target node name
    pub node: String,

    /// Input port type
    #[serde(rename = "type")]
    pub port_type: String,

    /// Input index on the target
    pub index: usize,
}

/// Document metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowMeta {
    /// Fresh per generation
    pub instance_id: String,
}

/// Workflow-level settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSettings {
    /// Execution order version
    pub execution_order: String,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            execution_order: "v1".to_string(),
        }
    }
}

impl WorkflowDocument {
    /// Create an empty document with a fresh instance id
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            nodes: Vec::new(),
            connections: Connections::new(),
            meta: WorkflowMeta {
                instance_id: uuid::Uuid::new_v4().to_string(),
            },
            name: name.into(),
            active: false,
            settings: WorkflowSettings::default(),
        }
    }

    /// Find a node by name
    pub fn node(&self, name: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// Append a connection, growing the output index list as needed
    pub fn connect(
        &mut self,
        source: &str,
        port_type: &str,
        output_index: usize,
        target: ConnectionTarget,
    ) {
        let outputs = self
            .connections
            .entry(source.to_string())
            .or_default()
            .entry(port_type.to_string())
            .or_default();
        if outputs.len() <= output_index {
            outputs.resize_with(output_index + 1, Vec::new);
        }
        outputs[output_index].push(target);
    }

    /// Total number of connection targets
    pub fn connection_count(&self) -> usize {
        self.connections
            .values()
            .flat_map(|ports| ports.values())
            .flatten()
            .map(Vec::len)
            .sum()
    }

    /// Convert to a JSON value
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Render as JSON text
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let text = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(text)
    }
}
