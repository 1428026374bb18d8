//! AST → workflow document generation

use std::collections::{BTreeMap, HashSet};

use flowdsl_core::ast::{ConnectionDeclaration, Endpoint, NodeDeclaration, NodeEntry, Program};
use flowdsl_core::config::ProjectConfig;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::document::{ConnectionTarget, GraphNode, WorkflowDocument};
use crate::error::{Error, Result};
use crate::evaluator::{EnvProvider, Evaluator, FileLoader};
use crate::node_types;
use crate::templates::template_for;

/// Port type used for every connection
pub const MAIN_PORT_TYPE: &str = "main";

/// Generation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// Place nodes without an explicit position left to right
    pub auto_layout: bool,

    /// First auto-placed position
    pub start_position: [f64; 2],

    /// Horizontal step between auto-placed nodes
    pub spacing: f64,

    /// Parameter overrides by name
    #[serde(default)]
    pub params: BTreeMap<String, Value>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            auto_layout: true,
            start_position: [0.0, 0.0],
            spacing: 200.0,
            params: BTreeMap::new(),
        }
    }
}

impl From<&ProjectConfig> for GenerateOptions {
    fn from(config: &ProjectConfig) -> Self {
        Self {
            auto_layout: config.layout.auto,
            start_position: config.layout.start,
            spacing: config.layout.spacing,
            params: config.params.clone(),
        }
    }
}

/// Output index for a named port: `false` is 1, everything else 0
pub fn port_index(port: &str) -> usize {
    match port {
        "false" => 1,
        "main" | "output" | "true" => 0,
        other => {
            tracing::debug!("Unknown port '{}', using output 0", other);
            0
        }
    }
}

/// Converts a parsed program into a workflow document
pub struct Generator {
    options: GenerateOptions,
    env: Box<dyn EnvProvider>,
    files: Option<Box<dyn FileLoader>>,
}

impl Generator {
    /// Create a generator with an empty environment and no file access
    pub fn new(options: GenerateOptions) -> Self {
        Self {
            options,
            env: Box::new(BTreeMap::<String, String>::new()),
            files: None,
        }
    }

    /// Use `env` for `env(...)` lookups
    pub fn with_env(mut self, env: impl EnvProvider + 'static) -> Self {
        self.env = Box::new(env);
        self
    }

    /// Enable `file(...)` through `loader`
    pub fn with_file_loader(mut self, loader: impl FileLoader + 'static) -> Self {
        self.files = Some(Box::new(loader));
        self
    }

    /// Generation settings
    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    /// Generate a document from a program
    pub fn generate(&self, program: &Program) -> Result<WorkflowDocument> {
        let workflow = &program.workflow;
        tracing::debug!(
            "Generating workflow '{}' ({} nodes, {} connections)",
            workflow.name,
            workflow.nodes.len(),
            workflow.connections.len()
        );

        let mut evaluator = Evaluator::new(self.env.as_ref(), self.files.as_deref());
        evaluator.bind_parameters(&workflow.parameters, &self.options.params)?;
        evaluator.bind_variables(&workflow.variables)?;

        let mut document = WorkflowDocument::new(workflow.name.clone());
        let mut layout = Layout::new(&self.options);

        for entry in &workflow.nodes {
            let node = match entry {
                NodeEntry::Node(node) => node,
                NodeEntry::Module(module) => {
                    return Err(Error::UnsupportedModuleReference {
                        module: module.name.clone(),
                        path: module.module_path.clone(),
                        line: module.span.line,
                        column: module.span.column,
                    });
                }
            };
            let position = layout.place(node.position);
            document.nodes.push(self.generate_node(node, position, &evaluator)?);
        }

        let names: HashSet<&str> = document.nodes.iter().map(|n| n.name.as_str()).collect();
        for connection in &workflow.connections {
            check_endpoint(&names, &connection.source, "source", connection)?;
            check_endpoint(&names, &connection.target, "target", connection)?;
        }

        for connection in &workflow.connections {
            document.connect(
                &connection.source.node,
                MAIN_PORT_TYPE,
                port_index(&connection.source.port),
                ConnectionTarget {
                    node: connection.target.node.clone(),
                    port_type: MAIN_PORT_TYPE.to_string(),
                    index: port_index(&connection.target.port),
                },
            );
        }

        tracing::info!(
            "Generated workflow '{}': {} nodes, {} connections",
            document.name,
            document.nodes.len(),
            document.connection_count()
        );
        Ok(document)
    }

    fn generate_node(
        &self,
        node: &NodeDeclaration,
        position: [f64; 2],
        evaluator: &Evaluator<'_>,
    ) -> Result<GraphNode> {
        let info = node_types::lookup(&node.node_type).ok_or_else(|| Error::UnknownNodeType {
            node: node.name.clone(),
            node_type: node.node_type.clone(),
            known: node_types::tags().join(", "),
            line: node.span.line,
            column: node.span.column,
        })?;

        let mut raw = Map::new();
        for (key, expr) in &node.parameters {
            raw.insert(key.clone(), evaluator.evaluate(expr)?);
        }

        let parameters = template_for(info.target_type).map_parameters(&raw);
        tracing::debug!("Node '{}' → {}", node.name, info.target_type);

        Ok(GraphNode {
            id: uuid::Uuid::new_v4().to_string(),
            name: node.name.clone(),
            node_type: info.target_type.to_string(),
            position,
            parameters,
            type_version: info.type_version,
        })
    }
}

/// Generate with default collaborators
pub fn generate(program: &Program, options: GenerateOptions) -> Result<WorkflowDocument> {
    Generator::new(options).generate(program)
}

fn check_endpoint(
    names: &HashSet<&str>,
    endpoint: &Endpoint,
    role: &'static str,
    connection: &ConnectionDeclaration,
) -> Result<()> {
    if names.contains(endpoint.node.as_str()) {
        return Ok(());
    }
    Err(Error::UnknownConnectionEndpoint {
        node: endpoint.node.clone(),
        role,
        line: connection.span.line,
        column: connection.span.column,
    })
}

/// Left-to-right placement; only auto-placed nodes advance the cursor
struct Layout {
    auto: bool,
    start: [f64; 2],
    spacing: f64,
    next_x: f64,
}

impl Layout {
    fn new(options: &GenerateOptions) -> Self {
        Self {
            auto: options.auto_layout,
            start: options.start_position,
            spacing: options.spacing,
            next_x: options.start_position[0],
        }
    }

    fn place(&mut self, explicit: Option<[f64; 2]>) -> [f64; 2] {
        if let Some(position) = explicit {
            return position;
        }
        if !self.auto {
            return self.start;
        }
        let position = [self.next_x, self.start[1]];
        self.next_x += self.spacing;
        position
    }
}
