//! Abstract syntax tree for workflow sources
//!
//! Every node owns its children. Maps are kept as ordered `(key, value)`
//! vectors so declaration order survives into the generated document.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Source position of a declaration's leading keyword
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// 1-based line
    pub line: usize,
    /// 1-based column
    pub column: usize,
}

impl Span {
    /// Create a span
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Root of a parsed source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// The single workflow in the source
    pub workflow: WorkflowDeclaration,
}

/// A `workflow "name" { ... }` block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDeclaration {
    /// Workflow name
    pub name: String,
    /// Parameters, in declaration order
    pub parameters: Vec<ParameterDeclaration>,
    /// Variables, in declaration order
    pub variables: Vec<VariableDeclaration>,
    /// Nodes and module placeholders, in declaration order
    pub nodes: Vec<NodeEntry>,
    /// Connections, in declaration order
    pub connections: Vec<ConnectionDeclaration>,
    /// Position of the `workflow` keyword
    pub span: Span,
}

impl WorkflowDeclaration {
    /// Create an empty workflow
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            variables: Vec::new(),
            nodes: Vec::new(),
            connections: Vec::new(),
            span: Span::default(),
        }
    }

    /// Look up a node or module entry by name (first declaration wins)
    pub fn node(&self, name: &str) -> Option<&NodeEntry> {
        self.nodes.iter().find(|n| n.name() == name)
    }
}

/// Declared type of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    /// `string`
    String,
    /// `number`
    Number,
    /// `boolean`
    Boolean,
    /// `array`
    Array,
    /// `object`
    Object,
}

impl ParamType {
    /// Parse a type keyword
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(ParamType::String),
            "number" => Some(ParamType::Number),
            "boolean" => Some(ParamType::Boolean),
            "array" => Some(ParamType::Array),
            "object" => Some(ParamType::Object),
            _ => None,
        }
    }

    /// The type keyword
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Array => "array",
            ParamType::Object => "object",
        }
    }

    /// Whether a JSON value inhabits this type
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::Number => value.is_number(),
            ParamType::Boolean => value.is_boolean(),
            ParamType::Array => value.is_array(),
            ParamType::Object => value.is_object(),
        }
    }
}

/// Optional validation constraints attached to a parameter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamConstraints {
    /// Inclusive lower bound for numbers
    pub min: Option<f64>,
    /// Inclusive upper bound for numbers
    pub max: Option<f64>,
    /// Regex a string value must match
    pub pattern: Option<String>,
    /// Closed set of permitted values
    pub allowed: Option<Vec<Value>>,
}

impl ParamConstraints {
    /// True when no constraint is set
    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none() && self.pattern.is_none() && self.allowed.is_none()
    }
}

/// `param name type (= default)? ({ constraints })?`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDeclaration {
    /// Parameter name
    pub name: String,
    /// Declared type
    pub param_type: ParamType,
    /// Default value expression
    pub default_value: Option<Expression>,
    /// True iff no default was given
    pub required: bool,
    /// Validation constraints
    pub constraints: ParamConstraints,
    /// Position of the `param` keyword
    pub span: Span,
}

/// `var name = expression`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDeclaration {
    /// Variable name
    pub name: String,
    /// Bound expression
    pub value: Expression,
    /// Position of the `var` keyword
    pub span: Span,
}

/// `node name "type" { key: expr, ... }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDeclaration {
    /// Node name, unique within the workflow
    pub name: String,
    /// DSL type tag such as `http.request`
    pub node_type: String,
    /// Parameter expressions, in source order
    pub parameters: Vec<(String, Expression)>,
    /// Explicit `position: [x, y]`, if given
    pub position: Option<[f64; 2]>,
    /// Position of the `node` keyword
    pub span: Span,
}

/// `module name = "path" { key: expr, ... }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleDeclaration {
    /// Placeholder node name
    pub name: String,
    /// Referenced module path
    pub module_path: String,
    /// Parameter expressions, in source order
    pub parameters: Vec<(String, Expression)>,
    /// Position of the `module` keyword
    pub span: Span,
}

/// A workflow node entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NodeEntry {
    /// A concrete node
    Node(NodeDeclaration),
    /// A module placeholder
    Module(ModuleDeclaration),
}

impl NodeEntry {
    /// The entry's name
    pub fn name(&self) -> &str {
        match self {
            NodeEntry::Node(n) => &n.name,
            NodeEntry::Module(m) => &m.name,
        }
    }

    /// The entry's source position
    pub fn span(&self) -> Span {
        match self {
            NodeEntry::Node(n) => n.span,
            NodeEntry::Module(m) => m.span,
        }
    }
}

/// One side of a connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Node name
    pub node: String,
    /// Port name, `main` unless given
    pub port: String,
}

impl Endpoint {
    /// Endpoint on the default `main` port
    pub fn main(node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            port: DEFAULT_PORT.to_string(),
        }
    }
}

/// Port used when a connection names none
pub const DEFAULT_PORT: &str = "main";

/// `connect source(.port)? -> target(.port)?`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDeclaration {
    /// Output side
    pub source: Endpoint,
    /// Input side
    pub target: Endpoint,
    /// Position of the `connect` keyword
    pub span: Span,
}

/// An unevaluated expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Expression {
    /// String, number, boolean or null
    Literal(Value),
    /// Reference to a variable or parameter
    Identifier(String),
    /// Built-in call such as `env("HOME")`
    FunctionCall {
        /// Function name
        name: String,
        /// Argument expressions
        args: Vec<Expression>,
    },
    /// String containing `${...}` spans, expanded at generation time
    Template(String),
    /// `{ key: expr, ... }`
    Object(Vec<(String, Expression)>),
    /// `[ expr, ... ]`
    Array(Vec<Expression>),
}

impl Expression {
    /// Convenience constructor for a string literal
    pub fn string(s: impl Into<String>) -> Self {
        Expression::Literal(Value::String(s.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_param_type_names_round_trip() {
        for name in ["string", "number", "boolean", "array", "object"] {
            let ty = ParamType::from_name(name).unwrap();
            assert_eq!(ty.as_str(), name);
        }
        assert!(ParamType::from_name("int").is_none());
    }

    #[test]
    fn test_param_type_accepts() {
        assert!(ParamType::Number.accepts(&json!(3)));
        assert!(!ParamType::Number.accepts(&json!("3")));
        assert!(ParamType::Object.accepts(&json!({"a": 1})));
        assert!(ParamType::Array.accepts(&json!([])));
    }

    #[test]
    fn test_node_entry_lookup() {
        let mut wf = WorkflowDeclaration::new("wf");
        wf.nodes.push(NodeEntry::Module(ModuleDeclaration {
            name: "shared".to_string(),
            module_path: "./shared.flow".to_string(),
            parameters: vec![],
            span: Span::new(3, 5),
        }));

        let entry = wf.node("shared").unwrap();
        assert_eq!(entry.name(), "shared");
        assert_eq!(entry.span(), Span::new(3, 5));
        assert!(wf.node("missing").is_none());
    }

    #[test]
    fn test_constraints_empty() {
        assert!(ParamConstraints::default().is_empty());
        let c = ParamConstraints {
            min: Some(1.0),
            ..Default::default()
        };
        assert!(!c.is_empty());
    }
}
