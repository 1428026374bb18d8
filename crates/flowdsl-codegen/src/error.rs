//! Error types for code generation

use flowdsl_core::Diagnostic;
use thiserror::Error;

/// Result type for codegen operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during generation
#[derive(Error, Debug)]
pub enum Error {
    /// Lexing, parsing or configuration failed
    #[error(transparent)]
    Core(#[from] flowdsl_core::Error),

    /// A node uses a DSL type tag with no target mapping
    #[error("unknown node type '{node_type}' for node '{node}' (known types: {known})")]
    UnknownNodeType {
        /// Node name
        node: String,
        /// The unmapped DSL tag
        node_type: String,
        /// Comma-separated list of the mapped tags
        known: String,
        /// Line of the node declaration
        line: usize,
        /// Column of the node declaration
        column: usize,
    },

    /// A `module` entry was reached; module resolution is not supported
    #[error("module resolution is unsupported: module '{module}' references '{path}'")]
    UnsupportedModuleReference {
        /// Module placeholder name
        module: String,
        /// Referenced module path
        path: String,
        /// Line of the module declaration
        line: usize,
        /// Column of the module declaration
        column: usize,
    },

    /// A connection names a node that was not generated
    #[error("connection {role} '{node}' does not name a generated node")]
    UnknownConnectionEndpoint {
        /// The unresolved node name
        node: String,
        /// `source` or `target`
        role: &'static str,
        /// Line of the connection
        line: usize,
        /// Column of the connection
        column: usize,
    },

    /// A function call names no built-in
    #[error("unknown function '{name}'")]
    UnknownFunction {
        /// Function name
        name: String,
    },

    /// `file(path)` could not be resolved
    #[error("cannot load file '{path}': {message}")]
    FileLoad {
        /// Requested path
        path: String,
        /// Error description
        message: String,
    },

    /// A parameter value violates its type or constraints
    #[error("invalid value for parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name
        name: String,
        /// Error description
        message: String,
    },

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Source position, where the failing construct has one
    pub fn position(&self) -> Option<(usize, usize)> {
        match self {
            Error::Core(inner) => inner.position(),
            Error::UnknownNodeType { line, column, .. }
            | Error::UnsupportedModuleReference { line, column, .. }
            | Error::UnknownConnectionEndpoint { line, column, .. } => Some((*line, *column)),
            _ => None,
        }
    }

    /// Render as an error diagnostic
    pub fn to_diagnostic(&self) -> Diagnostic {
        let rule_id = match self {
            Error::Core(flowdsl_core::Error::Lex { .. }) => "lex",
            Error::Core(flowdsl_core::Error::Parse { .. }) => "parse",
            Error::Core(_) => "core",
            _ => "generate",
        };
        let diagnostic = Diagnostic::error(self.to_string(), rule_id);
        match self.position() {
            Some((line, column)) => diagnostic.at(line, column),
            None => diagnostic,
        }
    }
}
