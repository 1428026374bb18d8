//! Diagnostics shared by the validator and the compile orchestrator

use std::fmt;

use serde::Serialize;

use crate::ast::Span;

/// Severity of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Always blocks success
    Error,
    /// Blocks success only in strict mode
    Warning,
}

/// A positioned message produced by validation or compilation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Human-readable message
    pub message: String,
    /// 1-based line, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// 1-based column, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    /// Severity level
    pub severity: Severity,
    /// Identifier of the check that produced this diagnostic
    pub rule_id: &'static str,
}

impl Diagnostic {
    /// Create an error
    pub fn error(message: impl Into<String>, rule_id: &'static str) -> Self {
        Self {
            message: message.into(),
            line: None,
            column: None,
            severity: Severity::Error,
            rule_id,
        }
    }

    /// Create a warning
    pub fn warning(message: impl Into<String>, rule_id: &'static str) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(message, rule_id)
        }
    }

    /// Attach a source position
    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    /// Attach the position of a span
    pub fn at_span(self, span: Span) -> Self {
        self.at(span.line, span.column)
    }

    /// Check if this is an error (not a warning)
    pub fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Error)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        match (self.line, self.column) {
            (Some(line), Some(column)) => write!(
                f,
                "{} at line {}, col {}: {} [{}]",
                severity, line, column, self.message, self.rule_id
            ),
            _ => write!(f, "{}: {} [{}]", severity, self.message, self.rule_id),
        }
    }
}

/// Split diagnostics into `(errors, warnings)`
pub fn partition(diagnostics: Vec<Diagnostic>) -> (Vec<Diagnostic>, Vec<Diagnostic>) {
    diagnostics.into_iter().partition(Diagnostic::is_error)
}
