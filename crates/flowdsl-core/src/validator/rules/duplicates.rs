//! Rules: name uniqueness
//!
//! Parameter names, variable names and node names must each be unique, and
//! no variable may reuse a parameter's name. The first declaration of a name
//! is accepted; every later one is reported at its own position.

use std::collections::HashSet;

use crate::ast::{Span, WorkflowDeclaration};
use crate::diagnostics::Diagnostic;
use crate::validator::ValidationRule;

fn report_duplicates<'a>(
    names: impl Iterator<Item = (&'a str, Span)>,
    kind: &str,
    rule_id: &'static str,
) -> Vec<Diagnostic> {
    let mut seen = HashSet::new();
    names
        .filter(|(name, _)| !seen.insert(*name))
        .map(|(name, span)| {
            Diagnostic::error(format!("duplicate {} name '{}'", kind, name), rule_id).at_span(span)
        })
        .collect()
}

/// Parameter names are unique.
pub struct DuplicateParameterRule;

impl ValidationRule for DuplicateParameterRule {
    fn id(&self) -> &'static str {
        "duplicate-parameter"
    }

    fn description(&self) -> &'static str {
        "Parameter names must be unique"
    }

    fn validate(&self, workflow: &WorkflowDeclaration) -> Vec<Diagnostic> {
        report_duplicates(
            workflow
                .parameters
                .iter()
                .map(|p| (p.name.as_str(), p.span)),
            "parameter",
            self.id(),
        )
    }
}

/// Variable names are unique.
pub struct DuplicateVariableRule;

impl ValidationRule for DuplicateVariableRule {
    fn id(&self) -> &'static str {
        "duplicate-variable"
    }

    fn description(&self) -> &'static str {
        "Variable names must be unique"
    }

    fn validate(&self, workflow: &WorkflowDeclaration) -> Vec<Diagnostic> {
        report_duplicates(
            workflow.variables.iter().map(|v| (v.name.as_str(), v.span)),
            "variable",
            self.id(),
        )
    }
}

/// Variables do not reuse parameter names.
pub struct VariableShadowsParameterRule;

impl ValidationRule for VariableShadowsParameterRule {
    fn id(&self) -> &'static str {
        "variable-shadows-parameter"
    }

    fn description(&self) -> &'static str {
        "Variable names must not collide with parameter names"
    }

    fn validate(&self, workflow: &WorkflowDeclaration) -> Vec<Diagnostic> {
        let params: HashSet<&str> = workflow
            .parameters
            .iter()
            .map(|p| p.name.as_str())
            .collect();

        workflow
            .variables
            .iter()
            .filter(|v| params.contains(v.name.as_str()))
            .map(|v| {
                Diagnostic::error(
                    format!("variable '{}' conflicts with a parameter of the same name", v.name),
                    self.id(),
                )
                .at_span(v.span)
            })
            .collect()
    }
}

/// Node names are unique across nodes and modules.
pub struct DuplicateNodeRule;

impl ValidationRule for DuplicateNodeRule {
    fn id(&self) -> &'static str {
        "duplicate-node"
    }

    fn description(&self) -> &'static str {
        "Node and module names must be unique"
    }

    fn validate(&self, workflow: &WorkflowDeclaration) -> Vec<Diagnostic> {
        report_duplicates(
            workflow.nodes.iter().map(|n| (n.name(), n.span())),
            "node",
            self.id(),
        )
    }
}
