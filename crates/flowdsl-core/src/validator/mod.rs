//! Structural validation
//!
//! Two independent passes, both of which collect [`Diagnostic`]s and never
//! fail:
//!
//! 1. **AST pass** ([`Validator`]) runs a list of [`ValidationRule`]s over a
//!    parsed workflow before generation.
//! 2. **Graph pass** ([`validate_graph`]) checks the shape of a generated
//!    JSON document.
//!
//! # Adding a New Rule
//!
//! 1. Create a new file in `validator/rules/`
//! 2. Implement `ValidationRule` for your struct
//! 3. Add it to the `Validator::new()` constructor

pub mod graph;
pub mod rules;

pub use graph::validate_graph;

use crate::ast::{Program, WorkflowDeclaration};
use crate::diagnostics::Diagnostic;

/// Trait that all AST validation rules implement.
///
/// Rules are independent of each other and only read the AST.
pub trait ValidationRule: Send + Sync {
    /// Unique identifier for this rule (e.g., "duplicate-node")
    fn id(&self) -> &'static str;

    /// Human-readable description of what this rule checks
    fn description(&self) -> &'static str;

    /// Run the rule. An empty vector means no issues found.
    fn validate(&self, workflow: &WorkflowDeclaration) -> Vec<Diagnostic>;
}

/// Runs every registered AST rule.
pub struct Validator {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl Validator {
    /// Create a validator with all built-in rules.
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(rules::DuplicateParameterRule),
                Box::new(rules::DuplicateVariableRule),
                Box::new(rules::VariableShadowsParameterRule),
                Box::new(rules::DuplicateNodeRule),
                Box::new(rules::DanglingConnectionRule),
                Box::new(rules::UnconnectedNodeRule),
            ],
        }
    }

    /// Run all rules and collect their diagnostics.
    pub fn validate(&self, workflow: &WorkflowDeclaration) -> Vec<Diagnostic> {
        let diagnostics: Vec<Diagnostic> = self
            .rules
            .iter()
            .flat_map(|rule| rule.validate(workflow))
            .collect();

        tracing::debug!(
            workflow = %workflow.name,
            diagnostics = diagnostics.len(),
            "validated workflow"
        );

        diagnostics
    }

    /// Registered rules as `(id, description)` pairs
    pub fn rules(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.rules.iter().map(|r| (r.id(), r.description()))
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the AST pass with the built-in rules.
pub fn validate_program(program: &Program) -> Vec<Diagnostic> {
    Validator::new().validate(&program.workflow)
}

#[cfg(test)]
mod tests;
