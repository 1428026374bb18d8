//! Built-in AST validation rules
//!
//! Errors:
//! - `duplicate-parameter`, `duplicate-variable`, `variable-shadows-parameter`
//! - `duplicate-node`
//! - `dangling-connection`
//!
//! Warnings:
//! - `unconnected-node`

mod connections;
mod duplicates;

pub use connections::{DanglingConnectionRule, UnconnectedNodeRule};
pub use duplicates::{
    DuplicateNodeRule, DuplicateParameterRule, DuplicateVariableRule, VariableShadowsParameterRule,
};
