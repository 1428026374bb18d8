//! flowdsl Core Library
//!
//! This crate provides the front half of the workflow compiler:
//! - Lexing DSL source into tokens
//! - Recursive-descent parsing into an AST
//! - Structural validation of the AST and of generated documents
//! - Project configuration (`flowdsl.yaml`)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │    Lexer    │────▶│   Parser    │────▶│  Validator  │
//! │  (tokens)   │     │    (AST)    │     │(diagnostics)│
//! └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use flowdsl_core::{parse_source, validator::validate_program};
//!
//! let program = parse_source(r#"workflow "demo" { node start "manual.trigger" {} }"#)?;
//! for diagnostic in validate_program(&program) {
//!     println!("{}", diagnostic);
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ast;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod token;
pub mod validator;

pub use ast::Program;
pub use config::{Config, ProjectConfig};
pub use diagnostics::{Diagnostic, Severity};
pub use error::{Error, Result};
pub use lexer::{LexWarning, tokenize, tokenize_with_warnings};
pub use parser::{parse, parse_source};
pub use token::{Token, TokenKind};
