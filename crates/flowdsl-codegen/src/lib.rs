//! flowdsl Code Generation
//!
//! This crate turns a parsed workflow into the target platform's JSON
//! workflow document and drives the full compile pipeline.
//!
//! # Pipeline Overview
//!
//! ```text
//! ┌─────────┐     ┌─────────┐     ┌──────────┐     ┌──────────┐
//! │ Source  │────▶│   AST   │────▶│ Document │────▶│   JSON   │
//! │ (.flow) │     │ (core)  │     │  (Gen)   │     │(Validate)│
//! └─────────┘     └─────────┘     └──────────┘     └──────────┘
//! ```
//!
//! Generation evaluates variables and parameters, maps each DSL type tag to
//! a target node type, reshapes node parameters through a per-type
//! template, lays nodes out left to right and builds the connection map.
//!
//! # Example
//!
//! ```rust,ignore
//! use flowdsl_codegen::{CompileOptions, Compiler};
//!
//! let compiler = Compiler::new(CompileOptions::default());
//! let result = compiler.compile(&std::fs::read_to_string("orders.flow")?);
//! if let Some(json) = result.to_json(true)? {
//!     println!("{json}");
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod compiler;
pub mod document;
pub mod error;
pub mod evaluator;
pub mod generator;
pub mod node_types;
pub mod templates;

pub use compiler::{CompileOptions, CompileResult, Compiler, compile};
pub use document::{ConnectionTarget, GraphNode, WorkflowDocument};
pub use error::{Error, Result};
pub use evaluator::{EnvProvider, FileLoader, FsFileLoader, ProcessEnv};
pub use generator::{GenerateOptions, Generator, generate};
