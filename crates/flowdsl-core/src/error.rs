//! Error types for flowdsl-core

use thiserror::Error;

/// Result type alias for flowdsl-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in flowdsl-core
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed token or unterminated literal
    #[error("lex error at line {line}, column {column}: {message}")]
    Lex {
        /// Description of the problem
        message: String,
        /// 1-based line
        line: usize,
        /// 1-based column
        column: usize,
    },

    /// Grammar violation
    #[error("parse error at line {line}, column {column}: {message}")]
    Parse {
        /// Description of the problem
        message: String,
        /// 1-based line of the offending token
        line: usize,
        /// 1-based column of the offending token
        column: usize,
    },

    /// Configuration file could not be found
    #[error("configuration file not found: {path}")]
    ConfigNotFound {
        /// Path that was searched
        path: String,
    },

    /// Failed to parse YAML configuration
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Source position of a lex or parse error, if the error has one
    pub fn position(&self) -> Option<(usize, usize)> {
        match self {
            Error::Lex { line, column, .. } | Error::Parse { line, column, .. } => {
                Some((*line, *column))
            }
            _ => None,
        }
    }
}
