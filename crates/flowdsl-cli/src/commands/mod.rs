//! CLI command implementations

pub mod compile;
pub mod init;
pub mod validate;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use flowdsl_core::{Config, Diagnostic};
use walkdir::WalkDir;

/// Source file extension
pub const SOURCE_EXTENSION: &str = "flow";

/// Load the project configuration, falling back to defaults when absent
pub fn load_config(config_path: &str) -> Result<Config> {
    tracing::debug!("Loading configuration from {}", config_path);
    Config::load_or_default(config_path).context("Failed to load configuration")
}

/// A single file, or every `.flow` file under a directory in sorted order
pub fn collect_sources(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.exists() {
        anyhow::bail!("Path not found: {}", path.display());
    }
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut sources = Vec::new();
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to read {}", path.display()))?;
        let is_source = entry.file_type().is_file()
            && entry.path().extension().and_then(|e| e.to_str()) == Some(SOURCE_EXTENSION);
        if is_source {
            sources.push(entry.into_path());
        }
    }

    if sources.is_empty() {
        anyhow::bail!("No .{} files found in {}", SOURCE_EXTENSION, path.display());
    }
    Ok(sources)
}

/// Print diagnostics for one source to stderr
pub fn report<'a>(source: &Path, diagnostics: impl IntoIterator<Item = &'a Diagnostic>) {
    for diagnostic in diagnostics {
        eprintln!("{}: {}", source.display(), diagnostic);
    }
}
