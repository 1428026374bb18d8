//! Validate workflow sources without generating output

use std::path::Path;

use anyhow::{Context, Result};
use flowdsl_codegen::{CompileOptions, Compiler};

use super::{collect_sources, load_config, report};

/// Run the validate command
pub async fn run(config_path: &str, path: &Path, strict: bool) -> Result<()> {
    let config = load_config(config_path)?;

    let mut options = CompileOptions::from(&config.project);
    options.strict |= strict;
    let compiler = Compiler::new(options);

    let sources = collect_sources(path)?;
    let mut failed = 0usize;

    for source in &sources {
        let text = tokio::fs::read_to_string(source)
            .await
            .with_context(|| format!("Failed to read {}", source.display()))?;

        let result = compiler.check(&text);
        report(source, result.diagnostics());

        if result.success {
            tracing::info!("✓ {} is valid", source.display());
        } else {
            tracing::error!("✗ {}", source.display());
            failed += 1;
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} workflows failed validation", failed, sources.len());
    }
    Ok(())
}
