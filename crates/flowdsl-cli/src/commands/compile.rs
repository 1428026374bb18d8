//! Compile workflow sources to JSON

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use flowdsl_codegen::{CompileOptions, Compiler, FsFileLoader, ProcessEnv};

use super::{collect_sources, load_config, report};

/// Arguments for the compile command
pub struct CompileArgs {
    /// Source file or directory
    pub path: PathBuf,
    /// Output file or directory; `-` for stdout
    pub output: Option<String>,
    /// Treat warnings as errors
    pub strict: bool,
    /// Write compact JSON
    pub compact: bool,
    /// Disable automatic node placement
    pub no_layout: bool,
    /// Horizontal spacing override
    pub spacing: Option<f64>,
    /// `--param KEY=VALUE` overrides
    pub params: Vec<(String, String)>,
}

/// Where compiled documents go
#[derive(Debug, Clone, PartialEq)]
enum Destination {
    /// `<stem>.json` next to each source
    Alongside,
    Stdout,
    File(PathBuf),
    Directory(PathBuf),
}

impl Destination {
    fn resolve(output: Option<&str>, multiple: bool) -> Self {
        match output {
            None => Destination::Alongside,
            Some("-") => Destination::Stdout,
            Some(path) if multiple => Destination::Directory(PathBuf::from(path)),
            Some(path) => Destination::File(PathBuf::from(path)),
        }
    }

    fn target(&self, source: &Path) -> Option<PathBuf> {
        match self {
            Destination::Alongside => Some(source.with_extension("json")),
            Destination::Stdout => None,
            Destination::File(path) => Some(path.clone()),
            Destination::Directory(dir) => {
                let stem = source.file_stem().unwrap_or(source.as_os_str());
                Some(dir.join(format!("{}.json", stem.to_string_lossy())))
            }
        }
    }
}

/// Parse a `KEY=VALUE` parameter override
pub fn parse_param(raw: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty parameter name in '{}'", raw));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Run the compile command
pub async fn run(config_path: &str, args: CompileArgs) -> Result<()> {
    let config = load_config(config_path)?;

    let mut options = CompileOptions::from(&config.project);
    options.strict |= args.strict;
    if args.no_layout {
        options.generate.auto_layout = false;
    }
    if let Some(spacing) = args.spacing {
        options.generate.spacing = spacing;
    }
    for (key, value) in args.params {
        options
            .generate
            .params
            .insert(key, serde_json::Value::String(value));
    }

    let sources = collect_sources(&args.path)?;
    let destination = Destination::resolve(args.output.as_deref(), args.path.is_dir());
    if let Destination::Directory(dir) = &destination {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let mut failed = 0usize;
    for source in &sources {
        if !compile_source(&options, source, &destination, !args.compact).await? {
            failed += 1;
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} workflows failed to compile", failed, sources.len());
    }

    tracing::info!("Compiled {} workflows", sources.len());
    Ok(())
}

/// Compile one source; `Ok(false)` means diagnostics blocked it.
async fn compile_source(
    options: &CompileOptions,
    source: &Path,
    destination: &Destination,
    pretty: bool,
) -> Result<bool> {
    tracing::debug!("Compiling {}", source.display());

    let text = tokio::fs::read_to_string(source)
        .await
        .with_context(|| format!("Failed to read {}", source.display()))?;

    let base = source.parent().unwrap_or(Path::new(".")).to_path_buf();
    let compiler = Compiler::new(options.clone())
        .with_env(ProcessEnv)
        .with_file_loader(FsFileLoader::new(base));

    let result = compiler.compile(&text);
    report(source, result.diagnostics());

    if !result.success {
        tracing::error!("✗ {}", source.display());
        return Ok(false);
    }

    let Some(json) = result.to_json(pretty)? else {
        return Ok(false);
    };

    match destination.target(source) {
        Some(target) => {
            tokio::fs::write(&target, format!("{}\n", json))
                .await
                .with_context(|| format!("Failed to write {}", target.display()))?;
            tracing::info!("✓ {} → {}", source.display(), target.display());
        }
        None => println!("{}", json),
    }

    Ok(true)
}
