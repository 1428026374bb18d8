//! flowdsl CLI
//!
//! Compiles workflow sources into workflow JSON documents.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

/// flowdsl - workflow DSL compiler
#[derive(Parser)]
#[command(name = "flowdsl")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "flowdsl.yaml", global = true)]
    config: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new flowdsl project
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,

        /// Name of the example workflow (defaults to directory name)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Compile workflow sources to JSON
    Compile {
        /// Source file or directory of `.flow` files
        path: PathBuf,

        /// Output file or directory; `-` writes to stdout
        #[arg(short, long)]
        output: Option<String>,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,

        /// Write compact JSON
        #[arg(long)]
        compact: bool,

        /// Disable automatic node placement
        #[arg(long)]
        no_layout: bool,

        /// Horizontal spacing between auto-placed nodes
        #[arg(long)]
        spacing: Option<f64>,

        /// Override a workflow parameter (repeatable)
        #[arg(short, long = "param", value_name = "KEY=VALUE", value_parser = commands::compile::parse_param)]
        params: Vec<(String, String)>,
    },

    /// Check sources without generating output
    Validate {
        /// Source file or directory of `.flow` files
        path: PathBuf,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let registry = tracing_subscriber::registry().with(filter);
    if cli.log_json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    match cli.command {
        Commands::Init { path, name } => {
            commands::init::run(&path, name.as_deref()).await?;
        }
        Commands::Compile {
            path,
            output,
            strict,
            compact,
            no_layout,
            spacing,
            params,
        } => {
            let args = commands::compile::CompileArgs {
                path,
                output,
                strict,
                compact,
                no_layout,
                spacing,
                params,
            };
            commands::compile::run(&cli.config, args).await?;
        }
        Commands::Validate { path, strict } => {
            commands::validate::run(&cli.config, &path, strict).await?;
        }
    }

    Ok(())
}
