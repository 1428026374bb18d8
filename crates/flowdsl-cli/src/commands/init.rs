//! Initialize a new flowdsl project

use anyhow::Result;
use std::path::Path;
use tokio::fs;

use flowdsl_core::config::CONFIG_FILE;

/// Run the init command
pub async fn run(path: &str, name: Option<&str>) -> Result<()> {
    let project_dir = Path::new(path);

    // Create directory if it doesn't exist
    if !project_dir.exists() {
        fs::create_dir_all(project_dir).await?;
    }

    let abs_path = project_dir.canonicalize()?;

    // Derive workflow name from directory name if not provided
    let workflow_name = match name {
        Some(n) => n.to_string(),
        None => abs_path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("Could not determine project name from path"))?,
    };

    if project_dir.join(CONFIG_FILE).exists() {
        anyhow::bail!(
            "Directory '{}' already contains a {}",
            project_dir.display(),
            CONFIG_FILE
        );
    }

    tracing::info!("Creating new flowdsl project: {}", workflow_name);

    fs::create_dir_all(project_dir.join("workflows")).await?;

    let config = r#"# flowdsl project configuration
layout:
  auto: true
  start: [0, 0]
  spacing: 200

validation:
  # Fail on warnings such as unconnected nodes
  strict: false
  # Check the generated document's structure
  validate_output: true

# Parameter overrides, by parameter name
params: {}
"#;
    fs::write(project_dir.join(CONFIG_FILE), config).await?;

    let hello = format!(
        r#"// Example workflow
workflow "{workflow_name}" {{
    param base_url string = "https://api.example.com"

    var endpoint = "${{base_url}}/status"

    node start "manual.trigger" {{}}

    node fetch "http.request" {{
        url: endpoint,
        method: "GET",
        headers: {{ Accept: "application/json" }}
    }}

    node check "if" {{
        condition: "{{{{ $json.status }}}} == 'ok'"
    }}

    node done "noop" {{}}
    node alert "noop" {{}}

    connect start -> fetch
    connect fetch -> check
    connect check.true -> done
    connect check.false -> alert
}}
"#
    );
    fs::write(project_dir.join("workflows/hello.flow"), hello).await?;

    let gitignore = r#"# Compiled workflows
*.json
"#;
    fs::write(project_dir.join(".gitignore"), gitignore).await?;

    tracing::info!(
        "✓ Created project '{}' at {}",
        workflow_name,
        abs_path.display()
    );
    tracing::info!("Next steps:");
    if path != "." {
        tracing::info!("  cd {}", project_dir.display());
    }
    tracing::info!("  flowdsl validate workflows      # Check sources");
    tracing::info!("  flowdsl compile workflows       # Write workflow JSON");

    Ok(())
}
