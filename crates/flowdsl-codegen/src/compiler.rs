//! Compile pipeline
//!
//! Source text → tokens → AST → AST validation → document → graph
//! validation. Failures become diagnostics instead of errors so callers get
//! everything that went wrong in one result.

use flowdsl_core::config::ProjectConfig;
use flowdsl_core::diagnostics::{Diagnostic, partition};
use flowdsl_core::validator::{Validator, validate_graph};
use flowdsl_core::{Program, parse, tokenize_with_warnings};
use serde::Serialize;

use crate::document::WorkflowDocument;
use crate::error::{Error, Result};
use crate::evaluator::{EnvProvider, FileLoader};
use crate::generator::{GenerateOptions, Generator};

/// Compile settings
#[derive(Debug, Clone, PartialEq)]
pub struct CompileOptions {
    /// Passed through to the generator
    pub generate: GenerateOptions,

    /// Warnings fail the compile
    pub strict: bool,

    /// Run the graph pass on the generated document
    pub validate_output: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            generate: GenerateOptions::default(),
            strict: false,
            validate_output: true,
        }
    }
}

impl From<&ProjectConfig> for CompileOptions {
    fn from(config: &ProjectConfig) -> Self {
        Self {
            generate: GenerateOptions::from(config),
            strict: config.validation.strict,
            validate_output: config.validation.validate_output,
        }
    }
}

/// Outcome of one compile
#[derive(Debug, Clone, Serialize)]
pub struct CompileResult {
    /// No errors, and no warnings in strict mode
    pub success: bool,

    /// The generated document, when generation ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<WorkflowDocument>,

    /// Blocking diagnostics
    pub errors: Vec<Diagnostic>,

    /// Non-blocking diagnostics
    pub warnings: Vec<Diagnostic>,
}

impl CompileResult {
    fn finish(
        document: Option<WorkflowDocument>,
        errors: Vec<Diagnostic>,
        warnings: Vec<Diagnostic>,
        strict: bool,
    ) -> Self {
        let success = errors.is_empty() && !(strict && !warnings.is_empty());
        Self {
            success,
            document,
            errors,
            warnings,
        }
    }

    /// Render the document as JSON, if there is one
    pub fn to_json(&self, pretty: bool) -> Result<Option<String>> {
        self.document
            .as_ref()
            .map(|doc| doc.to_json(pretty))
            .transpose()
    }

    /// Errors followed by warnings
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.errors.iter().chain(self.warnings.iter())
    }
}

/// Runs the whole pipeline
pub struct Compiler {
    options: CompileOptions,
    generator: Generator,
    validator: Validator,
}

impl Compiler {
    /// Create a compiler
    pub fn new(options: CompileOptions) -> Self {
        let generator = Generator::new(options.generate.clone());
        Self {
            options,
            generator,
            validator: Validator::new(),
        }
    }

    /// Use `env` for `env(...)` lookups
    pub fn with_env(mut self, env: impl EnvProvider + 'static) -> Self {
        self.generator = self.generator.with_env(env);
        self
    }

    /// Enable `file(...)` through `loader`
    pub fn with_file_loader(mut self, loader: impl FileLoader + 'static) -> Self {
        self.generator = self.generator.with_file_loader(loader);
        self
    }

    /// Compile settings
    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Compile source text into a document plus diagnostics
    pub fn compile(&self, source: &str) -> CompileResult {
        let (program, mut warnings) = match self.front(source) {
            Ok(front) => front,
            Err(result) => return result,
        };

        let document = match self.generator.generate(&program) {
            Ok(document) => document,
            Err(err) => {
                tracing::debug!("Generation failed: {}", err);
                return CompileResult::finish(
                    None,
                    vec![err.to_diagnostic()],
                    warnings,
                    self.options.strict,
                );
            }
        };

        let mut errors = Vec::new();
        if self.options.validate_output {
            match document.to_value() {
                Ok(value) => {
                    let (graph_errors, graph_warnings) = partition(validate_graph(&value));
                    errors.extend(graph_errors);
                    warnings.extend(graph_warnings);
                }
                Err(err) => errors.push(err.to_diagnostic()),
            }
        }

        CompileResult::finish(Some(document), errors, warnings, self.options.strict)
    }

    /// Lex, parse and validate without generating
    pub fn check(&self, source: &str) -> CompileResult {
        match self.front(source) {
            Ok((_, warnings)) => CompileResult::finish(None, Vec::new(), warnings, self.options.strict),
            Err(result) => result,
        }
    }

    /// Front half shared by `compile` and `check`. On failure the returned
    /// result already carries every diagnostic.
    fn front(&self, source: &str) -> std::result::Result<(Program, Vec<Diagnostic>), CompileResult> {
        let fail = |errors: Vec<Diagnostic>, warnings: Vec<Diagnostic>| {
            CompileResult::finish(None, errors, warnings, self.options.strict)
        };

        let lexed = match tokenize_with_warnings(source) {
            Ok(lexed) => lexed,
            Err(err) => return Err(fail(vec![Error::from(err).to_diagnostic()], Vec::new())),
        };

        let mut warnings: Vec<Diagnostic> = lexed
            .warnings
            .iter()
            .map(|w| Diagnostic::warning(w.message(), "lex").at(w.line, w.column))
            .collect();

        let program = match parse(lexed.tokens) {
            Ok(program) => program,
            Err(err) => return Err(fail(vec![Error::from(err).to_diagnostic()], warnings)),
        };

        let (errors, ast_warnings) = partition(self.validator.validate(&program.workflow));
        warnings.extend(ast_warnings);
        if !errors.is_empty() {
            tracing::debug!("AST validation found {} errors", errors.len());
            return Err(fail(errors, warnings));
        }

        Ok((program, warnings))
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(CompileOptions::default())
    }
}

/// Compile with default options and collaborators
pub fn compile(source: &str) -> CompileResult {
    Compiler::default().compile(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PIPELINE: &str = r#"
workflow "orders" {
    param base_url string = "https://api.test"

    node start "manual.trigger" {}
    node fetch "http.request" { url: "${base_url}/orders" }
    node check "if" { condition: "${count} >= 10" }

    connect start -> fetch
    connect fetch -> check
}
"#;

    #[test]
    fn test_compile_success() {
        let result = compile(PIPELINE);
        assert!(result.success, "{:?}", result.errors);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());

        let doc = result.document.as_ref().unwrap();
        assert_eq!(doc.nodes.len(), 3);
        assert_eq!(doc.connection_count(), 2);
        assert_eq!(
            doc.node("fetch").unwrap().parameters["url"],
            "https://api.test/orders"
        );
    }

    #[test]
    fn test_lex_error_is_single_positioned_error() {
        let result = compile("workflow \"w\" {\n  node a \"noop\" { x: @ }\n}");
        assert!(!result.success);
        assert!(result.document.is_none());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].rule_id, "lex");
        assert_eq!(result.errors[0].line, Some(2));
    }

    #[test]
    fn test_parse_error() {
        let result = compile("workflow \"w\" { node }");
        assert!(!result.success);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].rule_id, "parse");
    }

    #[test]
    fn test_ast_errors_stop_before_generation() {
        let result = compile(
            r#"workflow "w" {
                node a "noop" {}
                node a "noop" {}
                connect a -> ghost
            }"#,
        );
        assert!(!result.success);
        assert!(result.document.is_none());
        let rules: Vec<&str> = result.errors.iter().map(|d| d.rule_id).collect();
        assert!(rules.contains(&"duplicate-node"));
        assert!(rules.contains(&"dangling-connection"));
    }

    #[test]
    fn test_generation_error_is_reported() {
        let result = compile(r#"workflow "w" { node a "slack" {} }"#);
        assert!(!result.success);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].rule_id, "generate");
        assert_eq!(result.errors[0].line, Some(1));
    }

    #[test]
    fn test_warning_blocks_only_in_strict_mode() {
        let source = r#"workflow "w" {
            node a "noop" {}
            node b "noop" {}
            node lonely "noop" {}
            connect a -> b
        }"#;

        let lenient = compile(source);
        assert!(lenient.success);
        assert_eq!(lenient.warnings.len(), 1);
        assert_eq!(lenient.warnings[0].rule_id, "unconnected-node");
        assert!(lenient.document.is_some());

        let strict = Compiler::new(CompileOptions {
            strict: true,
            ..Default::default()
        })
        .compile(source);
        assert!(!strict.success);
        assert!(strict.errors.is_empty());
        assert!(strict.document.is_some());
    }

    #[test]
    fn test_lex_warnings_surface() {
        let result = compile(
            "workflow \"w\" { node a \"noop\" {} node b \"noop\" {} * connect a -> b }",
        );
        assert!(result.success);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].rule_id, "lex");
        assert_eq!(result.warnings[0].column, Some(50));
    }

    #[test]
    fn test_check_skips_generation() {
        let result = Compiler::default().check(r#"workflow "w" { node a "unknown.type" {} }"#);
        assert!(result.success);
        assert!(result.document.is_none());
    }

    #[test]
    fn test_to_json() {
        let result = compile(PIPELINE);
        let pretty = result.to_json(true).unwrap().unwrap();
        let compact = result.to_json(false).unwrap().unwrap();
        assert!(pretty.contains('\n'));
        assert!(!compact.contains('\n'));
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&pretty).unwrap(),
            serde_json::from_str::<serde_json::Value>(&compact).unwrap()
        );

        assert!(compile("workflow").to_json(true).unwrap().is_none());
    }

    #[test]
    fn test_options_from_config() {
        let config = flowdsl_core::Config::parse("validation:\n  strict: true\n  validate_output: false\n").unwrap();
        let options = CompileOptions::from(&config);
        assert!(options.strict);
        assert!(!options.validate_output);
        assert!(options.generate.auto_layout);
    }
}
