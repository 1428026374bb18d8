use super::*;
use crate::diagnostics::Severity;
use crate::parser::parse_source;

fn validate(source: &str) -> Vec<Diagnostic> {
    let program = parse_source(source).unwrap();
    validate_program(&program)
}

fn errors(diagnostics: &[Diagnostic]) -> Vec<&Diagnostic> {
    diagnostics.iter().filter(|d| d.is_error()).collect()
}

fn warnings(diagnostics: &[Diagnostic]) -> Vec<&Diagnostic> {
    diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Warning)
        .collect()
}

#[test]
fn test_clean_workflow_has_no_diagnostics() {
    let diagnostics = validate(
        r#"workflow "ok" {
            param url string = "https://example.com"
            var retries = 3
            node start "manual.trigger" {}
            node fetch "http.request" { url: url }
            connect start -> fetch
        }"#,
    );
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
}

#[test]
fn test_duplicate_node_names() {
    let diagnostics = validate(
        r#"workflow "dup" {
            node a "http.request" {}
            node a "http.request" {}
            connect a -> a
        }"#,
    );
    let errs = errors(&diagnostics);
    assert_eq!(errs.len(), 1);
    assert_eq!(errs[0].rule_id, "duplicate-node");
    assert!(errs[0].message.contains("'a'"));
    assert_eq!(errs[0].line, Some(3));
}

#[test]
fn test_node_and_module_share_namespace() {
    let diagnostics = validate(
        r#"workflow "dup" {
            node a "noop" {}
            module a = "./a.flow" {}
            connect a -> a
        }"#,
    );
    assert_eq!(errors(&diagnostics).len(), 1);
}

#[test]
fn test_duplicate_parameters_and_variables() {
    let diagnostics = validate(
        r#"workflow "dup" {
            param p string = "x"
            param p number = 1
            var v = 1
            var v = 2
            var p = 3
        }"#,
    );
    let rules: Vec<&str> = errors(&diagnostics).iter().map(|d| d.rule_id).collect();
    assert_eq!(
        rules,
        vec![
            "duplicate-parameter",
            "duplicate-variable",
            "variable-shadows-parameter"
        ]
    );
}

#[test]
fn test_dangling_connection_reports_each_endpoint() {
    let diagnostics = validate(
        r#"workflow "dangling" {
            connect missing -> alsoMissing
        }"#,
    );
    let errs = errors(&diagnostics);
    assert_eq!(errs.len(), 2);
    assert!(errs[0].message.contains("missing"));
    assert!(errs[1].message.contains("alsoMissing"));
    assert!(errs.iter().all(|d| d.rule_id == "dangling-connection"));
}

#[test]
fn test_unconnected_node_is_a_single_warning() {
    let diagnostics = validate(
        r#"workflow "lonely" {
            node a "manual.trigger" {}
            node b "noop" {}
            node c "noop" {}
            connect a -> b
        }"#,
    );
    assert!(errors(&diagnostics).is_empty());
    let warns = warnings(&diagnostics);
    assert_eq!(warns.len(), 1);
    assert!(warns[0].message.contains("'c'"));
    assert_eq!(warns[0].line, Some(4));
}

#[test]
fn test_rules_are_listed() {
    let validator = Validator::new();
    let ids: Vec<&str> = validator.rules().map(|(id, _)| id).collect();
    assert!(ids.contains(&"unconnected-node"));
    assert_eq!(ids.len(), 6);
}
