//! Integration tests for the full compile pipeline
//!
//! Sources go in, JSON workflow documents come out. Tests check the shape of
//! the emitted JSON rather than internal types.

use std::collections::{BTreeMap, HashMap};

use flowdsl_codegen::{CompileOptions, Compiler, FsFileLoader, GenerateOptions, compile};
use serde_json::{Value, json};
use tempfile::TempDir;

const ORDER_SYNC: &str = r#"
workflow "order-sync" {
    param base_url string = "https://api.example.com"
    param limit number = 50 { min: 1, max: 500 }

    var endpoint = "${base_url}/orders"

    node nightly "cron" { cron: "0 */6 * * *" }
    node fetch "http.request" {
        url: endpoint,
        query: { limit: limit },
        headers: { "Authorization": "Bearer ${env(\"API_TOKEN\")}" },
        timeout: 10000
    }
    node has_orders "if" { condition: "${$json.count} > 0 && ${$json.status} == 'open'" }
    node tag "set" { fields: { synced: true, source: "nightly" } }
    node pause "wait" { amount: 2, unit: "minutes" }

    connect nightly -> fetch
    connect fetch -> has_orders
    connect has_orders.true -> tag
    connect has_orders.false -> pause
}
"#;

fn compile_json(compiler: &Compiler, source: &str) -> Value {
    let result = compiler.compile(source);
    assert!(result.success, "compile failed: {:?}", result.errors);
    serde_json::from_str(&result.to_json(true).unwrap().unwrap()).unwrap()
}

fn node<'a>(doc: &'a Value, name: &str) -> &'a Value {
    doc["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .find(|n| n["name"] == name)
        .unwrap_or_else(|| panic!("node '{name}' missing"))
}

// =============================================================================
// Document shape
// =============================================================================

#[test]
fn test_document_top_level() {
    let doc = compile_json(&Compiler::default(), ORDER_SYNC);

    assert_eq!(doc["name"], "order-sync");
    assert_eq!(doc["active"], false);
    assert_eq!(doc["settings"], json!({"executionOrder": "v1"}));
    assert!(doc["meta"]["instanceId"].as_str().is_some_and(|s| !s.is_empty()));
    assert_eq!(doc["nodes"].as_array().unwrap().len(), 5);

    let ids: std::collections::HashSet<&str> = doc["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids.len(), 5);
}

#[test]
fn test_connections_and_branches() {
    let doc = compile_json(&Compiler::default(), ORDER_SYNC);
    let connections = &doc["connections"];

    assert_eq!(
        connections["nightly"]["main"],
        json!([[{"node": "fetch", "type": "main", "index": 0}]])
    );
    assert_eq!(connections["has_orders"]["main"][0][0]["node"], "tag");
    assert_eq!(connections["has_orders"]["main"][1][0]["node"], "pause");
    assert!(connections.get("tag").is_none());
}

#[test]
fn test_node_parameters() {
    let compiler = Compiler::default()
        .with_env(HashMap::from([("API_TOKEN".to_string(), "t0k".to_string())]));
    let doc = compile_json(&compiler, ORDER_SYNC);

    let nightly = node(&doc, "nightly");
    assert_eq!(nightly["type"], "n8n-nodes-base.scheduleTrigger");
    assert_eq!(nightly["typeVersion"], 1.1);
    assert_eq!(
        nightly["parameters"]["rule"]["interval"][0],
        json!({"field": "hours", "hoursInterval": 6})
    );

    let fetch = &node(&doc, "fetch")["parameters"];
    assert_eq!(fetch["method"], "GET");
    assert_eq!(fetch["url"], "https://api.example.com/orders");
    assert_eq!(
        fetch["queryParameters"]["parameters"],
        json!([{"name": "limit", "value": "50"}])
    );
    assert_eq!(fetch["headerParameters"]["parameters"][0]["value"], "Bearer t0k");
    assert_eq!(fetch["options"]["timeout"], 10000);

    let branch = &node(&doc, "has_orders")["parameters"]["conditions"];
    assert_eq!(branch["combinator"], "and");
    let clauses = branch["conditions"].as_array().unwrap();
    assert_eq!(clauses.len(), 2);
    assert_eq!(clauses[0]["leftValue"], "${$json.count}");
    assert_eq!(clauses[0]["operator"], json!({"type": "number", "operation": "gt"}));
    assert_eq!(clauses[1]["rightValue"], "open");

    let tag = &node(&doc, "tag")["parameters"];
    assert_eq!(tag["assignments"]["assignments"][0]["name"], "synced");
    assert_eq!(tag["assignments"]["assignments"][0]["type"], "boolean");

    let pause = &node(&doc, "pause")["parameters"];
    assert_eq!(pause, &json!({"resume": "timeInterval", "amount": 2, "unit": "minutes"}));
}

#[test]
fn test_layout_positions() {
    let doc = compile_json(&Compiler::default(), ORDER_SYNC);
    let xs: Vec<f64> = doc["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["position"][0].as_f64().unwrap())
        .collect();
    assert_eq!(xs, vec![0.0, 200.0, 400.0, 600.0, 800.0]);
}

#[test]
fn test_recompile_differs_only_in_ids() {
    let strip = |mut doc: Value| {
        doc["meta"]["instanceId"] = Value::Null;
        for node in doc["nodes"].as_array_mut().unwrap() {
            node["id"] = Value::Null;
            if let Some(clauses) = node["parameters"]["conditions"]["conditions"].as_array_mut() {
                for clause in clauses {
                    clause["id"] = Value::Null;
                }
            }
            if let Some(items) = node["parameters"]["assignments"]["assignments"].as_array_mut() {
                for item in items {
                    item["id"] = Value::Null;
                }
            }
        }
        doc
    };

    let first = compile_json(&Compiler::default(), ORDER_SYNC);
    let second = compile_json(&Compiler::default(), ORDER_SYNC);
    assert_ne!(first["meta"]["instanceId"], second["meta"]["instanceId"]);
    assert_eq!(strip(first), strip(second));
}

// =============================================================================
// Options
// =============================================================================

#[test]
fn test_parameter_overrides_and_constraints() {
    let options = |limit: Value| CompileOptions {
        generate: GenerateOptions {
            params: BTreeMap::from([("limit".to_string(), limit)]),
            ..Default::default()
        },
        ..Default::default()
    };

    let doc = compile_json(&Compiler::new(options(json!("120"))), ORDER_SYNC);
    assert_eq!(
        node(&doc, "fetch")["parameters"]["queryParameters"]["parameters"][0]["value"],
        "120"
    );

    let result = Compiler::new(options(json!(9000))).compile(ORDER_SYNC);
    assert!(!result.success);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].message.contains("limit"));
}

#[test]
fn test_file_loader() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("transform.js"), "return items;").unwrap();

    let source = r#"workflow "w" {
        node start "manual.trigger" {}
        node run "code" { code: file("transform.js"), mode: "each" }
        connect start -> run
    }"#;

    let compiler = Compiler::default().with_file_loader(FsFileLoader::new(dir.path()));
    let doc = compile_json(&compiler, source);
    let run = &node(&doc, "run")["parameters"];
    assert_eq!(run["jsCode"], "return items;");
    assert_eq!(run["mode"], "runOnceForEachItem");

    let result = Compiler::default().compile(source);
    assert!(!result.success);
    assert!(result.errors[0].message.contains("transform.js"));
}

#[test]
fn test_strict_mode_fails_on_unconnected_node() {
    let source = r#"workflow "w" {
        node start "manual.trigger" {}
        node hook "webhook" { path: "/orders" }
        node orphan "noop" {}
        connect hook -> start
    }"#;

    let lenient = compile(source);
    assert!(lenient.success);
    assert_eq!(lenient.warnings.len(), 1);
    assert_eq!(lenient.warnings[0].line, Some(4));

    let strict = Compiler::new(CompileOptions {
        strict: true,
        ..Default::default()
    })
    .compile(source);
    assert!(!strict.success);
}

#[test]
fn test_failures_produce_no_document() {
    for source in [
        "workflow \"w\" { node a \"noop\" { x: ~ } }",
        "workflow \"w\" { node a }",
        "workflow \"w\" { node a \"noop\" {} connect a -> b }",
        "workflow \"w\" { node a \"mystery\" {} }",
        "workflow \"w\" { module m = \"./m.flow\" {} }",
    ] {
        let result = compile(source);
        assert!(!result.success, "expected failure for {source}");
        assert!(result.document.is_none());
        assert!(!result.errors.is_empty());
    }
}
