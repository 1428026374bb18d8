//! Graph pass: shape checks over a generated workflow document
//!
//! Operates on raw JSON so that documents produced elsewhere can be checked
//! the same way as freshly generated ones.

use std::collections::HashSet;

use serde_json::Value;

use crate::diagnostics::Diagnostic;

const RULE_NODES: &str = "graph-nodes";
const RULE_NODE_SHAPE: &str = "graph-node-shape";
const RULE_DUPLICATE: &str = "graph-duplicate-node";
const RULE_CONNECTIONS: &str = "graph-connections";

/// Check a generated document's node list and connection map.
pub fn validate_graph(document: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    let Some(nodes) = document.get("nodes").and_then(Value::as_array) else {
        diagnostics.push(Diagnostic::error(
            "document has no 'nodes' array",
            RULE_NODES,
        ));
        return diagnostics;
    };

    if nodes.is_empty() {
        diagnostics.push(Diagnostic::error(
            "workflow must contain at least one node",
            RULE_NODES,
        ));
    }

    let mut names = HashSet::new();
    for (index, node) in nodes.iter().enumerate() {
        check_node(index, node, &mut diagnostics);

        if let Some(name) = non_empty_str(node, "name") {
            if !names.insert(name) {
                diagnostics.push(Diagnostic::error(
                    format!("duplicate node name '{}'", name),
                    RULE_DUPLICATE,
                ));
            }
        }
    }

    match document.get("connections") {
        None => {}
        Some(Value::Object(connections)) => {
            for (source, ports) in connections {
                check_connections(source, ports, &names, &mut diagnostics);
            }
        }
        Some(_) => diagnostics.push(Diagnostic::error(
            "'connections' must be an object",
            RULE_CONNECTIONS,
        )),
    }

    diagnostics
}

fn non_empty_str<'a>(node: &'a Value, key: &str) -> Option<&'a str> {
    node.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

fn check_node(index: usize, node: &Value, diagnostics: &mut Vec<Diagnostic>) {
    let label = match non_empty_str(node, "name") {
        Some(name) => format!("node #{} ('{}')", index, name),
        None => format!("node #{}", index),
    };

    if !node.is_object() {
        diagnostics.push(Diagnostic::error(
            format!("{} is not an object", label),
            RULE_NODE_SHAPE,
        ));
        return;
    }

    for key in ["id", "name", "type"] {
        if non_empty_str(node, key).is_none() {
            diagnostics.push(Diagnostic::error(
                format!("{} is missing a non-empty '{}'", label, key),
                RULE_NODE_SHAPE,
            ));
        }
    }

    let position_ok = node
        .get("position")
        .and_then(Value::as_array)
        .is_some_and(|p| p.len() == 2 && p.iter().all(Value::is_number));
    if !position_ok {
        diagnostics.push(Diagnostic::error(
            format!("{} must have a two-element numeric 'position'", label),
            RULE_NODE_SHAPE,
        ));
    }

    if !node.get("parameters").is_some_and(Value::is_object) {
        diagnostics.push(Diagnostic::error(
            format!("{} must have a 'parameters' object", label),
            RULE_NODE_SHAPE,
        ));
    }

    if !node.get("typeVersion").is_some_and(Value::is_number) {
        diagnostics.push(Diagnostic::error(
            format!("{} must have a numeric 'typeVersion'", label),
            RULE_NODE_SHAPE,
        ));
    }
}

fn check_connections(
    source: &str,
    ports: &Value,
    names: &HashSet<&str>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if !names.contains(source) {
        diagnostics.push(Diagnostic::error(
            format!("connection source '{}' does not exist", source),
            RULE_CONNECTIONS,
        ));
    }

    let Some(ports) = ports.as_object() else {
        diagnostics.push(Diagnostic::error(
            format!("connections of '{}' must be an object", source),
            RULE_CONNECTIONS,
        ));
        return;
    };

    let targets = ports
        .values()
        .filter_map(Value::as_array)
        .flatten()
        .filter_map(Value::as_array)
        .flatten();

    for target in targets {
        match target.get("node").and_then(Value::as_str) {
            Some(node) if names.contains(node) => {}
            Some(node) => diagnostics.push(Diagnostic::error(
                format!("connection target '{}' from '{}' does not exist", node, source),
                RULE_CONNECTIONS,
            )),
            None => diagnostics.push(Diagnostic::error(
                format!("connection from '{}' has a target without a node name", source),
                RULE_CONNECTIONS,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(name: &str) -> Value {
        json!({
            "id": format!("id-{}", name),
            "name": name,
            "type": "n8n-nodes-base.noOp",
            "position": [0, 0],
            "parameters": {},
            "typeVersion": 1
        })
    }

    #[test]
    fn test_valid_document() {
        let doc = json!({
            "nodes": [node("a"), node("b")],
            "connections": {
                "a": {"main": [[{"node": "b", "type": "main", "index": 0}]]}
            }
        });
        assert!(validate_graph(&doc).is_empty());
    }

    #[test]
    fn test_empty_nodes() {
        let diagnostics = validate_graph(&json!({"nodes": [], "connections": {}}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("at least one node"));
    }

    #[test]
    fn test_missing_nodes_array() {
        let diagnostics = validate_graph(&json!({"connections": {}}));
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_duplicate_names() {
        let doc = json!({"nodes": [node("a"), node("a")]});
        let diagnostics = validate_graph(&doc);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].rule_id, RULE_DUPLICATE);
    }

    #[test]
    fn test_bad_node_shape() {
        let doc = json!({
            "nodes": [{"id": "", "name": "x", "type": "t", "position": [1], "typeVersion": "1"}]
        });
        let diagnostics = validate_graph(&doc);
        // empty id, bad position, missing parameters, non-numeric typeVersion
        assert_eq!(diagnostics.len(), 4);
        assert!(diagnostics.iter().all(|d| d.is_error()));
    }

    #[test]
    fn test_connection_to_missing_node() {
        let doc = json!({
            "nodes": [node("a")],
            "connections": {
                "a": {"main": [[{"node": "ghost", "type": "main", "index": 0}]]},
                "phantom": {"main": [[{"node": "a", "type": "main", "index": 0}]]}
            }
        });
        let diagnostics = validate_graph(&doc);
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics[0].message.contains("ghost"));
        assert!(diagnostics[1].message.contains("phantom"));
    }
}
