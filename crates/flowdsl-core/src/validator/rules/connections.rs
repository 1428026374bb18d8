//! Rules: connection endpoints and node reachability

use std::collections::HashSet;

use crate::ast::WorkflowDeclaration;
use crate::diagnostics::Diagnostic;
use crate::validator::ValidationRule;

/// Both ends of every connection name a declared node.
///
/// One error per unresolved endpoint, so `connect a -> b` with neither
/// declared yields two.
pub struct DanglingConnectionRule;

impl ValidationRule for DanglingConnectionRule {
    fn id(&self) -> &'static str {
        "dangling-connection"
    }

    fn description(&self) -> &'static str {
        "Connections must reference declared nodes"
    }

    fn validate(&self, workflow: &WorkflowDeclaration) -> Vec<Diagnostic> {
        let nodes: HashSet<&str> = workflow.nodes.iter().map(|n| n.name()).collect();
        let mut diagnostics = Vec::new();

        for connection in &workflow.connections {
            for (role, endpoint) in [("source", &connection.source), ("target", &connection.target)]
            {
                if !nodes.contains(endpoint.node.as_str()) {
                    diagnostics.push(
                        Diagnostic::error(
                            format!("connection {} node '{}' is not declared", role, endpoint.node),
                            self.id(),
                        )
                        .at_span(connection.span),
                    );
                }
            }
        }

        diagnostics
    }
}

/// Warns about nodes that take part in no connection.
pub struct UnconnectedNodeRule;

impl ValidationRule for UnconnectedNodeRule {
    fn id(&self) -> &'static str {
        "unconnected-node"
    }

    fn description(&self) -> &'static str {
        "Nodes should appear in at least one connection"
    }

    fn validate(&self, workflow: &WorkflowDeclaration) -> Vec<Diagnostic> {
        let connected: HashSet<&str> = workflow
            .connections
            .iter()
            .flat_map(|c| [c.source.node.as_str(), c.target.node.as_str()])
            .collect();

        workflow
            .nodes
            .iter()
            .filter(|n| !connected.contains(n.name()))
            .map(|n| {
                Diagnostic::warning(format!("node '{}' is not connected", n.name()), self.id())
                    .at_span(n.span())
            })
            .collect()
    }
}
