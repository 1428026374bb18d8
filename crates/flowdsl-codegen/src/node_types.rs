//! DSL type tag → target node type mapping

use phf::phf_map;

/// Manual trigger
pub const MANUAL_TRIGGER: &str = "n8n-nodes-base.manualTrigger";
/// Schedule trigger
pub const SCHEDULE_TRIGGER: &str = "n8n-nodes-base.scheduleTrigger";
/// Webhook trigger
pub const WEBHOOK: &str = "n8n-nodes-base.webhook";
/// HTTP request
pub const HTTP_REQUEST: &str = "n8n-nodes-base.httpRequest";
/// Conditional branch
pub const IF: &str = "n8n-nodes-base.if";
/// Code execution
pub const CODE: &str = "n8n-nodes-base.code";
/// Field assignment
pub const SET: &str = "n8n-nodes-base.set";
/// Stream merge
pub const MERGE: &str = "n8n-nodes-base.merge";
/// Delay
pub const WAIT: &str = "n8n-nodes-base.wait";
/// No operation
pub const NO_OP: &str = "n8n-nodes-base.noOp";

/// Target type and schema version for a DSL tag
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeTypeInfo {
    /// Target node type identifier
    pub target_type: &'static str,
    /// Schema version emitted as `typeVersion`
    pub type_version: f64,
}

const fn info(target_type: &'static str, type_version: f64) -> NodeTypeInfo {
    NodeTypeInfo {
        target_type,
        type_version,
    }
}

static NODE_TYPES: phf::Map<&'static str, NodeTypeInfo> = phf_map! {
    "manual.trigger" => info(MANUAL_TRIGGER, 1.0),
    "trigger.manual" => info(MANUAL_TRIGGER, 1.0),
    "schedule.trigger" => info(SCHEDULE_TRIGGER, 1.1),
    "trigger.schedule" => info(SCHEDULE_TRIGGER, 1.1),
    "cron" => info(SCHEDULE_TRIGGER, 1.1),
    "webhook" => info(WEBHOOK, 1.1),
    "trigger.webhook" => info(WEBHOOK, 1.1),
    "http.request" => info(HTTP_REQUEST, 4.1),
    "http" => info(HTTP_REQUEST, 4.1),
    "if" => info(IF, 2.0),
    "condition" => info(IF, 2.0),
    "logic.if" => info(IF, 2.0),
    "code" => info(CODE, 2.0),
    "transform.code" => info(CODE, 2.0),
    "function" => info(CODE, 2.0),
    "set" => info(SET, 3.3),
    "transform.set" => info(SET, 3.3),
    "merge" => info(MERGE, 2.1),
    "logic.merge" => info(MERGE, 2.1),
    "wait" => info(WAIT, 1.1),
    "delay" => info(WAIT, 1.1),
    "noop" => info(NO_OP, 1.0),
    "no.op" => info(NO_OP, 1.0),
};

/// Look up a DSL type tag
pub fn lookup(tag: &str) -> Option<&'static NodeTypeInfo> {
    NODE_TYPES.get(tag)
}

/// All known DSL tags, sorted
pub fn tags() -> Vec<&'static str> {
    let mut tags: Vec<&'static str> = NODE_TYPES.keys().copied().collect();
    tags.sort_unstable();
    tags
}
