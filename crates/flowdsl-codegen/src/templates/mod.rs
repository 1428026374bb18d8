//! Per-node-type parameter reshaping
//!
//! Each target node type has a [`NodeTemplate`] that turns the evaluated
//! DSL parameters of a node into the parameter shape the target expects.
//! Templates never fail: missing keys take defaults and unknown keys are
//! ignored.

pub mod code;
pub mod condition;
pub mod merge;
pub mod request;
pub mod schedule;
pub mod set;
pub mod wait;
pub mod webhook;

use serde_json::{Map, Value};

use crate::node_types;

pub use code::CodeTemplate;
pub use condition::ConditionTemplate;
pub use merge::MergeTemplate;
pub use request::RequestTemplate;
pub use schedule::ScheduleTemplate;
pub use set::SetTemplate;
pub use wait::WaitTemplate;
pub use webhook::WebhookTemplate;

/// Reshapes evaluated parameters for one target node type
pub trait NodeTemplate: Send + Sync {
    /// Produce target parameters from DSL parameters
    fn map_parameters(&self, raw: &Map<String, Value>) -> Map<String, Value>;
}

/// Template for node types that take no parameters
pub struct EmptyTemplate;

impl NodeTemplate for EmptyTemplate {
    fn map_parameters(&self, _raw: &Map<String, Value>) -> Map<String, Value> {
        Map::new()
    }
}

/// Copies parameters unchanged; used for target types without a template
pub struct PassthroughTemplate;

impl NodeTemplate for PassthroughTemplate {
    fn map_parameters(&self, raw: &Map<String, Value>) -> Map<String, Value> {
        raw.clone()
    }
}

/// Select the template for a target node type
pub fn template_for(target_type: &str) -> &'static dyn NodeTemplate {
    match target_type {
        node_types::HTTP_REQUEST => &RequestTemplate,
        node_types::IF => &ConditionTemplate,
        node_types::SCHEDULE_TRIGGER => &ScheduleTemplate,
        node_types::CODE => &CodeTemplate,
        node_types::SET => &SetTemplate,
        node_types::WEBHOOK => &WebhookTemplate,
        node_types::MERGE => &MergeTemplate,
        node_types::WAIT => &WaitTemplate,
        node_types::MANUAL_TRIGGER | node_types::NO_OP => &EmptyTemplate,
        _ => &PassthroughTemplate,
    }
}

/// String value of `key`, if it holds a string
pub(crate) fn str_param<'a>(raw: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    raw.get(key).and_then(Value::as_str)
}

/// First of `keys` that holds a string
pub(crate) fn first_str<'a>(raw: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|key| str_param(raw, key))
}

/// Numeric value of `key` as JSON, keeping integers integral
pub(crate) fn number_value(raw: &Map<String, Value>, key: &str) -> Option<Value> {
    match raw.get(key)? {
        Value::Number(n) => Some(Value::Number(n.clone())),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .map(Value::from)
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(Value::from))
        }
        _ => None,
    }
}

/// Plural time-unit field for a unit name such as `Minute` or `hours`
pub(crate) fn time_unit(unit: &str) -> Option<&'static str> {
    let unit = unit.trim().to_ascii_lowercase();
    let field = match unit.trim_end_matches('s') {
        "second" => "seconds",
        "minute" => "minutes",
        "hour" => "hours",
        "day" => "days",
        "week" => "weeks",
        "month" => "months",
        _ => return None,
    };
    Some(field)
}

/// Text form of a scalar for `{name, value}` pairs
pub(crate) fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// `{k: v}` or `[{name, value}]` → `[{name, value}]`
pub(crate) fn name_value_pairs(value: &Value) -> Vec<Value> {
    match value {
        Value::Object(map) => map
            .iter()
            .map(|(name, value)| pair(name, text_of(value)))
            .collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| {
                let name = item.get("name")?.as_str()?;
                Some(pair(name, item.get("value").map(text_of).unwrap_or_default()))
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn pair(name: &str, value: String) -> Value {
    let mut map = Map::new();
    map.insert("name".to_string(), Value::String(name.to_string()));
    map.insert("value".to_string(), Value::String(value));
    Value::Object(map)
}

/// Type name for a JSON value as the target platform spells it
pub(crate) fn value_type(value: &Value) -> &'static str {
    match value {
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
        Value::String(_) | Value::Null => "string",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_empty_template_drops_everything() {
        let raw = params(json!({"note": "ignored"}));
        assert!(template_for(node_types::MANUAL_TRIGGER).map_parameters(&raw).is_empty());
        assert!(template_for(node_types::NO_OP).map_parameters(&raw).is_empty());
    }

    #[test]
    fn test_unknown_target_passes_through() {
        let raw = params(json!({"channel": "#ops"}));
        assert_eq!(template_for("custom.slack").map_parameters(&raw), raw);
    }

    #[test]
    fn test_name_value_pairs() {
        let from_object = name_value_pairs(&json!({"Accept": "application/json", "X-Retry": 3}));
        assert_eq!(
            Value::Array(from_object),
            json!([
                {"name": "Accept", "value": "application/json"},
                {"name": "X-Retry", "value": "3"}
            ])
        );

        let from_list = name_value_pairs(&json!([{"name": "page", "value": 2}, {"bad": true}]));
        assert_eq!(Value::Array(from_list), json!([{"name": "page", "value": "2"}]));
        assert!(name_value_pairs(&json!("nope")).is_empty());
    }
}
