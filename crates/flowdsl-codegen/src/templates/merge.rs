//! Merge node parameters

use serde_json::{Map, Value, json};

use super::{NodeTemplate, str_param};

/// Maps `mode` and `options`
pub struct MergeTemplate;

impl NodeTemplate for MergeTemplate {
    fn map_parameters(&self, raw: &Map<String, Value>) -> Map<String, Value> {
        let mut out = Map::new();
        out.insert("mode".into(), json!(str_param(raw, "mode").unwrap_or("append")));
        let options = match raw.get("options") {
            Some(Value::Object(options)) => Value::Object(options.clone()),
            _ => json!({}),
        };
        out.insert("options".into(), options);
        out
    }
}
