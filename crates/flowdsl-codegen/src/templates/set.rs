//! Set node parameters

use serde_json::{Map, Value, json};

use super::{NodeTemplate, value_type};

/// Maps `fields`/`values`/`assignments`, or every other key, to assignments
pub struct SetTemplate;

const CONTROL_KEYS: [&str; 2] = ["includeOtherFields", "keepOnlySet"];

impl NodeTemplate for SetTemplate {
    fn map_parameters(&self, raw: &Map<String, Value>) -> Map<String, Value> {
        let source = ["fields", "values", "assignments"]
            .iter()
            .find_map(|key| raw.get(*key).and_then(Value::as_object));

        let assignments: Vec<Value> = match source {
            Some(fields) => fields.iter().map(|(k, v)| assignment(k, v)).collect(),
            None => raw
                .iter()
                .filter(|(k, _)| !CONTROL_KEYS.contains(&k.as_str()))
                .map(|(k, v)| assignment(k, v))
                .collect(),
        };

        let include_other = match (raw.get("includeOtherFields"), raw.get("keepOnlySet")) {
            (Some(Value::Bool(include)), _) => *include,
            (None, Some(Value::Bool(keep_only))) => !keep_only,
            _ => false,
        };

        let mut out = Map::new();
        out.insert("mode".into(), json!("manual"));
        out.insert(
            "assignments".into(),
            json!({ "assignments": assignments }),
        );
        out.insert("includeOtherFields".into(), json!(include_other));
        out.insert("options".into(), json!({}));
        out
    }
}

fn assignment(name: &str, value: &Value) -> Value {
    json!({
        "id": uuid::Uuid::new_v4().to_string(),
        "name": name,
        "value": value,
        "type": value_type(value),
    })
}
