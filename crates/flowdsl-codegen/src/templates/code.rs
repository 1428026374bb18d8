//! Code node parameters

use serde_json::{Map, Value, json};

use super::{NodeTemplate, first_str, str_param};

/// Maps `code`/`jsCode`/`pythonCode`, `language` and `mode`
pub struct CodeTemplate;

impl NodeTemplate for CodeTemplate {
    fn map_parameters(&self, raw: &Map<String, Value>) -> Map<String, Value> {
        let python = str_param(raw, "language")
            .map(|l| l.eq_ignore_ascii_case("python"))
            .unwrap_or(false)
            || (raw.contains_key("pythonCode") && !raw.contains_key("jsCode"));

        let mode = match str_param(raw, "mode").map(str::to_ascii_lowercase).as_deref() {
            Some("each") | Some("runonceforeachitem") => "runOnceForEachItem",
            _ => "runOnceForAllItems",
        };

        let code = if python {
            first_str(raw, &["pythonCode", "code"])
        } else {
            first_str(raw, &["jsCode", "code"])
        }
        .unwrap_or("");

        let mut out = Map::new();
        out.insert("mode".into(), json!(mode));
        if python {
            out.insert("language".into(), json!("python"));
            out.insert("pythonCode".into(), json!(code));
        } else {
            out.insert("language".into(), json!("javaScript"));
            out.insert("jsCode".into(), json!(code));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(value: Value) -> Value {
        let raw = value.as_object().cloned().unwrap();
        Value::Object(CodeTemplate.map_parameters(&raw))
    }

    #[test]
    fn test_javascript_defaults() {
        assert_eq!(
            map(json!({"code": "return items;"})),
            json!({"mode": "runOnceForAllItems", "language": "javaScript", "jsCode": "return items;"})
        );
    }

    #[test]
    fn test_python_each_item() {
        let out = map(json!({"language": "Python", "mode": "each", "code": "return _input.item"}));
        assert_eq!(out["mode"], "runOnceForEachItem");
        assert_eq!(out["language"], "python");
        assert_eq!(out["pythonCode"], "return _input.item");
        assert!(out.get("jsCode").is_none());
    }

    #[test]
    fn test_python_inferred_from_key() {
        let out = map(json!({"pythonCode": "pass"}));
        assert_eq!(out["language"], "python");
    }

    #[test]
    fn test_empty_code() {
        assert_eq!(map(json!({}))["jsCode"], "");
    }
}
