//! Webhook trigger parameters

use serde_json::{Map, Value, json};

use super::{NodeTemplate, first_str, str_param};

/// Maps `path`, `method`/`httpMethod` and `responseMode`
pub struct WebhookTemplate;

impl NodeTemplate for WebhookTemplate {
    fn map_parameters(&self, raw: &Map<String, Value>) -> Map<String, Value> {
        let path = str_param(raw, "path")
            .map(|p| p.strip_prefix('/').unwrap_or(p))
            .filter(|p| !p.is_empty())
            .unwrap_or("webhook");
        let method = first_str(raw, &["httpMethod", "method"])
            .unwrap_or("GET")
            .to_ascii_uppercase();
        let response_mode = str_param(raw, "responseMode").unwrap_or("onReceived");

        let mut out = Map::new();
        out.insert("path".into(), json!(path));
        out.insert("httpMethod".into(), json!(method));
        out.insert("responseMode".into(), json!(response_mode));
        out.insert("options".into(), json!({}));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(value: Value) -> Value {
        let raw = value.as_object().cloned().unwrap();
        Value::Object(WebhookTemplate.map_parameters(&raw))
    }

    #[test]
    fn test_defaults() {
        assert_eq!(
            map(json!({})),
            json!({"path": "webhook", "httpMethod": "GET", "responseMode": "onReceived", "options": {}})
        );
    }

    #[test]
    fn test_leading_slash_stripped() {
        let out = map(json!({"path": "/orders/new", "method": "post", "responseMode": "lastNode"}));
        assert_eq!(out["path"], "orders/new");
        assert_eq!(out["httpMethod"], "POST");
        assert_eq!(out["responseMode"], "lastNode");
    }
}
