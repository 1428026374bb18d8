//! HTTP request parameters

use serde_json::{Map, Value, json};

use super::{NodeTemplate, name_value_pairs, number_value, str_param};

/// Maps `method`, `url`, `headers`, `query`, `body`, `auth` and `timeout`
pub struct RequestTemplate;

const BODY_METHODS: [&str; 3] = ["POST", "PUT", "PATCH"];

impl NodeTemplate for RequestTemplate {
    fn map_parameters(&self, raw: &Map<String, Value>) -> Map<String, Value> {
        let mut out = Map::new();

        let method = str_param(raw, "method").unwrap_or("GET").to_ascii_uppercase();
        out.insert("method".into(), json!(method));
        out.insert("url".into(), json!(str_param(raw, "url").unwrap_or("")));

        map_auth(raw.get("auth"), &mut out);

        if let Some(query) = raw.get("query") {
            let pairs = name_value_pairs(query);
            if !pairs.is_empty() {
                out.insert("sendQuery".into(), json!(true));
                out.insert("queryParameters".into(), json!({ "parameters": pairs }));
            }
        }

        if let Some(headers) = raw.get("headers") {
            let pairs = name_value_pairs(headers);
            if !pairs.is_empty() {
                out.insert("sendHeaders".into(), json!(true));
                out.insert("headerParameters".into(), json!({ "parameters": pairs }));
            }
        }

        match raw.get("body") {
            Some(body) if BODY_METHODS.contains(&method.as_str()) => map_body(body, &mut out),
            Some(_) => tracing::debug!("Ignoring body on {} request", method),
            None => {}
        }

        let mut options = Map::new();
        if let Some(timeout) = number_value(raw, "timeout") {
            options.insert("timeout".into(), timeout);
        }
        out.insert("options".into(), Value::Object(options));

        out
    }
}

fn map_auth(auth: Option<&Value>, out: &mut Map<String, Value>) {
    let kind = match auth {
        Some(Value::String(kind)) => kind.as_str(),
        Some(Value::Object(map)) => map.get("type").and_then(Value::as_str).unwrap_or("none"),
        _ => return,
    };

    let generic = match kind.to_ascii_lowercase().as_str() {
        "basic" => Some("httpBasicAuth"),
        "header" => Some("httpHeaderAuth"),
        _ => None,
    };

    match generic {
        Some(auth_type) => {
            out.insert("authentication".into(), json!("genericCredentialType"));
            out.insert("genericAuthType".into(), json!(auth_type));
        }
        None => {
            out.insert("authentication".into(), json!("none"));
        }
    }
}

fn map_body(body: &Value, out: &mut Map<String, Value>) {
    out.insert("sendBody".into(), json!(true));
    match body {
        Value::Object(_) => {
            out.insert("contentType".into(), json!("json"));
            out.insert("specifyBody".into(), json!("keypair"));
            out.insert(
                "bodyParameters".into(),
                json!({ "parameters": name_value_pairs(body) }),
            );
        }
        Value::String(text) => {
            out.insert("specifyBody".into(), json!("json"));
            out.insert("jsonBody".into(), json!(text));
        }
        other => {
            out.insert("specifyBody".into(), json!("json"));
            out.insert("jsonBody".into(), json!(other.to_string()));
        }
    }
}
