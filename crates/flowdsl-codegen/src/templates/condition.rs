//! Conditional branch parameters
//!
//! Conditions arrive either structured (a list of `{leftValue, operator,
//! rightValue}` objects) or as free text such as `"${status} == 'paid'"`.
//! Free text splits on `||` when present, otherwise on `&&`; mixed
//! expressions are not nested. `${...}` spans are opaque to both the split
//! and the operator match.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use phf::phf_map;
use regex::Regex;
use serde_json::{Map, Value, json};

use super::{NodeTemplate, str_param};

/// Maps `conditions`/`condition`, `combinator` and `caseSensitive`
pub struct ConditionTemplate;

/// Canonical operation names keyed by lowercased synonym
static OPERATORS: phf::Map<&'static str, &'static str> = phf_map! {
    "==" => "equals",
    "=" => "equals",
    "eq" => "equals",
    "equal" => "equals",
    "equals" => "equals",
    "!=" => "notEquals",
    "<>" => "notEquals",
    "ne" => "notEquals",
    "notequal" => "notEquals",
    "notequals" => "notEquals",
    ">" => "gt",
    "gt" => "gt",
    "larger" => "gt",
    "<" => "lt",
    "lt" => "lt",
    "smaller" => "lt",
    ">=" => "gte",
    "gte" => "gte",
    "largerequal" => "gte",
    "<=" => "lte",
    "lte" => "lte",
    "smallerequal" => "lte",
    "contains" => "contains",
    "startswith" => "startsWith",
    "starts_with" => "startsWith",
    "endswith" => "endsWith",
    "ends_with" => "endsWith",
    "regex" => "regex",
    "matches" => "regex",
};

const STRING_OPERATIONS: [&str; 4] = ["contains", "startsWith", "endsWith", "regex"];

static COMPARISON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?is)^\s*(.+?)(?:\s*(>=|<=|==|!=|<>|>|<|=)\s*|\s+(contains|starts_?with|ends_?with|matches|regex)\s+)(.+?)\s*$",
    )
    .expect("Invalid regex pattern")
});

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x01(\d+)\x01").expect("Invalid regex pattern"));

static NUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?\d+(\.\d+)?$").expect("Invalid regex pattern"));

/// Canonical operation for an operator name; unknown names mean `equals`
pub fn normalize_operator(name: &str) -> &'static str {
    OPERATORS
        .get(name.trim().to_ascii_lowercase().as_str())
        .copied()
        .unwrap_or("equals")
}

impl NodeTemplate for ConditionTemplate {
    fn map_parameters(&self, raw: &Map<String, Value>) -> Map<String, Value> {
        let case_sensitive = raw
            .get("caseSensitive")
            .and_then(Value::as_bool)
            .unwrap_or(true);

        let (conditions, combinator) = collect_conditions(raw);

        let mut out = Map::new();
        out.insert(
            "conditions".into(),
            json!({
                "options": {
                    "caseSensitive": case_sensitive,
                    "leftValue": "",
                    "typeValidation": "strict",
                },
                "conditions": conditions,
                "combinator": combinator,
            }),
        );
        out.insert("options".into(), json!({}));
        out
    }
}

fn collect_conditions(raw: &Map<String, Value>) -> (Vec<Value>, String) {
    let explicit = str_param(raw, "combinator").map(normalize_combinator);

    match raw.get("conditions").or_else(|| raw.get("condition")) {
        Some(Value::String(text)) => {
            let (conditions, combinator) = parse_condition_text(text);
            (conditions, explicit.unwrap_or(combinator).to_string())
        }
        Some(Value::Array(items)) => (
            items.iter().map(structured_condition).collect(),
            explicit.unwrap_or("and").to_string(),
        ),
        Some(Value::Object(inner)) if inner.contains_key("conditions") => collect_conditions(inner),
        Some(Value::Object(single)) => (
            vec![structured_condition(&Value::Object(single.clone()))],
            explicit.unwrap_or("and").to_string(),
        ),
        _ if raw.contains_key("leftValue") => (
            vec![structured_condition(&Value::Object(raw.clone()))],
            explicit.unwrap_or("and").to_string(),
        ),
        _ => (Vec::new(), explicit.unwrap_or("and").to_string()),
    }
}

fn normalize_combinator(text: &str) -> &'static str {
    match text.trim().to_ascii_lowercase().as_str() {
        "or" | "||" | "any" => "or",
        _ => "and",
    }
}

/// Free text with every `${...}` span swapped for an indexed placeholder
struct Masked {
    text: String,
    spans: Vec<String>,
}

impl Masked {
    fn new(text: &str) -> Self {
        let mut masked = String::with_capacity(text.len());
        let mut spans = Vec::new();
        let mut rest = text;

        while let Some(start) = rest.find("${") {
            let Some(len) = span_len(&rest[start..]) else {
                break;
            };
            masked.push_str(&rest[..start]);
            masked.push_str(&format!("\x01{}\x01", spans.len()));
            spans.push(rest[start..start + len].to_string());
            rest = &rest[start + len..];
        }
        masked.push_str(rest);

        Self {
            text: masked,
            spans,
        }
    }

    fn restore(&self, part: &str) -> String {
        PLACEHOLDER
            .replace_all(part, |caps: &regex::Captures<'_>| {
                caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| self.spans.get(i))
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

/// Byte length of the `${...}` span at the start of `text`, nested braces included
fn span_len(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in text.char_indices().skip(1) {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split free-text conditions into clauses and a combinator.
pub fn parse_condition_text(text: &str) -> (Vec<Value>, &'static str) {
    let masked = Masked::new(text);
    let (separator, combinator) = if masked.text.contains("||") {
        ("||", "or")
    } else {
        ("&&", "and")
    };

    let conditions = masked
        .text
        .split(separator)
        .map(str::trim)
        .filter(|clause| !clause.is_empty())
        .map(|clause| masked_comparison(clause, &masked))
        .collect();

    (conditions, combinator)
}

/// Parse one `left op right` clause.
///
/// Text that does not look like a comparison becomes an always-true
/// boolean condition.
pub fn parse_comparison(text: &str) -> Value {
    let masked = Masked::new(text);
    masked_comparison(&masked.text, &masked)
}

fn masked_comparison(clause: &str, masked: &Masked) -> Value {
    let Some(caps) = COMPARISON.captures(clause) else {
        let text = masked.restore(clause);
        tracing::debug!("Condition '{}' is not a comparison, treating as true", text);
        return always_true(text.trim());
    };

    let left = masked.restore(caps.get(1).map_or("", |m| m.as_str()));
    let operator = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
    let right = masked.restore(caps.get(4).map_or("", |m| m.as_str()));

    let (right_value, right_type) = infer_operand(&right);
    build_condition(json!(left), normalize_operator(operator), right_value, right_type)
}

fn structured_condition(item: &Value) -> Value {
    let Value::Object(map) = item else {
        return match item {
            Value::String(text) => parse_comparison(text),
            _ => always_true(""),
        };
    };

    let left = map.get("leftValue").cloned().unwrap_or_else(|| json!(""));
    let right = map.get("rightValue").cloned().unwrap_or_else(|| json!(""));

    let (operation, declared_type) = match map.get("operator") {
        Some(Value::String(op)) => (normalize_operator(op), None),
        Some(Value::Object(op)) => (
            op.get("operation")
                .and_then(Value::as_str)
                .map_or("equals", normalize_operator),
            op.get("type").and_then(Value::as_str).map(str::to_string),
        ),
        _ => (
            map.get("operation")
                .and_then(Value::as_str)
                .map_or("equals", normalize_operator),
            None,
        ),
    };

    let (right, inferred) = match right {
        Value::String(text) => infer_operand(&text),
        other => {
            let ty = operand_type(&other);
            (other, ty)
        }
    };

    let mut condition = build_condition(left, operation, right, inferred);
    if let Some(ty) = declared_type {
        condition["operator"]["type"] = json!(ty);
    }
    condition
}

fn build_condition(left: Value, operation: &str, right: Value, right_type: &str) -> Value {
    let ty = if STRING_OPERATIONS.contains(&operation) {
        "string"
    } else {
        right_type
    };

    json!({
        "id": uuid::Uuid::new_v4().to_string(),
        "leftValue": left,
        "rightValue": right,
        "operator": {
            "type": ty,
            "operation": operation,
        },
    })
}

fn always_true(left: &str) -> Value {
    json!({
        "id": uuid::Uuid::new_v4().to_string(),
        "leftValue": left,
        "rightValue": "",
        "operator": {
            "type": "boolean",
            "operation": "true",
            "singleValue": true,
        },
    })
}

fn operand_type(value: &Value) -> &'static str {
    match value {
        Value::Number(_) => "number",
        Value::Bool(_) => "boolean",
        _ => "string",
    }
}

/// Infer the JSON value and operator type of a right-hand operand
pub fn infer_operand(text: &str) -> (Value, &'static str) {
    let text = text.trim();

    if let Some(inner) = unquote(text) {
        return (json!(inner), "string");
    }

    if NUMERIC.is_match(text) {
        let number = text
            .parse::<i64>()
            .map(Value::from)
            .ok()
            .or_else(|| text.parse::<f64>().ok().map(Value::from));
        if let Some(number) = number {
            return (number, "number");
        }
    }

    if text.eq_ignore_ascii_case("true") {
        return (json!(true), "boolean");
    }
    if text.eq_ignore_ascii_case("false") {
        return (json!(false), "boolean");
    }

    if is_date(text) {
        return (json!(text), "dateTime");
    }

    (json!(text), "string")
}

fn unquote(text: &str) -> Option<&str> {
    ['"', '\''].into_iter().find_map(|quote| {
        text.strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
    })
}

fn is_date(text: &str) -> bool {
    DateTime::parse_from_rfc3339(text).is_ok()
        || NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").is_ok()
        || NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S").is_ok()
        || NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok()
}
