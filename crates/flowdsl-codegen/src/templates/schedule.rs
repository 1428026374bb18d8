//! Schedule trigger parameters
//!
//! A cron expression is classified into a simple interval when it has one
//! of the common shapes; anything else is kept as a raw cron expression.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value, json};

use super::{NodeTemplate, first_str, number_value, str_param, time_unit};

/// Maps `cron`/`expression` or `interval` + magnitude
pub struct ScheduleTemplate;

static STEP: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\*/(\d+)$").expect("Invalid regex pattern"));

/// One entry of `rule.interval`
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduleRule {
    /// Every `n` units of `field`
    Interval {
        /// `seconds`, `minutes`, `hours`, `days`, `weeks` or `months`
        field: &'static str,
        /// Magnitude
        value: Value,
    },
    /// Raw cron expression
    Cron(String),
}

impl ScheduleRule {
    fn to_value(&self) -> Value {
        match self {
            ScheduleRule::Interval { field, value } => {
                let mut item = Map::new();
                item.insert("field".into(), json!(field));
                item.insert(format!("{}Interval", field), value.clone());
                Value::Object(item)
            }
            ScheduleRule::Cron(expression) => json!({
                "field": "cronExpression",
                "expression": expression,
            }),
        }
    }

    fn every(field: &'static str, n: u64) -> Self {
        ScheduleRule::Interval {
            field,
            value: json!(n),
        }
    }
}

impl NodeTemplate for ScheduleTemplate {
    fn map_parameters(&self, raw: &Map<String, Value>) -> Map<String, Value> {
        let mut item = match first_str(raw, &["cron", "expression"]) {
            Some(expression) => classify_cron(expression).to_value(),
            None => explicit_interval(raw).to_value(),
        };

        if let Value::Object(fields) = &mut item {
            for key in ["triggerAtHour", "triggerAtMinute", "triggerAtDay"] {
                if let Some(value) = number_value(raw, key) {
                    fields.insert(key.into(), value);
                }
            }
        }

        let mut out = Map::new();
        out.insert("rule".into(), json!({ "interval": [item] }));
        out
    }
}

fn explicit_interval(raw: &Map<String, Value>) -> ScheduleRule {
    let Some(field) = str_param(raw, "interval").and_then(time_unit) else {
        return ScheduleRule::every("hours", 1);
    };

    let value = number_value(raw, field)
        .or_else(|| number_value(raw, &format!("{}Interval", field)))
        .or_else(|| number_value(raw, "value"))
        .unwrap_or_else(|| json!(1));

    ScheduleRule::Interval { field, value }
}

/// Classify a five-field cron expression.
pub fn classify_cron(expression: &str) -> ScheduleRule {
    let fields: Vec<&str> = expression.split_whitespace().collect();
    let custom = || ScheduleRule::Cron(expression.trim().to_string());

    if fields.len() != 5 {
        return custom();
    }

    let rest_wild = |from: usize| fields[from..].iter().all(|f| *f == "*");

    if fields.iter().all(|f| *f == "*" || *f == "*/1") {
        return ScheduleRule::every("minutes", 1);
    }
    if fields[0] == "0" && rest_wild(1) {
        return ScheduleRule::every("hours", 1);
    }
    if fields[0] == "0" && fields[1] == "0" && rest_wild(2) {
        return ScheduleRule::every("days", 1);
    }
    if let Some(n) = step(fields[0]) {
        if rest_wild(1) {
            return ScheduleRule::every("minutes", n);
        }
    }
    if fields[0] == "0" && rest_wild(2) {
        if let Some(n) = step(fields[1]) {
            return ScheduleRule::every("hours", n);
        }
    }

    custom()
}

/// `*/N` with N above zero
fn step(field: &str) -> Option<u64> {
    STEP.captures(field)?
        .get(1)?
        .as_str()
        .parse()
        .ok()
        .filter(|n| *n > 0)
}
