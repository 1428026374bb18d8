//! Wait node parameters

use serde_json::{Map, Value, json};

use super::{NodeTemplate, number_value, str_param, time_unit};

/// Maps `amount` and `unit` to a time-interval resume
pub struct WaitTemplate;

impl NodeTemplate for WaitTemplate {
    fn map_parameters(&self, raw: &Map<String, Value>) -> Map<String, Value> {
        let mut out = Map::new();
        out.insert("resume".into(), json!("timeInterval"));
        out.insert(
            "amount".into(),
            number_value(raw, "amount").unwrap_or_else(|| json!(1)),
        );
        out.insert("unit".into(), json!(wait_unit(raw)));
        out
    }
}

/// Unknown units, weeks and months fall back to seconds
fn wait_unit(raw: &Map<String, Value>) -> &'static str {
    match str_param(raw, "unit").and_then(time_unit) {
        Some(unit @ ("seconds" | "minutes" | "hours" | "days")) => unit,
        _ => "seconds",
    }
}
