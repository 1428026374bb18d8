//! Expression evaluation
//!
//! Turns AST [`Expression`]s into JSON values against a scope of variables
//! and parameters. Environment access and file reads go through the
//! [`EnvProvider`] and [`FileLoader`] traits so generation stays pure unless
//! the caller opts in.

use std::collections::{BTreeMap, HashMap};

use flowdsl_core::ast::{Expression, ParamConstraints, ParamType, ParameterDeclaration, VariableDeclaration};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Source of environment variables for `env(...)`
pub trait EnvProvider: Send + Sync {
    /// Look up a variable
    fn get(&self, name: &str) -> Option<String>;
}

impl EnvProvider for HashMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        HashMap::get(self, name).cloned()
    }
}

impl EnvProvider for BTreeMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        BTreeMap::get(self, name).cloned()
    }
}

/// Reads the real process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvProvider for ProcessEnv {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Loader behind the `file(path)` built-in
pub trait FileLoader: Send + Sync {
    /// Read a file's contents as text
    fn load(&self, path: &str) -> std::io::Result<String>;
}

/// Loads files from disk relative to a base directory
#[derive(Debug, Clone)]
pub struct FsFileLoader {
    base: std::path::PathBuf,
}

impl FsFileLoader {
    /// Create a loader rooted at `base`
    pub fn new(base: impl Into<std::path::PathBuf>) -> Self {
        Self { base: base.into() }
    }
}

impl FileLoader for FsFileLoader {
    fn load(&self, path: &str) -> std::io::Result<String> {
        std::fs::read_to_string(self.base.join(path))
    }
}

static ENV_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^env\(\s*["']?([^"')]*)["']?\s*\)$"#).expect("Invalid regex pattern")
});

/// A parameter after defaults and overrides are applied
#[derive(Debug, Clone, PartialEq)]
pub struct BoundParameter {
    /// Declared type
    pub param_type: ParamType,
    /// Resolved value, `Null` when required and unset
    pub value: Value,
}

/// Evaluation scope plus the collaborators built-ins need
pub struct Evaluator<'a> {
    variables: HashMap<String, Value>,
    parameters: HashMap<String, BoundParameter>,
    env: &'a dyn EnvProvider,
    files: Option<&'a dyn FileLoader>,
}

impl<'a> Evaluator<'a> {
    /// Create an empty scope
    pub fn new(env: &'a dyn EnvProvider, files: Option<&'a dyn FileLoader>) -> Self {
        Self {
            variables: HashMap::new(),
            parameters: HashMap::new(),
            env,
            files,
        }
    }

    /// Bind parameters in declaration order.
    ///
    /// An override wins over the default; string overrides are coerced to
    /// the declared type. Non-null values must inhabit the declared type and
    /// satisfy the constraints.
    pub fn bind_parameters(
        &mut self,
        declarations: &[ParameterDeclaration],
        overrides: &BTreeMap<String, Value>,
    ) -> Result<()> {
        for declaration in declarations {
            let value = match overrides.get(&declaration.name) {
                Some(value) => coerce(declaration.param_type, value.clone()),
                None => match &declaration.default_value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Null,
                },
            };

            if value.is_null() {
                if declaration.required {
                    tracing::warn!("Required parameter '{}' has no value", declaration.name);
                }
            } else {
                check_parameter(declaration, &value)?;
            }

            self.parameters.insert(
                declaration.name.clone(),
                BoundParameter {
                    param_type: declaration.param_type,
                    value,
                },
            );
        }
        Ok(())
    }

    /// Bind variables in declaration order; later ones see earlier ones.
    pub fn bind_variables(&mut self, declarations: &[VariableDeclaration]) -> Result<()> {
        for declaration in declarations {
            let value = self.evaluate(&declaration.value)?;
            self.variables.insert(declaration.name.clone(), value);
        }
        Ok(())
    }

    /// Look up a bound parameter
    pub fn parameter(&self, name: &str) -> Option<&BoundParameter> {
        self.parameters.get(name)
    }

    /// Look up a bound variable
    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Evaluate an expression
    pub fn evaluate(&self, expr: &Expression) -> Result<Value> {
        match expr {
            Expression::Literal(value) => Ok(value.clone()),
            Expression::Identifier(name) => Ok(self.resolve_identifier(name)),
            Expression::FunctionCall { name, args } => self.call(name, args),
            Expression::Template(text) => Ok(Value::String(self.expand_template(text))),
            Expression::Object(entries) => {
                let mut map = Map::new();
                for (key, value) in entries {
                    map.insert(key.clone(), self.evaluate(value)?);
                }
                Ok(Value::Object(map))
            }
            Expression::Array(items) => items
                .iter()
                .map(|item| self.evaluate(item))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
        }
    }

    /// Variables first, then parameters, else the bare name as a string.
    fn resolve_identifier(&self, name: &str) -> Value {
        if let Some(value) = self.variables.get(name) {
            return value.clone();
        }
        if let Some(param) = self.parameters.get(name) {
            return param.value.clone();
        }
        tracing::debug!("Unresolved identifier '{}' kept as a string", name);
        Value::String(name.to_string())
    }

    fn call(&self, name: &str, args: &[Expression]) -> Result<Value> {
        match name {
            "now" => Ok(Value::String(now())),
            "env" => {
                let key = self.string_arg(name, args)?;
                Ok(Value::String(self.env.get(&key).unwrap_or_default()))
            }
            "file" => {
                let path = self.string_arg(name, args)?;
                let loader = self.files.ok_or_else(|| Error::FileLoad {
                    path: path.clone(),
                    message: "no file loader configured".to_string(),
                })?;
                loader
                    .load(&path)
                    .map(Value::String)
                    .map_err(|e| Error::FileLoad {
                        path,
                        message: e.to_string(),
                    })
            }
            _ => Err(Error::UnknownFunction {
                name: name.to_string(),
            }),
        }
    }

    fn string_arg(&self, function: &str, args: &[Expression]) -> Result<String> {
        let first = args.first().ok_or_else(|| Error::InvalidParameter {
            name: function.to_string(),
            message: "expected one argument".to_string(),
        })?;
        Ok(render(&self.evaluate(first)?))
    }

    /// Expand every `${...}` span in `text`.
    ///
    /// A span resolves to a variable, a parameter with a value, `now()` or
    /// `env(NAME)`. Anything else is left verbatim.
    pub fn expand_template(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];

            let Some(len) = span_len(after) else {
                out.push_str(&rest[start..]);
                return out;
            };

            let inner = &after[..len];
            match self.resolve_span(inner.trim()) {
                Some(value) => out.push_str(&value),
                None => {
                    tracing::debug!("Unresolved template span '${{{}}}'", inner);
                    out.push_str(&rest[start..start + 2 + len + 1]);
                }
            }
            rest = &after[len + 1..];
        }

        out.push_str(rest);
        out
    }

    fn resolve_span(&self, inner: &str) -> Option<String> {
        if let Some(value) = self.variables.get(inner) {
            return Some(render(value));
        }
        if let Some(param) = self.parameters.get(inner) {
            if !param.value.is_null() {
                return Some(render(&param.value));
            }
            return None;
        }
        if inner.starts_with("now(") {
            return Some(now());
        }
        if let Some(caps) = ENV_CALL.captures(inner) {
            let key = caps.get(1).map_or("", |m| m.as_str()).trim();
            return Some(self.env.get(key).unwrap_or_default());
        }
        None
    }
}

/// Byte length of a span body up to its matching `}`
fn span_len(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '{' => depth += 1,
            '}' if depth == 0 => return Some(i),
            '}' => depth -= 1,
            _ => {}
        }
    }
    None
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Text form of a value inside a template
pub fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Coerce a string override to the declared type, best effort.
pub fn coerce(param_type: ParamType, value: Value) -> Value {
    let Value::String(text) = &value else {
        return value;
    };
    let parsed = match param_type {
        ParamType::String => return value,
        ParamType::Number => text
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .ok()
            .or_else(|| text.trim().parse::<f64>().ok().map(Value::from)),
        ParamType::Boolean => match text.trim().to_ascii_lowercase().as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        ParamType::Array | ParamType::Object => serde_json::from_str::<Value>(text)
            .ok()
            .filter(|v| param_type.accepts(v)),
    };
    parsed.unwrap_or(value)
}

fn check_parameter(declaration: &ParameterDeclaration, value: &Value) -> Result<()> {
    let invalid = |message: String| Error::InvalidParameter {
        name: declaration.name.clone(),
        message,
    };

    if !declaration.param_type.accepts(value) {
        return Err(invalid(format!(
            "expected {}, got {}",
            declaration.param_type.as_str(),
            json_type(value)
        )));
    }

    let ParamConstraints {
        min,
        max,
        pattern,
        allowed,
    } = &declaration.constraints;

    if let Some(n) = value.as_f64() {
        if let Some(min) = min {
            if n < *min {
                return Err(invalid(format!("{} is below the minimum {}", n, min)));
            }
        }
        if let Some(max) = max {
            if n > *max {
                return Err(invalid(format!("{} is above the maximum {}", n, max)));
            }
        }
    }

    if let (Some(pattern), Some(text)) = (pattern, value.as_str()) {
        let re = Regex::new(pattern)
            .map_err(|e| invalid(format!("invalid pattern '{}': {}", pattern, e)))?;
        if !re.is_match(text) {
            return Err(invalid(format!("'{}' does not match '{}'", text, pattern)));
        }
    }

    if let Some(allowed) = allowed {
        if !allowed.contains(value) {
            return Err(invalid(format!("{} is not one of the allowed values", value)));
        }
    }

    Ok(())
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowdsl_core::ast::Span;
    use rstest::rstest;
    use serde_json::json;

    struct MapLoader(HashMap<String, String>);

    impl FileLoader for MapLoader {
        fn load(&self, path: &str) -> std::io::Result<String> {
            self.0
                .get(path)
                .cloned()
                .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "missing"))
        }
    }

    fn env() -> HashMap<String, String> {
        HashMap::from([("API_TOKEN".to_string(), "secret".to_string())])
    }

    fn param(name: &str, ty: ParamType, default: Option<Expression>) -> ParameterDeclaration {
        ParameterDeclaration {
            name: name.to_string(),
            param_type: ty,
            required: default.is_none(),
            default_value: default,
            constraints: ParamConstraints::default(),
            span: Span::new(1, 1),
        }
    }

    fn var(name: &str, value: Expression) -> VariableDeclaration {
        VariableDeclaration {
            name: name.to_string(),
            value,
            span: Span::new(1, 1),
        }
    }

    #[test]
    fn test_variables_shadow_parameters() {
        let env = env();
        let mut ev = Evaluator::new(&env, None);
        ev.bind_parameters(
            &[param("limit", ParamType::Number, Some(Expression::Literal(json!(5))))],
            &BTreeMap::new(),
        )
        .unwrap();
        ev.bind_variables(&[var("limit", Expression::Literal(json!(10)))])
            .unwrap();

        assert_eq!(
            ev.evaluate(&Expression::Identifier("limit".into())).unwrap(),
            json!(10)
        );
        assert_eq!(ev.parameter("limit").unwrap().value, json!(5));
    }

    #[test]
    fn test_unresolved_identifier_is_its_name() {
        let env = env();
        let ev = Evaluator::new(&env, None);
        assert_eq!(
            ev.evaluate(&Expression::Identifier("GET".into())).unwrap(),
            json!("GET")
        );
    }

    #[rstest]
    #[case("${base}/orders", "https://api.test/orders")]
    #[case("${ base }/x", "https://api.test/x")]
    #[case("limit=${limit}", "limit=25")]
    #[case("${missing} stays", "${missing} stays")]
    #[case("token ${env(\"API_TOKEN\")}", "token secret")]
    #[case("token ${env(NOPE)}", "token ")]
    #[case("${$json.id}", "${$json.id}")]
    #[case("open ${base", "open ${base")]
    #[case("no spans", "no spans")]
    fn test_expand_template(#[case] input: &str, #[case] expected: &str) {
        let env = env();
        let mut ev = Evaluator::new(&env, None);
        ev.bind_variables(&[
            var("base", Expression::string("https://api.test")),
            var("limit", Expression::Literal(json!(25))),
        ])
        .unwrap();
        assert_eq!(ev.expand_template(input), expected);
    }

    #[test]
    fn test_expand_now_is_rfc3339() {
        let env = env();
        let ev = Evaluator::new(&env, None);
        let out = ev.expand_template("${now()}");
        assert!(chrono::DateTime::parse_from_rfc3339(&out).is_ok());
    }

    #[test]
    fn test_required_parameter_without_value_stays_verbatim() {
        let env = env();
        let mut ev = Evaluator::new(&env, None);
        ev.bind_parameters(&[param("url", ParamType::String, None)], &BTreeMap::new())
            .unwrap();
        assert_eq!(ev.expand_template("${url}"), "${url}");
        assert_eq!(
            ev.evaluate(&Expression::Identifier("url".into())).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn test_nested_structures_evaluate() {
        let env = env();
        let mut ev = Evaluator::new(&env, None);
        ev.bind_variables(&[var("host", Expression::string("example.com"))])
            .unwrap();

        let expr = Expression::Object(vec![
            ("url".to_string(), Expression::Template("https://${host}".into())),
            (
                "tags".to_string(),
                Expression::Array(vec![Expression::Identifier("host".into())]),
            ),
        ]);
        assert_eq!(
            ev.evaluate(&expr).unwrap(),
            json!({"url": "https://example.com", "tags": ["example.com"]})
        );
    }

    #[test]
    fn test_builtin_calls() {
        let env = env();
        let loader = MapLoader(HashMap::from([(
            "script.js".to_string(),
            "return items;".to_string(),
        )]));
        let ev = Evaluator::new(&env, Some(&loader));

        let call = |name: &str, arg: &str| Expression::FunctionCall {
            name: name.to_string(),
            args: vec![Expression::string(arg)],
        };

        assert_eq!(ev.evaluate(&call("env", "API_TOKEN")).unwrap(), json!("secret"));
        assert_eq!(ev.evaluate(&call("env", "UNSET")).unwrap(), json!(""));
        assert_eq!(
            ev.evaluate(&call("file", "script.js")).unwrap(),
            json!("return items;")
        );
        assert!(matches!(
            ev.evaluate(&call("file", "other.js")),
            Err(Error::FileLoad { .. })
        ));
        assert!(matches!(
            ev.evaluate(&call("upper", "x")),
            Err(Error::UnknownFunction { name }) if name == "upper"
        ));
    }

    #[test]
    fn test_file_without_loader_fails() {
        let env = env();
        let ev = Evaluator::new(&env, None);
        let expr = Expression::FunctionCall {
            name: "file".to_string(),
            args: vec![Expression::string("a.txt")],
        };
        assert!(matches!(ev.evaluate(&expr), Err(Error::FileLoad { .. })));
    }

    #[test]
    fn test_override_is_coerced_and_checked() {
        let env = env();
        let mut ev = Evaluator::new(&env, None);
        let mut declaration = param("retries", ParamType::Number, Some(Expression::Literal(json!(3))));
        declaration.constraints.max = Some(10.0);

        let overrides = BTreeMap::from([("retries".to_string(), json!("7"))]);
        ev.bind_parameters(std::slice::from_ref(&declaration), &overrides)
            .unwrap();
        assert_eq!(ev.parameter("retries").unwrap().value, json!(7));

        let overrides = BTreeMap::from([("retries".to_string(), json!("70"))]);
        let err = Evaluator::new(&env, None)
            .bind_parameters(&[declaration], &overrides)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { name, .. } if name == "retries"));
    }

    #[rstest]
    #[case(ParamType::Number, json!("abc"))]
    #[case(ParamType::Boolean, json!(1))]
    #[case(ParamType::Object, json!([1]))]
    fn test_type_mismatch_rejected(#[case] ty: ParamType, #[case] value: Value) {
        let env = env();
        let mut ev = Evaluator::new(&env, None);
        let declaration = param("p", ty, Some(Expression::Literal(value)));
        assert!(matches!(
            ev.bind_parameters(&[declaration], &BTreeMap::new()),
            Err(Error::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_pattern_and_allowed_constraints() {
        let env = env();
        let mut declaration = param("method", ParamType::String, Some(Expression::string("GET")));
        declaration.constraints.pattern = Some("^[A-Z]+$".to_string());
        declaration.constraints.allowed = Some(vec![json!("GET"), json!("POST")]);

        let mut ev = Evaluator::new(&env, None);
        ev.bind_parameters(std::slice::from_ref(&declaration), &BTreeMap::new())
            .unwrap();

        for bad in ["get", "DELETE"] {
            let overrides = BTreeMap::from([("method".to_string(), json!(bad))]);
            assert!(
                Evaluator::new(&env, None)
                    .bind_parameters(std::slice::from_ref(&declaration), &overrides)
                    .is_err()
            );
        }
    }

    #[rstest]
    #[case(ParamType::Boolean, json!("TRUE"), json!(true))]
    #[case(ParamType::Number, json!("2.5"), json!(2.5))]
    #[case(ParamType::Array, json!("[1,2]"), json!([1, 2]))]
    #[case(ParamType::String, json!("42"), json!("42"))]
    #[case(ParamType::Number, json!(4), json!(4))]
    fn test_coerce(#[case] ty: ParamType, #[case] input: Value, #[case] expected: Value) {
        assert_eq!(coerce(ty, input), expected);
    }
}
