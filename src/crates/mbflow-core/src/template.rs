//! Template rendering over the variable namespace
//!
//! Node configurations may embed `{{ expr }}` tokens anywhere in their
//! string values. Rendering recurses through mappings and lists, evaluates
//! each token against a namespace snapshot, and substitutes the result.
//! A string that consists of exactly one token passes the evaluated value
//! through structurally (a mapping stays a mapping); tokens embedded in
//! surrounding text stringify, with structured values serialised as JSON.
//! Missing variables render as the empty string.

use crate::expression::ExpressionEvaluator;
use crate::model::JsonMap;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use tracing::debug;

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{\s*([^{}]+?)\s*\}\}").expect("valid token regex"))
}

fn whole_token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\{\{\s*([^{}]+?)\s*\}\}$").expect("valid token regex"))
}

/// Render a value against a namespace snapshot, recursing through
/// mappings and lists.
pub fn render_value(value: &Value, vars: &JsonMap, evaluator: &ExpressionEvaluator) -> Value {
    match value {
        Value::String(s) => render_string(s, vars, evaluator),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| render_value(item, vars, evaluator))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| (key.clone(), render_value(item, vars, evaluator)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Render a node configuration mapping. Every value is rendered; keys are
/// left untouched.
pub fn render_config(config: &JsonMap, vars: &JsonMap, evaluator: &ExpressionEvaluator) -> JsonMap {
    config
        .iter()
        .map(|(key, value)| (key.clone(), render_value(value, vars, evaluator)))
        .collect()
}

fn render_string(template: &str, vars: &JsonMap, evaluator: &ExpressionEvaluator) -> Value {
    if !template.contains("{{") {
        return Value::String(template.to_string());
    }

    // A template that is exactly one token keeps the value's structure.
    if let Some(caps) = whole_token_regex().captures(template) {
        let expr = caps.get(1).expect("token capture").as_str();
        return match evaluator.eval_value(expr, vars) {
            Ok(Some(value)) => value,
            Ok(None) => Value::String(String::new()),
            Err(e) => {
                debug!(expr, error = %e, "template token failed to evaluate");
                Value::String(String::new())
            }
        };
    }

    let rendered = token_regex().replace_all(template, |caps: &regex::Captures<'_>| {
        let expr = caps.get(1).expect("token capture").as_str();
        match evaluator.eval_value(expr, vars) {
            Ok(Some(value)) => stringify(&value),
            Ok(None) => String::new(),
            Err(e) => {
                debug!(expr, error = %e, "template token failed to evaluate");
                String::new()
            }
        }
    });

    Value::String(rendered.into_owned())
}

/// Stringify an evaluated token for embedding in surrounding text.
/// Structured values serialise as compact JSON.
fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
