//! Expression evaluation for edge conditions and templates
//!
//! Expressions are minijinja expressions evaluated against a namespace
//! snapshot: comparison, and/or/not, `in` membership, equality, and dotted
//! member access all come from the engine. Missing variables never raise:
//! a condition over a not-yet-populated variable evaluates to `false`, so
//! the gated branch is simply not taken.
//!
//! Two caches keep evaluation cheap: a process-global compile cache
//! (expression string → compiled program, bounded by the number of
//! distinct expressions the process ever sees) and a per-execution result
//! cache (expression + variable values → boolean) that is dropped when the
//! execution ends.

use crate::model::JsonMap;
use minijinja::{Environment, Expression, UndefinedBehavior};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::OnceLock;
use thiserror::Error;

/// Expression failure kinds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    /// The expression string did not parse.
    #[error("expression failed to compile: {0}")]
    Compile(String),

    /// The expression evaluated to something other than a boolean.
    #[error("expression produced a non-boolean result: {0}")]
    NonBoolean(String),

    /// Evaluation failed for a reason other than a missing variable.
    #[error("expression evaluation failed: {0}")]
    Eval(String),
}

type CompiledExpr = Expression<'static, 'static>;

fn global_env() -> &'static Environment<'static> {
    static ENV: OnceLock<Environment<'static>> = OnceLock::new();
    ENV.get_or_init(|| {
        let mut env = Environment::new();
        // Strict mode turns every use of a missing variable into an
        // UndefinedError, which the evaluator maps to `false`/empty.
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env
    })
}

fn compile_cache() -> &'static RwLock<HashMap<String, Result<&'static CompiledExpr, String>>> {
    static CACHE: OnceLock<RwLock<HashMap<String, Result<&'static CompiledExpr, String>>>> =
        OnceLock::new();
    CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Compile an expression through the process-global cache.
///
/// Sources are interned for the lifetime of the process; the cache (and
/// therefore the interned memory) is bounded by the number of distinct
/// expression strings encountered. Compile failures are cached too so a
/// bad expression does not re-intern its source on every evaluation.
fn compiled(expr: &str) -> Result<&'static CompiledExpr, ExpressionError> {
    if let Some(entry) = compile_cache().read().get(expr) {
        return entry.clone().map_err(ExpressionError::Compile);
    }

    let mut cache = compile_cache().write();
    if let Some(entry) = cache.get(expr) {
        return entry.clone().map_err(ExpressionError::Compile);
    }

    let source: &'static str = Box::leak(expr.to_string().into_boxed_str());
    let entry = match global_env().compile_expression(source) {
        Ok(program) => Ok(&*Box::leak(Box::new(program))),
        Err(e) => Err(e.to_string()),
    };
    cache.insert(expr.to_string(), entry.clone());
    entry.map_err(ExpressionError::Compile)
}

/// Compile-check an expression without evaluating it. Used at workflow
/// load time so malformed conditions are rejected before a run starts.
pub fn compile_check(expr: &str) -> Result<(), ExpressionError> {
    compiled(expr).map(|_| ())
}

/// Recursively trim surrounding whitespace off string values, reducing
/// spurious comparison mismatches from padded upstream data.
fn trim_strings(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(s.trim().to_string()),
        Value::Array(items) => Value::Array(items.iter().map(trim_strings).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), trim_strings(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Per-execution expression evaluator.
///
/// Shares the process-global compile cache; owns the execution-scoped
/// result cache, which dies with the evaluator.
#[derive(Debug, Default)]
pub struct ExpressionEvaluator {
    results: Mutex<HashMap<String, bool>>,
}

impl ExpressionEvaluator {
    pub fn new() -> Self {
        Self {
            results: Mutex::new(HashMap::new()),
        }
    }

    /// Evaluate a boolean expression against a namespace snapshot.
    ///
    /// Missing variables evaluate to `false`. String values are trimmed of
    /// surrounding whitespace before comparison.
    pub fn eval_bool(&self, expr: &str, vars: &JsonMap) -> Result<bool, ExpressionError> {
        let key = result_key(expr, vars);
        if let Some(hit) = self.results.lock().get(&key) {
            return Ok(*hit);
        }

        let program = compiled(expr)?;
        let trimmed = trim_strings(&Value::Object(vars.clone()));
        let ctx = minijinja::value::Value::from_serialize(&trimmed);

        let result = match program.eval(ctx) {
            Ok(value) => {
                if value.is_undefined() {
                    false
                } else if value.kind() == minijinja::value::ValueKind::Bool {
                    value.is_true()
                } else {
                    return Err(ExpressionError::NonBoolean(format!(
                        "'{}' produced {:?}",
                        expr,
                        value.kind()
                    )));
                }
            }
            Err(e) if e.kind() == minijinja::ErrorKind::UndefinedError => false,
            Err(e) => return Err(ExpressionError::Eval(format!("'{}': {}", expr, e))),
        };

        self.results.lock().insert(key, result);
        Ok(result)
    }

    /// Evaluate an expression for its value, as the template renderer does.
    ///
    /// Returns `Ok(None)` when the expression resolves to nothing (missing
    /// variable); values pass through as JSON.
    pub fn eval_value(&self, expr: &str, vars: &JsonMap) -> Result<Option<Value>, ExpressionError> {
        let program = compiled(expr)?;
        let ctx = minijinja::value::Value::from_serialize(vars);

        match program.eval(ctx) {
            Ok(value) => {
                if value.is_undefined() || value.is_none() {
                    return Ok(None);
                }
                let json = serde_json::to_value(&value)
                    .map_err(|e| ExpressionError::Eval(format!("'{}': {}", expr, e)))?;
                Ok(Some(json))
            }
            Err(e) if e.kind() == minijinja::ErrorKind::UndefinedError => Ok(None),
            Err(e) => Err(ExpressionError::Eval(format!("'{}': {}", expr, e))),
        }
    }

    /// Drop every cached result. Called when the owning execution ends.
    pub fn clear_results(&self) {
        self.results.lock().clear();
    }

    /// Number of cached results (test/diagnostic aid).
    pub fn cached_results(&self) -> usize {
        self.results.lock().len()
    }
}

fn result_key(expr: &str, vars: &JsonMap) -> String {
    // serde_json maps serialize with sorted keys, so equal snapshots
    // produce equal keys regardless of insertion order.
    let vars_json = serde_json::to_string(vars).unwrap_or_default();
    format!("{}\u{1f}{}", expr, vars_json)
}
