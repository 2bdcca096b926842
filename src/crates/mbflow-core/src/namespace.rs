//! Per-execution variable namespace
//!
//! A case-sensitive key/value store shared by every node of one execution.
//! Reads are concurrent (parallel node dispatch reads snapshots); writes
//! happen only at wave boundaries, where the scheduler merges executor
//! outputs in deterministic order.

use crate::model::JsonMap;
use parking_lot::RwLock;
use serde_json::Value;

/// Shared variable store for one execution.
///
/// A node's output is addressable as `<node_id>`; when the output is a
/// mapping, its fields are reachable through dotted paths
/// (`<node_id>.<field>`).
#[derive(Debug, Default)]
pub struct VariableNamespace {
    inner: RwLock<JsonMap>,
}

impl VariableNamespace {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(JsonMap::new()),
        }
    }

    /// Set a top-level key, overwriting any previous value.
    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.inner.write().insert(key.into(), value);
    }

    /// Look up a dotted path (e.g. `user.address.city`), walking nested
    /// mappings. Returns `None` when any segment is missing. Array indexing
    /// is not supported.
    pub fn get(&self, path: &str) -> Option<Value> {
        let guard = self.inner.read();
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = guard.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current.clone())
    }

    /// Whether a dotted path resolves to a value.
    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Deep-copy snapshot of the current contents. Executors and the
    /// template renderer work against snapshots so they see a stable view
    /// for the duration of a wave.
    pub fn snapshot(&self) -> JsonMap {
        self.inner.read().clone()
    }

    /// Bulk-set every entry of `values`.
    pub fn merge(&self, values: JsonMap) {
        let mut guard = self.inner.write();
        for (key, value) in values {
            guard.insert(key, value);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_and_get() {
        let ns = VariableNamespace::new();
        ns.set("name", json!("alice"));
        assert_eq!(ns.get("name"), Some(json!("alice")));
        assert_eq!(ns.get("missing"), None);
    }

    #[test]
    fn test_set_overwrites() {
        let ns = VariableNamespace::new();
        ns.set("count", json!(1));
        ns.set("count", json!(2));
        assert_eq!(ns.get("count"), Some(json!(2)));
    }

    #[test]
    fn test_dotted_path_lookup() {
        let ns = VariableNamespace::new();
        ns.set(
            "user",
            json!({"address": {"city": "Berlin", "zip": "10115"}}),
        );
        assert_eq!(ns.get("user.address.city"), Some(json!("Berlin")));
        assert_eq!(ns.get("user.address.country"), None);
        assert_eq!(ns.get("user.name"), None);
    }

    #[test]
    fn test_dotted_path_through_non_object_fails() {
        let ns = VariableNamespace::new();
        ns.set("value", json!(42));
        assert_eq!(ns.get("value.field"), None);
    }

    #[test]
    fn test_snapshot_is_isolated() {
        let ns = VariableNamespace::new();
        ns.set("a", json!(1));
        let snapshot = ns.snapshot();

        ns.set("a", json!(2));
        ns.set("b", json!(3));

        assert_eq!(snapshot.get("a"), Some(&json!(1)));
        assert!(!snapshot.contains_key("b"));
    }

    #[test]
    fn test_merge() {
        let ns = VariableNamespace::new();
        ns.set("keep", json!("old"));

        let mut incoming = JsonMap::new();
        incoming.insert("keep".to_string(), json!("new"));
        incoming.insert("extra".to_string(), json!(true));
        ns.merge(incoming);

        assert_eq!(ns.get("keep"), Some(json!("new")));
        assert_eq!(ns.get("extra"), Some(json!(true)));
        assert_eq!(ns.len(), 2);
    }

    #[test]
    fn test_node_output_field_addressing() {
        let ns = VariableNamespace::new();
        ns.set("fetch", json!({"status": 200, "body": {"ok": true}}));
        assert_eq!(ns.get("fetch.status"), Some(json!(200)));
        assert_eq!(ns.get("fetch.body.ok"), Some(json!(true)));
    }

    #[test]
    fn test_case_sensitivity() {
        let ns = VariableNamespace::new();
        ns.set("Key", json!(1));
        assert_eq!(ns.get("key"), None);
        assert_eq!(ns.get("Key"), Some(json!(1)));
    }
}
