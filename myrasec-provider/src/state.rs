//! Per-operation resource state wrapper.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::error::{ProviderError, ProviderResult};
use crate::schema::{ResourceSchema, suppressed, values_equal};

/// State of one resource while a handler runs.
///
/// `state` starts as the planned state (configured values normalized,
/// defaults applied, computed values carried over) and is overwritten by the
/// handler's set-back. `prior` is the state before the operation.
#[derive(Debug, Clone)]
pub struct ResourceData {
    schema: &'static ResourceSchema,
    id: String,
    configured: BTreeSet<String>,
    prior: Option<Map<String, Value>>,
    state: Map<String, Value>,
}

impl ResourceData {
    fn configured_keys(map: &Map<String, Value>) -> BTreeSet<String> {
        map.iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Fresh object about to be created.
    pub fn for_create(schema: &'static ResourceSchema, config: &Map<String, Value>) -> Self {
        Self {
            schema,
            id: String::new(),
            configured: Self::configured_keys(config),
            prior: None,
            state: schema.plan(config, None),
        }
    }

    /// Existing object whose configuration changed.
    pub fn for_update(
        schema: &'static ResourceSchema,
        id: impl Into<String>,
        prior: Map<String, Value>,
        config: &Map<String, Value>,
    ) -> Self {
        let state = schema.plan(config, Some(&prior));
        Self {
            schema,
            id: id.into(),
            configured: Self::configured_keys(config),
            prior: Some(prior),
            state,
        }
    }

    /// Existing object known only by its stored state (read, delete, import).
    pub fn from_state(
        schema: &'static ResourceSchema,
        id: impl Into<String>,
        state: Map<String, Value>,
    ) -> Self {
        Self {
            schema,
            id: id.into(),
            configured: Self::configured_keys(&state),
            prior: Some(state.clone()),
            state,
        }
    }

    pub fn schema(&self) -> &'static ResourceSchema {
        self.schema
    }

    // ==================== Id ====================

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl ToString) {
        self.id = id.to_string();
    }

    /// Forget the object: the next plan recreates it.
    pub fn clear_id(&mut self) {
        self.id.clear();
    }

    /// Id as vendor numeric id.
    pub fn id_i64(&self) -> ProviderResult<i64> {
        self.id
            .parse::<i64>()
            .map_err(|e| ProviderError::parse("id", format!("'{}': {e}", self.id)))
    }

    // ==================== Getters ====================

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.state.get(key).filter(|v| !v.is_null())
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Non-empty string value.
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.get_str(key)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    pub fn get_list(&self, key: &str) -> &[Value] {
        self.get(key)
            .and_then(Value::as_array)
            .map_or(&[][..], Vec::as_slice)
    }

    pub fn get_string_list(&self, key: &str) -> Vec<String> {
        self.get_list(key)
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()
    }

    /// Sorted, duplicate-free string collection.
    pub fn get_string_set(&self, key: &str) -> Vec<String> {
        let set: BTreeSet<String> = self.get_string_list(key).into_iter().collect();
        set.into_iter().collect()
    }

    /// Nested records of `key`.
    pub fn get_blocks(&self, key: &str) -> Vec<&Map<String, Value>> {
        self.get_list(key).iter().filter_map(Value::as_object).collect()
    }

    /// Whether the user (or the stored state, for reads) sets `key`.
    pub fn is_configured(&self, key: &str) -> bool {
        self.configured.contains(key)
    }

    /// Whether `key` differs between prior state and the current state.
    pub fn has_change(&self, key: &str) -> bool {
        let Some(prior) = &self.prior else {
            return self.get(key).is_some();
        };
        let old = prior.get(key).filter(|v| !v.is_null());
        match self.schema.get(key) {
            Some(schema) => {
                let new = self.get(key);
                !values_equal(schema, old, new) && !suppressed(schema, key, old, new, Some(prior))
            }
            None => old != self.get(key),
        }
    }

    /// Prior value of `key`.
    pub fn prior(&self, key: &str) -> Option<&Value> {
        self.prior
            .as_ref()
            .and_then(|p| p.get(key))
            .filter(|v| !v.is_null())
    }

    // ==================== Setters ====================

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.state.insert(key.to_string(), value.into());
    }

    /// `Some` sets the value, `None` removes the key.
    pub fn set_opt<V: Into<Value>>(&mut self, key: &str, value: Option<V>) {
        match value {
            Some(v) => self.set(key, v),
            None => self.remove(key),
        }
    }

    pub fn remove(&mut self, key: &str) {
        self.state.remove(key);
    }

    pub fn state(&self) -> &Map<String, Value> {
        &self.state
    }

    pub fn into_state(self) -> (String, Map<String, Value>) {
        (self.id, self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use serde_json::json;
    use std::sync::LazyLock;

    static SCHEMA: LazyLock<ResourceSchema> = LazyLock::new(|| {
        ResourceSchema::new()
            .field("name", Schema::string().required())
            .field("ttl", Schema::int().optional().default(300))
            .field("paths", Schema::string_set().optional())
            .field("created", Schema::string().computed())
    });

    fn obj(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => Map::new(),
        }
    }

    #[test]
    fn create_sees_planned_values() {
        let d = ResourceData::for_create(&SCHEMA, &obj(json!({"name": "a"})));
        assert_eq!(d.get_str("name"), Some("a"));
        assert_eq!(d.get_i64("ttl"), Some(300));
        assert!(d.is_configured("name"));
        assert!(!d.is_configured("ttl"));
        assert!(d.id().is_empty());
    }

    #[test]
    fn update_tracks_changes_against_prior() {
        let prior = obj(json!({"name": "a", "ttl": 300, "paths": ["/b", "/a"]}));
        let config = obj(json!({"name": "a", "ttl": 600, "paths": ["/a", "/b"]}));
        let d = ResourceData::for_update(&SCHEMA, "7", prior, &config);
        assert!(d.has_change("ttl"));
        assert!(!d.has_change("name"));
        assert!(!d.has_change("paths"));
        assert_eq!(d.id_i64().unwrap(), 7);
    }

    #[test]
    fn string_set_is_sorted() {
        let d = ResourceData::for_create(
            &SCHEMA,
            &obj(json!({"name": "a", "paths": ["/z", "/a", "/z"]})),
        );
        assert_eq!(d.get_string_set("paths"), vec!["/a", "/z"]);
    }

    #[test]
    fn clear_id_and_bad_id() {
        let mut d = ResourceData::from_state(&SCHEMA, "abc", obj(json!({"name": "a"})));
        assert!(d.id_i64().is_err());
        d.clear_id();
        assert_eq!(d.id(), "");
    }

    #[test]
    fn set_opt_none_removes() {
        let mut d = ResourceData::from_state(&SCHEMA, "1", obj(json!({"name": "a", "created": "x"})));
        d.set_opt::<String>("created", None);
        assert!(d.get("created").is_none());
    }
}
