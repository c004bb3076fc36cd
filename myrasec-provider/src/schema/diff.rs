//! Attribute level change detection between prior state and configuration.

use serde::Serialize;
use serde_json::{Map, Value};

use super::{ResourceSchema, Schema, ValueType, canonical_set};

/// One attribute whose planned value differs from the prior state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeChange {
    pub key: String,
    pub old: Option<Value>,
    pub new: Option<Value>,
    /// Changing this attribute recreates the object.
    pub requires_replace: bool,
}

/// Change set plus the proposed new state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diff {
    pub changes: Vec<AttributeChange>,
    pub planned: Map<String, Value>,
}

impl Diff {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn requires_replace(&self) -> bool {
        self.changes.iter().any(|c| c.requires_replace)
    }

    pub fn has_change(&self, key: &str) -> bool {
        self.changes.iter().any(|c| c.key == key)
    }

    pub fn change(&self, key: &str) -> Option<&AttributeChange> {
        self.changes.iter().find(|c| c.key == key)
    }

    /// Mark every change as forcing replacement.
    pub fn force_replace(&mut self) {
        for change in &mut self.changes {
            change.requires_replace = true;
        }
    }
}

impl ResourceSchema {
    /// Compare the prior state with the state `config` would produce.
    ///
    /// Computed-only attributes never show up as changes. Nothing is marked
    /// as replacing when there is no prior state.
    pub fn diff(&self, prior: Option<&Map<String, Value>>, config: &Map<String, Value>) -> Diff {
        let planned = self.plan(config, prior);
        let mut changes = Vec::new();
        for (&key, schema) in &self.fields {
            if schema.is_computed_only() {
                continue;
            }
            let old = prior.and_then(|p| p.get(key)).filter(|v| !v.is_null());
            let new = planned.get(key).filter(|v| !v.is_null());
            if !values_equal(schema, old, new) && !suppressed(schema, key, old, new, prior) {
                changes.push(AttributeChange {
                    key: key.to_string(),
                    old: old.cloned(),
                    new: new.cloned(),
                    requires_replace: schema.force_new && prior.is_some(),
                });
            }
        }
        Diff { changes, planned }
    }
}

/// Whether the attribute's diff suppressor accepts `new` against the prior state.
pub(crate) fn suppressed(
    schema: &Schema,
    key: &str,
    old: Option<&Value>,
    new: Option<&Value>,
    prior: Option<&Map<String, Value>>,
) -> bool {
    match (schema.diff_suppress, old, new, prior) {
        (Some(suppress), Some(old), Some(new), Some(state)) => suppress(key, old, new, state),
        _ => false,
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Semantic equality of two attribute values.
///
/// Absent, empty strings and empty lists are equal. Sets ignore order.
/// Nested records compare only the keys the new record carries, so computed
/// members such as ids never register as drift.
pub(crate) fn values_equal(schema: &Schema, old: Option<&Value>, new: Option<&Value>) -> bool {
    match (old, new) {
        (None, None) => true,
        (Some(v), None) | (None, Some(v)) => is_blank(v),
        (Some(old), Some(new)) => match &schema.value_type {
            ValueType::Nested(block) => {
                let (Some(old_items), Some(new_items)) = (old.as_array(), new.as_array()) else {
                    return old == new;
                };
                old_items.len() == new_items.len()
                    && old_items.iter().zip(new_items).all(|(o, n)| {
                        let (Some(o), Some(n)) = (o.as_object(), n.as_object()) else {
                            return o == n;
                        };
                        block.fields.iter().all(|(&k, field)| {
                            n.get(k).filter(|v| !v.is_null()).is_none_or(|nv| {
                                values_equal(field, o.get(k).filter(|v| !v.is_null()), Some(nv))
                            })
                        })
                    })
            }
            ValueType::Set(_) => {
                canonical_set(&schema.normalized(old)) == canonical_set(&schema.normalized(new))
            }
            _ => schema.normalized(old) == schema.normalized(new),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Block;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => Map::new(),
        }
    }

    fn trim_dot(s: &str) -> String {
        s.trim_end_matches('.').to_lowercase()
    }

    fn schema() -> ResourceSchema {
        ResourceSchema::new()
            .field("name", Schema::string().required().force_new().normalize(trim_dot))
            .field("ttl", Schema::int().optional())
            .field("paths", Schema::string_set().optional())
            .field("modified", Schema::string().computed())
            .field(
                "conditions",
                Schema::nested(
                    Block::new()
                        .field("id", Schema::int().computed())
                        .field("name", Schema::string().required())
                        .field("value", Schema::string().optional()),
                )
                .optional(),
            )
    }

    #[test]
    fn no_prior_state_means_every_value_is_a_change_without_replace() {
        let d = schema().diff(None, &obj(json!({"name": "a", "ttl": 300})));
        assert!(d.has_change("name"));
        assert!(d.has_change("ttl"));
        assert!(!d.requires_replace());
    }

    #[test]
    fn normalized_values_do_not_drift() {
        let prior = obj(json!({"name": "www.example.com", "ttl": 300}));
        let config = obj(json!({"name": "WWW.example.com.", "ttl": 300}));
        let d = schema().diff(Some(&prior), &config);
        assert!(d.is_empty(), "{d:?}");
    }

    #[test]
    fn set_order_is_irrelevant() {
        let prior = obj(json!({"name": "a", "paths": ["/b", "/a"]}));
        let d = schema().diff(Some(&prior), &obj(json!({"name": "a", "paths": ["/a", "/b"]})));
        assert!(d.is_empty());
    }

    #[test]
    fn force_new_change_requires_replace() {
        let prior = obj(json!({"name": "a", "ttl": 300}));
        let d = schema().diff(Some(&prior), &obj(json!({"name": "b", "ttl": 300})));
        assert!(d.requires_replace());
        assert_eq!(d.change("name").and_then(|c| c.new.clone()), Some(json!("b")));
    }

    #[test]
    fn computed_members_of_nested_records_are_ignored() {
        let prior = obj(json!({
            "name": "a",
            "modified": "2024-01-01T00:00:00Z",
            "conditions": [{"id": 7, "name": "url", "value": "/admin"}]
        }));
        let config = obj(json!({"name": "a", "conditions": [{"name": "url", "value": "/admin"}]}));
        assert!(schema().diff(Some(&prior), &config).is_empty());

        let config = obj(json!({"name": "a", "conditions": [{"name": "url", "value": "/login"}]}));
        assert!(schema().diff(Some(&prior), &config).has_change("conditions"));
    }

    #[test]
    fn removing_an_optional_value_is_a_change() {
        let prior = obj(json!({"name": "a", "ttl": 300}));
        let d = schema().diff(Some(&prior), &obj(json!({"name": "a"})));
        assert!(d.has_change("ttl"));
    }

    #[test]
    fn suppressed_change_keeps_configured_value_in_plan() {
        fn same_length(_: &str, old: &Value, new: &Value, _: &Map<String, Value>) -> bool {
            old.as_str().map(str::len) == new.as_str().map(str::len)
        }
        let schema = ResourceSchema::new().field(
            "body",
            Schema::string().optional().diff_suppress(same_length),
        );
        let prior = obj(json!({"body": "abc"}));
        let d = schema.diff(Some(&prior), &obj(json!({"body": "xyz"})));
        assert!(d.is_empty());
        assert_eq!(d.planned["body"], json!("xyz"));
    }
}
