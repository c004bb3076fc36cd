//! Structural validation of user configuration.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::diagnostics::{Diagnostic, Diagnostics};

use super::{ResourceSchema, Schema, Validator, ValueType};

impl ResourceSchema {
    /// Check `config` against the catalog.
    ///
    /// Reports unknown keys, missing required keys, computed-only keys set by
    /// the user, type mismatches, duplicate set members and validator
    /// failures. Every problem becomes one error diagnostic naming the
    /// attribute path.
    pub fn validate(&self, config: &Map<String, Value>) -> Diagnostics {
        let mut diags = Diagnostics::new();
        validate_block(&self.fields, config, "", &mut diags);
        diags
    }
}

fn attribute_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn invalid(diags: &mut Diagnostics, path: &str, detail: String) {
    diags.push(Diagnostic::error("Invalid attribute value", detail).with_attribute(path));
}

fn validate_block(
    fields: &BTreeMap<&'static str, Schema>,
    config: &Map<String, Value>,
    prefix: &str,
    diags: &mut Diagnostics,
) {
    for key in config.keys() {
        if !fields.contains_key(key.as_str()) {
            let path = attribute_path(prefix, key);
            diags.push(
                Diagnostic::error(
                    "Unsupported argument",
                    format!("An argument named \"{path}\" is not expected here."),
                )
                .with_attribute(path),
            );
        }
    }

    for (&key, schema) in fields {
        let path = attribute_path(prefix, key);
        let value = config.get(key).filter(|v| !v.is_null());
        match value {
            None if schema.required => diags.push(
                Diagnostic::error(
                    "Missing required argument",
                    format!("The argument \"{path}\" is required, but no definition was found."),
                )
                .with_attribute(path),
            ),
            None => {}
            Some(_) if schema.is_computed_only() => diags.push(
                Diagnostic::error(
                    "Value for unconfigurable attribute",
                    format!(
                        "Can't configure a value for \"{path}\": its value is decided by the provider."
                    ),
                )
                .with_attribute(path),
            ),
            Some(v) => validate_value(schema, v, &path, diags),
        }
    }
}

fn validate_value(schema: &Schema, value: &Value, path: &str, diags: &mut Diagnostics) {
    match &schema.value_type {
        ValueType::Scalar(scalar) => {
            if scalar.accepts(value) {
                run_validators(schema, &schema.normalized(value), path, diags);
            } else {
                invalid(diags, path, format!("{path}: expected {}", scalar.name()));
            }
        }
        ValueType::List(scalar) | ValueType::Set(scalar) => {
            let Some(items) = value.as_array() else {
                invalid(diags, path, format!("{path}: expected a list"));
                return;
            };
            check_max_items(schema, items.len(), path, diags);
            if matches!(schema.value_type, ValueType::Set(_)) {
                let mut seen = Vec::with_capacity(items.len());
                for item in items {
                    let item = schema.normalized(&Value::Array(vec![item.clone()]));
                    if seen.contains(&item) {
                        invalid(diags, path, format!("{path}: duplicate set element {}", element(&item)));
                    } else {
                        seen.push(item);
                    }
                }
            }
            for (i, item) in items.iter().enumerate() {
                let item_path = format!("{path}.{i}");
                if scalar.accepts(item) {
                    run_validators(schema, item, &item_path, diags);
                } else {
                    invalid(diags, &item_path, format!("{item_path}: expected {}", scalar.name()));
                }
            }
        }
        ValueType::Nested(block) => {
            let Some(items) = value.as_array() else {
                invalid(diags, path, format!("{path}: expected a list of blocks"));
                return;
            };
            check_max_items(schema, items.len(), path, diags);
            for (i, item) in items.iter().enumerate() {
                let item_path = format!("{path}.{i}");
                match item.as_object() {
                    Some(obj) => validate_block(&block.fields, obj, &item_path, diags),
                    None => invalid(diags, &item_path, format!("{item_path}: expected a block")),
                }
            }
        }
    }
}

fn element(wrapped: &Value) -> String {
    wrapped
        .as_array()
        .and_then(|a| a.first())
        .map(ToString::to_string)
        .unwrap_or_default()
}

fn check_max_items(schema: &Schema, len: usize, path: &str, diags: &mut Diagnostics) {
    if let Some(max) = schema.max_items
        && len > max
    {
        invalid(diags, path, format!("{path}: at most {max} item(s) allowed, got {len}"));
    }
}

fn run_validators(schema: &Schema, value: &Value, path: &str, diags: &mut Diagnostics) {
    for validator in &schema.validators {
        match (validator, value) {
            (Validator::OneOf(allowed), Value::String(s)) => {
                let s = schema.normalize.map_or_else(|| s.clone(), |f| f(s));
                if !allowed.contains(&s.as_str()) {
                    invalid(
                        diags,
                        path,
                        format!("{path}: expected one of [{}], got \"{s}\"", allowed.join(", ")),
                    );
                }
            }
            (Validator::OneOfInt(allowed), v) => {
                if let Some(n) = v.as_i64()
                    && !allowed.contains(&n)
                {
                    let allowed: Vec<String> = allowed.iter().map(ToString::to_string).collect();
                    invalid(
                        diags,
                        path,
                        format!("{path}: expected one of [{}], got {n}", allowed.join(", ")),
                    );
                }
            }
            (Validator::IntRange(min, max), v) => {
                if let Some(n) = v.as_i64()
                    && (n < *min || n > *max)
                {
                    invalid(
                        diags,
                        path,
                        format!("{path}: expected to be in the range ({min} - {max}), got {n}"),
                    );
                }
            }
            (Validator::Rfc3339, Value::String(s)) => {
                if !s.is_empty() && chrono::DateTime::parse_from_rfc3339(s).is_err() {
                    invalid(diags, path, format!("{path}: \"{s}\" is not a valid RFC 3339 timestamp"));
                }
            }
            _ => {}
        }
    }
}
