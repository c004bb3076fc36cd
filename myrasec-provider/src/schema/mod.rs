//! Declarative field catalog
//!
//! Every resource and data source declares its attributes as a
//! [`ResourceSchema`]. The catalog drives structural validation of the user
//! configuration ([`ResourceSchema::validate`]), the proposed new state
//! ([`ResourceSchema::plan`]) and the attribute level change set
//! ([`ResourceSchema::diff`]).
//!
//! Values are `serde_json::Value`: bools, integers, strings, arrays of
//! scalars and arrays of objects for nested blocks.

mod diff;
mod validate;

use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::{Map, Value};

pub use diff::{AttributeChange, Diff};
pub(crate) use diff::{suppressed, values_equal};

/// Normalizes a string value before it is compared or stored.
pub type NormalizeFn = fn(&str) -> String;

/// Decides whether a change of `key` from `old` to `new` is cosmetic.
///
/// `state` is the prior state of the whole resource.
pub type DiffSuppressFn =
    fn(key: &str, old: &Value, new: &Value, state: &Map<String, Value>) -> bool;

/// Default deadline for every operation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// ==================== Types ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    Bool,
    Int,
    String,
}

impl ScalarType {
    fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "number",
            Self::String => "string",
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Bool => value.is_boolean(),
            Self::Int => value.as_i64().is_some(),
            Self::String => value.is_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ValueType {
    Scalar(ScalarType),
    /// Ordered list of scalars.
    List(ScalarType),
    /// Unordered, duplicate-free collection of scalars.
    Set(ScalarType),
    /// List of nested records.
    Nested(Block),
}

/// Field set of a nested record.
#[derive(Debug, Clone, Default)]
pub struct Block {
    pub fields: BTreeMap<&'static str, Schema>,
}

impl Block {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn field(mut self, name: &'static str, schema: Schema) -> Self {
        self.fields.insert(name, schema);
        self
    }
}

#[derive(Debug, Clone)]
pub enum Validator {
    OneOf(&'static [&'static str]),
    OneOfInt(&'static [i64]),
    IntRange(i64, i64),
    /// RFC 3339 timestamp; the empty string means "no timestamp".
    Rfc3339,
}

// ==================== Field ====================

/// Declaration of one attribute.
#[derive(Debug, Clone)]
pub struct Schema {
    pub value_type: ValueType,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub force_new: bool,
    pub sensitive: bool,
    pub default: Option<Value>,
    pub description: &'static str,
    pub max_items: Option<usize>,
    pub validators: Vec<Validator>,
    pub normalize: Option<NormalizeFn>,
    pub diff_suppress: Option<DiffSuppressFn>,
}

impl Schema {
    fn of(value_type: ValueType) -> Self {
        Self {
            value_type,
            required: false,
            optional: false,
            computed: false,
            force_new: false,
            sensitive: false,
            default: None,
            description: "",
            max_items: None,
            validators: Vec::new(),
            normalize: None,
            diff_suppress: None,
        }
    }

    #[must_use]
    pub fn string() -> Self {
        Self::of(ValueType::Scalar(ScalarType::String))
    }

    #[must_use]
    pub fn int() -> Self {
        Self::of(ValueType::Scalar(ScalarType::Int))
    }

    #[must_use]
    pub fn bool() -> Self {
        Self::of(ValueType::Scalar(ScalarType::Bool))
    }

    #[must_use]
    pub fn string_list() -> Self {
        Self::of(ValueType::List(ScalarType::String))
    }

    #[must_use]
    pub fn string_set() -> Self {
        Self::of(ValueType::Set(ScalarType::String))
    }

    #[must_use]
    pub fn nested(block: Block) -> Self {
        Self::of(ValueType::Nested(block))
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    #[must_use]
    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    #[must_use]
    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    #[must_use]
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    #[must_use]
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    #[must_use]
    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    #[must_use]
    pub fn max_items(mut self, max: usize) -> Self {
        self.max_items = Some(max);
        self
    }

    #[must_use]
    pub fn one_of(mut self, allowed: &'static [&'static str]) -> Self {
        self.validators.push(Validator::OneOf(allowed));
        self
    }

    #[must_use]
    pub fn one_of_int(mut self, allowed: &'static [i64]) -> Self {
        self.validators.push(Validator::OneOfInt(allowed));
        self
    }

    #[must_use]
    pub fn int_range(mut self, min: i64, max: i64) -> Self {
        self.validators.push(Validator::IntRange(min, max));
        self
    }

    #[must_use]
    pub fn rfc3339(mut self) -> Self {
        self.validators.push(Validator::Rfc3339);
        self
    }

    #[must_use]
    pub fn normalize(mut self, f: NormalizeFn) -> Self {
        self.normalize = Some(f);
        self
    }

    #[must_use]
    pub fn diff_suppress(mut self, f: DiffSuppressFn) -> Self {
        self.diff_suppress = Some(f);
        self
    }

    /// Set only by the provider, never by the user.
    pub fn is_computed_only(&self) -> bool {
        self.computed && !self.required && !self.optional
    }

    /// Apply the normalizer to a value (strings and string collections).
    pub fn normalized(&self, value: &Value) -> Value {
        let normalized = match (&self.value_type, self.normalize) {
            (ValueType::Scalar(ScalarType::String), Some(f)) => match value {
                Value::String(s) => Value::String(f(s)),
                other => other.clone(),
            },
            (ValueType::List(ScalarType::String) | ValueType::Set(ScalarType::String), Some(f)) => {
                match value {
                    Value::Array(items) => Value::Array(
                        items
                            .iter()
                            .map(|v| match v {
                                Value::String(s) => Value::String(f(s)),
                                other => other.clone(),
                            })
                            .collect(),
                    ),
                    other => other.clone(),
                }
            }
            _ => value.clone(),
        };
        match &self.value_type {
            ValueType::Set(_) => canonical_set(&normalized),
            _ => normalized,
        }
    }
}

/// Sorted, duplicate-free form of a set value.
pub fn canonical_set(value: &Value) -> Value {
    match value {
        Value::Array(items) => {
            let mut items = items.clone();
            items.sort_by_key(ToString::to_string);
            items.dedup();
            Value::Array(items)
        }
        other => other.clone(),
    }
}

// ==================== Resource ====================

/// Per-operation deadlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub create: Duration,
    pub read: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            create: DEFAULT_TIMEOUT,
            read: DEFAULT_TIMEOUT,
            update: DEFAULT_TIMEOUT,
            delete: DEFAULT_TIMEOUT,
        }
    }
}

/// Attribute catalog of one resource or data source.
#[derive(Debug, Clone, Default)]
pub struct ResourceSchema {
    pub fields: BTreeMap<&'static str, Schema>,
    pub timeouts: Timeouts,
}

impl ResourceSchema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn field(mut self, name: &'static str, schema: Schema) -> Self {
        self.fields.insert(name, schema);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.fields.get(name)
    }

    /// Proposed new state for `config`.
    ///
    /// Configured values are normalized; unset fields fall back to their
    /// default and computed fields keep their prior value. Diff suppression
    /// does not touch the plan, handlers still see the configured value.
    pub fn plan(
        &self,
        config: &Map<String, Value>,
        prior: Option<&Map<String, Value>>,
    ) -> Map<String, Value> {
        plan_block(&self.fields, config, prior)
    }
}

fn plan_block(
    fields: &BTreeMap<&'static str, Schema>,
    config: &Map<String, Value>,
    prior: Option<&Map<String, Value>>,
) -> Map<String, Value> {
    let mut planned = Map::new();
    for (&key, schema) in fields {
        let prior_value = prior.and_then(|p| p.get(key)).filter(|v| !v.is_null());
        let value = match config.get(key).filter(|v| !v.is_null()) {
            Some(v) => plan_value(schema, v, prior_value),
            None => match (&schema.default, prior_value) {
                (Some(default), _) => default.clone(),
                (None, Some(old)) if schema.computed => old.clone(),
                _ => continue,
            },
        };
        planned.insert(key.to_string(), value);
    }
    planned
}

fn plan_value(schema: &Schema, value: &Value, prior: Option<&Value>) -> Value {
    match (&schema.value_type, value) {
        (ValueType::Nested(block), Value::Array(items)) => {
            let prior_items = match prior {
                Some(Value::Array(old)) => old.as_slice(),
                _ => &[],
            };
            let mut taken = vec![false; prior_items.len()];
            Value::Array(
                items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| match item {
                        Value::Object(obj) => {
                            let old = matching_prior(block, obj, index, prior_items, &mut taken);
                            Value::Object(plan_block(&block.fields, obj, old))
                        }
                        other => other.clone(),
                    })
                    .collect(),
            )
        }
        _ => schema.normalized(value),
    }
}

/// Prior record a configured nested record continues, so its computed
/// fields survive the plan. The record at the same position wins when its
/// required fields agree, otherwise the first unclaimed record that agrees.
fn matching_prior<'a>(
    block: &Block,
    config: &Map<String, Value>,
    index: usize,
    prior_items: &'a [Value],
    taken: &mut [bool],
) -> Option<&'a Map<String, Value>> {
    let same_identity = |old: &Map<String, Value>| {
        block
            .fields
            .iter()
            .filter(|(_, schema)| schema.required && !schema.computed)
            .all(|(&key, schema)| {
                config.get(key).map(|v| schema.normalized(v)).as_ref() == old.get(key)
            })
    };
    let position = std::iter::once(index)
        .chain(0..prior_items.len())
        .find(|&i| {
            !taken.get(i).copied().unwrap_or(true)
                && prior_items[i].as_object().is_some_and(same_identity)
        })?;
    taken[position] = true;
    prior_items[position].as_object()
}
