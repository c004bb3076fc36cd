//! WAF rule fields shared by subdomain and tag rules.

use myrasec_api::{WafAction, WafCondition, WafRule};
use serde_json::{Map, Value};

use crate::error::ProviderResult;
use crate::schema::{Block, ResourceSchema, Schema};
use crate::state::ResourceData;
use crate::translate::{
    block_bool, block_i64, block_str, parse_time, parse_time_str, record, set_time,
    set_timestamps, set_vendor_id, time_value,
};

use super::{existing_id, required_str};

pub(crate) const DIRECTIONS: &[&str] = &["in", "out"];

pub(crate) fn condition_block() -> Block {
    Block::new()
        .field("condition_id", Schema::int().computed())
        .field("name", Schema::string().required())
        .field("matching_type", Schema::string().required())
        .field("key", Schema::string().optional())
        .field("value", Schema::string().optional())
        .field("category", Schema::string().computed())
        .field("alias", Schema::string().computed())
        .field("available_phases", Schema::int().computed())
        .field("created", Schema::string().computed())
        .field("modified", Schema::string().computed())
}

pub(crate) fn action_block() -> Block {
    Block::new()
        .field("action_id", Schema::int().computed())
        .field("name", Schema::string().required())
        .field("type", Schema::string().required())
        .field("custom_key", Schema::string().optional())
        .field("value", Schema::string().optional())
        .field("available_phases", Schema::int().computed())
        .field("force_custom_values", Schema::bool().computed())
        .field("created", Schema::string().computed())
        .field("modified", Schema::string().computed())
}

/// Rule attributes; the caller adds the scope attribute.
pub(crate) fn with_rule_fields(schema: ResourceSchema) -> ResourceSchema {
    schema
        .field("rule_id", Schema::int().computed())
        .field("rule_type", Schema::string().computed())
        .field("name", Schema::string().required())
        .field("description", Schema::string().optional())
        .field("log_identifier", Schema::string().optional())
        .field(
            "direction",
            Schema::string()
                .required()
                .one_of(DIRECTIONS)
                .describe("`in` checks requests, `out` checks responses."),
        )
        .field("sort", Schema::int().optional().default(0))
        .field("sync", Schema::bool().optional().default(false))
        .field("template", Schema::string().optional())
        .field("process_next", Schema::bool().optional().default(false))
        .field("enabled", Schema::bool().optional().default(true))
        .field("expire_date", Schema::string().optional().rfc3339())
        .field("conditions", Schema::nested(condition_block()).optional())
        .field("actions", Schema::nested(action_block()).optional())
        .field("created", Schema::string().computed())
        .field("modified", Schema::string().computed())
}

// ==================== Build ====================

fn build_condition(b: &Map<String, Value>) -> ProviderResult<WafCondition> {
    Ok(WafCondition {
        id: block_i64(b, "condition_id"),
        name: block_str(b, "name").unwrap_or_default(),
        matching_type: block_str(b, "matching_type"),
        key: block_str(b, "key"),
        value: block_str(b, "value"),
        modified: parse_time_str("conditions.modified", block_str(b, "modified").as_deref())?,
        ..WafCondition::default()
    })
}

fn build_action(b: &Map<String, Value>) -> ProviderResult<WafAction> {
    Ok(WafAction {
        id: block_i64(b, "action_id"),
        name: block_str(b, "name").unwrap_or_default(),
        action_type: block_str(b, "type").unwrap_or_default(),
        custom_key: block_str(b, "custom_key"),
        value: block_str(b, "value"),
        force_custom_values: block_bool(b, "force_custom_values"),
        modified: parse_time_str("actions.modified", block_str(b, "modified").as_deref())?,
        ..WafAction::default()
    })
}

pub(crate) fn build_rule(d: &ResourceData) -> ProviderResult<WafRule> {
    let conditions = d
        .get_blocks("conditions")
        .into_iter()
        .map(build_condition)
        .collect::<ProviderResult<Vec<_>>>()?;
    let actions = d
        .get_blocks("actions")
        .into_iter()
        .map(build_action)
        .collect::<ProviderResult<Vec<_>>>()?;

    Ok(WafRule {
        id: existing_id(d)?,
        name: required_str(d, "name")?,
        description: d.get_string("description"),
        log_identifier: d.get_string("log_identifier"),
        direction: required_str(d, "direction")?,
        sort: d.get_i64("sort"),
        sync: d.get_bool("sync"),
        template: d.get_string("template"),
        process_next: d.get_bool("process_next"),
        enabled: d.get_bool("enabled"),
        expire_date: parse_time(d, "expire_date")?,
        conditions,
        actions,
        modified: parse_time(d, "modified")?,
        ..WafRule::default()
    })
}

// ==================== Set-back ====================

fn time(v: Option<&chrono::DateTime<chrono::Utc>>) -> Option<Value> {
    time_value(v).map(Value::from)
}

pub(crate) fn condition_record(c: &WafCondition) -> Value {
    record([
        ("condition_id", c.id.map(Value::from)),
        ("name", Some(Value::from(c.name.clone()))),
        ("matching_type", c.matching_type.clone().map(Value::from)),
        ("key", c.key.clone().map(Value::from)),
        ("value", c.value.clone().map(Value::from)),
        ("category", c.category.clone().map(Value::from)),
        ("alias", c.alias.clone().map(Value::from)),
        ("available_phases", c.available_phases.map(Value::from)),
        ("created", time(c.created.as_ref())),
        ("modified", time(c.modified.as_ref())),
    ])
}

pub(crate) fn action_record(a: &WafAction) -> Value {
    record([
        ("action_id", a.id.map(Value::from)),
        ("name", Some(Value::from(a.name.clone()))),
        ("type", Some(Value::from(a.action_type.clone()))),
        ("custom_key", a.custom_key.clone().map(Value::from)),
        ("value", a.value.clone().map(Value::from)),
        ("available_phases", a.available_phases.map(Value::from)),
        ("force_custom_values", a.force_custom_values.map(Value::from)),
        ("created", time(a.created.as_ref())),
        ("modified", time(a.modified.as_ref())),
    ])
}

pub(crate) fn set_rule(d: &mut ResourceData, r: &WafRule) {
    set_vendor_id(d, "rule_id", r.id);
    d.set_opt("rule_type", r.rule_type.clone());
    d.set("name", r.name.clone());
    d.set_opt("description", r.description.clone());
    d.set_opt("log_identifier", r.log_identifier.clone());
    d.set("direction", r.direction.clone());
    d.set_opt("sort", r.sort);
    d.set_opt("sync", r.sync);
    d.set_opt("template", r.template.clone());
    d.set_opt("process_next", r.process_next);
    d.set_opt("enabled", r.enabled);
    set_time(d, "expire_date", r.expire_date.as_ref());
    d.set(
        "conditions",
        r.conditions.iter().map(condition_record).collect::<Vec<_>>(),
    );
    d.set("actions", r.actions.iter().map(action_record).collect::<Vec<_>>());
    set_timestamps(d, r.created.as_ref(), r.modified.as_ref());
}
