//! Data source handlers
//!
//! Read-only listings. Each data source takes an optional one-element
//! `filter` block, lists the matching vendor objects and writes them to a
//! list attribute. The list entries reuse the set-back of the matching
//! resource, so both surfaces share attribute names.

mod account;
mod domain;
mod subdomain;
mod tag;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use myrasec_api::MyrasecApi;
use serde_json::{Map, Value};

use crate::error::ProviderResult;
use crate::filters::FILTER;
use crate::schema::{Block, ResourceSchema, Schema, ValueType};
use crate::state::ResourceData;

pub use account::{
    ApiKeysDataSource, IpRangesDataSource, SslConfigurationsDataSource, WafActionsDataSource,
    WafConditionsDataSource,
};
pub use domain::{
    DnsRecordsDataSource, DomainsDataSource, ErrorPagesDataSource, MaintenanceTemplatesDataSource,
    SslCertificatesDataSource, SubdomainsDataSource,
};
pub use subdomain::{
    CacheSettingsDataSource, IpFiltersDataSource, MaintenancesDataSource, RateLimitsDataSource,
    RedirectsDataSource, SettingsDataSource, WafRulesDataSource, WaitingRoomsDataSource,
};
pub use tag::{
    TagCacheSettingsDataSource, TagInformationDataSource, TagSettingsDataSource,
    TagWafRulesDataSource, TagsDataSource,
};

/// Data source trait
#[async_trait]
pub trait DataSourceHandler: Send + Sync {
    /// Orchestrator type name, e.g. `myrasec_dns_records`.
    fn name(&self) -> &'static str;

    fn schema(&self) -> &'static ResourceSchema;

    /// Read with the raw user configuration; the handler parses the filter.
    async fn read(
        &self,
        api: &dyn MyrasecApi,
        config: &Map<String, Value>,
    ) -> ProviderResult<ResourceData>;
}

/// Every data source handler.
pub fn all() -> Vec<Arc<dyn DataSourceHandler>> {
    vec![
        Arc::new(DomainsDataSource),
        Arc::new(SubdomainsDataSource),
        Arc::new(DnsRecordsDataSource),
        Arc::new(SettingsDataSource),
        Arc::new(CacheSettingsDataSource),
        Arc::new(RedirectsDataSource),
        Arc::new(RateLimitsDataSource),
        Arc::new(IpFiltersDataSource),
        Arc::new(MaintenancesDataSource),
        Arc::new(MaintenanceTemplatesDataSource),
        Arc::new(ErrorPagesDataSource),
        Arc::new(SslCertificatesDataSource),
        Arc::new(SslConfigurationsDataSource),
        Arc::new(WafRulesDataSource),
        Arc::new(WafConditionsDataSource),
        Arc::new(WafActionsDataSource),
        Arc::new(TagsDataSource),
        Arc::new(TagCacheSettingsDataSource),
        Arc::new(TagWafRulesDataSource),
        Arc::new(TagSettingsDataSource),
        Arc::new(TagInformationDataSource),
        Arc::new(WaitingRoomsDataSource),
        Arc::new(ApiKeysDataSource),
        Arc::new(IpRangesDataSource),
    ]
}

// ==================== Schema helpers ====================

/// Computed-only copy of a field, recursing into nested blocks.
fn computed_copy(schema: &Schema) -> Schema {
    let base = match &schema.value_type {
        ValueType::Nested(block) => Schema::nested(computed_block(&block.fields)),
        _ => Schema {
            value_type: schema.value_type.clone(),
            ..Schema::string()
        },
    };
    let mut copy = base.computed();
    copy.description = schema.description;
    copy.normalize = schema.normalize;
    copy
}

/// Computed-only copy of a field set; sensitive fields are left out.
pub(crate) fn computed_block(fields: &BTreeMap<&'static str, Schema>) -> Block {
    fields
        .iter()
        .filter(|(_, s)| !s.sensitive)
        .fold(Block::new(), |block, (&name, s)| {
            block.field(name, computed_copy(s))
        })
}

/// List entry block derived from a resource schema, plus a numeric `id`.
pub(crate) fn entry_block(resource: &ResourceSchema) -> Block {
    computed_block(&resource.fields).field("id", Schema::int().computed())
}

/// `filter` plus the computed list attribute.
pub(crate) fn list_schema(filter: Block, list_key: &'static str, entry: Block) -> ResourceSchema {
    ResourceSchema::new()
        .field(
            FILTER,
            Schema::nested(filter)
                .optional()
                .max_items(1)
                .describe("Narrows the listing."),
        )
        .field(list_key, Schema::nested(entry).computed())
}

// ==================== Entries ====================

/// One list entry produced by a resource set-back.
pub(crate) fn entry<T>(
    schema: &'static ResourceSchema,
    item: &T,
    set: fn(&mut ResourceData, &T),
) -> Map<String, Value> {
    let mut d = ResourceData::from_state(schema, "", Map::new());
    set(&mut d, item);
    let (id, mut state) = d.into_state();
    if let Ok(id) = id.parse::<i64>() {
        state.insert("id".into(), Value::from(id));
    }
    state
}

/// Entries for every item.
pub(crate) fn entries<T>(
    schema: &'static ResourceSchema,
    items: &[T],
    set: fn(&mut ResourceData, &T),
) -> Vec<Value> {
    items
        .iter()
        .map(|item| Value::Object(entry(schema, item, set)))
        .collect()
}

/// Final state: the list attribute and `id` set to the filter scope.
pub(crate) fn listing(
    schema: &'static ResourceSchema,
    config: &Map<String, Value>,
    list_key: &str,
    scope: Option<&str>,
    items: Vec<Value>,
) -> ResourceData {
    let mut d = ResourceData::for_create(schema, config);
    log::debug!("[data] {list_key}: {} entr(ies)", items.len());
    d.set(list_key, items);
    d.set_id(scope.unwrap_or("all"));
    d
}

/// `Some(wanted)` must equal `actual`; `None` matches anything.
pub(crate) fn accepts<T: PartialEq + ?Sized>(wanted: Option<&T>, actual: &T) -> bool {
    wanted.is_none_or(|w| w == actual)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn every_type_name_is_unique_and_prefixed() {
        let names: Vec<_> = all().iter().map(|h| h.name()).collect();
        let unique: BTreeSet<_> = names.iter().collect();
        assert_eq!(names.len(), 24);
        assert_eq!(unique.len(), names.len());
        assert!(names.iter().all(|n| n.starts_with("myrasec_")));
    }

    #[test]
    fn entry_blocks_are_computed_and_drop_secrets() {
        let block = entry_block(&crate::resources::api_key::SCHEMA);
        assert!(block.fields.values().all(Schema::is_computed_only));
        assert!(!block.fields.contains_key("secret"));
        assert!(block.fields.contains_key("id"));
    }

    #[test]
    fn accepts_treats_none_as_wildcard() {
        assert!(accepts(None, "a"));
        assert!(accepts(Some("a"), "a"));
        assert!(!accepts(Some("b"), "a"));
    }
}
