//! Tags and the collections they own.

use std::sync::LazyLock;

use async_trait::async_trait;
use myrasec_api::{ListParams, MyrasecApi, TagInformation};
use serde_json::{Map, Value};

use crate::error::ProviderResult;
use crate::filters::{TagFilter, TagsFilter, parse_filter, require_filter};
use crate::lookup::collect_pages;
use crate::names::upper;
use crate::resources::settings::values;
use crate::resources::{cache_setting, tag, tag_cache_setting, tag_settings, tag_waf_rule, waf};
use crate::schema::{Block, ResourceSchema, Schema};
use crate::state::ResourceData;
use crate::translate::record;

use super::{DataSourceHandler, accepts, entries, entry_block, list_schema, listing};

fn tag_filter() -> Block {
    Block::new()
        .field("tag_id", Schema::int().required())
        .field("search", Schema::string().optional())
}

fn tag_params(filter: &TagFilter) -> ListParams {
    match &filter.search {
        Some(term) => ListParams::default().search(term.clone()),
        None => ListParams::default(),
    }
}

// ==================== Tags ====================

static TAGS: LazyLock<ResourceSchema> = LazyLock::new(|| {
    list_schema(
        Block::new()
            .field("name", Schema::string().optional())
            .field("type", Schema::string().optional().normalize(upper)),
        "tags",
        entry_block(&tag::SCHEMA),
    )
});

pub struct TagsDataSource;

#[async_trait]
impl DataSourceHandler for TagsDataSource {
    fn name(&self) -> &'static str {
        "myrasec_tags"
    }

    fn schema(&self) -> &'static ResourceSchema {
        &TAGS
    }

    async fn read(
        &self,
        api: &dyn MyrasecApi,
        config: &Map<String, Value>,
    ) -> ProviderResult<ResourceData> {
        let filter: TagsFilter = parse_filter(config)?.unwrap_or_default();
        let tag_type = filter.tag_type.as_deref().map(upper);
        let params = match &filter.name {
            Some(name) => ListParams::default().search(name.clone()),
            None => ListParams::default(),
        };
        let mut tags = collect_pages(params, |p| async move { api.list_tags(&p).await }).await?;
        tags.retain(|t| {
            accepts(filter.name.as_deref(), t.name.as_str())
                && accepts(tag_type.as_deref(), upper(&t.tag_type).as_str())
        });

        let items = entries(&tag::SCHEMA, &tags, tag::set);
        Ok(listing(&TAGS, config, "tags", filter.name.as_deref(), items))
    }
}

// ==================== Tag cache settings ====================

static TAG_CACHE_SETTINGS: LazyLock<ResourceSchema> = LazyLock::new(|| {
    list_schema(
        tag_filter(),
        "settings",
        entry_block(&tag_cache_setting::SCHEMA),
    )
});

pub struct TagCacheSettingsDataSource;

#[async_trait]
impl DataSourceHandler for TagCacheSettingsDataSource {
    fn name(&self) -> &'static str {
        "myrasec_tag_cache_settings"
    }

    fn schema(&self) -> &'static ResourceSchema {
        &TAG_CACHE_SETTINGS
    }

    async fn read(
        &self,
        api: &dyn MyrasecApi,
        config: &Map<String, Value>,
    ) -> ProviderResult<ResourceData> {
        let filter: TagFilter = require_filter(config, "tag_id")?;
        let tag_id = filter.tag_id;
        let settings = collect_pages(tag_params(&filter), |p| async move {
            api.list_tag_cache_settings(tag_id, &p).await
        })
        .await?;

        let items = entries(&tag_cache_setting::SCHEMA, &settings, cache_setting::set);
        Ok(listing(
            &TAG_CACHE_SETTINGS,
            config,
            "settings",
            Some(&tag_id.to_string()),
            items,
        ))
    }
}

// ==================== Tag WAF rules ====================

static TAG_WAF_RULES: LazyLock<ResourceSchema> = LazyLock::new(|| {
    list_schema(tag_filter(), "rules", entry_block(&tag_waf_rule::SCHEMA))
});

pub struct TagWafRulesDataSource;

#[async_trait]
impl DataSourceHandler for TagWafRulesDataSource {
    fn name(&self) -> &'static str {
        "myrasec_tag_waf_rules"
    }

    fn schema(&self) -> &'static ResourceSchema {
        &TAG_WAF_RULES
    }

    async fn read(
        &self,
        api: &dyn MyrasecApi,
        config: &Map<String, Value>,
    ) -> ProviderResult<ResourceData> {
        let filter: TagFilter = require_filter(config, "tag_id")?;
        let tag_id = filter.tag_id;
        let rules = collect_pages(tag_params(&filter), |p| async move {
            api.list_tag_waf_rules(tag_id, &p).await
        })
        .await?;

        let items = entries(&tag_waf_rule::SCHEMA, &rules, waf::set_rule);
        Ok(listing(
            &TAG_WAF_RULES,
            config,
            "rules",
            Some(&tag_id.to_string()),
            items,
        ))
    }
}

// ==================== Tag settings ====================

static TAG_SETTINGS: LazyLock<ResourceSchema> = LazyLock::new(|| {
    list_schema(tag_filter(), "settings", entry_block(&tag_settings::SCHEMA))
});

pub struct TagSettingsDataSource;

#[async_trait]
impl DataSourceHandler for TagSettingsDataSource {
    fn name(&self) -> &'static str {
        "myrasec_tag_settings"
    }

    fn schema(&self) -> &'static ResourceSchema {
        &TAG_SETTINGS
    }

    /// Lists only the keys the tag overrides.
    async fn read(
        &self,
        api: &dyn MyrasecApi,
        config: &Map<String, Value>,
    ) -> ProviderResult<ResourceData> {
        let filter: TagFilter = require_filter(config, "tag_id")?;
        let overlay = api.get_tag_settings(filter.tag_id).await?;
        let mut entry = values(&overlay)?;
        entry.insert("tag_id".into(), Value::from(filter.tag_id));
        Ok(listing(
            &TAG_SETTINGS,
            config,
            "settings",
            Some(&filter.tag_id.to_string()),
            vec![Value::Object(entry)],
        ))
    }
}

// ==================== Tag information ====================

fn information_entry(info: &TagInformation) -> Value {
    record([
        ("id", info.id.map(Value::from)),
        ("key", Some(Value::from(info.key.clone()))),
        ("value", Some(Value::from(info.value.clone()))),
        ("comment", info.comment.clone().map(Value::from)),
    ])
}

static TAG_INFORMATION: LazyLock<ResourceSchema> = LazyLock::new(|| {
    list_schema(
        tag_filter(),
        "information",
        Block::new()
            .field("id", Schema::int().computed())
            .field("key", Schema::string().computed())
            .field("value", Schema::string().computed())
            .field("comment", Schema::string().computed()),
    )
});

pub struct TagInformationDataSource;

#[async_trait]
impl DataSourceHandler for TagInformationDataSource {
    fn name(&self) -> &'static str {
        "myrasec_tag_information"
    }

    fn schema(&self) -> &'static ResourceSchema {
        &TAG_INFORMATION
    }

    async fn read(
        &self,
        api: &dyn MyrasecApi,
        config: &Map<String, Value>,
    ) -> ProviderResult<ResourceData> {
        let filter: TagFilter = require_filter(config, "tag_id")?;
        let tag_id = filter.tag_id;
        let information = collect_pages(tag_params(&filter), |p| async move {
            api.list_tag_information(tag_id, &p).await
        })
        .await?;

        let items = information.iter().map(information_entry).collect();
        Ok(listing(
            &TAG_INFORMATION,
            config,
            "information",
            Some(&tag_id.to_string()),
            items,
        ))
    }
}
