//! Account wide catalogs.

use std::sync::LazyLock;

use async_trait::async_trait;
use myrasec_api::{IpRange, ListParams, MyrasecApi, SslConfiguration};
use serde_json::{Map, Value};

use crate::error::ProviderResult;
use crate::filters::{IpRangesFilter, NameFilter, parse_filter};
use crate::lookup::collect_pages;
use crate::resources::{api_key, waf};
use crate::schema::{Block, ResourceSchema, Schema};
use crate::state::ResourceData;
use crate::translate::{record, time_value};

use super::{
    DataSourceHandler, accepts, computed_block, entries, entry_block, list_schema, listing,
};

fn name_filter() -> Block {
    Block::new().field("name", Schema::string().optional())
}

// ==================== API keys ====================

static API_KEYS: LazyLock<ResourceSchema> =
    LazyLock::new(|| list_schema(name_filter(), "apikeys", entry_block(&api_key::SCHEMA)));

pub struct ApiKeysDataSource;

#[async_trait]
impl DataSourceHandler for ApiKeysDataSource {
    fn name(&self) -> &'static str {
        "myrasec_api_keys"
    }

    fn schema(&self) -> &'static ResourceSchema {
        &API_KEYS
    }

    async fn read(
        &self,
        api: &dyn MyrasecApi,
        config: &Map<String, Value>,
    ) -> ProviderResult<ResourceData> {
        let filter: NameFilter = parse_filter(config)?.unwrap_or_default();
        let mut keys =
            collect_pages(ListParams::default(), |p| async move { api.list_api_keys(&p).await })
                .await?;
        keys.retain(|k| accepts(filter.name.as_deref(), k.name.as_str()));

        let items = entries(&api_key::SCHEMA, &keys, api_key::set);
        Ok(listing(&API_KEYS, config, "apikeys", filter.name.as_deref(), items))
    }
}

// ==================== IP ranges ====================

fn ip_range_entry(r: &IpRange) -> Value {
    record([
        ("id", r.id.map(Value::from)),
        ("network", Some(Value::from(r.network.clone()))),
        ("valid_from", time_value(r.valid_from.as_ref()).map(Value::from)),
        ("valid_to", time_value(r.valid_to.as_ref()).map(Value::from)),
        ("enabled", r.enabled.map(Value::from)),
        ("comment", r.comment.clone().map(Value::from)),
        ("created", time_value(r.created.as_ref()).map(Value::from)),
        ("modified", time_value(r.modified.as_ref()).map(Value::from)),
    ])
}

static IP_RANGES: LazyLock<ResourceSchema> = LazyLock::new(|| {
    list_schema(
        Block::new().field("network", Schema::string().optional()),
        "ipranges",
        Block::new()
            .field("id", Schema::int().computed())
            .field("network", Schema::string().computed())
            .field("valid_from", Schema::string().computed())
            .field("valid_to", Schema::string().computed())
            .field("enabled", Schema::bool().computed())
            .field("comment", Schema::string().computed())
            .field("created", Schema::string().computed())
            .field("modified", Schema::string().computed()),
    )
});

pub struct IpRangesDataSource;

#[async_trait]
impl DataSourceHandler for IpRangesDataSource {
    fn name(&self) -> &'static str {
        "myrasec_ip_ranges"
    }

    fn schema(&self) -> &'static ResourceSchema {
        &IP_RANGES
    }

    async fn read(
        &self,
        api: &dyn MyrasecApi,
        config: &Map<String, Value>,
    ) -> ProviderResult<ResourceData> {
        let filter: IpRangesFilter = parse_filter(config)?.unwrap_or_default();
        let mut ranges =
            collect_pages(ListParams::default(), |p| async move { api.list_ip_ranges(&p).await })
                .await?;
        ranges.retain(|r| accepts(filter.network.as_deref(), r.network.as_str()));

        let items = ranges.iter().map(ip_range_entry).collect();
        Ok(listing(&IP_RANGES, config, "ipranges", filter.network.as_deref(), items))
    }
}

// ==================== SSL configurations ====================

fn ssl_configuration_entry(c: &SslConfiguration) -> Value {
    record([
        ("name", Some(Value::from(c.name.clone()))),
        ("ciphers", Some(Value::from(c.ciphers.clone()))),
        ("protocols", Some(Value::from(c.protocols.clone()))),
    ])
}

static SSL_CONFIGURATIONS: LazyLock<ResourceSchema> = LazyLock::new(|| {
    list_schema(
        name_filter(),
        "configurations",
        Block::new()
            .field("name", Schema::string().computed())
            .field("ciphers", Schema::string().computed())
            .field("protocols", Schema::string().computed()),
    )
});

pub struct SslConfigurationsDataSource;

#[async_trait]
impl DataSourceHandler for SslConfigurationsDataSource {
    fn name(&self) -> &'static str {
        "myrasec_ssl_configurations"
    }

    fn schema(&self) -> &'static ResourceSchema {
        &SSL_CONFIGURATIONS
    }

    async fn read(
        &self,
        api: &dyn MyrasecApi,
        config: &Map<String, Value>,
    ) -> ProviderResult<ResourceData> {
        let filter: NameFilter = parse_filter(config)?.unwrap_or_default();
        let mut configurations = api.list_ssl_configurations().await?;
        configurations.retain(|c| accepts(filter.name.as_deref(), c.name.as_str()));

        let items = configurations.iter().map(ssl_configuration_entry).collect();
        Ok(listing(
            &SSL_CONFIGURATIONS,
            config,
            "configurations",
            filter.name.as_deref(),
            items,
        ))
    }
}

// ==================== WAF catalog ====================

static WAF_CONDITIONS: LazyLock<ResourceSchema> = LazyLock::new(|| {
    list_schema(
        name_filter(),
        "conditions",
        computed_block(&waf::condition_block().fields),
    )
});

pub struct WafConditionsDataSource;

#[async_trait]
impl DataSourceHandler for WafConditionsDataSource {
    fn name(&self) -> &'static str {
        "myrasec_waf_conditions"
    }

    fn schema(&self) -> &'static ResourceSchema {
        &WAF_CONDITIONS
    }

    async fn read(
        &self,
        api: &dyn MyrasecApi,
        config: &Map<String, Value>,
    ) -> ProviderResult<ResourceData> {
        let filter: NameFilter = parse_filter(config)?.unwrap_or_default();
        let items = api
            .list_waf_conditions()
            .await?
            .iter()
            .filter(|c| accepts(filter.name.as_deref(), c.name.as_str()))
            .map(waf::condition_record)
            .collect();
        Ok(listing(
            &WAF_CONDITIONS,
            config,
            "conditions",
            filter.name.as_deref(),
            items,
        ))
    }
}

static WAF_ACTIONS: LazyLock<ResourceSchema> = LazyLock::new(|| {
    list_schema(
        name_filter(),
        "actions",
        computed_block(&waf::action_block().fields),
    )
});

pub struct WafActionsDataSource;

#[async_trait]
impl DataSourceHandler for WafActionsDataSource {
    fn name(&self) -> &'static str {
        "myrasec_waf_actions"
    }

    fn schema(&self) -> &'static ResourceSchema {
        &WAF_ACTIONS
    }

    async fn read(
        &self,
        api: &dyn MyrasecApi,
        config: &Map<String, Value>,
    ) -> ProviderResult<ResourceData> {
        let filter: NameFilter = parse_filter(config)?.unwrap_or_default();
        let items = api
            .list_waf_actions()
            .await?
            .iter()
            .filter(|a| accepts(filter.name.as_deref(), a.name.as_str()))
            .map(waf::action_record)
            .collect();
        Ok(listing(&WAF_ACTIONS, config, "actions", filter.name.as_deref(), items))
    }
}
