//! Subdomain scoped listings.

use std::sync::LazyLock;

use async_trait::async_trait;
use myrasec_api::{ListParams, MAINTENANCE_PAGE_SIZE, MyrasecApi};
use serde_json::{Map, Value};

use crate::content_hash::CONTENT;
use crate::error::{ProviderError, ProviderResult};
use crate::filters::{
    CacheSettingsFilter, FILTER, IpFiltersFilter, RateLimitsFilter, RedirectsFilter,
    SubdomainFilter, WafRulesFilter, WaitingRoomsFilter, parse_filter, require_filter,
};
use crate::lookup::{SubdomainScope, collect_pages, domain_id_for_subdomain, resolve_domain_id};
use crate::names::{canonical_name, names_equal, upper};
use crate::resources::settings::values;
use crate::resources::{
    cache_setting, ip_filter, maintenance, ratelimit, redirect, settings, waf, waf_rule,
    waiting_room,
};
use crate::schema::{Block, ResourceSchema, Schema};
use crate::state::ResourceData;

use super::{DataSourceHandler, accepts, entries, entry, entry_block, list_schema, listing};

fn subdomain_filter() -> Block {
    Block::new()
        .field(
            "subdomain_name",
            Schema::string().required().normalize(canonical_name),
        )
        .field("search", Schema::string().optional())
}

fn search_params(base: ListParams, search: Option<&str>) -> ListParams {
    match search {
        Some(term) => base.search(term),
        None => base,
    }
}

// ==================== Settings ====================

static SETTINGS: LazyLock<ResourceSchema> = LazyLock::new(|| {
    list_schema(subdomain_filter(), "settings", entry_block(&settings::SCHEMA))
});

pub struct SettingsDataSource;

#[async_trait]
impl DataSourceHandler for SettingsDataSource {
    fn name(&self) -> &'static str {
        "myrasec_settings"
    }

    fn schema(&self) -> &'static ResourceSchema {
        &SETTINGS
    }

    async fn read(
        &self,
        api: &dyn MyrasecApi,
        config: &Map<String, Value>,
    ) -> ProviderResult<ResourceData> {
        let filter: SubdomainFilter = require_filter(config, "subdomain_name")?;
        let scope = SubdomainScope::resolve(api, &filter.subdomain_name).await?;
        let current = api.get_settings(scope.domain_id, &scope.name).await?;
        let mut entry = values(&current)?;
        entry.insert("subdomain_name".into(), Value::from(scope.name.clone()));
        Ok(listing(
            &SETTINGS,
            config,
            "settings",
            Some(&scope.name),
            vec![Value::Object(entry)],
        ))
    }
}

// ==================== Cache settings ====================

static CACHE_SETTINGS: LazyLock<ResourceSchema> = LazyLock::new(|| {
    list_schema(
        Block::new()
            .field(
                "subdomain_name",
                Schema::string().required().normalize(canonical_name),
            )
            .field("path", Schema::string().optional()),
        "settings",
        entry_block(&cache_setting::SCHEMA),
    )
});

pub struct CacheSettingsDataSource;

#[async_trait]
impl DataSourceHandler for CacheSettingsDataSource {
    fn name(&self) -> &'static str {
        "myrasec_cache_settings"
    }

    fn schema(&self) -> &'static ResourceSchema {
        &CACHE_SETTINGS
    }

    async fn read(
        &self,
        api: &dyn MyrasecApi,
        config: &Map<String, Value>,
    ) -> ProviderResult<ResourceData> {
        let filter: CacheSettingsFilter = require_filter(config, "subdomain_name")?;
        let scope = SubdomainScope::resolve(api, &filter.subdomain_name).await?;
        let mut items = collect_pages(ListParams::default(), |p| {
            let scope = &scope;
            async move { api.list_cache_settings(scope.domain_id, &scope.name, &p).await }
        })
        .await?;
        items.retain(|s| accepts(filter.path.as_deref(), s.path.as_str()));

        let items = entries(&cache_setting::SCHEMA, &items, cache_setting::set);
        Ok(listing(&CACHE_SETTINGS, config, "settings", Some(&scope.name), items))
    }
}

// ==================== Redirects ====================

static REDIRECTS: LazyLock<ResourceSchema> = LazyLock::new(|| {
    list_schema(
        Block::new()
            .field(
                "subdomain_name",
                Schema::string().required().normalize(canonical_name),
            )
            .field("source", Schema::string().optional()),
        "redirects",
        entry_block(&redirect::SCHEMA),
    )
});

pub struct RedirectsDataSource;

#[async_trait]
impl DataSourceHandler for RedirectsDataSource {
    fn name(&self) -> &'static str {
        "myrasec_redirects"
    }

    fn schema(&self) -> &'static ResourceSchema {
        &REDIRECTS
    }

    async fn read(
        &self,
        api: &dyn MyrasecApi,
        config: &Map<String, Value>,
    ) -> ProviderResult<ResourceData> {
        let filter: RedirectsFilter = require_filter(config, "subdomain_name")?;
        let scope = SubdomainScope::resolve(api, &filter.subdomain_name).await?;
        let mut items = collect_pages(ListParams::default(), |p| {
            let scope = &scope;
            async move { api.list_redirects(scope.domain_id, &scope.name, &p).await }
        })
        .await?;
        items.retain(|r| accepts(filter.source.as_deref(), r.source.as_str()));

        let items = entries(&redirect::SCHEMA, &items, redirect::set);
        Ok(listing(&REDIRECTS, config, "redirects", Some(&scope.name), items))
    }
}

// ==================== Rate limits ====================

static RATE_LIMITS: LazyLock<ResourceSchema> = LazyLock::new(|| {
    list_schema(
        Block::new()
            .field(
                "subdomain_name",
                Schema::string().required().normalize(canonical_name),
            )
            .field("network", Schema::string().optional()),
        "ratelimits",
        entry_block(&ratelimit::SCHEMA),
    )
});

pub struct RateLimitsDataSource;

#[async_trait]
impl DataSourceHandler for RateLimitsDataSource {
    fn name(&self) -> &'static str {
        "myrasec_ratelimits"
    }

    fn schema(&self) -> &'static ResourceSchema {
        &RATE_LIMITS
    }

    async fn read(
        &self,
        api: &dyn MyrasecApi,
        config: &Map<String, Value>,
    ) -> ProviderResult<ResourceData> {
        let filter: RateLimitsFilter = require_filter(config, "subdomain_name")?;
        let scope = SubdomainScope::resolve(api, &filter.subdomain_name).await?;
        let mut items = collect_pages(ListParams::default(), |p| {
            let scope = &scope;
            async move { api.list_rate_limits(scope.domain_id, &scope.name, &p).await }
        })
        .await?;
        items.retain(|r| accepts(filter.network.as_deref(), r.network.as_str()));

        let items = entries(&ratelimit::SCHEMA, &items, ratelimit::set);
        Ok(listing(&RATE_LIMITS, config, "ratelimits", Some(&scope.name), items))
    }
}

// ==================== IP filters ====================

static IP_FILTERS: LazyLock<ResourceSchema> = LazyLock::new(|| {
    list_schema(
        Block::new()
            .field(
                "subdomain_name",
                Schema::string().required().normalize(canonical_name),
            )
            .field("type", Schema::string().optional().normalize(upper))
            .field("value", Schema::string().optional()),
        "ipfilters",
        entry_block(&ip_filter::SCHEMA),
    )
});

pub struct IpFiltersDataSource;

#[async_trait]
impl DataSourceHandler for IpFiltersDataSource {
    fn name(&self) -> &'static str {
        "myrasec_ip_filters"
    }

    fn schema(&self) -> &'static ResourceSchema {
        &IP_FILTERS
    }

    async fn read(
        &self,
        api: &dyn MyrasecApi,
        config: &Map<String, Value>,
    ) -> ProviderResult<ResourceData> {
        let filter: IpFiltersFilter = require_filter(config, "subdomain_name")?;
        let scope = SubdomainScope::resolve(api, &filter.subdomain_name).await?;
        let filter_type = filter.filter_type.as_deref().map(upper);
        let mut items = collect_pages(ListParams::default(), |p| {
            let scope = &scope;
            async move { api.list_ip_filters(scope.domain_id, &scope.name, &p).await }
        })
        .await?;
        items.retain(|f| {
            accepts(filter_type.as_deref(), upper(&f.filter_type).as_str())
                && accepts(filter.value.as_deref(), f.value.as_str())
        });

        let items = entries(&ip_filter::SCHEMA, &items, ip_filter::set);
        Ok(listing(&IP_FILTERS, config, "ipfilters", Some(&scope.name), items))
    }
}

// ==================== Maintenances ====================

static MAINTENANCES: LazyLock<ResourceSchema> = LazyLock::new(|| {
    list_schema(
        subdomain_filter(),
        "maintenances",
        entry_block(&maintenance::SCHEMA),
    )
});

pub struct MaintenancesDataSource;

#[async_trait]
impl DataSourceHandler for MaintenancesDataSource {
    fn name(&self) -> &'static str {
        "myrasec_maintenances"
    }

    fn schema(&self) -> &'static ResourceSchema {
        &MAINTENANCES
    }

    async fn read(
        &self,
        api: &dyn MyrasecApi,
        config: &Map<String, Value>,
    ) -> ProviderResult<ResourceData> {
        let filter: SubdomainFilter = require_filter(config, "subdomain_name")?;
        let scope = SubdomainScope::resolve(api, &filter.subdomain_name).await?;
        let params = search_params(
            ListParams::with_page_size(MAINTENANCE_PAGE_SIZE),
            filter.search.as_deref(),
        );
        let maintenances = collect_pages(params, |p| {
            let scope = &scope;
            async move { api.list_maintenances(scope.domain_id, &scope.name, &p).await }
        })
        .await?;

        let items = maintenances
            .iter()
            .map(|m| {
                let mut e = entry(&maintenance::SCHEMA, m, maintenance::set);
                e.insert(CONTENT.into(), Value::from(m.content.clone()));
                Value::Object(e)
            })
            .collect();
        Ok(listing(&MAINTENANCES, config, "maintenances", Some(&scope.name), items))
    }
}

// ==================== WAF rules ====================

static WAF_RULES: LazyLock<ResourceSchema> = LazyLock::new(|| {
    list_schema(
        Block::new()
            .field("domain_name", Schema::string().optional().normalize(canonical_name))
            .field(
                "subdomain_name",
                Schema::string().optional().normalize(canonical_name),
            )
            .field("search", Schema::string().optional()),
        "rules",
        entry_block(&waf_rule::SCHEMA),
    )
});

pub struct WafRulesDataSource;

#[async_trait]
impl DataSourceHandler for WafRulesDataSource {
    fn name(&self) -> &'static str {
        "myrasec_waf_rules"
    }

    fn schema(&self) -> &'static ResourceSchema {
        &WAF_RULES
    }

    /// A subdomain narrows the domain listing to that subdomain's rules.
    async fn read(
        &self,
        api: &dyn MyrasecApi,
        config: &Map<String, Value>,
    ) -> ProviderResult<ResourceData> {
        let filter: WafRulesFilter = parse_filter(config)?.unwrap_or_default();
        let (domain_id, subdomain, scope) = match (&filter.subdomain_name, &filter.domain_name) {
            (Some(sub), _) => {
                let resolved = SubdomainScope::resolve(api, sub).await?;
                let name = resolved.name.clone();
                (resolved.domain_id, Some(name.clone()), name)
            }
            (None, Some(domain)) => {
                let name = canonical_name(domain);
                (resolve_domain_id(api, &name).await?, None, name)
            }
            (None, None) => {
                return Err(ProviderError::parse(
                    FILTER,
                    "a filter block with domain_name or subdomain_name is required",
                ));
            }
        };

        let params = search_params(ListParams::default(), filter.search.as_deref());
        let rules = collect_pages(params, |p| {
            let subdomain = subdomain.as_deref();
            async move { api.list_waf_rules(domain_id, subdomain, &p).await }
        })
        .await?;

        let items = entries(&waf_rule::SCHEMA, &rules, waf::set_rule);
        Ok(listing(&WAF_RULES, config, "rules", Some(&scope), items))
    }
}

// ==================== Waiting rooms ====================

static WAITING_ROOMS: LazyLock<ResourceSchema> = LazyLock::new(|| {
    list_schema(
        Block::new()
            .field("domain_id", Schema::int().optional())
            .field(
                "subdomain_name",
                Schema::string().optional().normalize(canonical_name),
            )
            .field("name", Schema::string().optional()),
        "waiting_rooms",
        entry_block(&waiting_room::SCHEMA),
    )
});

pub struct WaitingRoomsDataSource;

#[async_trait]
impl DataSourceHandler for WaitingRoomsDataSource {
    fn name(&self) -> &'static str {
        "myrasec_waiting_rooms"
    }

    fn schema(&self) -> &'static ResourceSchema {
        &WAITING_ROOMS
    }

    /// `subdomain_name` takes precedence over `domain_id`.
    async fn read(
        &self,
        api: &dyn MyrasecApi,
        config: &Map<String, Value>,
    ) -> ProviderResult<ResourceData> {
        let filter: WaitingRoomsFilter = parse_filter(config)?.unwrap_or_default();
        let subdomain = filter.subdomain_name.as_deref().map(canonical_name);
        let domain_id = match (&subdomain, filter.domain_id) {
            (Some(sub), _) => domain_id_for_subdomain(api, sub).await?,
            (None, Some(id)) => id,
            (None, None) => {
                return Err(ProviderError::parse(
                    FILTER,
                    "a filter block with subdomain_name or domain_id is required",
                ));
            }
        };

        let mut rooms = collect_pages(ListParams::default(), |p| async move {
            api.list_waiting_rooms(domain_id, &p).await
        })
        .await?;
        rooms.retain(|r| {
            subdomain.as_deref().is_none_or(|s| {
                r.sub_domain_name
                    .as_deref()
                    .is_some_and(|name| names_equal(name, s))
            }) && accepts(filter.name.as_deref(), r.name.as_str())
        });

        let items = rooms
            .iter()
            .map(|r| {
                let mut e = entry(&waiting_room::SCHEMA, r, waiting_room::set);
                e.insert(CONTENT.into(), Value::from(r.content.clone()));
                Value::Object(e)
            })
            .collect();
        let scope = subdomain.unwrap_or_else(|| domain_id.to_string());
        Ok(listing(&WAITING_ROOMS, config, "waiting_rooms", Some(&scope), items))
    }
}
