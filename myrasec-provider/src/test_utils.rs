//! Test helpers
//!
//! In-memory [`MyrasecApi`] with real paging, call recording and error
//! injection, plus small factories for handler tests.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use myrasec_api::{
    ApiError, ApiKey, CacheSetting, DnsRecord, Domain, ErrorPage, IpFilter, IpRange, ListParams,
    Maintenance, MaintenanceTemplate, MyrasecApi, RateLimit, Redirect, Result, Settings,
    SslCertificate, SslConfiguration, Tag, TagInformation, VHost, WafAction, WafCondition,
    WafRule, WaitingRoom,
};
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::names::{canonical_name, names_equal};

/// Object map from a `json!` literal.
pub fn config(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("config expects an object, got {other}"),
    }
}

/// Subdomain created by [`MockMyrasecApi::seed_subdomain`].
#[derive(Debug, Clone)]
pub struct SeededSubdomain {
    pub domain_id: i64,
    pub name: String,
    pub vhost_id: Option<i64>,
}

// ===== Entity bookkeeping =====

trait Entity: Clone {
    fn id(&self) -> Option<i64>;
    fn created(&self) -> Option<DateTime<Utc>>;
    fn stamp(&mut self, id: i64, created: Option<DateTime<Utc>>, modified: DateTime<Utc>);
}

macro_rules! impl_entity {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Entity for $ty {
                fn id(&self) -> Option<i64> {
                    self.id
                }

                fn created(&self) -> Option<DateTime<Utc>> {
                    self.created
                }

                fn stamp(
                    &mut self,
                    id: i64,
                    created: Option<DateTime<Utc>>,
                    modified: DateTime<Utc>,
                ) {
                    self.id = Some(id);
                    self.created = created.or(Some(modified));
                    self.modified = Some(modified);
                }
            }
        )*
    };
}

impl_entity!(
    ApiKey,
    CacheSetting,
    DnsRecord,
    Domain,
    ErrorPage,
    IpFilter,
    Maintenance,
    MaintenanceTemplate,
    RateLimit,
    Redirect,
    SslCertificate,
    Tag,
    VHost,
    WafRule,
    WaitingRoom,
);

fn not_found(path: String) -> ApiError {
    ApiError::NotFound {
        path,
        raw_message: None,
    }
}

fn page<T: Clone>(items: &[T], params: &ListParams) -> Vec<T> {
    let size = params.page_size as usize;
    let start = (params.page.max(1) as usize - 1) * size;
    items.iter().skip(start).take(size).cloned().collect()
}

fn search_matches(params: &ListParams, name: &str) -> bool {
    match params.search.as_deref().filter(|s| !s.is_empty()) {
        None => true,
        Some(term) if params.filter_type.as_deref() == Some("exact") => names_equal(name, term),
        Some(term) => name.to_ascii_lowercase().contains(&canonical_name(term)),
    }
}

/// Overlay the non-`None` fields of `update` onto `base`.
fn merge_settings(base: &Settings, update: &Settings) -> Result<Settings> {
    let encode = |s: &Settings| {
        serde_json::to_value(s).map_err(|e| ApiError::SerializationError {
            detail: e.to_string(),
        })
    };
    let mut merged = encode(base)?;
    if let (Value::Object(target), Value::Object(overlay)) = (&mut merged, encode(update)?) {
        target.extend(overlay);
    }
    serde_json::from_value(merged).map_err(|e| ApiError::ParseError {
        detail: e.to_string(),
    })
}

// ===== MockMyrasecApi =====

#[derive(Default)]
struct Store {
    next_id: i64,
    clock: Option<DateTime<Utc>>,
    latency: Duration,
    calls: HashMap<&'static str, usize>,
    failures: HashMap<&'static str, ApiError>,
    pruned: Vec<String>,

    domains: Vec<Domain>,
    vhosts: Vec<VHost>,
    dns_records: HashMap<i64, Vec<DnsRecord>>,
    cache_settings: HashMap<String, Vec<CacheSetting>>,
    redirects: HashMap<String, Vec<Redirect>>,
    rate_limits: HashMap<String, Vec<RateLimit>>,
    ip_filters: HashMap<String, Vec<IpFilter>>,
    maintenances: HashMap<String, Vec<Maintenance>>,
    templates: HashMap<i64, Vec<MaintenanceTemplate>>,
    settings: HashMap<String, Settings>,
    error_pages: HashMap<i64, Vec<ErrorPage>>,
    certificates: HashMap<i64, Vec<SslCertificate>>,
    waf_rules: HashMap<i64, Vec<WafRule>>,
    tags: Vec<Tag>,
    tag_cache_settings: HashMap<i64, Vec<CacheSetting>>,
    tag_waf_rules: HashMap<i64, Vec<WafRule>>,
    tag_settings: HashMap<i64, Settings>,
    tag_information: HashMap<i64, Vec<TagInformation>>,
    waiting_rooms: HashMap<i64, Vec<WaitingRoom>>,
    api_keys: Vec<ApiKey>,
}

impl Store {
    fn now(&self) -> DateTime<Utc> {
        self.clock
            .unwrap_or_else(|| Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    }

    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        1000 + self.next_id
    }

    /// Copy of `item` with a fresh id and timestamps.
    fn stamped<T: Entity>(&mut self, item: &T) -> T {
        let id = self.next_id();
        let mut created = item.clone();
        created.stamp(id, None, self.now());
        created
    }
}

pub struct MockMyrasecApi {
    store: RwLock<Store>,
}

impl MockMyrasecApi {
    pub fn new() -> Self {
        Self {
            store: RwLock::new(Store::default()),
        }
    }

    // ---- seeding ----

    pub async fn seed_domain(&self, id: i64, name: &str) {
        let mut s = self.store.write().await;
        if s.domains.iter().any(|d| d.id == Some(id)) {
            return;
        }
        let now = s.now();
        s.domains.push(Domain {
            id: Some(id),
            name: name.to_string(),
            auto_update: Some(true),
            created: Some(now),
            modified: Some(now),
            ..Domain::default()
        });
    }

    /// Subdomain `fqdn` under domain `domain_id`; seeds the domain if needed.
    pub async fn seed_subdomain(
        &self,
        domain_id: i64,
        domain_name: &str,
        fqdn: &str,
    ) -> SeededSubdomain {
        self.seed_domain(domain_id, domain_name).await;
        let mut s = self.store.write().await;
        let vhost = s.stamped(&VHost {
            label: fqdn.to_string(),
            domain_name: Some(domain_name.to_string()),
            domain_id: Some(domain_id),
            ..VHost::default()
        });
        s.vhosts.push(vhost.clone());
        SeededSubdomain {
            domain_id,
            name: canonical_name(fqdn),
            vhost_id: vhost.id,
        }
    }

    /// `count` prefix rules on `scope`, ids in insertion order.
    pub async fn seed_cache_settings(&self, scope: &SeededSubdomain, count: usize) -> Vec<i64> {
        let mut s = self.store.write().await;
        let mut ids = Vec::with_capacity(count);
        for i in 0..count {
            let setting = s.stamped(&CacheSetting {
                setting_type: "prefix".into(),
                path: format!("/assets/{i}"),
                ttl: Some(3600),
                not_found_ttl: Some(60),
                sort: i64::try_from(i).ok(),
                enabled: Some(true),
                enforce: Some(false),
                ..CacheSetting::default()
            });
            ids.extend(setting.id);
            s.cache_settings
                .entry(scope.name.clone())
                .or_default()
                .push(setting);
        }
        ids
    }

    pub async fn seed_tag(&self, name: &str, tag_type: &str) -> i64 {
        let mut s = self.store.write().await;
        let tag = s.stamped(&Tag {
            name: name.to_string(),
            tag_type: tag_type.to_string(),
            ..Tag::default()
        });
        let id = tag.id.unwrap_or_default();
        s.tags.push(tag);
        id
    }

    pub async fn seed_tag_information(&self, tag_id: i64, key: &str, value: &str) {
        let mut s = self.store.write().await;
        let id = s.next_id();
        s.tag_information
            .entry(tag_id)
            .or_default()
            .push(TagInformation {
                id: Some(id),
                key: key.to_string(),
                value: value.to_string(),
                comment: None,
            });
    }

    // ---- behaviour ----

    pub async fn set_clock(&self, now: DateTime<Utc>) {
        self.store.write().await.clock = Some(now);
    }

    /// Delay every call by `latency`.
    pub async fn set_latency(&self, latency: Duration) {
        self.store.write().await.latency = latency;
    }

    /// Fail the next call of `method` with `err`.
    pub async fn fail_next(&self, method: &'static str, err: ApiError) {
        self.store.write().await.failures.insert(method, err);
    }

    // ---- inspection ----

    pub async fn call_count(&self, method: &str) -> usize {
        self.store
            .read()
            .await
            .calls
            .get(method)
            .copied()
            .unwrap_or(0)
    }

    pub async fn domains(&self) -> Vec<Domain> {
        self.store.read().await.domains.clone()
    }

    pub async fn maintenance_templates(&self, domain_id: i64) -> Vec<MaintenanceTemplate> {
        self.store
            .read()
            .await
            .templates
            .get(&domain_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn settings_of(&self, fqdn: &str) -> Settings {
        self.store
            .read()
            .await
            .settings
            .get(&canonical_name(fqdn))
            .cloned()
            .unwrap_or_default()
    }

    pub async fn pruned_prefixes(&self) -> Vec<String> {
        self.store.read().await.pruned.clone()
    }

    // ---- internals ----

    async fn call(&self, method: &'static str) -> Result<()> {
        let latency = {
            let mut s = self.store.write().await;
            *s.calls.entry(method).or_default() += 1;
            if let Some(err) = s.failures.remove(method) {
                return Err(err);
            }
            s.latency
        };
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        Ok(())
    }

    async fn list<T: Clone>(
        &self,
        method: &'static str,
        params: &ListParams,
        select: impl FnOnce(&Store) -> Vec<T>,
    ) -> Result<Vec<T>> {
        self.call(method).await?;
        let s = self.store.read().await;
        Ok(page(&select(&*s), params))
    }

    async fn insert<T: Entity>(
        &self,
        method: &'static str,
        pick: impl FnOnce(&mut Store) -> &mut Vec<T>,
        item: &T,
    ) -> Result<T> {
        self.call(method).await?;
        let mut s = self.store.write().await;
        let created = s.stamped(item);
        pick(&mut *s).push(created.clone());
        Ok(created)
    }

    async fn replace<T: Entity>(
        &self,
        method: &'static str,
        pick: impl FnOnce(&mut Store) -> &mut Vec<T>,
        item: &T,
    ) -> Result<T> {
        self.call(method).await?;
        let mut s = self.store.write().await;
        let now = s.now();
        let id = item.id().ok_or_else(|| not_found(method.to_string()))?;
        let slot = pick(&mut *s)
            .iter_mut()
            .find(|i| i.id() == Some(id))
            .ok_or_else(|| not_found(format!("{method}/{id}")))?;
        let mut updated = item.clone();
        updated.stamp(id, slot.created(), now);
        *slot = updated.clone();
        Ok(updated)
    }

    async fn remove<T: Entity>(
        &self,
        method: &'static str,
        pick: impl FnOnce(&mut Store) -> &mut Vec<T>,
        item: &T,
    ) -> Result<()> {
        self.call(method).await?;
        let mut s = self.store.write().await;
        let id = item.id().ok_or_else(|| not_found(method.to_string()))?;
        let items = pick(&mut *s);
        let before = items.len();
        items.retain(|i| i.id() != Some(id));
        if items.len() == before {
            return Err(not_found(format!("{method}/{id}")));
        }
        Ok(())
    }
}

#[async_trait]
impl MyrasecApi for MockMyrasecApi {
    // ---- domains ----

    async fn list_domains(&self, params: &ListParams) -> Result<Vec<Domain>> {
        self.list("list_domains", params, |s| {
            s.domains
                .iter()
                .filter(|d| search_matches(params, &d.name))
                .cloned()
                .collect()
        })
        .await
    }

    async fn create_domain(&self, domain: &Domain) -> Result<Domain> {
        self.insert("create_domain", |s| &mut s.domains, domain).await
    }

    async fn update_domain(&self, domain: &Domain) -> Result<Domain> {
        self.replace("update_domain", |s| &mut s.domains, domain).await
    }

    async fn delete_domain(&self, domain: &Domain) -> Result<()> {
        self.remove("delete_domain", |s| &mut s.domains, domain).await
    }

    // ---- subdomains ----

    async fn list_subdomains(&self, domain_id: i64, params: &ListParams) -> Result<Vec<VHost>> {
        self.list("list_subdomains", params, |s| {
            s.vhosts
                .iter()
                .filter(|v| v.domain_id == Some(domain_id) && search_matches(params, &v.label))
                .cloned()
                .collect()
        })
        .await
    }

    async fn list_all_subdomains(&self, params: &ListParams) -> Result<Vec<VHost>> {
        self.list("list_all_subdomains", params, |s| {
            s.vhosts
                .iter()
                .filter(|v| search_matches(params, &v.label))
                .cloned()
                .collect()
        })
        .await
    }

    // ---- DNS records ----

    async fn list_dns_records(
        &self,
        domain_id: i64,
        params: &ListParams,
    ) -> Result<Vec<DnsRecord>> {
        self.list("list_dns_records", params, |s| {
            s.dns_records.get(&domain_id).cloned().unwrap_or_default()
        })
        .await
    }

    async fn create_dns_record(&self, domain_id: i64, record: &DnsRecord) -> Result<DnsRecord> {
        self.insert(
            "create_dns_record",
            |s| s.dns_records.entry(domain_id).or_default(),
            record,
        )
        .await
    }

    async fn update_dns_record(&self, domain_id: i64, record: &DnsRecord) -> Result<DnsRecord> {
        self.replace(
            "update_dns_record",
            |s| s.dns_records.entry(domain_id).or_default(),
            record,
        )
        .await
    }

    async fn delete_dns_record(&self, domain_id: i64, record: &DnsRecord) -> Result<()> {
        self.remove(
            "delete_dns_record",
            |s| s.dns_records.entry(domain_id).or_default(),
            record,
        )
        .await
    }

    // ---- cache settings ----

    async fn list_cache_settings(
        &self,
        _domain_id: i64,
        subdomain: &str,
        params: &ListParams,
    ) -> Result<Vec<CacheSetting>> {
        let key = canonical_name(subdomain);
        self.list("list_cache_settings", params, |s| {
            s.cache_settings.get(&key).cloned().unwrap_or_default()
        })
        .await
    }

    async fn create_cache_setting(
        &self,
        _domain_id: i64,
        subdomain: &str,
        setting: &CacheSetting,
    ) -> Result<CacheSetting> {
        let key = canonical_name(subdomain);
        self.insert(
            "create_cache_setting",
            |s| s.cache_settings.entry(key).or_default(),
            setting,
        )
        .await
    }

    async fn update_cache_setting(
        &self,
        _domain_id: i64,
        subdomain: &str,
        setting: &CacheSetting,
    ) -> Result<CacheSetting> {
        let key = canonical_name(subdomain);
        self.replace(
            "update_cache_setting",
            |s| s.cache_settings.entry(key).or_default(),
            setting,
        )
        .await
    }

    async fn delete_cache_setting(
        &self,
        _domain_id: i64,
        subdomain: &str,
        setting: &CacheSetting,
    ) -> Result<()> {
        let key = canonical_name(subdomain);
        self.remove(
            "delete_cache_setting",
            |s| s.cache_settings.entry(key).or_default(),
            setting,
        )
        .await
    }

    // ---- redirects ----

    async fn list_redirects(
        &self,
        _domain_id: i64,
        subdomain: &str,
        params: &ListParams,
    ) -> Result<Vec<Redirect>> {
        let key = canonical_name(subdomain);
        self.list("list_redirects", params, |s| {
            s.redirects.get(&key).cloned().unwrap_or_default()
        })
        .await
    }

    async fn create_redirect(
        &self,
        _domain_id: i64,
        subdomain: &str,
        redirect: &Redirect,
    ) -> Result<Redirect> {
        let key = canonical_name(subdomain);
        let mut redirect = redirect.clone();
        redirect.sub_domain_name = Some(key.clone());
        self.insert(
            "create_redirect",
            |s| s.redirects.entry(key).or_default(),
            &redirect,
        )
        .await
    }

    async fn update_redirect(
        &self,
        _domain_id: i64,
        subdomain: &str,
        redirect: &Redirect,
    ) -> Result<Redirect> {
        let key = canonical_name(subdomain);
        self.replace(
            "update_redirect",
            |s| s.redirects.entry(key).or_default(),
            redirect,
        )
        .await
    }

    async fn delete_redirect(
        &self,
        _domain_id: i64,
        subdomain: &str,
        redirect: &Redirect,
    ) -> Result<()> {
        let key = canonical_name(subdomain);
        self.remove(
            "delete_redirect",
            |s| s.redirects.entry(key).or_default(),
            redirect,
        )
        .await
    }

    // ---- rate limits ----

    async fn list_rate_limits(
        &self,
        _domain_id: i64,
        subdomain: &str,
        params: &ListParams,
    ) -> Result<Vec<RateLimit>> {
        let key = canonical_name(subdomain);
        self.list("list_rate_limits", params, |s| {
            s.rate_limits.get(&key).cloned().unwrap_or_default()
        })
        .await
    }

    async fn create_rate_limit(
        &self,
        _domain_id: i64,
        subdomain: &str,
        limit: &RateLimit,
    ) -> Result<RateLimit> {
        let key = canonical_name(subdomain);
        let mut limit = limit.clone();
        limit.sub_domain_name = Some(key.clone());
        self.insert(
            "create_rate_limit",
            |s| s.rate_limits.entry(key).or_default(),
            &limit,
        )
        .await
    }

    async fn update_rate_limit(
        &self,
        _domain_id: i64,
        subdomain: &str,
        limit: &RateLimit,
    ) -> Result<RateLimit> {
        let key = canonical_name(subdomain);
        self.replace(
            "update_rate_limit",
            |s| s.rate_limits.entry(key).or_default(),
            limit,
        )
        .await
    }

    async fn delete_rate_limit(
        &self,
        _domain_id: i64,
        subdomain: &str,
        limit: &RateLimit,
    ) -> Result<()> {
        let key = canonical_name(subdomain);
        self.remove(
            "delete_rate_limit",
            |s| s.rate_limits.entry(key).or_default(),
            limit,
        )
        .await
    }

    // ---- IP filters ----

    async fn list_ip_filters(
        &self,
        _domain_id: i64,
        subdomain: &str,
        params: &ListParams,
    ) -> Result<Vec<IpFilter>> {
        let key = canonical_name(subdomain);
        self.list("list_ip_filters", params, |s| {
            s.ip_filters.get(&key).cloned().unwrap_or_default()
        })
        .await
    }

    async fn create_ip_filter(
        &self,
        _domain_id: i64,
        subdomain: &str,
        filter: &IpFilter,
    ) -> Result<IpFilter> {
        let key = canonical_name(subdomain);
        self.insert(
            "create_ip_filter",
            |s| s.ip_filters.entry(key).or_default(),
            filter,
        )
        .await
    }

    async fn update_ip_filter(
        &self,
        _domain_id: i64,
        subdomain: &str,
        filter: &IpFilter,
    ) -> Result<IpFilter> {
        let key = canonical_name(subdomain);
        self.replace(
            "update_ip_filter",
            |s| s.ip_filters.entry(key).or_default(),
            filter,
        )
        .await
    }

    async fn delete_ip_filter(
        &self,
        _domain_id: i64,
        subdomain: &str,
        filter: &IpFilter,
    ) -> Result<()> {
        let key = canonical_name(subdomain);
        self.remove(
            "delete_ip_filter",
            |s| s.ip_filters.entry(key).or_default(),
            filter,
        )
        .await
    }

    // ---- maintenance ----

    async fn list_maintenances(
        &self,
        _domain_id: i64,
        subdomain: &str,
        params: &ListParams,
    ) -> Result<Vec<Maintenance>> {
        let key = canonical_name(subdomain);
        self.list("list_maintenances", params, |s| {
            s.maintenances.get(&key).cloned().unwrap_or_default()
        })
        .await
    }

    async fn create_maintenance(
        &self,
        _domain_id: i64,
        subdomain: &str,
        maintenance: &Maintenance,
    ) -> Result<Maintenance> {
        let key = canonical_name(subdomain);
        let mut maintenance = maintenance.clone();
        maintenance.fqdn = Some(key.clone());
        self.insert(
            "create_maintenance",
            |s| s.maintenances.entry(key).or_default(),
            &maintenance,
        )
        .await
    }

    async fn update_maintenance(
        &self,
        _domain_id: i64,
        subdomain: &str,
        maintenance: &Maintenance,
    ) -> Result<Maintenance> {
        let key = canonical_name(subdomain);
        self.replace(
            "update_maintenance",
            |s| s.maintenances.entry(key).or_default(),
            maintenance,
        )
        .await
    }

    async fn delete_maintenance(
        &self,
        _domain_id: i64,
        subdomain: &str,
        maintenance: &Maintenance,
    ) -> Result<()> {
        let key = canonical_name(subdomain);
        self.remove(
            "delete_maintenance",
            |s| s.maintenances.entry(key).or_default(),
            maintenance,
        )
        .await
    }

    async fn list_maintenance_templates(
        &self,
        domain_id: i64,
        params: &ListParams,
    ) -> Result<Vec<MaintenanceTemplate>> {
        self.list("list_maintenance_templates", params, |s| {
            s.templates.get(&domain_id).cloned().unwrap_or_default()
        })
        .await
    }

    async fn create_maintenance_template(
        &self,
        domain_id: i64,
        template: &MaintenanceTemplate,
    ) -> Result<MaintenanceTemplate> {
        self.insert(
            "create_maintenance_template",
            |s| s.templates.entry(domain_id).or_default(),
            template,
        )
        .await
    }

    async fn update_maintenance_template(
        &self,
        domain_id: i64,
        template: &MaintenanceTemplate,
    ) -> Result<MaintenanceTemplate> {
        self.replace(
            "update_maintenance_template",
            |s| s.templates.entry(domain_id).or_default(),
            template,
        )
        .await
    }

    async fn delete_maintenance_template(
        &self,
        domain_id: i64,
        template: &MaintenanceTemplate,
    ) -> Result<()> {
        self.remove(
            "delete_maintenance_template",
            |s| s.templates.entry(domain_id).or_default(),
            template,
        )
        .await
    }

    // ---- subdomain settings ----

    async fn get_settings(&self, _domain_id: i64, subdomain: &str) -> Result<Settings> {
        self.call("get_settings").await?;
        let s = self.store.read().await;
        Ok(s.settings
            .get(&canonical_name(subdomain))
            .cloned()
            .unwrap_or_default())
    }

    async fn update_settings(
        &self,
        _domain_id: i64,
        subdomain: &str,
        settings: &Settings,
    ) -> Result<Settings> {
        self.call("update_settings").await?;
        let mut s = self.store.write().await;
        let slot = s.settings.entry(canonical_name(subdomain)).or_default();
        *slot = merge_settings(slot, settings)?;
        Ok(slot.clone())
    }

    // ---- error pages ----

    async fn list_error_pages(
        &self,
        domain_id: i64,
        params: &ListParams,
    ) -> Result<Vec<ErrorPage>> {
        self.list("list_error_pages", params, |s| {
            s.error_pages.get(&domain_id).cloned().unwrap_or_default()
        })
        .await
    }

    async fn create_error_page(&self, domain_id: i64, page: &ErrorPage) -> Result<ErrorPage> {
        self.insert(
            "create_error_page",
            |s| s.error_pages.entry(domain_id).or_default(),
            page,
        )
        .await
    }

    async fn update_error_page(&self, domain_id: i64, page: &ErrorPage) -> Result<ErrorPage> {
        self.replace(
            "update_error_page",
            |s| s.error_pages.entry(domain_id).or_default(),
            page,
        )
        .await
    }

    async fn delete_error_page(&self, domain_id: i64, page: &ErrorPage) -> Result<()> {
        self.remove(
            "delete_error_page",
            |s| s.error_pages.entry(domain_id).or_default(),
            page,
        )
        .await
    }

    // ---- SSL ----

    async fn list_ssl_certificates(
        &self,
        domain_id: i64,
        params: &ListParams,
    ) -> Result<Vec<SslCertificate>> {
        self.list("list_ssl_certificates", params, |s| {
            s.certificates.get(&domain_id).cloned().unwrap_or_default()
        })
        .await
    }

    async fn get_ssl_certificate(&self, domain_id: i64, cert_id: i64) -> Result<SslCertificate> {
        self.call("get_ssl_certificate").await?;
        let s = self.store.read().await;
        s.certificates
            .get(&domain_id)
            .and_then(|certs| certs.iter().find(|c| c.id == Some(cert_id)))
            .cloned()
            .ok_or_else(|| not_found(format!("/domain/{domain_id}/certificates/{cert_id}")))
    }

    async fn create_ssl_certificate(
        &self,
        domain_id: i64,
        cert: &SslCertificate,
    ) -> Result<SslCertificate> {
        // the vendor never echoes the private key
        let mut stored = cert.clone();
        stored.key = None;
        self.insert(
            "create_ssl_certificate",
            |s| s.certificates.entry(domain_id).or_default(),
            &stored,
        )
        .await
    }

    async fn update_ssl_certificate(
        &self,
        domain_id: i64,
        cert: &SslCertificate,
    ) -> Result<SslCertificate> {
        let mut stored = cert.clone();
        stored.key = None;
        self.replace(
            "update_ssl_certificate",
            |s| s.certificates.entry(domain_id).or_default(),
            &stored,
        )
        .await
    }

    async fn delete_ssl_certificate(&self, domain_id: i64, cert: &SslCertificate) -> Result<()> {
        self.remove(
            "delete_ssl_certificate",
            |s| s.certificates.entry(domain_id).or_default(),
            cert,
        )
        .await
    }

    async fn list_ssl_configurations(&self) -> Result<Vec<SslConfiguration>> {
        self.call("list_ssl_configurations").await?;
        Ok(vec![
            SslConfiguration {
                name: "Myra-Global-TLS-Default".into(),
                ciphers: "ECDHE-ECDSA-AES128-GCM-SHA256:ECDHE-RSA-AES128-GCM-SHA256".into(),
                protocols: "TLSv1.2 TLSv1.3".into(),
            },
            SslConfiguration {
                name: "Myra-Global-TLS-Modern".into(),
                ciphers: "TLS_AES_128_GCM_SHA256:TLS_AES_256_GCM_SHA384".into(),
                protocols: "TLSv1.3".into(),
            },
        ])
    }

    // ---- WAF ----

    async fn list_waf_rules(
        &self,
        domain_id: i64,
        subdomain: Option<&str>,
        params: &ListParams,
    ) -> Result<Vec<WafRule>> {
        self.list("list_waf_rules", params, |s| {
            s.waf_rules
                .get(&domain_id)
                .map(|rules| {
                    rules
                        .iter()
                        .filter(|r| {
                            subdomain.is_none_or(|sub| {
                                r.sub_domain_name
                                    .as_deref()
                                    .is_some_and(|name| names_equal(name, sub))
                            })
                        })
                        .cloned()
                        .collect()
                })
                .unwrap_or_default()
        })
        .await
    }

    async fn get_waf_rule(&self, rule_id: i64) -> Result<WafRule> {
        self.call("get_waf_rule").await?;
        let s = self.store.read().await;
        s.waf_rules
            .values()
            .flatten()
            .find(|r| r.id == Some(rule_id))
            .cloned()
            .ok_or_else(|| not_found(format!("/waf/rules/{rule_id}")))
    }

    async fn create_waf_rule(
        &self,
        domain_id: i64,
        subdomain: &str,
        rule: &WafRule,
    ) -> Result<WafRule> {
        let mut rule = rule.clone();
        rule.sub_domain_name = Some(canonical_name(subdomain));
        rule.rule_type = Some("domain".into());
        self.insert(
            "create_waf_rule",
            |s| s.waf_rules.entry(domain_id).or_default(),
            &rule,
        )
        .await
    }

    async fn update_waf_rule(
        &self,
        domain_id: i64,
        subdomain: &str,
        rule: &WafRule,
    ) -> Result<WafRule> {
        let mut rule = rule.clone();
        rule.sub_domain_name = Some(canonical_name(subdomain));
        self.replace(
            "update_waf_rule",
            |s| s.waf_rules.entry(domain_id).or_default(),
            &rule,
        )
        .await
    }

    async fn delete_waf_rule(&self, domain_id: i64, _subdomain: &str, rule: &WafRule) -> Result<()> {
        self.remove(
            "delete_waf_rule",
            |s| s.waf_rules.entry(domain_id).or_default(),
            rule,
        )
        .await
    }

    async fn list_waf_conditions(&self) -> Result<Vec<WafCondition>> {
        self.call("list_waf_conditions").await?;
        let condition = |id: i64, name: &str, category: &str| WafCondition {
            id: Some(id),
            name: name.into(),
            matching_type: Some("IREGEX".into()),
            category: Some(category.into()),
            alias: Some(name.into()),
            available_phases: Some(1),
            ..WafCondition::default()
        };
        Ok(vec![
            condition(1, "url", "request"),
            condition(2, "user_agent", "request"),
            condition(3, "remote_addr", "connection"),
        ])
    }

    async fn list_waf_actions(&self) -> Result<Vec<WafAction>> {
        self.call("list_waf_actions").await?;
        let action = |id: i64, name: &str, action_type: &str| WafAction {
            id: Some(id),
            name: name.into(),
            action_type: action_type.into(),
            available_phases: Some(3),
            force_custom_values: Some(false),
            ..WafAction::default()
        };
        Ok(vec![
            action(1, "Allow", "allow"),
            action(2, "Block", "block"),
            action(3, "Log", "log"),
        ])
    }

    // ---- tags ----

    async fn list_tags(&self, params: &ListParams) -> Result<Vec<Tag>> {
        self.list("list_tags", params, |s| {
            s.tags
                .iter()
                .filter(|t| search_matches(params, &t.name))
                .cloned()
                .collect()
        })
        .await
    }

    async fn get_tag(&self, tag_id: i64) -> Result<Tag> {
        self.call("get_tag").await?;
        let s = self.store.read().await;
        s.tags
            .iter()
            .find(|t| t.id == Some(tag_id))
            .cloned()
            .ok_or_else(|| not_found(format!("/tags/{tag_id}")))
    }

    async fn create_tag(&self, tag: &Tag) -> Result<Tag> {
        self.insert("create_tag", |s| &mut s.tags, tag).await
    }

    async fn update_tag(&self, tag: &Tag) -> Result<Tag> {
        self.replace("update_tag", |s| &mut s.tags, tag).await
    }

    async fn delete_tag(&self, tag: &Tag) -> Result<()> {
        self.remove("delete_tag", |s| &mut s.tags, tag).await
    }

    async fn list_tag_cache_settings(
        &self,
        tag_id: i64,
        params: &ListParams,
    ) -> Result<Vec<CacheSetting>> {
        self.list("list_tag_cache_settings", params, |s| {
            s.tag_cache_settings
                .get(&tag_id)
                .cloned()
                .unwrap_or_default()
        })
        .await
    }

    async fn create_tag_cache_setting(
        &self,
        tag_id: i64,
        setting: &CacheSetting,
    ) -> Result<CacheSetting> {
        self.insert(
            "create_tag_cache_setting",
            |s| s.tag_cache_settings.entry(tag_id).or_default(),
            setting,
        )
        .await
    }

    async fn update_tag_cache_setting(
        &self,
        tag_id: i64,
        setting: &CacheSetting,
    ) -> Result<CacheSetting> {
        self.replace(
            "update_tag_cache_setting",
            |s| s.tag_cache_settings.entry(tag_id).or_default(),
            setting,
        )
        .await
    }

    async fn delete_tag_cache_setting(&self, tag_id: i64, setting: &CacheSetting) -> Result<()> {
        self.remove(
            "delete_tag_cache_setting",
            |s| s.tag_cache_settings.entry(tag_id).or_default(),
            setting,
        )
        .await
    }

    async fn list_tag_waf_rules(&self, tag_id: i64, params: &ListParams) -> Result<Vec<WafRule>> {
        self.list("list_tag_waf_rules", params, |s| {
            s.tag_waf_rules.get(&tag_id).cloned().unwrap_or_default()
        })
        .await
    }

    async fn create_tag_waf_rule(&self, tag_id: i64, rule: &WafRule) -> Result<WafRule> {
        let mut rule = rule.clone();
        rule.tag_id = Some(tag_id);
        rule.rule_type = Some("tag".into());
        self.insert(
            "create_tag_waf_rule",
            |s| s.tag_waf_rules.entry(tag_id).or_default(),
            &rule,
        )
        .await
    }

    async fn update_tag_waf_rule(&self, tag_id: i64, rule: &WafRule) -> Result<WafRule> {
        let mut rule = rule.clone();
        rule.tag_id = Some(tag_id);
        self.replace(
            "update_tag_waf_rule",
            |s| s.tag_waf_rules.entry(tag_id).or_default(),
            &rule,
        )
        .await
    }

    async fn delete_tag_waf_rule(&self, tag_id: i64, rule: &WafRule) -> Result<()> {
        self.remove(
            "delete_tag_waf_rule",
            |s| s.tag_waf_rules.entry(tag_id).or_default(),
            rule,
        )
        .await
    }

    async fn get_tag_settings(&self, tag_id: i64) -> Result<Settings> {
        self.call("get_tag_settings").await?;
        let s = self.store.read().await;
        Ok(s.tag_settings.get(&tag_id).cloned().unwrap_or_default())
    }

    async fn update_tag_settings(&self, tag_id: i64, settings: &Settings) -> Result<Settings> {
        self.call("update_tag_settings").await?;
        let mut s = self.store.write().await;
        let slot = s.tag_settings.entry(tag_id).or_default();
        *slot = merge_settings(slot, settings)?;
        Ok(slot.clone())
    }

    async fn list_tag_information(
        &self,
        tag_id: i64,
        params: &ListParams,
    ) -> Result<Vec<TagInformation>> {
        self.list("list_tag_information", params, |s| {
            s.tag_information.get(&tag_id).cloned().unwrap_or_default()
        })
        .await
    }

    // ---- waiting rooms ----

    async fn list_waiting_rooms(
        &self,
        domain_id: i64,
        params: &ListParams,
    ) -> Result<Vec<WaitingRoom>> {
        self.list("list_waiting_rooms", params, |s| {
            s.waiting_rooms.get(&domain_id).cloned().unwrap_or_default()
        })
        .await
    }

    async fn create_waiting_room(&self, domain_id: i64, room: &WaitingRoom) -> Result<WaitingRoom> {
        self.insert(
            "create_waiting_room",
            |s| s.waiting_rooms.entry(domain_id).or_default(),
            room,
        )
        .await
    }

    async fn update_waiting_room(&self, domain_id: i64, room: &WaitingRoom) -> Result<WaitingRoom> {
        self.replace(
            "update_waiting_room",
            |s| s.waiting_rooms.entry(domain_id).or_default(),
            room,
        )
        .await
    }

    async fn delete_waiting_room(&self, domain_id: i64, room: &WaitingRoom) -> Result<()> {
        self.remove(
            "delete_waiting_room",
            |s| s.waiting_rooms.entry(domain_id).or_default(),
            room,
        )
        .await
    }

    // ---- account ----

    async fn list_api_keys(&self, params: &ListParams) -> Result<Vec<ApiKey>> {
        self.list("list_api_keys", params, |s| s.api_keys.clone()).await
    }

    /// The secret is only part of the creation response.
    async fn create_api_key(&self, key: &ApiKey) -> Result<ApiKey> {
        self.call("create_api_key").await?;
        let mut s = self.store.write().await;
        let mut created = s.stamped(key);
        let id = created.id.unwrap_or_default();
        created.key = Some(format!("key-{id}"));
        created.secret = None;
        s.api_keys.push(created.clone());
        created.secret = Some(format!("secret-{id}"));
        Ok(created)
    }

    async fn delete_api_key(&self, key: &ApiKey) -> Result<()> {
        self.remove("delete_api_key", |s| &mut s.api_keys, key).await
    }

    async fn list_ip_ranges(&self, params: &ListParams) -> Result<Vec<IpRange>> {
        self.list("list_ip_ranges", params, |s| {
            let now = s.now();
            vec![
                IpRange {
                    id: Some(1),
                    network: "185.3.232.0/22".into(),
                    valid_from: Some(now),
                    enabled: Some(true),
                    created: Some(now),
                    modified: Some(now),
                    ..IpRange::default()
                },
                IpRange {
                    id: Some(2),
                    network: "2a00:f20::/29".into(),
                    valid_from: Some(now),
                    enabled: Some(true),
                    created: Some(now),
                    modified: Some(now),
                    ..IpRange::default()
                },
            ]
        })
        .await
    }

    // ---- cache ----

    async fn prune_cache(&self, prefix: &str) {
        let mut s = self.store.write().await;
        *s.calls.entry("prune_cache").or_default() += 1;
        s.pruned.push(prefix.to_string());
    }
}
