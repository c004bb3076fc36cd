//! Subdomain settings
//!
//! The settings object always exists on the vendor side. Create and update
//! send the full overlay, read writes every field back, and delete restores
//! the defaults with a single update.

use std::sync::LazyLock;

use async_trait::async_trait;
use myrasec_api::{MyrasecApi, Settings};
use serde_json::{Map, Value};

use crate::error::{ProviderError, ProviderResult};
use crate::import_id::parse_scope_only;
use crate::lookup::SubdomainScope;
use crate::names::canonical_name;
use crate::schema::{ResourceSchema, Schema};
use crate::state::ResourceData;

use super::{ResourceHandler, subdomain_name_schema, subdomain_scope};

// ==================== Field table ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Kind {
    Bool,
    Int,
    Str,
    Set,
}

/// Every settings attribute, keyed by its vendor name.
pub(crate) const FIELDS: &[(&str, Kind)] = &[
    ("access_log", Kind::Bool),
    ("antibot_post_flood", Kind::Bool),
    ("antibot_post_flood_threshold", Kind::Int),
    ("antibot_proof_of_work", Kind::Bool),
    ("antibot_proof_of_work_threshold", Kind::Int),
    ("balancing_method", Kind::Str),
    ("block_not_whitelisted", Kind::Bool),
    ("block_tor_network", Kind::Bool),
    ("cache_enabled", Kind::Bool),
    ("cache_revalidate", Kind::Bool),
    ("cdn", Kind::Bool),
    ("client_max_body_size", Kind::Int),
    ("cookie_name", Kind::Str),
    ("diffie_hellman_exchange", Kind::Int),
    ("enable_origin_sni", Kind::Bool),
    ("forwarded_for_replacement", Kind::Str),
    ("host_header", Kind::Str),
    ("hsts", Kind::Bool),
    ("hsts_include_subdomains", Kind::Bool),
    ("hsts_max_age", Kind::Int),
    ("hsts_preload", Kind::Bool),
    ("http_origin_port", Kind::Int),
    ("ignore_nocache", Kind::Bool),
    ("image_optimization", Kind::Bool),
    ("ipv6_active", Kind::Bool),
    ("limit_allowed_http_method", Kind::Set),
    ("limit_tls_version", Kind::Set),
    ("log_format", Kind::Str),
    ("monitoring_alert_threshold", Kind::Int),
    ("monitoring_contact_email", Kind::Str),
    ("monitoring_send_alert", Kind::Bool),
    ("myra_ssl_header", Kind::Bool),
    ("next_upstream", Kind::Set),
    ("only_https", Kind::Bool),
    ("origin_connection_header", Kind::Str),
    ("proxy_cache_bypass", Kind::Str),
    ("proxy_cache_stale", Kind::Set),
    ("proxy_connect_timeout", Kind::Int),
    ("proxy_host_header", Kind::Str),
    ("proxy_read_timeout", Kind::Int),
    ("request_limit_block", Kind::Str),
    ("request_limit_level", Kind::Int),
    ("request_limit_report", Kind::Bool),
    ("request_limit_report_email", Kind::Str),
    ("rewrite", Kind::Bool),
    ("source_protocol", Kind::Str),
    ("spdy", Kind::Bool),
    ("ssl_origin_port", Kind::Int),
    ("waf_enable", Kind::Bool),
    ("waf_levels_enable", Kind::Set),
    ("waf_policy", Kind::Str),
];

pub(crate) const BALANCING_METHODS: &[&str] =
    &["round_robin", "ip_hash", "least_conn", "cookie_based"];
pub(crate) const REQUEST_LIMIT_BLOCKS: &[&str] = &["CAPTCHA", "HTTP429", "no"];
pub(crate) const SOURCE_PROTOCOLS: &[&str] = &["same", "http", "https"];
pub(crate) const ORIGIN_CONNECTION_HEADERS: &[&str] = &["none", "close", "upgrade"];
pub(crate) const WAF_POLICIES: &[&str] = &["allow", "block"];

/// Base schema of one settings attribute, without presence modifiers.
pub(crate) fn field_schema(name: &str, kind: Kind) -> Schema {
    let schema = match kind {
        Kind::Bool => Schema::bool(),
        Kind::Int => Schema::int(),
        Kind::Str => Schema::string(),
        Kind::Set => Schema::string_set(),
    };
    match name {
        "balancing_method" => schema.one_of(BALANCING_METHODS),
        "request_limit_block" => schema.one_of(REQUEST_LIMIT_BLOCKS),
        "source_protocol" => schema.one_of(SOURCE_PROTOCOLS),
        "origin_connection_header" => schema.one_of(ORIGIN_CONNECTION_HEADERS),
        "waf_policy" => schema.one_of(WAF_POLICIES),
        "diffie_hellman_exchange" => schema.one_of_int(&[1024, 2048]),
        "http_origin_port" | "ssl_origin_port" => schema.int_range(1, 65535),
        _ => schema,
    }
}

/// Vendor state after "delete".
pub(crate) fn defaults() -> Settings {
    let strings = |items: &[&str]| Some(items.iter().map(|s| (*s).to_string()).collect());
    Settings {
        access_log: Some(true),
        antibot_post_flood: Some(false),
        antibot_post_flood_threshold: Some(540),
        antibot_proof_of_work: Some(true),
        antibot_proof_of_work_threshold: Some(1800),
        balancing_method: Some("round_robin".into()),
        block_not_whitelisted: Some(false),
        block_tor_network: Some(false),
        cache_enabled: Some(false),
        cache_revalidate: Some(false),
        cdn: Some(false),
        client_max_body_size: Some(10),
        diffie_hellman_exchange: Some(2048),
        enable_origin_sni: Some(true),
        forwarded_for_replacement: Some("X-Forwarded-For".into()),
        hsts: Some(false),
        hsts_include_subdomains: Some(false),
        hsts_max_age: Some(31_536_000),
        hsts_preload: Some(false),
        http_origin_port: Some(80),
        ignore_nocache: Some(false),
        image_optimization: Some(true),
        ipv6_active: Some(true),
        limit_tls_version: strings(&["TLSv1", "TLSv1.1", "TLSv1.2", "TLSv1.3"]),
        log_format: Some("myra-combined-waf".into()),
        monitoring_alert_threshold: Some(300),
        monitoring_send_alert: Some(false),
        myra_ssl_header: Some(false),
        next_upstream: strings(&["error", "timeout", "invalid_header"]),
        only_https: Some(false),
        origin_connection_header: Some("none".into()),
        proxy_cache_stale: strings(&["updating"]),
        proxy_connect_timeout: Some(60),
        proxy_read_timeout: Some(600),
        request_limit_block: Some("CAPTCHA".into()),
        request_limit_level: Some(6000),
        request_limit_report: Some(false),
        rewrite: Some(false),
        source_protocol: Some("same".into()),
        spdy: Some(true),
        ssl_origin_port: Some(443),
        waf_enable: Some(false),
        waf_levels_enable: strings(&["waf_tag", "waf_domain", "waf_subdomain"]),
        waf_policy: Some("allow".into()),
        ..Settings::default()
    }
}

// ==================== Build / set-back ====================

/// Settings from the attributes in `d`.
///
/// With `only_configured` the overlay carries just the keys the user sets.
pub(crate) fn build(d: &ResourceData, only_configured: bool) -> ProviderResult<Settings> {
    let mut overlay = Map::new();
    for &(name, _) in FIELDS {
        if only_configured && !d.is_configured(name) {
            continue;
        }
        if let Some(value) = d.get(name).filter(|v| !v.is_null()) {
            overlay.insert(name.to_string(), value.clone());
        }
    }
    serde_json::from_value(Value::Object(overlay))
        .map_err(|e| ProviderError::parse("settings", e))
}

/// Settings as attribute map; unset fields are absent.
pub(crate) fn values(settings: &Settings) -> ProviderResult<Map<String, Value>> {
    match serde_json::to_value(settings) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ProviderError::parse(
            "settings",
            format!("unexpected settings shape: {other}"),
        )),
        Err(e) => Err(ProviderError::parse("settings", e)),
    }
}

/// Write settings back; `only` restricts which keys are touched.
pub(crate) fn set(
    d: &mut ResourceData,
    settings: &Settings,
    only: Option<&dyn Fn(&str) -> bool>,
) -> ProviderResult<()> {
    let mut values = values(settings)?;
    for &(name, _) in FIELDS {
        if only.is_some_and(|keep| !keep(name)) {
            continue;
        }
        d.set_opt(name, values.remove(name));
    }
    Ok(())
}

// ==================== Resource ====================

pub(crate) static SCHEMA: LazyLock<ResourceSchema> = LazyLock::new(|| {
    FIELDS.iter().fold(
        ResourceSchema::new().field("subdomain_name", subdomain_name_schema()),
        |schema, &(name, kind)| schema.field(name, field_schema(name, kind).optional().computed()),
    )
});

pub struct SettingsResource;

impl SettingsResource {
    async fn write(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let scope = subdomain_scope(api, d).await?;
        let settings = build(d, false)?;
        log::debug!("[settings] update {}", scope.name);
        let updated = api
            .update_settings(scope.domain_id, &scope.name, &settings)
            .await?;
        d.set_id(&scope.name);
        d.set("subdomain_name", scope.name.clone());
        set(d, &updated, None)
    }
}

#[async_trait]
impl ResourceHandler for SettingsResource {
    fn name(&self) -> &'static str {
        "myrasec_settings"
    }

    fn schema(&self) -> &'static ResourceSchema {
        &SCHEMA
    }

    async fn create(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        self.write(api, d).await
    }

    async fn read(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let name = match d.get_string("subdomain_name") {
            Some(name) => name,
            None => d.id().to_string(),
        };
        let scope = SubdomainScope::resolve(api, &name).await?;
        let settings = api.get_settings(scope.domain_id, &scope.name).await?;
        d.set_id(&scope.name);
        d.set("subdomain_name", scope.name);
        set(d, &settings, None)
    }

    async fn update(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        self.write(api, d).await
    }

    async fn delete(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let scope = subdomain_scope(api, d).await?;
        log::debug!("[settings] restore defaults of {}", scope.name);
        api.update_settings(scope.domain_id, &scope.name, &defaults())
            .await?;
        Ok(())
    }

    /// `<subdomain>`
    async fn import(&self, api: &dyn MyrasecApi, id: &str) -> ProviderResult<ResourceData> {
        let name = parse_scope_only(id)?;
        let mut state = Map::new();
        state.insert("subdomain_name".into(), Value::String(canonical_name(&name)));
        let mut d = ResourceData::from_state(&SCHEMA, canonical_name(&name), state);
        self.read(api, &mut d).await?;
        Ok(d)
    }
}
