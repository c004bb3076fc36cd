//! Resource handlers
//!
//! One handler per orchestrator resource type. Each pairs a schema with a
//! build (state → vendor object) and set-back (vendor object → state)
//! function and binds them to the vendor endpoints.

pub(crate) mod api_key;
pub(crate) mod cache_setting;
pub(crate) mod dns_record;
pub(crate) mod domain;
pub(crate) mod error_page;
pub(crate) mod ip_filter;
pub(crate) mod maintenance;
pub(crate) mod maintenance_template;
pub(crate) mod ratelimit;
pub(crate) mod redirect;
pub(crate) mod settings;
pub(crate) mod ssl_certificate;
pub(crate) mod tag;
pub(crate) mod tag_cache_setting;
pub(crate) mod tag_settings;
pub(crate) mod tag_waf_rule;
pub(crate) mod waf;
pub(crate) mod waf_rule;
pub(crate) mod waiting_room;

use std::sync::Arc;

use async_trait::async_trait;
use myrasec_api::{ApiError, MyrasecApi};
use serde_json::{Map, Value};

use crate::error::{ProviderError, ProviderResult};
use crate::import_id::{parse_import_id, parse_numeric_id};
use crate::lookup::SubdomainScope;
use crate::names::canonical_name;
use crate::schema::{Diff, ResourceSchema, Schema};
use crate::state::ResourceData;

pub use api_key::ApiKeyResource;
pub use cache_setting::CacheSettingResource;
pub use dns_record::DnsRecordResource;
pub use domain::DomainResource;
pub use error_page::ErrorPageResource;
pub use ip_filter::IpFilterResource;
pub use maintenance::MaintenanceResource;
pub use maintenance_template::MaintenanceTemplateResource;
pub use ratelimit::RateLimitResource;
pub use redirect::RedirectResource;
pub use settings::SettingsResource;
pub use ssl_certificate::SslCertificateResource;
pub use tag::TagResource;
pub use tag_cache_setting::TagCacheSettingResource;
pub use tag_settings::TagSettingsResource;
pub use tag_waf_rule::TagWafRuleResource;
pub use waf_rule::WafRuleResource;
pub use waiting_room::WaitingRoomResource;

/// Resource handler trait
///
/// `create`, `read` and `update` finish with a set-back into `d`; `read`
/// reports a vanished object as [`ProviderError::EntityNotFound`].
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    /// Orchestrator type name, e.g. `myrasec_dns_record`.
    fn name(&self) -> &'static str;

    fn schema(&self) -> &'static ResourceSchema;

    /// Without update support every change recreates the object.
    fn supports_update(&self) -> bool {
        true
    }

    async fn create(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()>;

    async fn read(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()>;

    async fn update(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let _ = (api, d);
        Err(ApiError::Unsupported {
            operation: format!("update {}", self.name()),
        }
        .into())
    }

    async fn delete(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()>;

    /// Build state from an import id and read the object.
    async fn import(&self, api: &dyn MyrasecApi, id: &str) -> ProviderResult<ResourceData>;

    /// Plan-time hook; may reject the change or adjust replacement flags.
    fn customize_diff(
        &self,
        prior: Option<&Map<String, Value>>,
        diff: &mut Diff,
    ) -> ProviderResult<()> {
        let _ = (prior, diff);
        Ok(())
    }
}

/// Every resource handler.
pub fn all() -> Vec<Arc<dyn ResourceHandler>> {
    vec![
        Arc::new(DomainResource),
        Arc::new(DnsRecordResource),
        Arc::new(SettingsResource),
        Arc::new(CacheSettingResource),
        Arc::new(RedirectResource),
        Arc::new(RateLimitResource),
        Arc::new(IpFilterResource),
        Arc::new(MaintenanceResource),
        Arc::new(MaintenanceTemplateResource),
        Arc::new(ErrorPageResource),
        Arc::new(SslCertificateResource),
        Arc::new(WafRuleResource),
        Arc::new(TagResource),
        Arc::new(TagCacheSettingResource),
        Arc::new(TagWafRuleResource),
        Arc::new(TagSettingsResource),
        Arc::new(WaitingRoomResource),
        Arc::new(ApiKeyResource),
    ]
}

/// `<scope>:<id>` import: seed the scope attribute and read.
pub(crate) async fn import_scoped<H>(
    handler: &H,
    api: &dyn MyrasecApi,
    id: &str,
    scope_key: &str,
) -> ProviderResult<ResourceData>
where
    H: ResourceHandler + ?Sized,
{
    let (scope, entity_id) = parse_import_id(id)?;
    let mut state = Map::new();
    state.insert(scope_key.to_string(), Value::String(scope));
    let mut d = ResourceData::from_state(handler.schema(), entity_id.to_string(), state);
    handler.read(api, &mut d).await?;
    Ok(d)
}

/// `<tag id>:<id>` import: seed `tag_id` and read.
pub(crate) async fn import_tag_scoped<H>(
    handler: &H,
    api: &dyn MyrasecApi,
    id: &str,
) -> ProviderResult<ResourceData>
where
    H: ResourceHandler + ?Sized,
{
    let (scope, entity_id) = parse_import_id(id)?;
    let tag_id = parse_numeric_id(&scope)?;
    let mut state = Map::new();
    state.insert("tag_id".to_string(), Value::from(tag_id));
    let mut d = ResourceData::from_state(handler.schema(), entity_id.to_string(), state);
    handler.read(api, &mut d).await?;
    Ok(d)
}

/// `tag_id` attribute of tag scoped resources.
pub(crate) fn tag_id_schema() -> Schema {
    Schema::int()
        .required()
        .force_new()
        .describe("Tag the object belongs to.")
}

/// `subdomain_name` attribute of subdomain scoped resources.
pub(crate) fn subdomain_name_schema() -> Schema {
    Schema::string()
        .required()
        .force_new()
        .normalize(canonical_name)
        .describe("Subdomain the object belongs to.")
}

/// Resolve the subdomain scope stored in `d`.
pub(crate) async fn subdomain_scope(
    api: &dyn MyrasecApi,
    d: &ResourceData,
) -> ProviderResult<SubdomainScope> {
    SubdomainScope::resolve(api, &required_str(d, "subdomain_name")?).await
}

/// Required attribute that the schema already guarantees.
pub(crate) fn required_str(d: &ResourceData, key: &str) -> ProviderResult<String> {
    d.get_str(key)
        .map(str::to_string)
        .ok_or_else(|| ProviderError::parse(key, "value is required"))
}

pub(crate) fn required_i64(d: &ResourceData, key: &str) -> ProviderResult<i64> {
    d.get_i64(key)
        .ok_or_else(|| ProviderError::parse(key, "value is required"))
}

/// Vendor id of the object in `d`, `None` before creation.
pub(crate) fn existing_id(d: &ResourceData) -> ProviderResult<Option<i64>> {
    if d.id().is_empty() {
        Ok(None)
    } else {
        d.id_i64().map(Some)
    }
}
