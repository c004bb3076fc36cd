use std::sync::LazyLock;

use async_trait::async_trait;
use myrasec_api::{CacheSetting, ListParams, MyrasecApi};

use crate::error::ProviderResult;
use crate::lookup::fetch_by_id;
use crate::schema::{ResourceSchema, Schema};
use crate::state::ResourceData;
use crate::translate::{parse_time, set_timestamps, set_vendor_id};

use super::{
    ResourceHandler, existing_id, import_scoped, required_str, subdomain_name_schema,
    subdomain_scope,
};

pub(crate) const MATCHING_TYPES: &[&str] = &["exact", "prefix", "suffix"];

/// Cache rule fields shared with tag cache settings.
pub(crate) fn with_cache_fields(schema: ResourceSchema) -> ResourceSchema {
    schema
        .field("setting_id", Schema::int().computed())
        .field(
            "type",
            Schema::string()
                .required()
                .one_of(MATCHING_TYPES)
                .describe("How `path` is matched."),
        )
        .field("path", Schema::string().required())
        .field("ttl", Schema::int().required().int_range(0, i64::MAX))
        .field("not_found_ttl", Schema::int().optional().default(60))
        .field("sort", Schema::int().optional().default(0))
        .field("enabled", Schema::bool().optional().default(true))
        .field("enforce", Schema::bool().optional().default(false))
        .field("created", Schema::string().computed())
        .field("modified", Schema::string().computed())
}

pub(crate) static SCHEMA: LazyLock<ResourceSchema> = LazyLock::new(|| {
    with_cache_fields(ResourceSchema::new().field("subdomain_name", subdomain_name_schema()))
});

pub(crate) fn build(d: &ResourceData) -> ProviderResult<CacheSetting> {
    Ok(CacheSetting {
        id: existing_id(d)?,
        setting_type: required_str(d, "type")?,
        path: required_str(d, "path")?,
        ttl: d.get_i64("ttl"),
        not_found_ttl: d.get_i64("not_found_ttl"),
        sort: d.get_i64("sort"),
        enabled: d.get_bool("enabled"),
        enforce: d.get_bool("enforce"),
        modified: parse_time(d, "modified")?,
        ..CacheSetting::default()
    })
}

pub(crate) fn set(d: &mut ResourceData, s: &CacheSetting) {
    set_vendor_id(d, "setting_id", s.id);
    d.set("type", s.setting_type.clone());
    d.set("path", s.path.clone());
    d.set_opt("ttl", s.ttl);
    d.set_opt("not_found_ttl", s.not_found_ttl);
    d.set_opt("sort", s.sort);
    d.set_opt("enabled", s.enabled);
    d.set_opt("enforce", s.enforce);
    set_timestamps(d, s.created.as_ref(), s.modified.as_ref());
}

pub struct CacheSettingResource;

#[async_trait]
impl ResourceHandler for CacheSettingResource {
    fn name(&self) -> &'static str {
        "myrasec_cache_setting"
    }

    fn schema(&self) -> &'static ResourceSchema {
        &SCHEMA
    }

    async fn create(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let scope = subdomain_scope(api, d).await?;
        let setting = build(d)?;
        log::debug!("[cache_setting] create {} on {}", setting.path, scope.name);
        let created = api
            .create_cache_setting(scope.domain_id, &scope.name, &setting)
            .await?;
        set(d, &created);
        Ok(())
    }

    async fn read(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let scope = subdomain_scope(api, d).await?;
        let id = d.id_i64()?;
        let setting = fetch_by_id(
            ListParams::default(),
            |p| {
                let scope = &scope;
                async move {
                    api.list_cache_settings(scope.domain_id, &scope.name, &p)
                        .await
                }
            },
            id,
            "cache setting",
        )
        .await?;
        d.set("subdomain_name", scope.name);
        set(d, &setting);
        Ok(())
    }

    async fn update(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let scope = subdomain_scope(api, d).await?;
        let setting = build(d)?;
        let updated = api
            .update_cache_setting(scope.domain_id, &scope.name, &setting)
            .await?;
        set(d, &updated);
        Ok(())
    }

    async fn delete(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let scope = subdomain_scope(api, d).await?;
        let setting = build(d)?;
        log::debug!("[cache_setting] delete {:?} on {}", setting.id, scope.name);
        api.delete_cache_setting(scope.domain_id, &scope.name, &setting)
            .await?;
        Ok(())
    }

    async fn import(&self, api: &dyn MyrasecApi, id: &str) -> ProviderResult<ResourceData> {
        import_scoped(self, api, id, "subdomain_name").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockMyrasecApi, config};
    use serde_json::json;

    #[tokio::test]
    async fn create_applies_schema_defaults() {
        let api = MockMyrasecApi::new();
        api.seed_subdomain(1, "example.com", "www.example.com").await;

        let mut d = ResourceData::for_create(
            &SCHEMA,
            &config(json!({
                "subdomain_name": "WWW.example.com.",
                "type": "prefix",
                "path": "/static",
                "ttl": 3600
            })),
        );
        CacheSettingResource.create(&api, &mut d).await.unwrap();

        assert_eq!(d.get_i64("not_found_ttl"), Some(60));
        assert_eq!(d.get_bool("enforce"), Some(false));
        assert_eq!(d.get_i64("setting_id"), Some(d.id_i64().unwrap()));
    }

    #[tokio::test]
    async fn target_on_second_page_is_found() {
        let api = MockMyrasecApi::new();
        let scope = api.seed_subdomain(1, "example.com", "www.example.com").await;
        let ids = api.seed_cache_settings(&scope, 260).await;

        let id = format!("www.example.com:{}", ids[255]);
        let d = CacheSettingResource.import(&api, &id).await.unwrap();
        assert_eq!(d.id_i64().unwrap(), ids[255]);
        assert_eq!(api.call_count("list_cache_settings").await, 2);
    }
}
