use std::sync::LazyLock;

use async_trait::async_trait;
use myrasec_api::{ListParams, MyrasecApi};

use crate::error::ProviderResult;
use crate::lookup::fetch_by_id;
use crate::schema::ResourceSchema;
use crate::state::ResourceData;

use super::cache_setting::{build, set, with_cache_fields};
use super::{ResourceHandler, import_tag_scoped, required_i64, tag_id_schema};

pub(crate) static SCHEMA: LazyLock<ResourceSchema> =
    LazyLock::new(|| with_cache_fields(ResourceSchema::new().field("tag_id", tag_id_schema())));

pub struct TagCacheSettingResource;

#[async_trait]
impl ResourceHandler for TagCacheSettingResource {
    fn name(&self) -> &'static str {
        "myrasec_tag_cache_setting"
    }

    fn schema(&self) -> &'static ResourceSchema {
        &SCHEMA
    }

    async fn create(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let tag_id = required_i64(d, "tag_id")?;
        let setting = build(d)?;
        log::debug!("[tag_cache_setting] create {} on tag {tag_id}", setting.path);
        let created = api.create_tag_cache_setting(tag_id, &setting).await?;
        set(d, &created);
        Ok(())
    }

    async fn read(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let tag_id = required_i64(d, "tag_id")?;
        let id = d.id_i64()?;
        let setting = fetch_by_id(
            ListParams::default(),
            |p| async move { api.list_tag_cache_settings(tag_id, &p).await },
            id,
            "tag cache setting",
        )
        .await?;
        set(d, &setting);
        Ok(())
    }

    async fn update(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let tag_id = required_i64(d, "tag_id")?;
        let setting = build(d)?;
        let updated = api.update_tag_cache_setting(tag_id, &setting).await?;
        set(d, &updated);
        Ok(())
    }

    async fn delete(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let tag_id = required_i64(d, "tag_id")?;
        let setting = build(d)?;
        api.delete_tag_cache_setting(tag_id, &setting).await?;
        Ok(())
    }

    async fn import(&self, api: &dyn MyrasecApi, id: &str) -> ProviderResult<ResourceData> {
        import_tag_scoped(self, api, id).await
    }
}
