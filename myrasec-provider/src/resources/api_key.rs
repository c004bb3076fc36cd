use std::sync::LazyLock;

use async_trait::async_trait;
use myrasec_api::{ApiKey, ListParams, MyrasecApi};
use serde_json::Map;

use crate::error::ProviderResult;
use crate::import_id::parse_numeric_id;
use crate::lookup::fetch_by_id;
use crate::schema::{ResourceSchema, Schema};
use crate::state::ResourceData;
use crate::translate::{parse_time, set_timestamps, set_vendor_id};

use super::{ResourceHandler, existing_id, required_str};

pub(crate) static SCHEMA: LazyLock<ResourceSchema> = LazyLock::new(|| {
    ResourceSchema::new()
        .field("key_id", Schema::int().computed())
        .field("name", Schema::string().required().force_new())
        .field("key", Schema::string().computed())
        .field(
            "secret",
            Schema::string()
                .computed()
                .sensitive()
                .describe("Only known right after creation."),
        )
        .field("created", Schema::string().computed())
        .field("modified", Schema::string().computed())
});

fn build(d: &ResourceData) -> ProviderResult<ApiKey> {
    Ok(ApiKey {
        id: existing_id(d)?,
        name: required_str(d, "name")?,
        key: d.get_string("key"),
        modified: parse_time(d, "modified")?,
        ..ApiKey::default()
    })
}

/// The vendor never repeats the secret, so a missing one keeps the stored value.
pub(crate) fn set(d: &mut ResourceData, k: &ApiKey) {
    set_vendor_id(d, "key_id", k.id);
    d.set("name", k.name.clone());
    d.set_opt("key", k.key.clone());
    if let Some(secret) = &k.secret {
        d.set("secret", secret.clone());
    }
    set_timestamps(d, k.created.as_ref(), k.modified.as_ref());
}

pub struct ApiKeyResource;

#[async_trait]
impl ResourceHandler for ApiKeyResource {
    fn name(&self) -> &'static str {
        "myrasec_api_key"
    }

    fn schema(&self) -> &'static ResourceSchema {
        &SCHEMA
    }

    fn supports_update(&self) -> bool {
        false
    }

    async fn create(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let key = build(d)?;
        log::debug!("[api_key] create '{}'", key.name);
        let created = api.create_api_key(&key).await?;
        set(d, &created);
        Ok(())
    }

    async fn read(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let id = d.id_i64()?;
        let key = fetch_by_id(
            ListParams::default(),
            |p| async move { api.list_api_keys(&p).await },
            id,
            "API key",
        )
        .await?;
        set(d, &key);
        Ok(())
    }

    async fn delete(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let key = build(d)?;
        api.delete_api_key(&key).await?;
        Ok(())
    }

    /// `<key id>`
    async fn import(&self, api: &dyn MyrasecApi, id: &str) -> ProviderResult<ResourceData> {
        let key_id = parse_numeric_id(id)?;
        let mut d = ResourceData::from_state(&SCHEMA, key_id.to_string(), Map::new());
        self.read(api, &mut d).await?;
        Ok(d)
    }
}
