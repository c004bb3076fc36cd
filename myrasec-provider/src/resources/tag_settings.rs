//! Tag settings are a partial overlay: only configured keys are sent and
//! read back.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use async_trait::async_trait;
use myrasec_api::{MyrasecApi, Settings};
use serde_json::{Map, Value};

use crate::error::ProviderResult;
use crate::import_id::parse_numeric_id;
use crate::schema::ResourceSchema;
use crate::state::ResourceData;

use super::settings::{FIELDS, build, field_schema, set};
use super::{ResourceHandler, required_i64, tag_id_schema};

pub(crate) static SCHEMA: LazyLock<ResourceSchema> = LazyLock::new(|| {
    FIELDS.iter().fold(
        ResourceSchema::new().field("tag_id", tag_id_schema()),
        |schema, &(name, kind)| schema.field(name, field_schema(name, kind).optional()),
    )
});

pub struct TagSettingsResource;

impl TagSettingsResource {
    async fn write(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let tag_id = required_i64(d, "tag_id")?;
        let settings = build(d, true)?;
        log::debug!("[tag_settings] update tag {tag_id}");
        let updated = api.update_tag_settings(tag_id, &settings).await?;
        d.set_id(tag_id);
        set_configured(d, &updated)
    }

    async fn fetch(&self, api: &dyn MyrasecApi, d: &ResourceData) -> ProviderResult<Settings> {
        let tag_id = match d.get_i64("tag_id") {
            Some(id) => id,
            None => d.id_i64()?,
        };
        Ok(api.get_tag_settings(tag_id).await?)
    }
}

/// Set back only the keys the configuration carries.
fn set_configured(d: &mut ResourceData, settings: &Settings) -> ProviderResult<()> {
    let configured: BTreeSet<&str> = FIELDS
        .iter()
        .map(|&(name, _)| name)
        .filter(|name| d.is_configured(name))
        .collect();
    set(d, settings, Some(&|name: &str| configured.contains(name)))
}

#[async_trait]
impl ResourceHandler for TagSettingsResource {
    fn name(&self) -> &'static str {
        "myrasec_tag_settings"
    }

    fn schema(&self) -> &'static ResourceSchema {
        &SCHEMA
    }

    async fn create(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        self.write(api, d).await
    }

    async fn read(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let settings = self.fetch(api, d).await?;
        set_configured(d, &settings)
    }

    async fn update(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        self.write(api, d).await
    }

    /// Clears the overlay.
    async fn delete(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let tag_id = required_i64(d, "tag_id")?;
        api.update_tag_settings(tag_id, &Settings::default()).await?;
        Ok(())
    }

    /// `<tag id>`; nothing is configured yet, so every key is read.
    async fn import(&self, api: &dyn MyrasecApi, id: &str) -> ProviderResult<ResourceData> {
        let tag_id = parse_numeric_id(id)?;
        let mut state = Map::new();
        state.insert("tag_id".into(), Value::from(tag_id));
        let mut d = ResourceData::from_state(&SCHEMA, tag_id.to_string(), state);
        let settings = self.fetch(api, &d).await?;
        set(&mut d, &settings, None)?;
        Ok(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockMyrasecApi, config};
    use serde_json::json;

    #[tokio::test]
    async fn only_configured_keys_are_sent_and_read() {
        let api = MockMyrasecApi::new();
        let tag = api.seed_tag("cfg", "CONFIG").await;
        api.update_tag_settings(tag, &Settings {
            spdy: Some(false),
            ..Settings::default()
        })
        .await
        .unwrap();

        let mut d = ResourceData::for_create(
            &SCHEMA,
            &config(json!({"tag_id": tag, "cdn": true})),
        );
        TagSettingsResource.create(&api, &mut d).await.unwrap();

        assert_eq!(d.id(), tag.to_string());
        assert_eq!(d.get_bool("cdn"), Some(true));
        assert_eq!(d.get("spdy"), None);

        let stored = api.get_tag_settings(tag).await.unwrap();
        assert_eq!(stored.cdn, Some(true));
        assert_eq!(stored.spdy, Some(false));
    }

    #[tokio::test]
    async fn import_reads_all_present_keys() {
        let api = MockMyrasecApi::new();
        let tag = api.seed_tag("cfg", "CONFIG").await;
        api.update_tag_settings(tag, &Settings {
            hsts: Some(true),
            ..Settings::default()
        })
        .await
        .unwrap();

        let d = TagSettingsResource
            .import(&api, &tag.to_string())
            .await
            .unwrap();
        assert_eq!(d.get_bool("hsts"), Some(true));
        assert_eq!(d.get_i64("tag_id"), Some(tag));
    }
}
