use std::sync::LazyLock;

use async_trait::async_trait;
use myrasec_api::{ListParams, MAINTENANCE_PAGE_SIZE, MaintenanceTemplate, MyrasecApi};

use crate::content_hash::{CONTENT, set_content, with_content_fields};
use crate::error::ProviderResult;
use crate::lookup::{fetch_by_id, resolve_domain_id};
use crate::names::canonical_name;
use crate::schema::{ResourceSchema, Schema};
use crate::state::ResourceData;
use crate::throttle::settle;
use crate::translate::{parse_time, set_timestamps, set_vendor_id};

use super::{ResourceHandler, existing_id, import_scoped, required_str};

pub(crate) static SCHEMA: LazyLock<ResourceSchema> = LazyLock::new(|| {
    with_content_fields(
        ResourceSchema::new()
            .field(
                "domain_name",
                Schema::string()
                    .required()
                    .force_new()
                    .normalize(canonical_name),
            )
            .field("template_id", Schema::int().computed())
            .field("name", Schema::string().required())
            .field("created", Schema::string().computed())
            .field("modified", Schema::string().computed()),
    )
});

fn build(d: &ResourceData) -> ProviderResult<MaintenanceTemplate> {
    Ok(MaintenanceTemplate {
        id: existing_id(d)?,
        name: required_str(d, "name")?,
        content: d.get_str(CONTENT).unwrap_or_default().to_string(),
        modified: parse_time(d, "modified")?,
        ..MaintenanceTemplate::default()
    })
}

pub(crate) fn set(d: &mut ResourceData, t: &MaintenanceTemplate) {
    set_vendor_id(d, "template_id", t.id);
    d.set("name", t.name.clone());
    set_content(d, &t.content);
    set_timestamps(d, t.created.as_ref(), t.modified.as_ref());
}

pub struct MaintenanceTemplateResource;

#[async_trait]
impl ResourceHandler for MaintenanceTemplateResource {
    fn name(&self) -> &'static str {
        "myrasec_maintenance_template"
    }

    fn schema(&self) -> &'static ResourceSchema {
        &SCHEMA
    }

    async fn create(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let domain_id = resolve_domain_id(api, &required_str(d, "domain_name")?).await?;
        let template = build(d)?;
        settle().await;
        log::debug!("[maintenance_template] create {}", template.name);
        let created = api
            .create_maintenance_template(domain_id, &template)
            .await?;
        set(d, &created);
        Ok(())
    }

    async fn read(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let domain_id = resolve_domain_id(api, &required_str(d, "domain_name")?).await?;
        let id = d.id_i64()?;
        let template = fetch_by_id(
            ListParams::with_page_size(MAINTENANCE_PAGE_SIZE),
            |p| async move { api.list_maintenance_templates(domain_id, &p).await },
            id,
            "maintenance template",
        )
        .await?;
        set(d, &template);
        Ok(())
    }

    async fn update(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let domain_id = resolve_domain_id(api, &required_str(d, "domain_name")?).await?;
        let template = build(d)?;
        settle().await;
        let updated = api
            .update_maintenance_template(domain_id, &template)
            .await?;
        set(d, &updated);
        Ok(())
    }

    async fn delete(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let domain_id = resolve_domain_id(api, &required_str(d, "domain_name")?).await?;
        let template = build(d)?;
        api.delete_maintenance_template(domain_id, &template)
            .await?;
        Ok(())
    }

    async fn import(&self, api: &dyn MyrasecApi, id: &str) -> ProviderResult<ResourceData> {
        import_scoped(self, api, id, "domain_name").await
    }
}
