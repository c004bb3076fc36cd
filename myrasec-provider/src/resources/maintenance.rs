use std::sync::LazyLock;

use async_trait::async_trait;
use myrasec_api::{ListParams, MAINTENANCE_PAGE_SIZE, Maintenance, MyrasecApi};

use crate::content_hash::{CONTENT, set_content, with_content_fields};
use crate::error::{ProviderError, ProviderResult};
use crate::lookup::fetch_by_id;
use crate::schema::{ResourceSchema, Schema};
use crate::state::ResourceData;
use crate::throttle::settle;
use crate::translate::{parse_time, set_time, set_timestamps, set_vendor_id};

use super::{
    ResourceHandler, existing_id, import_scoped, subdomain_name_schema, subdomain_scope,
};

pub(crate) static SCHEMA: LazyLock<ResourceSchema> = LazyLock::new(|| {
    with_content_fields(
        ResourceSchema::new()
            .field("subdomain_name", subdomain_name_schema())
            .field("maintenance_id", Schema::int().computed())
            .field("start", Schema::string().required().rfc3339())
            .field("end", Schema::string().required().rfc3339())
            .field("active", Schema::bool().computed())
            .field("created", Schema::string().computed())
            .field("modified", Schema::string().computed()),
    )
});

fn build(d: &ResourceData) -> ProviderResult<Maintenance> {
    let start = parse_time(d, "start")?;
    let end = parse_time(d, "end")?;
    if let (Some(start), Some(end)) = (start, end)
        && end <= start
    {
        return Err(ProviderError::parse("end", "must be after start"));
    }
    Ok(Maintenance {
        id: existing_id(d)?,
        fqdn: d.get_string("subdomain_name"),
        start,
        end,
        content: d.get_str(CONTENT).unwrap_or_default().to_string(),
        active: d.get_bool("active"),
        modified: parse_time(d, "modified")?,
        ..Maintenance::default()
    })
}

pub(crate) fn set(d: &mut ResourceData, m: &Maintenance) {
    set_vendor_id(d, "maintenance_id", m.id);
    set_time(d, "start", m.start.as_ref());
    set_time(d, "end", m.end.as_ref());
    set_content(d, &m.content);
    d.set_opt("active", m.active);
    set_timestamps(d, m.created.as_ref(), m.modified.as_ref());
}

pub struct MaintenanceResource;

#[async_trait]
impl ResourceHandler for MaintenanceResource {
    fn name(&self) -> &'static str {
        "myrasec_maintenance"
    }

    fn schema(&self) -> &'static ResourceSchema {
        &SCHEMA
    }

    async fn create(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let scope = subdomain_scope(api, d).await?;
        let maintenance = build(d)?;
        settle().await;
        log::debug!("[maintenance] create on {}", scope.name);
        let created = api
            .create_maintenance(scope.domain_id, &scope.name, &maintenance)
            .await?;
        set(d, &created);
        Ok(())
    }

    async fn read(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let scope = subdomain_scope(api, d).await?;
        let id = d.id_i64()?;
        let maintenance = fetch_by_id(
            ListParams::with_page_size(MAINTENANCE_PAGE_SIZE),
            |p| {
                let scope = &scope;
                async move {
                    api.list_maintenances(scope.domain_id, &scope.name, &p)
                        .await
                }
            },
            id,
            "maintenance",
        )
        .await?;
        d.set("subdomain_name", scope.name);
        set(d, &maintenance);
        Ok(())
    }

    async fn update(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let scope = subdomain_scope(api, d).await?;
        let maintenance = build(d)?;
        settle().await;
        let updated = api
            .update_maintenance(scope.domain_id, &scope.name, &maintenance)
            .await?;
        set(d, &updated);
        Ok(())
    }

    async fn delete(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let scope = subdomain_scope(api, d).await?;
        let maintenance = build(d)?;
        api.delete_maintenance(scope.domain_id, &scope.name, &maintenance)
            .await?;
        Ok(())
    }

    async fn import(&self, api: &dyn MyrasecApi, id: &str) -> ProviderResult<ResourceData> {
        import_scoped(self, api, id, "subdomain_name").await
    }
}
