use std::sync::LazyLock;

use async_trait::async_trait;
use myrasec_api::{Domain, ListParams, MyrasecApi};

use crate::error::ProviderResult;
use crate::import_id::parse_numeric_id;
use crate::lookup::{fetch_by_id, resolve_domain};
use crate::names::canonical_name;
use crate::schema::{ResourceSchema, Schema};
use crate::state::ResourceData;
use crate::translate::{parse_time, set_time, set_timestamps, set_vendor_id};

use super::{ResourceHandler, required_str};

pub(crate) static SCHEMA: LazyLock<ResourceSchema> = LazyLock::new(|| {
    ResourceSchema::new()
        .field("domain_id", Schema::int().computed())
        .field(
            "name",
            Schema::string()
                .required()
                .force_new()
                .normalize(canonical_name)
                .describe("Domain name."),
        )
        .field(
            "auto_update",
            Schema::bool()
                .optional()
                .default(true)
                .describe("Let Myra update DNS records automatically."),
        )
        .field("auto_dns", Schema::bool().optional().computed())
        .field("paused", Schema::bool().optional().computed())
        .field("paused_until", Schema::string().optional().computed().rfc3339())
        .field("created", Schema::string().computed())
        .field("modified", Schema::string().computed())
});

fn build(d: &ResourceData) -> ProviderResult<Domain> {
    Ok(Domain {
        id: super::existing_id(d)?,
        name: required_str(d, "name")?,
        auto_update: d.get_bool("auto_update"),
        auto_dns: d.get_bool("auto_dns"),
        paused: d.get_bool("paused"),
        paused_until: parse_time(d, "paused_until")?,
        modified: parse_time(d, "modified")?,
        ..Domain::default()
    })
}

pub(crate) fn set(d: &mut ResourceData, domain: &Domain) {
    set_vendor_id(d, "domain_id", domain.id);
    d.set("name", canonical_name(&domain.name));
    d.set_opt("auto_update", domain.auto_update);
    d.set_opt("auto_dns", domain.auto_dns);
    d.set_opt("paused", domain.paused);
    set_time(d, "paused_until", domain.paused_until.as_ref());
    set_timestamps(d, domain.created.as_ref(), domain.modified.as_ref());
}

pub struct DomainResource;

#[async_trait]
impl ResourceHandler for DomainResource {
    fn name(&self) -> &'static str {
        "myrasec_domain"
    }

    fn schema(&self) -> &'static ResourceSchema {
        &SCHEMA
    }

    async fn create(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let domain = build(d)?;
        log::debug!("[domain] create {}", domain.name);
        let created = api.create_domain(&domain).await?;
        set(d, &created);
        Ok(())
    }

    async fn read(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let id = d.id_i64()?;
        let domain = fetch_by_id(
            ListParams::default(),
            |p| async move { api.list_domains(&p).await },
            id,
            "domain",
        )
        .await?;
        set(d, &domain);
        Ok(())
    }

    async fn update(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let domain = build(d)?;
        log::debug!("[domain] update {} ({:?})", domain.name, domain.id);
        let updated = api.update_domain(&domain).await?;
        set(d, &updated);
        Ok(())
    }

    async fn delete(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let domain = build(d)?;
        log::debug!("[domain] delete {}", domain.name);
        api.delete_domain(&domain).await?;
        Ok(())
    }

    /// `<id>` or `<domain name>`.
    async fn import(&self, api: &dyn MyrasecApi, id: &str) -> ProviderResult<ResourceData> {
        let domain_id = match parse_numeric_id(id) {
            Ok(n) => n,
            Err(_) => resolve_domain(api, id)
                .await?
                .id
                .ok_or_else(|| crate::error::ProviderError::not_found("domain", id))?,
        };
        let mut d = ResourceData::from_state(&SCHEMA, domain_id.to_string(), serde_json::Map::new());
        self.read(api, &mut d).await?;
        Ok(d)
    }
}
