use std::sync::LazyLock;

use async_trait::async_trait;
use myrasec_api::{ListParams, MyrasecApi, Redirect};

use crate::error::ProviderResult;
use crate::lookup::fetch_by_id;
use crate::schema::{ResourceSchema, Schema};
use crate::state::ResourceData;
use crate::translate::{parse_time, set_timestamps, set_vendor_id};

use super::cache_setting::MATCHING_TYPES;
use super::{
    ResourceHandler, existing_id, import_scoped, required_str, subdomain_name_schema,
    subdomain_scope,
};

pub(crate) const REDIRECT_TYPES: &[&str] = &["permanent", "redirect"];

pub(crate) static SCHEMA: LazyLock<ResourceSchema> = LazyLock::new(|| {
    ResourceSchema::new()
        .field("subdomain_name", subdomain_name_schema())
        .field("redirect_id", Schema::int().computed())
        .field("matching_type", Schema::string().required().one_of(MATCHING_TYPES))
        .field("source", Schema::string().required())
        .field("destination", Schema::string().required())
        .field(
            "type",
            Schema::string()
                .required()
                .one_of(REDIRECT_TYPES)
                .describe("`permanent` answers 301, `redirect` answers 302."),
        )
        .field("sort", Schema::int().optional().default(0))
        .field("enabled", Schema::bool().optional().default(true))
        .field("created", Schema::string().computed())
        .field("modified", Schema::string().computed())
});

fn build(d: &ResourceData) -> ProviderResult<Redirect> {
    Ok(Redirect {
        id: existing_id(d)?,
        redirect_type: required_str(d, "type")?,
        matching_type: required_str(d, "matching_type")?,
        source: required_str(d, "source")?,
        destination: required_str(d, "destination")?,
        sort: d.get_i64("sort"),
        enabled: d.get_bool("enabled"),
        sub_domain_name: d.get_string("subdomain_name"),
        modified: parse_time(d, "modified")?,
        ..Redirect::default()
    })
}

pub(crate) fn set(d: &mut ResourceData, r: &Redirect) {
    set_vendor_id(d, "redirect_id", r.id);
    d.set("matching_type", r.matching_type.clone());
    d.set("source", r.source.clone());
    d.set("destination", r.destination.clone());
    d.set("type", r.redirect_type.clone());
    d.set_opt("sort", r.sort);
    d.set_opt("enabled", r.enabled);
    set_timestamps(d, r.created.as_ref(), r.modified.as_ref());
}

pub struct RedirectResource;

#[async_trait]
impl ResourceHandler for RedirectResource {
    fn name(&self) -> &'static str {
        "myrasec_redirect"
    }

    fn schema(&self) -> &'static ResourceSchema {
        &SCHEMA
    }

    async fn create(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let scope = subdomain_scope(api, d).await?;
        let redirect = build(d)?;
        log::debug!(
            "[redirect] create {} -> {} on {}",
            redirect.source,
            redirect.destination,
            scope.name
        );
        let created = api
            .create_redirect(scope.domain_id, &scope.name, &redirect)
            .await?;
        set(d, &created);
        Ok(())
    }

    async fn read(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let scope = subdomain_scope(api, d).await?;
        let id = d.id_i64()?;
        let redirect = fetch_by_id(
            ListParams::default(),
            |p| {
                let scope = &scope;
                async move { api.list_redirects(scope.domain_id, &scope.name, &p).await }
            },
            id,
            "redirect",
        )
        .await?;
        d.set("subdomain_name", scope.name);
        set(d, &redirect);
        Ok(())
    }

    async fn update(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let scope = subdomain_scope(api, d).await?;
        let redirect = build(d)?;
        let updated = api
            .update_redirect(scope.domain_id, &scope.name, &redirect)
            .await?;
        set(d, &updated);
        Ok(())
    }

    async fn delete(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let scope = subdomain_scope(api, d).await?;
        let redirect = build(d)?;
        api.delete_redirect(scope.domain_id, &scope.name, &redirect)
            .await?;
        Ok(())
    }

    async fn import(&self, api: &dyn MyrasecApi, id: &str) -> ProviderResult<ResourceData> {
        import_scoped(self, api, id, "subdomain_name").await
    }
}
