use std::sync::LazyLock;

use async_trait::async_trait;
use myrasec_api::{ErrorPage, ListParams, MyrasecApi};
use serde_json::{Map, Value};

use crate::error::ProviderResult;
use crate::import_id::parse_import_id;
use crate::lookup::{SubdomainScope, collect_pages, fetch_by_id};
use crate::names::{canonical_name, names_equal};
use crate::schema::{ResourceSchema, Schema};
use crate::state::ResourceData;
use crate::translate::{parse_time, set_timestamps, set_vendor_id};

use super::{
    ResourceHandler, existing_id, required_i64, required_str, subdomain_name_schema,
    subdomain_scope,
};

pub(crate) const ERROR_CODES: &[i64] = &[400, 405, 429, 500, 502, 503, 504, 9999];

pub(crate) static SCHEMA: LazyLock<ResourceSchema> = LazyLock::new(|| {
    ResourceSchema::new()
        .field("subdomain_name", subdomain_name_schema())
        .field("error_page_id", Schema::int().computed())
        .field(
            "error_code",
            Schema::int()
                .required()
                .force_new()
                .one_of_int(ERROR_CODES)
                .describe("HTTP status the page is served for. 9999 covers every other error."),
        )
        .field("content", Schema::string().required())
        .field("created", Schema::string().computed())
        .field("modified", Schema::string().computed())
});

fn build(d: &ResourceData) -> ProviderResult<ErrorPage> {
    Ok(ErrorPage {
        id: existing_id(d)?,
        sub_domain_name: required_str(d, "subdomain_name")?,
        error_code: required_i64(d, "error_code")?,
        content: required_str(d, "content")?,
        modified: parse_time(d, "modified")?,
        ..ErrorPage::default()
    })
}

pub(crate) fn set(d: &mut ResourceData, p: &ErrorPage) {
    set_vendor_id(d, "error_page_id", p.id);
    d.set("subdomain_name", canonical_name(&p.sub_domain_name));
    d.set("error_code", p.error_code);
    d.set("content", p.content.clone());
    set_timestamps(d, p.created.as_ref(), p.modified.as_ref());
}

fn errorpages_prefix(domain_id: i64) -> String {
    format!("/domain/{domain_id}/errorpages")
}

async fn list_all(api: &dyn MyrasecApi, domain_id: i64) -> ProviderResult<Vec<ErrorPage>> {
    collect_pages(ListParams::default(), |p| async move {
        api.list_error_pages(domain_id, &p).await
    })
    .await
}

pub struct ErrorPageResource;

#[async_trait]
impl ResourceHandler for ErrorPageResource {
    fn name(&self) -> &'static str {
        "myrasec_error_page"
    }

    fn schema(&self) -> &'static ResourceSchema {
        &SCHEMA
    }

    async fn create(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let scope = subdomain_scope(api, d).await?;
        let mut page = build(d)?;
        page.sub_domain_name.clone_from(&scope.name);
        log::debug!("[error_page] create {} on {}", page.error_code, scope.name);
        let created = api.create_error_page(scope.domain_id, &page).await?;
        api.prune_cache(&errorpages_prefix(scope.domain_id)).await;
        set(d, &created);
        Ok(())
    }

    async fn read(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let scope = subdomain_scope(api, d).await?;
        let id = d.id_i64()?;
        let domain_id = scope.domain_id;
        let page = fetch_by_id(
            ListParams::default(),
            |p| async move { api.list_error_pages(domain_id, &p).await },
            id,
            "error page",
        )
        .await?;
        set(d, &page);
        Ok(())
    }

    async fn update(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let scope = subdomain_scope(api, d).await?;
        let page = build(d)?;
        let updated = api.update_error_page(scope.domain_id, &page).await?;
        set(d, &updated);
        Ok(())
    }

    async fn delete(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let scope = subdomain_scope(api, d).await?;
        let page = build(d)?;
        api.delete_error_page(scope.domain_id, &page).await?;
        Ok(())
    }

    /// `<subdomain>:<error code>` or `<subdomain>:<id>`.
    ///
    /// A tail that is a known error code is looked up as code first.
    async fn import(&self, api: &dyn MyrasecApi, id: &str) -> ProviderResult<ResourceData> {
        let (subdomain, tail) = parse_import_id(id)?;
        let scope = SubdomainScope::resolve(api, &subdomain).await?;

        let mut page_id = tail;
        if ERROR_CODES.contains(&tail) {
            let pages = list_all(api, scope.domain_id).await?;
            if let Some(page) = pages
                .iter()
                .find(|p| p.error_code == tail && names_equal(&p.sub_domain_name, &scope.name))
            {
                log::debug!("[error_page] import {id}: matched error code {tail}");
                page_id = page.id.unwrap_or(tail);
            }
        }

        let mut state = Map::new();
        state.insert("subdomain_name".into(), Value::String(scope.name));
        let mut d = ResourceData::from_state(&SCHEMA, page_id.to_string(), state);
        self.read(api, &mut d).await?;
        Ok(d)
    }
}
