use std::sync::LazyLock;

use async_trait::async_trait;
use myrasec_api::{IpFilter, ListParams, MyrasecApi};

use crate::error::ProviderResult;
use crate::lookup::fetch_by_id;
use crate::names::upper;
use crate::schema::{ResourceSchema, Schema};
use crate::state::ResourceData;
use crate::translate::{parse_time, set_time, set_timestamps, set_vendor_id};

use super::{
    ResourceHandler, existing_id, import_scoped, required_str, subdomain_name_schema,
    subdomain_scope,
};

pub(crate) const FILTER_TYPES: &[&str] = &["BLACKLIST", "WHITELIST", "WHITELIST_REQUEST_LIMITER"];

pub(crate) static SCHEMA: LazyLock<ResourceSchema> = LazyLock::new(|| {
    ResourceSchema::new()
        .field("subdomain_name", subdomain_name_schema())
        .field("filter_id", Schema::int().computed())
        .field(
            "type",
            Schema::string()
                .required()
                .normalize(upper)
                .one_of(FILTER_TYPES),
        )
        .field(
            "value",
            Schema::string()
                .required()
                .describe("IP address or network in CIDR notation."),
        )
        .field("expire_date", Schema::string().optional().rfc3339())
        .field("comment", Schema::string().optional())
        .field("enabled", Schema::bool().optional().default(true))
        .field("created", Schema::string().computed())
        .field("modified", Schema::string().computed())
});

fn build(d: &ResourceData) -> ProviderResult<IpFilter> {
    Ok(IpFilter {
        id: existing_id(d)?,
        filter_type: required_str(d, "type")?,
        value: required_str(d, "value")?,
        expire_date: parse_time(d, "expire_date")?,
        comment: d.get_string("comment"),
        enabled: d.get_bool("enabled"),
        modified: parse_time(d, "modified")?,
        ..IpFilter::default()
    })
}

pub(crate) fn set(d: &mut ResourceData, f: &IpFilter) {
    set_vendor_id(d, "filter_id", f.id);
    d.set("type", upper(&f.filter_type));
    d.set("value", f.value.clone());
    set_time(d, "expire_date", f.expire_date.as_ref());
    d.set_opt("comment", f.comment.clone());
    d.set_opt("enabled", f.enabled);
    set_timestamps(d, f.created.as_ref(), f.modified.as_ref());
}

pub struct IpFilterResource;

#[async_trait]
impl ResourceHandler for IpFilterResource {
    fn name(&self) -> &'static str {
        "myrasec_ip_filter"
    }

    fn schema(&self) -> &'static ResourceSchema {
        &SCHEMA
    }

    async fn create(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let scope = subdomain_scope(api, d).await?;
        let filter = build(d)?;
        log::debug!(
            "[ip_filter] create {} {} on {}",
            filter.filter_type,
            filter.value,
            scope.name
        );
        let created = api
            .create_ip_filter(scope.domain_id, &scope.name, &filter)
            .await?;
        set(d, &created);
        Ok(())
    }

    async fn read(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let scope = subdomain_scope(api, d).await?;
        let id = d.id_i64()?;
        let filter = fetch_by_id(
            ListParams::default(),
            |p| {
                let scope = &scope;
                async move { api.list_ip_filters(scope.domain_id, &scope.name, &p).await }
            },
            id,
            "IP filter",
        )
        .await?;
        d.set("subdomain_name", scope.name);
        set(d, &filter);
        Ok(())
    }

    async fn update(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let scope = subdomain_scope(api, d).await?;
        let filter = build(d)?;
        let updated = api
            .update_ip_filter(scope.domain_id, &scope.name, &filter)
            .await?;
        set(d, &updated);
        Ok(())
    }

    async fn delete(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let scope = subdomain_scope(api, d).await?;
        let filter = build(d)?;
        api.delete_ip_filter(scope.domain_id, &scope.name, &filter)
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
    use crate::error::ProviderError;
    use crate::test_utils::{MockMyrasecApi, config};
    use serde_json::json;

    #[tokio::test]
    async fn expire_date_round_trips_as_rfc3339() {
        let api = MockMyrasecApi::new();
        api.seed_subdomain(1, "example.com", "www.example.com").await;
        let mut d = ResourceData::for_create(
            &SCHEMA,
            &config(json!({
                "subdomain_name": "www.example.com",
                "type": "blacklist",
                "value": "192.0.2.0/24",
                "expire_date": "2030-01-01T01:00:00+01:00"
            })),
        );
        IpFilterResource.create(&api, &mut d).await.unwrap();
        assert_eq!(d.get_str("type"), Some("BLACKLIST"));
        assert_eq!(d.get_str("expire_date"), Some("2030-01-01T00:00:00Z"));
    }

    #[tokio::test]
    async fn malformed_expire_date_is_a_parse_error() {
        let api = MockMyrasecApi::new();
        api.seed_subdomain(1, "example.com", "www.example.com").await;
        let mut d = ResourceData::for_create(
            &SCHEMA,
            &config(json!({
                "subdomain_name": "www.example.com",
                "type": "WHITELIST",
                "value": "192.0.2.1",
                "expire_date": "next week"
            })),
        );
        let err = IpFilterResource.create(&api, &mut d).await.unwrap_err();
        assert!(matches!(err, ProviderError::ParseError { .. }));
        assert_eq!(api.call_count("create_ip_filter").await, 0);
    }
}
