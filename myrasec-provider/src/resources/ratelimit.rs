use std::sync::LazyLock;

use async_trait::async_trait;
use myrasec_api::{ListParams, MyrasecApi, RateLimit};

use crate::error::ProviderResult;
use crate::lookup::fetch_by_id;
use crate::schema::{ResourceSchema, Schema};
use crate::state::ResourceData;
use crate::translate::{parse_time, set_timestamps, set_vendor_id};

use super::{
    ResourceHandler, existing_id, import_scoped, required_str, subdomain_name_schema,
    subdomain_scope,
};

pub(crate) const VALUES: &[i64] = &[4000, 2000, 1000, 500, 100, 60, 0];
pub(crate) const TIMEFRAMES: &[i64] = &[
    1, 2, 5, 10, 15, 30, 45, 60, 120, 180, 300, 600, 1200, 3600,
];

pub(crate) static SCHEMA: LazyLock<ResourceSchema> = LazyLock::new(|| {
    ResourceSchema::new()
        .field("subdomain_name", subdomain_name_schema())
        .field("ratelimit_id", Schema::int().computed())
        .field(
            "network",
            Schema::string()
                .required()
                .describe("Client network in CIDR notation."),
        )
        .field("value", Schema::int().required().one_of_int(VALUES))
        .field("burst", Schema::int().optional().default(50))
        .field(
            "timeframe",
            Schema::int().optional().default(60).one_of_int(TIMEFRAMES),
        )
        .field("created", Schema::string().computed())
        .field("modified", Schema::string().computed())
});

fn build(d: &ResourceData) -> ProviderResult<RateLimit> {
    Ok(RateLimit {
        id: existing_id(d)?,
        network: required_str(d, "network")?,
        value: d.get_i64("value"),
        burst: d.get_i64("burst"),
        timeframe: d.get_i64("timeframe"),
        sub_domain_name: d.get_string("subdomain_name"),
        modified: parse_time(d, "modified")?,
        ..RateLimit::default()
    })
}

pub(crate) fn set(d: &mut ResourceData, r: &RateLimit) {
    set_vendor_id(d, "ratelimit_id", r.id);
    d.set("network", r.network.clone());
    d.set_opt("value", r.value);
    d.set_opt("burst", r.burst);
    d.set_opt("timeframe", r.timeframe);
    set_timestamps(d, r.created.as_ref(), r.modified.as_ref());
}

pub struct RateLimitResource;

#[async_trait]
impl ResourceHandler for RateLimitResource {
    fn name(&self) -> &'static str {
        "myrasec_ratelimit"
    }

    fn schema(&self) -> &'static ResourceSchema {
        &SCHEMA
    }

    async fn create(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let scope = subdomain_scope(api, d).await?;
        let limit = build(d)?;
        log::debug!("[ratelimit] create {} on {}", limit.network, scope.name);
        let created = api
            .create_rate_limit(scope.domain_id, &scope.name, &limit)
            .await?;
        set(d, &created);
        Ok(())
    }

    async fn read(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let scope = subdomain_scope(api, d).await?;
        let id = d.id_i64()?;
        let limit = fetch_by_id(
            ListParams::default(),
            |p| {
                let scope = &scope;
                async move { api.list_rate_limits(scope.domain_id, &scope.name, &p).await }
            },
            id,
            "rate limit",
        )
        .await?;
        d.set("subdomain_name", scope.name);
        set(d, &limit);
        Ok(())
    }

    async fn update(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let scope = subdomain_scope(api, d).await?;
        let limit = build(d)?;
        let updated = api
            .update_rate_limit(scope.domain_id, &scope.name, &limit)
            .await?;
        set(d, &updated);
        Ok(())
    }

    async fn delete(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let scope = subdomain_scope(api, d).await?;
        let limit = build(d)?;
        api.delete_rate_limit(scope.domain_id, &scope.name, &limit)
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
    use crate::test_utils::config;
    use serde_json::json;

    #[test]
    fn value_and_timeframe_come_from_closed_sets() {
        let base = json!({"subdomain_name": "www.example.com", "network": "10.0.0.0/8"});

        let mut ok = config(base.clone());
        ok.insert("value".into(), json!(100));
        ok.insert("timeframe".into(), json!(120));
        assert!(!SCHEMA.validate(&ok).has_error());

        let mut bad = config(base);
        bad.insert("value".into(), json!(150));
        bad.insert("timeframe".into(), json!(7));
        let diags = SCHEMA.validate(&bad);
        assert_eq!(diags.errors().count(), 2);
    }
}
