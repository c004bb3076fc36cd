use std::sync::LazyLock;

use async_trait::async_trait;
use myrasec_api::{ListParams, MyrasecApi};

use crate::error::ProviderResult;
use crate::lookup::fetch_by_id;
use crate::schema::ResourceSchema;
use crate::state::ResourceData;

use super::waf::{build_rule, set_rule, with_rule_fields};
use super::{ResourceHandler, import_scoped, subdomain_name_schema, subdomain_scope};

pub(crate) static SCHEMA: LazyLock<ResourceSchema> = LazyLock::new(|| {
    with_rule_fields(ResourceSchema::new().field("subdomain_name", subdomain_name_schema()))
});

pub struct WafRuleResource;

#[async_trait]
impl ResourceHandler for WafRuleResource {
    fn name(&self) -> &'static str {
        "myrasec_waf_rule"
    }

    fn schema(&self) -> &'static ResourceSchema {
        &SCHEMA
    }

    async fn create(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let scope = subdomain_scope(api, d).await?;
        let mut rule = build_rule(d)?;
        rule.sub_domain_name = Some(scope.name.clone());
        log::debug!("[waf_rule] create '{}' on {}", rule.name, scope.name);
        let created = api
            .create_waf_rule(scope.domain_id, &scope.name, &rule)
            .await?;
        set_rule(d, &created);
        Ok(())
    }

    async fn read(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let scope = subdomain_scope(api, d).await?;
        let id = d.id_i64()?;
        let rule = fetch_by_id(
            ListParams::default(),
            |p| {
                let scope = &scope;
                async move {
                    api.list_waf_rules(scope.domain_id, Some(&scope.name), &p)
                        .await
                }
            },
            id,
            "WAF rule",
        )
        .await?;
        d.set("subdomain_name", scope.name);
        set_rule(d, &rule);
        Ok(())
    }

    async fn update(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let scope = subdomain_scope(api, d).await?;
        let mut rule = build_rule(d)?;
        rule.sub_domain_name = Some(scope.name.clone());
        let updated = api
            .update_waf_rule(scope.domain_id, &scope.name, &rule)
            .await?;
        set_rule(d, &updated);
        Ok(())
    }

    async fn delete(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let scope = subdomain_scope(api, d).await?;
        let rule = build_rule(d)?;
        api.delete_waf_rule(scope.domain_id, &scope.name, &rule)
            .await?;
        Ok(())
    }

    async fn import(&self, api: &dyn MyrasecApi, id: &str) -> ProviderResult<ResourceData> {
        import_scoped(self, api, id, "subdomain_name").await
    }
}
