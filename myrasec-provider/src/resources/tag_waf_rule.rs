use std::sync::LazyLock;

use async_trait::async_trait;
use myrasec_api::{ListParams, MyrasecApi};

use crate::error::ProviderResult;
use crate::lookup::fetch_by_id;
use crate::schema::ResourceSchema;
use crate::state::ResourceData;
use crate::throttle::settle;

use super::waf::{build_rule, set_rule, with_rule_fields};
use super::{ResourceHandler, import_tag_scoped, required_i64, tag_id_schema};

pub(crate) static SCHEMA: LazyLock<ResourceSchema> =
    LazyLock::new(|| with_rule_fields(ResourceSchema::new().field("tag_id", tag_id_schema())));

pub struct TagWafRuleResource;

#[async_trait]
impl ResourceHandler for TagWafRuleResource {
    fn name(&self) -> &'static str {
        "myrasec_tag_waf_rule"
    }

    fn schema(&self) -> &'static ResourceSchema {
        &SCHEMA
    }

    async fn create(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let tag_id = required_i64(d, "tag_id")?;
        let rule = build_rule(d)?;
        log::debug!("[tag_waf_rule] create '{}' on tag {tag_id}", rule.name);
        settle().await;
        let created = api.create_tag_waf_rule(tag_id, &rule).await?;
        set_rule(d, &created);
        Ok(())
    }

    async fn read(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let tag_id = required_i64(d, "tag_id")?;
        let id = d.id_i64()?;
        let rule = fetch_by_id(
            ListParams::default(),
            |p| async move { api.list_tag_waf_rules(tag_id, &p).await },
            id,
            "tag WAF rule",
        )
        .await?;
        set_rule(d, &rule);
        Ok(())
    }

    async fn update(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let tag_id = required_i64(d, "tag_id")?;
        let rule = build_rule(d)?;
        settle().await;
        let updated = api.update_tag_waf_rule(tag_id, &rule).await?;
        set_rule(d, &updated);
        Ok(())
    }

    async fn delete(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let tag_id = required_i64(d, "tag_id")?;
        let rule = build_rule(d)?;
        api.delete_tag_waf_rule(tag_id, &rule).await?;
        Ok(())
    }

    async fn import(&self, api: &dyn MyrasecApi, id: &str) -> ProviderResult<ResourceData> {
        import_tag_scoped(self, api, id).await
    }
}
