use std::sync::LazyLock;

use async_trait::async_trait;
use futures::future::try_join_all;
use myrasec_api::{ListParams, MyrasecApi, Tag, TagAssignment};
use serde_json::{Map, Value};

use crate::error::{ProviderError, ProviderResult};
use crate::import_id::parse_numeric_id;
use crate::lookup::{fetch_by_id, resolve_subdomain};
use crate::names::{canonical_name, is_general_domain, names_equal};
use crate::schema::{Block, ResourceSchema, Schema};
use crate::state::ResourceData;
use crate::translate::{block_i64, block_str, parse_time, record, set_timestamps, set_vendor_id};

use super::{ResourceHandler, existing_id, required_str};

pub(crate) const TAG_TYPES: &[&str] = &["CACHE", "CONFIG", "RATE_LIMIT", "WAF"];

pub(crate) fn assignment_block() -> Block {
    Block::new()
        .field("assignment_id", Schema::int().computed())
        .field("type", Schema::string().computed())
        .field("title", Schema::string().computed())
        .field(
            "subdomain_name",
            Schema::string().required().normalize(canonical_name),
        )
}

pub(crate) static SCHEMA: LazyLock<ResourceSchema> = LazyLock::new(|| {
    ResourceSchema::new()
        .field("tag_id", Schema::int().computed())
        .field("name", Schema::string().required())
        .field(
            "type",
            Schema::string()
                .required()
                .force_new()
                .one_of(TAG_TYPES),
        )
        .field("organization", Schema::int().optional().computed())
        .field(
            "assignments",
            Schema::nested(assignment_block())
                .optional()
                .describe("Domains and subdomains the tag applies to."),
        )
        .field("created", Schema::string().computed())
        .field("modified", Schema::string().computed())
});

/// Name of the domain owning `name`.
async fn owning_domain(api: &dyn MyrasecApi, name: &str) -> ProviderResult<String> {
    let vhost = resolve_subdomain(api, name).await?;
    match (vhost.domain_name, vhost.domain_id) {
        (Some(domain), _) => Ok(domain),
        (None, Some(id)) => {
            let domain = fetch_by_id(
                ListParams::default(),
                |p| async move { api.list_domains(&p).await },
                id,
                "domain",
            )
            .await?;
            Ok(domain.name)
        }
        (None, None) => Err(ProviderError::lookup(
            "subdomain",
            format!("subdomain '{name}' reports no domain"),
        )),
    }
}

async fn build_assignment(
    api: &dyn MyrasecApi,
    block: &Map<String, Value>,
) -> ProviderResult<TagAssignment> {
    let name = block_str(block, "subdomain_name")
        .map(|n| canonical_name(&n))
        .ok_or_else(|| ProviderError::parse("assignments.subdomain_name", "value is required"))?;

    let assignment_type = if is_general_domain(&name) {
        "SUBDOMAIN"
    } else if names_equal(&owning_domain(api, &name).await?, &name) {
        "DOMAIN"
    } else {
        "SUBDOMAIN"
    };

    Ok(TagAssignment {
        id: block_i64(block, "assignment_id"),
        assignment_type: assignment_type.to_string(),
        title: block_str(block, "title").unwrap_or_else(|| name.clone()),
        sub_domain_name: name,
    })
}

async fn build(api: &dyn MyrasecApi, d: &ResourceData) -> ProviderResult<Tag> {
    let assignments = try_join_all(
        d.get_blocks("assignments")
            .into_iter()
            .map(|block| build_assignment(api, block)),
    )
    .await?;
    Ok(Tag {
        id: existing_id(d)?,
        name: required_str(d, "name")?,
        tag_type: required_str(d, "type")?,
        organization: d.get_i64("organization"),
        assignments,
        modified: parse_time(d, "modified")?,
        ..Tag::default()
    })
}

fn assignment_record(a: &TagAssignment) -> Value {
    record([
        ("assignment_id", a.id.map(Value::from)),
        ("type", Some(Value::from(a.assignment_type.clone()))),
        ("title", Some(Value::from(a.title.clone()))),
        (
            "subdomain_name",
            Some(Value::from(canonical_name(&a.sub_domain_name))),
        ),
    ])
}

pub(crate) fn set(d: &mut ResourceData, t: &Tag) {
    set_vendor_id(d, "tag_id", t.id);
    d.set("name", t.name.clone());
    d.set("type", t.tag_type.clone());
    d.set_opt("organization", t.organization);
    d.set(
        "assignments",
        t.assignments.iter().map(assignment_record).collect::<Vec<_>>(),
    );
    set_timestamps(d, t.created.as_ref(), t.modified.as_ref());
}

pub struct TagResource;

#[async_trait]
impl ResourceHandler for TagResource {
    fn name(&self) -> &'static str {
        "myrasec_tag"
    }

    fn schema(&self) -> &'static ResourceSchema {
        &SCHEMA
    }

    async fn create(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let tag = build(api, d).await?;
        log::debug!(
            "[tag] create '{}' with {} assignment(s)",
            tag.name,
            tag.assignments.len()
        );
        let created = api.create_tag(&tag).await?;
        set(d, &created);
        Ok(())
    }

    async fn read(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let id = d.id_i64()?;
        let tag = fetch_by_id(
            ListParams::default(),
            |p| async move { api.list_tags(&p).await },
            id,
            "tag",
        )
        .await?;
        set(d, &tag);
        Ok(())
    }

    async fn update(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let tag = build(api, d).await?;
        let updated = api.update_tag(&tag).await?;
        set(d, &updated);
        Ok(())
    }

    async fn delete(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let tag = build(api, d).await?;
        api.delete_tag(&tag).await?;
        Ok(())
    }

    /// `<tag id>`
    async fn import(&self, api: &dyn MyrasecApi, id: &str) -> ProviderResult<ResourceData> {
        let tag_id = parse_numeric_id(id)?;
        let mut d = ResourceData::from_state(&SCHEMA, tag_id.to_string(), Map::new());
        self.read(api, &mut d).await?;
        Ok(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockMyrasecApi, config};
    use serde_json::json;

    #[tokio::test]
    async fn assignments_distinguish_domains_from_subdomains() {
        let api = MockMyrasecApi::new();
        api.seed_domain(1, "example.com").await;
        api.seed_subdomain(1, "example.com", "example.com").await;
        api.seed_subdomain(1, "example.com", "www.example.com").await;

        let mut d = ResourceData::for_create(
            &SCHEMA,
            &config(json!({
                "name": "static",
                "type": "CACHE",
                "assignments": [
                    {"subdomain_name": "Example.com."},
                    {"subdomain_name": "www.example.com"}
                ]
            })),
        );
        TagResource.create(&api, &mut d).await.unwrap();

        let kinds: Vec<_> = d
            .get_blocks("assignments")
            .iter()
            .map(|b| b["type"].clone())
            .collect();
        assert_eq!(kinds, vec![json!("DOMAIN"), json!("SUBDOMAIN")]);
    }

    #[tokio::test]
    async fn unknown_subdomain_fails_before_any_write() {
        let api = MockMyrasecApi::new();
        let mut d = ResourceData::for_create(
            &SCHEMA,
            &config(json!({
                "name": "t",
                "type": "WAF",
                "assignments": [{"subdomain_name": "nope.example.com"}]
            })),
        );
        let err = TagResource.create(&api, &mut d).await.unwrap_err();
        assert!(matches!(err, ProviderError::AmbiguousSubdomain { matches: 0, .. }));
        assert_eq!(api.call_count("create_tag").await, 0);
    }

    #[tokio::test]
    async fn update_keeps_assignment_ids_from_state() {
        let api = MockMyrasecApi::new();
        api.seed_domain(1, "example.com").await;
        api.seed_subdomain(1, "example.com", "www.example.com").await;
        api.seed_subdomain(1, "example.com", "api.example.com").await;

        let prior = config(json!({
            "tag_id": 3,
            "name": "static",
            "type": "CACHE",
            "assignments": [
                {"assignment_id": 21, "type": "SUBDOMAIN", "title": "www.example.com", "subdomain_name": "www.example.com"},
                {"assignment_id": 22, "type": "SUBDOMAIN", "title": "api.example.com", "subdomain_name": "api.example.com"}
            ]
        }));
        let d = ResourceData::for_update(
            &SCHEMA,
            "3",
            prior,
            &config(json!({
                "name": "static",
                "type": "CACHE",
                "assignments": [
                    {"subdomain_name": "api.example.com"},
                    {"subdomain_name": "www.example.com"}
                ]
            })),
        );

        let tag = build(&api, &d).await.unwrap();
        let ids: Vec<_> = tag
            .assignments
            .iter()
            .map(|a| (a.sub_domain_name.as_str(), a.id))
            .collect();
        assert_eq!(
            ids,
            vec![("api.example.com", Some(22)), ("www.example.com", Some(21))]
        );
    }
}
