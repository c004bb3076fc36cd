use std::sync::LazyLock;

use async_trait::async_trait;
use myrasec_api::{DnsRecord, ListParams, MyrasecApi, UpstreamOptions};
use serde_json::Value;

use crate::error::ProviderResult;
use crate::lookup::{fetch_by_id, resolve_domain_id};
use crate::names::{canonical_name, upper};
use crate::schema::{Block, ResourceSchema, Schema};
use crate::state::ResourceData;
use crate::translate::{
    block_bool, block_i64, block_str, parse_time, record, set_timestamps, set_vendor_id,
};

use super::{ResourceHandler, existing_id, import_scoped, required_str};

pub(crate) const RECORD_TYPES: &[&str] = &["A", "AAAA", "MX", "CNAME", "TXT", "NS", "SRV", "CAA"];

pub(crate) fn upstream_block() -> Block {
    Block::new()
        .field("upstream_id", Schema::int().computed())
        .field("backup", Schema::bool().optional().default(false))
        .field("down", Schema::bool().optional().default(false))
        .field("fail_timeout", Schema::string().optional().default("1"))
        .field("max_fails", Schema::int().optional().default(100))
        .field("weight", Schema::int().optional().default(1))
}

pub(crate) static SCHEMA: LazyLock<ResourceSchema> = LazyLock::new(|| {
    ResourceSchema::new()
        .field(
            "domain_name",
            Schema::string()
                .required()
                .force_new()
                .normalize(canonical_name)
                .describe("Domain the record belongs to."),
        )
        .field("record_id", Schema::int().computed())
        .field(
            "name",
            Schema::string()
                .required()
                .normalize(canonical_name)
                .describe("Fully qualified record name."),
        )
        .field("ttl", Schema::int().required().int_range(300, 86400))
        .field(
            "record_type",
            Schema::string()
                .required()
                .force_new()
                .normalize(upper)
                .one_of(RECORD_TYPES),
        )
        .field("value", Schema::string().required())
        .field("alternative_cname", Schema::string().computed())
        .field("active", Schema::bool().optional().default(true))
        .field("enabled", Schema::bool().optional().default(true))
        .field("priority", Schema::int().optional().computed())
        .field("port", Schema::int().optional().computed())
        .field("comment", Schema::string().optional())
        .field(
            "upstream_options",
            Schema::nested(upstream_block()).optional().max_items(1),
        )
        .field("created", Schema::string().computed())
        .field("modified", Schema::string().computed())
});

fn build(d: &ResourceData) -> ProviderResult<DnsRecord> {
    let upstream_options = d.get_blocks("upstream_options").first().map(|b| UpstreamOptions {
        id: block_i64(b, "upstream_id"),
        backup: block_bool(b, "backup"),
        down: block_bool(b, "down"),
        fail_timeout: block_str(b, "fail_timeout"),
        max_fails: block_i64(b, "max_fails"),
        weight: block_i64(b, "weight"),
        ..UpstreamOptions::default()
    });

    Ok(DnsRecord {
        id: existing_id(d)?,
        name: required_str(d, "name")?,
        ttl: d.get_i64("ttl"),
        record_type: required_str(d, "record_type")?,
        value: required_str(d, "value")?,
        active: d.get_bool("active"),
        enabled: d.get_bool("enabled"),
        priority: d.get_i64("priority"),
        port: d.get_i64("port"),
        comment: d.get_string("comment"),
        upstream_options,
        modified: parse_time(d, "modified")?,
        ..DnsRecord::default()
    })
}

pub(crate) fn flatten_upstream(upstream: Option<&UpstreamOptions>) -> Value {
    match upstream {
        Some(u) => Value::Array(vec![record([
            ("upstream_id", u.id.map(Value::from)),
            ("backup", u.backup.map(Value::from)),
            ("down", u.down.map(Value::from)),
            ("fail_timeout", u.fail_timeout.clone().map(Value::from)),
            ("max_fails", u.max_fails.map(Value::from)),
            ("weight", u.weight.map(Value::from)),
        ])]),
        None => Value::Array(Vec::new()),
    }
}

pub(crate) fn set(d: &mut ResourceData, r: &DnsRecord) {
    set_vendor_id(d, "record_id", r.id);
    d.set("name", canonical_name(&r.name));
    d.set_opt("ttl", r.ttl);
    d.set("record_type", upper(&r.record_type));
    d.set("value", r.value.clone());
    d.set_opt("alternative_cname", r.alternative_cname.clone());
    d.set_opt("active", r.active);
    d.set_opt("enabled", r.enabled);
    d.set_opt("priority", r.priority);
    d.set_opt("port", r.port);
    d.set_opt("comment", r.comment.clone());
    d.set("upstream_options", flatten_upstream(r.upstream_options.as_ref()));
    set_timestamps(d, r.created.as_ref(), r.modified.as_ref());
}

pub struct DnsRecordResource;

#[async_trait]
impl ResourceHandler for DnsRecordResource {
    fn name(&self) -> &'static str {
        "myrasec_dns_record"
    }

    fn schema(&self) -> &'static ResourceSchema {
        &SCHEMA
    }

    async fn create(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let domain_id = resolve_domain_id(api, &required_str(d, "domain_name")?).await?;
        let record = build(d)?;
        log::debug!("[dns_record] create {} {}", record.record_type, record.name);
        let created = api.create_dns_record(domain_id, &record).await?;
        set(d, &created);
        Ok(())
    }

    async fn read(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let domain_id = resolve_domain_id(api, &required_str(d, "domain_name")?).await?;
        let id = d.id_i64()?;
        let record = fetch_by_id(
            ListParams::default(),
            |p| async move { api.list_dns_records(domain_id, &p).await },
            id,
            "DNS record",
        )
        .await?;
        set(d, &record);
        Ok(())
    }

    async fn update(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let domain_id = resolve_domain_id(api, &required_str(d, "domain_name")?).await?;
        let record = build(d)?;
        log::debug!("[dns_record] update {:?} {}", record.id, record.name);
        let updated = api.update_dns_record(domain_id, &record).await?;
        set(d, &updated);
        Ok(())
    }

    async fn delete(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let domain_id = resolve_domain_id(api, &required_str(d, "domain_name")?).await?;
        let record = build(d)?;
        log::debug!("[dns_record] delete {:?} {}", record.id, record.name);
        api.delete_dns_record(domain_id, &record).await?;
        Ok(())
    }

    async fn import(&self, api: &dyn MyrasecApi, id: &str) -> ProviderResult<ResourceData> {
        import_scoped(self, api, id, "domain_name").await
    }
}
