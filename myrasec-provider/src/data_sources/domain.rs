//! Account and domain scoped listings.

use std::sync::LazyLock;

use async_trait::async_trait;
use myrasec_api::{ListParams, MAINTENANCE_PAGE_SIZE, MyrasecApi, VHost};
use serde_json::{Map, Value};

use crate::content_hash::CONTENT;
use crate::error::ProviderResult;
use crate::filters::{
    DnsRecordsFilter, DomainsFilter, ErrorPagesFilter, MaintenanceTemplatesFilter,
    SslCertificatesFilter, SubdomainsFilter, parse_filter, require_filter,
};
use crate::lookup::{collect_pages, resolve_domain_id};
use crate::names::{canonical_name, names_equal, upper};
use crate::resources::{dns_record, domain, error_page, maintenance_template, ssl_certificate};
use crate::schema::{Block, ResourceSchema, Schema};
use crate::state::ResourceData;
use crate::translate::{record, time_value};

use super::{DataSourceHandler, accepts, entries, entry, entry_block, list_schema, listing};

fn domain_name_filter() -> Schema {
    Schema::string().required().normalize(canonical_name)
}

// ==================== Domains ====================

static DOMAINS: LazyLock<ResourceSchema> = LazyLock::new(|| {
    list_schema(
        Block::new()
            .field("id", Schema::int().optional())
            .field("name", Schema::string().optional().normalize(canonical_name)),
        "domains",
        entry_block(&domain::SCHEMA),
    )
});

pub struct DomainsDataSource;

#[async_trait]
impl DataSourceHandler for DomainsDataSource {
    fn name(&self) -> &'static str {
        "myrasec_domains"
    }

    fn schema(&self) -> &'static ResourceSchema {
        &DOMAINS
    }

    async fn read(
        &self,
        api: &dyn MyrasecApi,
        config: &Map<String, Value>,
    ) -> ProviderResult<ResourceData> {
        let filter: DomainsFilter = parse_filter(config)?.unwrap_or_default();
        let name = filter.name.as_deref().map(canonical_name);
        let params = match &name {
            Some(name) => ListParams::default().search(name.clone()),
            None => ListParams::default(),
        };
        let mut domains =
            collect_pages(params, |p| async move { api.list_domains(&p).await }).await?;
        domains.retain(|d| {
            filter.id.is_none_or(|id| d.id == Some(id))
                && name.as_deref().is_none_or(|n| names_equal(n, &d.name))
        });

        let scope = name.or_else(|| filter.id.map(|id| id.to_string()));
        let items = entries(&domain::SCHEMA, &domains, domain::set);
        Ok(listing(&DOMAINS, config, "domains", scope.as_deref(), items))
    }
}

// ==================== Subdomains ====================

fn subdomain_entry(v: &VHost) -> Value {
    record([
        ("id", v.id.map(Value::from)),
        ("label", Some(Value::from(canonical_name(&v.label)))),
        ("domain_name", v.domain_name.as_deref().map(|n| Value::from(canonical_name(n)))),
        ("domain_id", v.domain_id.map(Value::from)),
        ("access", v.access.map(Value::from)),
        ("maintenance", v.maintenance.map(Value::from)),
        ("paused", v.paused.map(Value::from)),
        ("paused_until", time_value(v.paused_until.as_ref()).map(Value::from)),
        ("created", time_value(v.created.as_ref()).map(Value::from)),
        ("modified", time_value(v.modified.as_ref()).map(Value::from)),
    ])
}

static SUBDOMAINS: LazyLock<ResourceSchema> = LazyLock::new(|| {
    list_schema(
        Block::new().field("name", Schema::string().optional().normalize(canonical_name)),
        "subdomains",
        Block::new()
            .field("id", Schema::int().computed())
            .field("label", Schema::string().computed())
            .field("domain_name", Schema::string().computed())
            .field("domain_id", Schema::int().computed())
            .field("access", Schema::bool().computed())
            .field("maintenance", Schema::bool().computed())
            .field("paused", Schema::bool().computed())
            .field("paused_until", Schema::string().computed())
            .field("created", Schema::string().computed())
            .field("modified", Schema::string().computed()),
    )
});

pub struct SubdomainsDataSource;

#[async_trait]
impl DataSourceHandler for SubdomainsDataSource {
    fn name(&self) -> &'static str {
        "myrasec_subdomains"
    }

    fn schema(&self) -> &'static ResourceSchema {
        &SUBDOMAINS
    }

    async fn read(
        &self,
        api: &dyn MyrasecApi,
        config: &Map<String, Value>,
    ) -> ProviderResult<ResourceData> {
        let filter: SubdomainsFilter = parse_filter(config)?.unwrap_or_default();
        let name = filter.name.as_deref().map(canonical_name);
        let params = match &name {
            Some(name) => ListParams::default().search(name.clone()),
            None => ListParams::default(),
        };
        let vhosts =
            collect_pages(params, |p| async move { api.list_all_subdomains(&p).await }).await?;
        let items = vhosts.iter().map(subdomain_entry).collect();
        Ok(listing(&SUBDOMAINS, config, "subdomains", name.as_deref(), items))
    }
}

// ==================== DNS records ====================

static DNS_RECORDS: LazyLock<ResourceSchema> = LazyLock::new(|| {
    list_schema(
        Block::new()
            .field("domain_name", domain_name_filter())
            .field("name", Schema::string().optional().normalize(canonical_name))
            .field("record_type", Schema::string().optional().normalize(upper)),
        "records",
        entry_block(&dns_record::SCHEMA),
    )
});

pub struct DnsRecordsDataSource;

#[async_trait]
impl DataSourceHandler for DnsRecordsDataSource {
    fn name(&self) -> &'static str {
        "myrasec_dns_records"
    }

    fn schema(&self) -> &'static ResourceSchema {
        &DNS_RECORDS
    }

    async fn read(
        &self,
        api: &dyn MyrasecApi,
        config: &Map<String, Value>,
    ) -> ProviderResult<ResourceData> {
        let filter: DnsRecordsFilter = require_filter(config, "domain_name")?;
        let domain_name = canonical_name(&filter.domain_name);
        let domain_id = resolve_domain_id(api, &domain_name).await?;
        let name = filter.name.as_deref().map(canonical_name);
        let record_type = filter.record_type.as_deref().map(upper);

        let params = match &name {
            Some(name) => ListParams::default().search(name.clone()),
            None => ListParams::default(),
        };
        let mut records = collect_pages(params, |p| async move {
            api.list_dns_records(domain_id, &p).await
        })
        .await?;
        records.retain(|r| {
            name.as_deref().is_none_or(|n| names_equal(n, &r.name))
                && accepts(record_type.as_deref(), upper(&r.record_type).as_str())
        });

        let items = entries(&dns_record::SCHEMA, &records, dns_record::set);
        Ok(listing(&DNS_RECORDS, config, "records", Some(&domain_name), items))
    }
}

// ==================== Maintenance templates ====================

static MAINTENANCE_TEMPLATES: LazyLock<ResourceSchema> = LazyLock::new(|| {
    list_schema(
        Block::new()
            .field("domain_name", domain_name_filter())
            .field("name", Schema::string().optional()),
        "maintenance_templates",
        entry_block(&maintenance_template::SCHEMA),
    )
});

pub struct MaintenanceTemplatesDataSource;

#[async_trait]
impl DataSourceHandler for MaintenanceTemplatesDataSource {
    fn name(&self) -> &'static str {
        "myrasec_maintenance_templates"
    }

    fn schema(&self) -> &'static ResourceSchema {
        &MAINTENANCE_TEMPLATES
    }

    /// Listings carry the full body next to its hash.
    async fn read(
        &self,
        api: &dyn MyrasecApi,
        config: &Map<String, Value>,
    ) -> ProviderResult<ResourceData> {
        let filter: MaintenanceTemplatesFilter = require_filter(config, "domain_name")?;
        let domain_name = canonical_name(&filter.domain_name);
        let domain_id = resolve_domain_id(api, &domain_name).await?;
        let templates = collect_pages(
            ListParams::with_page_size(MAINTENANCE_PAGE_SIZE),
            |p| async move { api.list_maintenance_templates(domain_id, &p).await },
        )
        .await?;

        let items = templates
            .iter()
            .filter(|t| accepts(filter.name.as_deref(), t.name.as_str()))
            .map(|t| {
                let mut e = entry(&maintenance_template::SCHEMA, t, maintenance_template::set);
                e.insert(CONTENT.into(), Value::from(t.content.clone()));
                Value::Object(e)
            })
            .collect();
        Ok(listing(
            &MAINTENANCE_TEMPLATES,
            config,
            "maintenance_templates",
            Some(&domain_name),
            items,
        ))
    }
}

// ==================== Error pages ====================

static ERROR_PAGES: LazyLock<ResourceSchema> = LazyLock::new(|| {
    list_schema(
        Block::new()
            .field("domain_name", domain_name_filter())
            .field(
                "subdomain_name",
                Schema::string().optional().normalize(canonical_name),
            )
            .field("error_code", Schema::int().optional()),
        "error_pages",
        entry_block(&error_page::SCHEMA),
    )
});

pub struct ErrorPagesDataSource;

#[async_trait]
impl DataSourceHandler for ErrorPagesDataSource {
    fn name(&self) -> &'static str {
        "myrasec_error_pages"
    }

    fn schema(&self) -> &'static ResourceSchema {
        &ERROR_PAGES
    }

    async fn read(
        &self,
        api: &dyn MyrasecApi,
        config: &Map<String, Value>,
    ) -> ProviderResult<ResourceData> {
        let filter: ErrorPagesFilter = require_filter(config, "domain_name")?;
        let domain_name = canonical_name(&filter.domain_name);
        let domain_id = resolve_domain_id(api, &domain_name).await?;
        let mut pages = collect_pages(ListParams::default(), |p| async move {
            api.list_error_pages(domain_id, &p).await
        })
        .await?;
        pages.retain(|p| {
            filter
                .subdomain_name
                .as_deref()
                .is_none_or(|n| names_equal(n, &p.sub_domain_name))
                && filter.error_code.is_none_or(|c| c == p.error_code)
        });

        let items = entries(&error_page::SCHEMA, &pages, error_page::set);
        Ok(listing(&ERROR_PAGES, config, "error_pages", Some(&domain_name), items))
    }
}

// ==================== SSL certificates ====================

static SSL_CERTIFICATES: LazyLock<ResourceSchema> = LazyLock::new(|| {
    list_schema(
        Block::new()
            .field("domain_name", domain_name_filter())
            .field("subject", Schema::string().optional()),
        "certificates",
        entry_block(&ssl_certificate::SCHEMA),
    )
});

pub struct SslCertificatesDataSource;

#[async_trait]
impl DataSourceHandler for SslCertificatesDataSource {
    fn name(&self) -> &'static str {
        "myrasec_ssl_certificates"
    }

    fn schema(&self) -> &'static ResourceSchema {
        &SSL_CERTIFICATES
    }

    async fn read(
        &self,
        api: &dyn MyrasecApi,
        config: &Map<String, Value>,
    ) -> ProviderResult<ResourceData> {
        let filter: SslCertificatesFilter = require_filter(config, "domain_name")?;
        let domain_name = canonical_name(&filter.domain_name);
        let domain_id = resolve_domain_id(api, &domain_name).await?;
        let mut certs = collect_pages(ListParams::default(), |p| async move {
            api.list_ssl_certificates(domain_id, &p).await
        })
        .await?;
        certs.retain(|c| {
            filter
                .subject
                .as_deref()
                .is_none_or(|s| c.subject.as_deref() == Some(s))
        });

        let items = entries(&ssl_certificate::SCHEMA, &certs, ssl_certificate::set);
        Ok(listing(
            &SSL_CERTIFICATES,
            config,
            "certificates",
            Some(&domain_name),
            items,
        ))
    }
}
