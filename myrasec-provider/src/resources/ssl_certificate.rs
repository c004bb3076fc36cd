//! Uploaded SSL certificates
//!
//! The private key is validated against the certificate at plan time. A new
//! certificate or key on an existing object uploads a replacement that
//! refreshes the old one instead of patching it in place.

use std::sync::LazyLock;

use async_trait::async_trait;
use myrasec_api::{ApiError, MyrasecApi, SslCertificate, SslIntermediate};
use serde_json::{Map, Value};

use crate::cert::validate_key_pair;
use crate::error::{ProviderError, ProviderResult};
use crate::lookup::resolve_domain_id;
use crate::names::canonical_name;
use crate::schema::{Block, Diff, ResourceSchema, Schema};
use crate::state::ResourceData;
use crate::translate::{
    block_str, parse_time, record, set_time, set_timestamps, set_vendor_id, time_value,
};

use super::{ResourceHandler, existing_id, import_scoped, required_str};

pub(crate) const CONFIGURATION_NAMES: &[&str] = &[
    "Myra-Global-TLS-Default",
    "2023-mozilla-intermediate",
    "2023-mozilla-modern",
];

pub(crate) fn intermediate_block() -> Block {
    Block::new()
        .field("certificate", Schema::string().optional())
        .field("subject", Schema::string().computed())
        .field("algorithm", Schema::string().computed())
        .field("issuer", Schema::string().computed())
        .field("fingerprint", Schema::string().computed())
        .field("serial_number", Schema::string().computed())
        .field("valid_from", Schema::string().computed())
        .field("valid_to", Schema::string().computed())
}

pub(crate) static SCHEMA: LazyLock<ResourceSchema> = LazyLock::new(|| {
    ResourceSchema::new()
        .field(
            "domain_name",
            Schema::string()
                .required()
                .force_new()
                .normalize(canonical_name),
        )
        .field("certificate_id", Schema::int().computed())
        .field(
            "certificate",
            Schema::string()
                .required()
                .describe("PEM encoded leaf certificate."),
        )
        .field(
            "key",
            Schema::string()
                .optional()
                .sensitive()
                .describe("PEM encoded private key of `certificate`."),
        )
        .field(
            "intermediate",
            Schema::nested(intermediate_block()).optional().computed(),
        )
        .field(
            "subdomains",
            Schema::string_set().optional().normalize(canonical_name),
        )
        .field("cert_refresh_forced", Schema::bool().optional().default(false))
        .field("cert_to_refresh", Schema::int().computed())
        .field(
            "configuration_name",
            Schema::string()
                .optional()
                .computed()
                .one_of(CONFIGURATION_NAMES),
        )
        .field("subject", Schema::string().computed())
        .field("algorithm", Schema::string().computed())
        .field("valid_from", Schema::string().computed())
        .field("valid_to", Schema::string().computed())
        .field("fingerprint", Schema::string().computed())
        .field("serial_number", Schema::string().computed())
        .field("subject_alternatives", Schema::string_set().computed())
        .field("wildcard", Schema::bool().computed())
        .field("extended_validation", Schema::bool().computed())
        .field("created", Schema::string().computed())
        .field("modified", Schema::string().computed())
});

fn build(d: &ResourceData) -> ProviderResult<SslCertificate> {
    let intermediates = d
        .get_blocks("intermediate")
        .into_iter()
        .filter_map(|b| block_str(b, "certificate"))
        .map(|cert| SslIntermediate {
            cert,
            ..SslIntermediate::default()
        })
        .collect();

    Ok(SslCertificate {
        id: existing_id(d)?,
        cert: required_str(d, "certificate")?,
        key: d.get_string("key"),
        intermediates,
        subdomains: d.get_string_set("subdomains"),
        cert_refresh_forced: d.get_bool("cert_refresh_forced"),
        ssl_configuration_name: d.get_string("configuration_name"),
        modified: parse_time(d, "modified")?,
        ..SslCertificate::default()
    })
}

fn flatten_intermediates(intermediates: &[SslIntermediate]) -> Value {
    Value::Array(
        intermediates
            .iter()
            .map(|i| {
                record([
                    ("certificate", Some(Value::from(i.cert.clone()))),
                    ("subject", i.subject.clone().map(Value::from)),
                    ("algorithm", i.algorithm.clone().map(Value::from)),
                    ("issuer", i.issuer.clone().map(Value::from)),
                    ("fingerprint", i.fingerprint.clone().map(Value::from)),
                    ("serial_number", i.serial_number.clone().map(Value::from)),
                    ("valid_from", time_value(i.valid_from.as_ref()).map(Value::from)),
                    ("valid_to", time_value(i.valid_to.as_ref()).map(Value::from)),
                ])
            })
            .collect(),
    )
}

fn sorted(items: &[String], normalize: fn(&str) -> String) -> Vec<String> {
    let mut items: Vec<String> = items.iter().map(|s| normalize(s)).collect();
    items.sort();
    items.dedup();
    items
}

pub(crate) fn set(d: &mut ResourceData, c: &SslCertificate) {
    set_vendor_id(d, "certificate_id", c.id);
    if !c.cert.is_empty() {
        d.set("certificate", c.cert.clone());
    }
    d.set("intermediate", flatten_intermediates(&c.intermediates));
    d.set("subdomains", sorted(&c.subdomains, canonical_name));
    d.set_opt("cert_refresh_forced", c.cert_refresh_forced);
    d.set_opt("cert_to_refresh", c.cert_to_refresh);
    d.set_opt("configuration_name", c.ssl_configuration_name.clone());
    d.set_opt("subject", c.subject.clone());
    d.set_opt("algorithm", c.algorithm.clone());
    set_time(d, "valid_from", c.valid_from.as_ref());
    set_time(d, "valid_to", c.valid_to.as_ref());
    d.set_opt("fingerprint", c.fingerprint.clone());
    d.set_opt("serial_number", c.serial_number.clone());
    d.set(
        "subject_alternatives",
        sorted(&c.subject_alternatives, str::to_string),
    );
    d.set_opt("wildcard", c.wildcard);
    d.set_opt("extended_validation", c.extended_validation);
    set_timestamps(d, c.created.as_ref(), c.modified.as_ref());
}

pub struct SslCertificateResource;

impl SslCertificateResource {
    async fn upload(
        &self,
        api: &dyn MyrasecApi,
        domain_id: i64,
        d: &mut ResourceData,
        cert: &SslCertificate,
    ) -> ProviderResult<()> {
        let created = api.create_ssl_certificate(domain_id, cert).await?;
        set(d, &created);
        Ok(())
    }
}

#[async_trait]
impl ResourceHandler for SslCertificateResource {
    fn name(&self) -> &'static str {
        "myrasec_ssl_certificate"
    }

    fn schema(&self) -> &'static ResourceSchema {
        &SCHEMA
    }

    async fn create(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let domain_id = resolve_domain_id(api, &required_str(d, "domain_name")?).await?;
        let cert = build(d)?;
        log::debug!("[ssl_certificate] upload to domain {domain_id}");
        self.upload(api, domain_id, d, &cert).await
    }

    async fn read(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let domain_id = resolve_domain_id(api, &required_str(d, "domain_name")?).await?;
        let id = d.id_i64()?;
        let cert = match api.get_ssl_certificate(domain_id, id).await {
            Ok(cert) => cert,
            Err(ApiError::NotFound { .. }) => {
                return Err(ProviderError::not_found("SSL certificate", id));
            }
            Err(e) => return Err(e.into()),
        };
        set(d, &cert);
        Ok(())
    }

    async fn update(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let domain_id = resolve_domain_id(api, &required_str(d, "domain_name")?).await?;
        let mut cert = build(d)?;
        let replaced = d.has_change("certificate") || d.has_change("key");

        match (replaced, cert.id) {
            (false, _) => {
                log::debug!("[ssl_certificate] update {:?} in place", cert.id);
                let updated = api.update_ssl_certificate(domain_id, &cert).await?;
                set(d, &updated);
                Ok(())
            }
            (true, Some(old)) => {
                log::debug!("[ssl_certificate] upload replacement for {old}");
                cert.cert_to_refresh = Some(old);
                cert.id = None;
                cert.modified = None;
                self.upload(api, domain_id, d, &cert).await
            }
            (true, None) => self.upload(api, domain_id, d, &cert).await,
        }
    }

    async fn delete(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let domain_id = resolve_domain_id(api, &required_str(d, "domain_name")?).await?;
        let cert = build(d)?;
        api.delete_ssl_certificate(domain_id, &cert).await?;
        Ok(())
    }

    async fn import(&self, api: &dyn MyrasecApi, id: &str) -> ProviderResult<ResourceData> {
        import_scoped(self, api, id, "domain_name").await
    }

    /// Reject a private key that does not belong to the certificate.
    fn customize_diff(
        &self,
        prior: Option<&Map<String, Value>>,
        diff: &mut Diff,
    ) -> ProviderResult<()> {
        let changed = prior.is_none() || diff.has_change("certificate") || diff.has_change("key");
        if !changed {
            return Ok(());
        }
        let cert = diff.planned.get("certificate").and_then(Value::as_str);
        let key = diff.planned.get("key").and_then(Value::as_str);
        match (cert, key) {
            (Some(cert), Some(key)) if !cert.is_empty() && !key.is_empty() => {
                validate_key_pair(cert, key)
            }
            _ => Ok(()),
        }
    }
}
