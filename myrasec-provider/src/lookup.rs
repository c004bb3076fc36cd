//! Lookup & pagination engine
//!
//! The vendor API only lists; a targeted read walks every page and scans the
//! accumulated rows. Scope resolution turns domain and subdomain names into
//! the numeric domain id the endpoints need.

use std::future::Future;

use myrasec_api::{
    ApiError, ApiKey, CacheSetting, DnsRecord, Domain, ErrorPage, IpFilter, IpRange, ListParams,
    Maintenance, MaintenanceTemplate, MyrasecApi, RateLimit, Redirect, SslCertificate, Tag,
    TagInformation, VHost, WafAction, WafCondition, WafRule, WaitingRoom,
};

use crate::error::{ProviderError, ProviderResult};
use crate::names::{canonical_name, general_domain_of, is_general_domain, names_equal};

// ==================== Pagination ====================

/// Request pages until one comes back shorter than `page_size`.
///
/// `params.search` is forwarded on every page.
pub async fn collect_pages<T, F, Fut>(params: ListParams, mut fetch: F) -> ProviderResult<Vec<T>>
where
    F: FnMut(ListParams) -> Fut,
    Fut: Future<Output = myrasec_api::Result<Vec<T>>>,
{
    let page_size = params.page_size as usize;
    let mut page = params.page.max(1);
    let mut all = Vec::new();
    loop {
        let batch = fetch(params.page(page)).await?;
        let len = batch.len();
        all.extend(batch);
        if len == 0 || len < page_size {
            break;
        }
        page += 1;
    }
    log::debug!("[lookup] collected {} row(s) over {page} page(s)", all.len());
    Ok(all)
}

/// Objects carrying a vendor numeric id.
pub trait HasId {
    fn vendor_id(&self) -> Option<i64>;
}

macro_rules! impl_has_id {
    ($($ty:ty),* $(,)?) => {
        $(
            impl HasId for $ty {
                fn vendor_id(&self) -> Option<i64> {
                    self.id
                }
            }
        )*
    };
}

impl_has_id!(
    ApiKey,
    CacheSetting,
    DnsRecord,
    Domain,
    ErrorPage,
    IpFilter,
    IpRange,
    Maintenance,
    MaintenanceTemplate,
    RateLimit,
    Redirect,
    SslCertificate,
    Tag,
    TagInformation,
    VHost,
    WafAction,
    WafCondition,
    WafRule,
    WaitingRoom,
);

/// First row whose id equals `id`.
///
/// Absence is [`ProviderError::EntityNotFound`], a warning: reads clear the
/// state, imports escalate it.
pub fn find_by_id<T: HasId>(items: Vec<T>, id: i64, kind: &str) -> ProviderResult<T> {
    items
        .into_iter()
        .find(|item| item.vendor_id() == Some(id))
        .ok_or_else(|| ProviderError::not_found(kind, id))
}

/// Walk every page and pick `id`.
pub async fn fetch_by_id<T, F, Fut>(
    params: ListParams,
    fetch: F,
    id: i64,
    kind: &str,
) -> ProviderResult<T>
where
    T: HasId,
    F: FnMut(ListParams) -> Fut,
    Fut: Future<Output = myrasec_api::Result<Vec<T>>>,
{
    let items = collect_pages(params, fetch).await?;
    find_by_id(items, id, kind)
}

// ==================== Scope resolution ====================

/// Resolve a domain by name.
///
/// Uses the exact lookup endpoint when the SDK offers one and falls back to
/// a paginated scan with a trailing-dot tolerant comparison.
pub async fn resolve_domain(api: &dyn MyrasecApi, name: &str) -> ProviderResult<Domain> {
    let name = general_domain_of(name).unwrap_or(name);
    match api.fetch_domain_by_name(name).await {
        Ok(domain) => return Ok(domain),
        Err(ApiError::Unsupported { .. }) => {}
        Err(ApiError::NotFound { .. }) => {
            return Err(ProviderError::lookup(
                "domain",
                format!("no domain named '{name}'"),
            ));
        }
        Err(e) => return Err(e.into()),
    }

    let wanted = canonical_name(name);
    let domains = collect_pages(ListParams::default().search(wanted.clone()), |p| async move {
        api.list_domains(&p).await
    })
    .await?;
    domains
        .into_iter()
        .find(|d| names_equal(&d.name, &wanted))
        .ok_or_else(|| ProviderError::lookup("domain", format!("no domain named '{name}'")))
}

/// Numeric id of the domain called `name`.
pub async fn resolve_domain_id(api: &dyn MyrasecApi, name: &str) -> ProviderResult<i64> {
    let domain = resolve_domain(api, name).await?;
    domain
        .id
        .ok_or_else(|| ProviderError::lookup("domain", format!("domain '{name}' has no id")))
}

/// The subdomain called `fqdn`, searched across every domain.
///
/// The exact search must yield exactly one row.
pub async fn resolve_subdomain(api: &dyn MyrasecApi, fqdn: &str) -> ProviderResult<VHost> {
    let name = canonical_name(fqdn);
    let mut rows = api
        .list_all_subdomains(&ListParams::default().search(name.clone()).exact())
        .await?;
    if rows.len() != 1 {
        return Err(ProviderError::AmbiguousSubdomain {
            name,
            matches: rows.len(),
        });
    }
    Ok(rows.remove(0))
}

/// Domain id owning the subdomain `name`.
///
/// General-domain labels resolve their parent directly.
pub async fn domain_id_for_subdomain(api: &dyn MyrasecApi, name: &str) -> ProviderResult<i64> {
    if is_general_domain(name) {
        return resolve_domain_id(api, name).await;
    }
    let vhost = resolve_subdomain(api, name).await?;
    if let Some(id) = vhost.domain_id {
        return Ok(id);
    }
    match vhost.domain_name.as_deref() {
        Some(domain) => resolve_domain_id(api, domain).await,
        None => Err(ProviderError::lookup(
            "subdomain",
            format!("subdomain '{name}' reports no domain"),
        )),
    }
}

/// Resolved `(domain id, subdomain name)` pair of subdomain scoped objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubdomainScope {
    pub domain_id: i64,
    pub name: String,
}

impl SubdomainScope {
    pub async fn resolve(api: &dyn MyrasecApi, name: &str) -> ProviderResult<Self> {
        let domain_id = domain_id_for_subdomain(api, name).await?;
        Ok(Self {
            domain_id,
            name: canonical_name(name),
        })
    }
}
