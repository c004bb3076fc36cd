//! # myrasec-api
//!
//! Typed async client for the [Myra Security](https://www.myrasecurity.com/)
//! REST API: domains, DNS records, caching and redirect rules, rate limits,
//! IP filters, maintenance and error pages, SSL certificates, WAF rules,
//! tags, waiting rooms and API keys.
//!
//! ## Feature Flags
//!
//! - **`native-tls`** *(default)*: Use the platform's native TLS implementation.
//! - **`rustls`**: Use rustls.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use myrasec_api::{ListParams, MyrasecApi, MyrasecClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = MyrasecClient::builder("api-key", "secret")
//!         .user_agent("my-tool")
//!         .build()?;
//!
//!     for domain in client.list_domains(&ListParams::default()).await? {
//!         println!("{} ({:?})", domain.name, domain.id);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Pagination
//!
//! List methods return a single page. A page shorter than
//! [`ListParams::page_size`] is the last one.
//!
//! ## Caching
//!
//! GET responses are cached for [`cache::DEFAULT_CACHE_TTL`]. Writes
//! invalidate the collection they touch; [`MyrasecApi::prune_cache`] drops
//! entries explicitly.
//!
//! ## Error Handling
//!
//! All operations return [`Result<T>`] with [`ApiError`]. Network errors,
//! timeouts and rate limits are retried with exponential backoff before they
//! surface.

mod api;
pub mod cache;
mod client;
mod error;
mod http_client;
mod sign;
mod types;
pub mod utils;

pub use api::MyrasecApi;
pub use client::{
    DEFAULT_BASE_URL, DEFAULT_LANGUAGE, DEFAULT_USER_AGENT, MyrasecClient, MyrasecClientBuilder,
};
pub use error::{ApiError, Result, Violation};
pub use sign::Signer;
pub use types::{
    ApiKey, CacheSetting, DEFAULT_PAGE_SIZE, DnsRecord, Domain, ErrorPage, IpFilter, IpRange,
    ListParams, MAINTENANCE_PAGE_SIZE, Maintenance, MaintenanceTemplate, RateLimit, Redirect,
    Settings, SslCertificate, SslConfiguration, SslIntermediate, Tag, TagAssignment,
    TagInformation, UpstreamOptions, VHost, WafAction, WafCondition, WafRule, WaitingRoom,
};
