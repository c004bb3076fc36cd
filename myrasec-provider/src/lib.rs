//! # myrasec-provider
//!
//! Infrastructure-as-code provider for the Myra Security CDN/WAF platform.
//!
//! The crate exposes a catalog of resource types (domains, DNS records,
//! caching rules, WAF rules, tags, ...) and read-only data sources. Each type
//! is a [`ResourceHandler`] or [`DataSourceHandler`] pairing a declarative
//! [`ResourceSchema`] with the calls against [`myrasec_api::MyrasecApi`].
//!
//! [`Provider`] is the entry point for an orchestrator: it validates the
//! provider block, builds the client and dispatches plan, create, read,
//! update, delete, import and data source reads, reporting every outcome as
//! [`Diagnostics`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use myrasec_provider::Provider;
//! use serde_json::{Map, Value, json};
//!
//! # async fn run() {
//! let mut provider = Provider::new();
//! let block: Map<String, Value> = serde_json::from_value(json!({"language": "en"})).unwrap();
//! // api_key and secret fall back to MYRASEC_API_KEY / MYRASEC_API_SECRET
//! let diags = provider.configure(&block);
//! assert!(!diags.has_error());
//!
//! let config = serde_json::from_value(json!({"name": "example.com"})).unwrap();
//! let result = provider.create("myrasec_domain", &config).await;
//! println!("{:?} {:?}", result.id, result.diagnostics);
//! # }
//! ```

pub mod cert;
pub mod content_hash;
pub mod data_sources;
pub mod diagnostics;
pub mod error;
pub mod filters;
pub mod import_id;
pub mod lookup;
pub mod names;
pub mod provider;
pub mod resources;
pub mod schema;
pub mod state;
pub mod throttle;
pub mod translate;

#[cfg(test)]
mod test_utils;

// Re-export common types
pub use data_sources::DataSourceHandler;
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::{ProviderError, ProviderResult};
pub use provider::{OperationResult, PlanResult, Provider, ProviderConfig};
pub use resources::ResourceHandler;
pub use schema::{Diff, ResourceSchema, Schema};
pub use state::ResourceData;

// Re-export the vendor client
pub use myrasec_api;
