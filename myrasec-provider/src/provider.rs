//! Provider bootstrap and operation dispatch
//!
//! [`Provider`] owns the handler registries, builds the Myra client from the
//! provider block and runs every orchestrator operation under the handler's
//! deadline and the provider wide [`CancellationToken`].

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use myrasec_api::{ApiError, MyrasecApi, MyrasecClient};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

use crate::data_sources::{self, DataSourceHandler};
use crate::diagnostics::{Diagnostic, Diagnostics, Severity};
use crate::error::{ProviderError, ProviderResult};
use crate::resources::{self, ResourceHandler};
use crate::schema::{Diff, ResourceSchema, Schema};
use crate::state::ResourceData;

pub const API_KEY_ENV: &str = "MYRASEC_API_KEY";
pub const API_SECRET_ENV: &str = "MYRASEC_API_SECRET";
pub const USER_AGENT: &str = "terraform-provider-myrasec";
pub const LANGUAGES: &[&str] = &["en", "de"];

// ==================== Configuration ====================

/// Schema of the provider block.
pub static PROVIDER_SCHEMA: LazyLock<ResourceSchema> = LazyLock::new(|| {
    ResourceSchema::new()
        .field(
            "api_key",
            Schema::string()
                .optional()
                .sensitive()
                .describe("API key. Falls back to MYRASEC_API_KEY."),
        )
        .field(
            "secret",
            Schema::string()
                .optional()
                .sensitive()
                .describe("API secret. Falls back to MYRASEC_API_SECRET."),
        )
        .field(
            "language",
            Schema::string()
                .optional()
                .default("en")
                .one_of(LANGUAGES)
                .describe("Language of API messages, used as path prefix."),
        )
});

/// Provider block as written by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub secret: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

/// Configuration after environment fallback.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub api_key: String,
    pub secret: String,
    pub language: String,
}

impl std::fmt::Debug for ResolvedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedConfig")
            .field("api_key", &"***")
            .field("secret", &"***")
            .field("language", &self.language)
            .finish()
    }
}

impl ProviderConfig {
    pub fn from_map(config: &Map<String, Value>) -> ProviderResult<Self> {
        serde_json::from_value(Value::Object(config.clone()))
            .map_err(|e| ProviderError::parse("provider", e))
    }

    /// Fill unset credentials from `env`; empty values count as unset.
    pub fn resolve_with(
        self,
        env: impl Fn(&str) -> Option<String>,
    ) -> ProviderResult<ResolvedConfig> {
        let pick = |value: Option<String>, var: &str| {
            value
                .filter(|v| !v.is_empty())
                .or_else(|| env(var).filter(|v| !v.is_empty()))
        };
        let api_key = pick(self.api_key, API_KEY_ENV)
            .ok_or_else(|| ProviderError::MissingCredentials("api_key".into()))?;
        let secret = pick(self.secret, API_SECRET_ENV)
            .ok_or_else(|| ProviderError::MissingCredentials("secret".into()))?;
        let language = self.language.unwrap_or_else(|| "en".into());
        if !LANGUAGES.contains(&language.as_str()) {
            return Err(ProviderError::parse(
                "language",
                format!("expected one of {LANGUAGES:?}, got '{language}'"),
            ));
        }
        Ok(ResolvedConfig {
            api_key,
            secret,
            language,
        })
    }

    /// [`resolve_with`](Self::resolve_with) on the process environment.
    pub fn resolve(self) -> ProviderResult<ResolvedConfig> {
        self.resolve_with(|var| std::env::var(var).ok())
    }
}

// ==================== Results ====================

/// Outcome of a create, read, update, delete, import or data source read.
///
/// `id` and `state` are `None` when the object no longer exists or the
/// operation failed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OperationResult {
    pub id: Option<String>,
    pub state: Option<Map<String, Value>>,
    pub diagnostics: Diagnostics,
}

impl OperationResult {
    fn from_data(d: ResourceData) -> Self {
        let (id, state) = d.into_state();
        Self {
            id: (!id.is_empty()).then_some(id),
            state: Some(state),
            diagnostics: Diagnostics::new(),
        }
    }

    fn failed(diagnostics: Diagnostics) -> Self {
        Self {
            diagnostics,
            ..Self::default()
        }
    }

    pub fn is_ok(&self) -> bool {
        !self.diagnostics.has_error()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PlanResult {
    pub diff: Option<Diff>,
    pub diagnostics: Diagnostics,
}

/// Render an error as an error diagnostic regardless of its usual severity.
fn escalate(err: &ProviderError) -> Diagnostic {
    let mut diag = Diagnostic::from(err);
    diag.severity = Severity::Error;
    diag
}

fn log_failure(operation: &str, type_name: &str, err: &ProviderError) {
    if err.is_expected() {
        log::warn!("[provider] {operation} {type_name}: {err}");
    } else {
        log::error!("[provider] {operation} {type_name}: {err}");
    }
}

// ==================== Provider ====================

pub struct Provider {
    resources: BTreeMap<&'static str, Arc<dyn ResourceHandler>>,
    data_sources: BTreeMap<&'static str, Arc<dyn DataSourceHandler>>,
    api: Option<Arc<dyn MyrasecApi>>,
    cancel: CancellationToken,
}

impl Default for Provider {
    fn default() -> Self {
        Self::new()
    }
}

impl Provider {
    /// Provider with every handler registered and no client yet.
    #[must_use]
    pub fn new() -> Self {
        Self {
            resources: resources::all().into_iter().map(|h| (h.name(), h)).collect(),
            data_sources: data_sources::all()
                .into_iter()
                .map(|h| (h.name(), h))
                .collect(),
            api: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Validate the provider block and build the Myra client.
    pub fn configure(&mut self, config: &Map<String, Value>) -> Diagnostics {
        let diags = PROVIDER_SCHEMA.validate(config);
        if diags.has_error() {
            return diags;
        }
        let built = ProviderConfig::from_map(config)
            .and_then(ProviderConfig::resolve)
            .and_then(|resolved| {
                log::info!("[provider] configuring client (language {})", resolved.language);
                MyrasecClient::builder(resolved.api_key, resolved.secret)
                    .language(resolved.language)
                    .user_agent(USER_AGENT)
                    .build()
                    .map_err(ProviderError::from)
            });
        match built {
            Ok(client) => {
                self.api = Some(Arc::new(client));
                diags
            }
            Err(e) => {
                log_failure("configure", "provider", &e);
                e.into()
            }
        }
    }

    /// Use an already built client.
    pub fn configure_with_api(&mut self, api: Arc<dyn MyrasecApi>) {
        self.api = Some(api);
    }

    /// Token whose cancellation aborts every running operation.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn stop(&self) {
        log::info!("[provider] stop requested");
        self.cancel.cancel();
    }

    pub fn resource_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.resources.keys().copied()
    }

    pub fn data_source_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.data_sources.keys().copied()
    }

    pub fn resource_schema(&self, type_name: &str) -> Option<&'static ResourceSchema> {
        self.resources.get(type_name).map(|h| h.schema())
    }

    pub fn data_source_schema(&self, type_name: &str) -> Option<&'static ResourceSchema> {
        self.data_sources.get(type_name).map(|h| h.schema())
    }

    // ==================== Internals ====================

    fn api(&self) -> ProviderResult<&dyn MyrasecApi> {
        self.api
            .as_deref()
            .ok_or_else(|| ProviderError::MissingCredentials("api_key and secret".into()))
    }

    fn resource(&self, type_name: &str) -> Result<&Arc<dyn ResourceHandler>, Diagnostics> {
        self.resources.get(type_name).ok_or_else(|| {
            let mut diags = Diagnostics::new();
            diags.error("Unknown resource type", format!("'{type_name}' is not supported"));
            diags
        })
    }

    /// Race `fut` against `deadline` and the cancellation token.
    async fn run<T>(
        &self,
        deadline: Duration,
        operation: &str,
        fut: impl Future<Output = ProviderResult<T>>,
    ) -> ProviderResult<T> {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => {
                Err(ProviderError::Cancelled(format!("{operation} stopped")))
            }
            result = tokio::time::timeout(deadline, fut) => result.unwrap_or_else(|_| {
                Err(ProviderError::Cancelled(format!(
                    "{operation} exceeded its {}s deadline",
                    deadline.as_secs()
                )))
            }),
        }
    }

    // ==================== Dispatchers ====================

    /// Validate `config` and compute the change set against `prior`.
    pub fn plan(
        &self,
        type_name: &str,
        prior: Option<&Map<String, Value>>,
        config: &Map<String, Value>,
    ) -> PlanResult {
        let handler = match self.resource(type_name) {
            Ok(h) => h,
            Err(diagnostics) => return PlanResult { diff: None, diagnostics },
        };
        let mut diagnostics = handler.schema().validate(config);
        if diagnostics.has_error() {
            return PlanResult { diff: None, diagnostics };
        }

        let mut diff = handler.schema().diff(prior, config);
        if prior.is_some() && !handler.supports_update() {
            diff.force_replace();
        }
        if let Err(e) = handler.customize_diff(prior, &mut diff) {
            log_failure("plan", type_name, &e);
            diagnostics.push(e);
            return PlanResult { diff: None, diagnostics };
        }
        log::debug!(
            "[provider] plan {type_name}: {} change(s), replace={}",
            diff.changes.len(),
            diff.requires_replace()
        );
        PlanResult {
            diff: Some(diff),
            diagnostics,
        }
    }

    pub async fn create(&self, type_name: &str, config: &Map<String, Value>) -> OperationResult {
        let handler = match self.resource(type_name) {
            Ok(h) => h,
            Err(diags) => return OperationResult::failed(diags),
        };
        let diags = handler.schema().validate(config);
        if diags.has_error() {
            return OperationResult::failed(diags);
        }
        let mut d = ResourceData::for_create(handler.schema(), config);
        let deadline = handler.schema().timeouts.create;
        let result = async {
            let api = self.api()?;
            self.run(deadline, "create", handler.create(api, &mut d)).await
        }
        .await;
        match result {
            Ok(()) => {
                log::info!("[provider] created {type_name} {}", d.id());
                OperationResult::from_data(d)
            }
            Err(e) => {
                log_failure("create", type_name, &e);
                OperationResult::failed(e.into())
            }
        }
    }

    /// Refresh stored state; a vanished object clears the state with a warning.
    pub async fn read(
        &self,
        type_name: &str,
        id: &str,
        state: Map<String, Value>,
    ) -> OperationResult {
        let handler = match self.resource(type_name) {
            Ok(h) => h,
            Err(diags) => return OperationResult::failed(diags),
        };
        let mut d = ResourceData::from_state(handler.schema(), id, state);
        let deadline = handler.schema().timeouts.read;
        let result = async {
            let api = self.api()?;
            self.run(deadline, "read", handler.read(api, &mut d)).await
        }
        .await;
        match result {
            Ok(()) => OperationResult::from_data(d),
            Err(e @ ProviderError::EntityNotFound { .. }) => {
                log::warn!("[provider] {type_name} {id} is gone, removing it from state");
                OperationResult::failed(e.into())
            }
            Err(e) => {
                log_failure("read", type_name, &e);
                OperationResult::failed(e.into())
            }
        }
    }

    pub async fn update(
        &self,
        type_name: &str,
        id: &str,
        prior: Map<String, Value>,
        config: &Map<String, Value>,
    ) -> OperationResult {
        let handler = match self.resource(type_name) {
            Ok(h) => h,
            Err(diags) => return OperationResult::failed(diags),
        };
        let diags = handler.schema().validate(config);
        if diags.has_error() {
            return OperationResult::failed(diags);
        }
        let mut d = ResourceData::for_update(handler.schema(), id, prior, config);
        let deadline = handler.schema().timeouts.update;
        let result = async {
            let api = self.api()?;
            self.run(deadline, "update", handler.update(api, &mut d)).await
        }
        .await;
        match result {
            Ok(()) => OperationResult::from_data(d),
            Err(e) => {
                log_failure("update", type_name, &e);
                OperationResult::failed(e.into())
            }
        }
    }

    /// Delete; an object that is already gone counts as deleted.
    pub async fn delete(
        &self,
        type_name: &str,
        id: &str,
        state: Map<String, Value>,
    ) -> OperationResult {
        let handler = match self.resource(type_name) {
            Ok(h) => h,
            Err(diags) => return OperationResult::failed(diags),
        };
        let mut d = ResourceData::from_state(handler.schema(), id, state);
        let deadline = handler.schema().timeouts.delete;
        let result = async {
            let api = self.api()?;
            self.run(deadline, "delete", handler.delete(api, &mut d)).await
        }
        .await;
        match result {
            Ok(()) => {
                log::info!("[provider] deleted {type_name} {id}");
                OperationResult::default()
            }
            Err(
                ProviderError::VendorApi(ApiError::NotFound { .. })
                | ProviderError::EntityNotFound { .. },
            ) => {
                log::info!("[provider] {type_name} {id} already gone");
                OperationResult::default()
            }
            Err(e) => {
                log_failure("delete", type_name, &e);
                OperationResult::failed(e.into())
            }
        }
    }

    /// Import by composite id; a missing object is an error here.
    pub async fn import(&self, type_name: &str, import_id: &str) -> OperationResult {
        let handler = match self.resource(type_name) {
            Ok(h) => h,
            Err(diags) => return OperationResult::failed(diags),
        };
        let deadline = handler.schema().timeouts.read;
        let result = async {
            let api = self.api()?;
            self.run(deadline, "import", handler.import(api, import_id))
                .await
        }
        .await;
        match result {
            Ok(d) => {
                log::info!("[provider] imported {type_name} {import_id}");
                OperationResult::from_data(d)
            }
            Err(e) => {
                log_failure("import", type_name, &e);
                let mut diags = Diagnostics::new();
                diags.push(escalate(&e));
                OperationResult::failed(diags)
            }
        }
    }

    pub async fn read_data_source(
        &self,
        type_name: &str,
        config: &Map<String, Value>,
    ) -> OperationResult {
        let Some(handler) = self.data_sources.get(type_name) else {
            let mut diags = Diagnostics::new();
            diags.error(
                "Unknown data source type",
                format!("'{type_name}' is not supported"),
            );
            return OperationResult::failed(diags);
        };
        let diags = handler.schema().validate(config);
        if diags.has_error() {
            return OperationResult::failed(diags);
        }
        let deadline = handler.schema().timeouts.read;
        let result = async {
            let api = self.api()?;
            self.run(deadline, "read", handler.read(api, config)).await
        }
        .await;
        match result {
            Ok(d) => OperationResult::from_data(d),
            Err(e) => {
                log_failure("read", type_name, &e);
                let mut diags = Diagnostics::new();
                diags.push(escalate(&e));
                OperationResult::failed(diags)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockMyrasecApi, config};
    use serde_json::json;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: Vec<(String, String)> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| {
            vars.iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
        }
    }

    fn provider_with(api: &Arc<MockMyrasecApi>) -> Provider {
        let mut provider = Provider::new();
        provider.configure_with_api(api.clone());
        provider
    }

    // ---- configuration ----

    #[test]
    fn environment_fills_missing_credentials() {
        let resolved = ProviderConfig::default()
            .resolve_with(env(&[(API_KEY_ENV, "k"), (API_SECRET_ENV, "s")]))
            .unwrap();
        assert_eq!(resolved.api_key, "k");
        assert_eq!(resolved.secret, "s");
        assert_eq!(resolved.language, "en");
    }

    #[test]
    fn explicit_values_win_over_environment() {
        let cfg = ProviderConfig {
            api_key: Some("explicit".into()),
            secret: Some("s".into()),
            language: Some("de".into()),
        };
        let resolved = cfg.resolve_with(env(&[(API_KEY_ENV, "env")])).unwrap();
        assert_eq!(resolved.api_key, "explicit");
        assert_eq!(resolved.language, "de");
    }

    #[test]
    fn empty_secret_is_missing() {
        let cfg = ProviderConfig {
            api_key: Some("k".into()),
            secret: Some(String::new()),
            language: None,
        };
        let err = cfg.resolve_with(env(&[])).unwrap_err();
        assert!(matches!(err, ProviderError::MissingCredentials(ref what) if what == "secret"));
    }

    #[test]
    fn debug_output_hides_credentials() {
        let resolved = ResolvedConfig {
            api_key: "key-123".into(),
            secret: "secret-456".into(),
            language: "en".into(),
        };
        let rendered = format!("{resolved:?}");
        assert!(!rendered.contains("key-123"));
        assert!(!rendered.contains("secret-456"));
    }

    #[test]
    fn unsupported_language_fails_validation() {
        let mut provider = Provider::new();
        let diags = provider.configure(&config(json!({
            "api_key": "k", "secret": "s", "language": "fr"
        })));
        assert!(diags.has_error());
    }

    #[test]
    fn registries_cover_the_catalog() {
        let provider = Provider::new();
        assert_eq!(provider.resource_types().count(), 18);
        assert_eq!(provider.data_source_types().count(), 24);
        assert!(provider.resource_schema("myrasec_dns_record").is_some());
        assert!(provider.data_source_schema("myrasec_ip_ranges").is_some());
    }

    // ---- dispatch ----

    #[tokio::test]
    async fn unconfigured_provider_reports_missing_credentials() {
        let provider = Provider::new();
        let result = provider
            .create("myrasec_domain", &config(json!({"name": "example.com"})))
            .await;
        assert!(!result.is_ok());
        assert_eq!(
            result.diagnostics.iter().next().map(|d| d.summary.as_str()),
            Some("Missing credentials")
        );
    }

    #[tokio::test]
    async fn read_of_vanished_object_clears_state_with_warning() {
        let api = Arc::new(MockMyrasecApi::new());
        let provider = provider_with(&api);

        let result = provider
            .read("myrasec_domain", "4711", config(json!({"name": "gone.example"})))
            .await;
        assert!(result.is_ok());
        assert!(result.id.is_none());
        assert!(result.state.is_none());
        assert_eq!(result.diagnostics.warnings().count(), 1);
    }

    #[tokio::test]
    async fn import_of_missing_object_is_an_error() {
        let api = Arc::new(MockMyrasecApi::new());
        let provider = provider_with(&api);

        let result = provider.import("myrasec_tag", "4711").await;
        assert!(!result.is_ok());
        let diag = result.diagnostics.iter().next().unwrap();
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.summary, "Object not found");
    }

    #[test]
    fn plan_without_update_support_replaces() {
        let provider = Provider::new();
        let prior = config(json!({"name": "ci", "key": "abc", "key_id": 3}));
        let plan = provider.plan("myrasec_api_key", Some(&prior), &config(json!({"name": "deploy"})));
        let diff = plan.diff.unwrap();
        assert!(diff.has_change("name"));
        assert!(diff.requires_replace());
    }

    #[test]
    fn plan_reports_validation_errors() {
        let provider = Provider::new();
        let plan = provider.plan(
            "myrasec_dns_record",
            None,
            &config(json!({"domain_name": "example.com", "name": "www", "record_type": "A"})),
        );
        assert!(plan.diff.is_none());
        assert!(plan.diagnostics.has_error());
    }

    #[tokio::test]
    async fn unknown_types_are_reported() {
        let provider = Provider::new();
        let result = provider.read_data_source("myrasec_nope", &Map::new()).await;
        assert!(!result.is_ok());
        let plan = provider.plan("myrasec_nope", None, &Map::new());
        assert!(plan.diagnostics.has_error());
    }

    #[tokio::test]
    async fn stop_cancels_running_operations() {
        let api = Arc::new(MockMyrasecApi::new());
        api.seed_domain(1, "example.com").await;
        let provider = provider_with(&api);
        provider.stop();

        let result = provider.read_data_source("myrasec_domains", &Map::new()).await;
        let diag = result.diagnostics.iter().next().unwrap();
        assert_eq!(diag.summary, "Operation cancelled");
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_expiry_is_a_cancellation() {
        let api = Arc::new(MockMyrasecApi::new());
        api.seed_domain(1, "example.com").await;
        api.set_latency(Duration::from_secs(31)).await;
        let provider = provider_with(&api);

        let result = provider.read_data_source("myrasec_domains", &Map::new()).await;
        assert!(!result.is_ok());
        let diag = result.diagnostics.iter().next().unwrap();
        assert_eq!(diag.summary, "Operation cancelled");
        assert!(diag.detail.contains("30s deadline"));
    }

    #[test]
    fn configure_builds_the_client() {
        let mut provider = Provider::new();
        let diags = provider.configure(&config(json!({
            "api_key": "k", "secret": "s", "language": "de"
        })));
        assert!(diags.is_empty());
        assert!(provider.api().is_ok());
    }

    #[tokio::test]
    async fn vendor_errors_become_error_diagnostics() {
        let api = Arc::new(MockMyrasecApi::new());
        api.fail_next(
            "create_domain",
            ApiError::Violation {
                violations: vec![myrasec_api::Violation {
                    property_path: Some("name".into()),
                    message: "already exists".into(),
                }],
            },
        )
        .await;
        let provider = provider_with(&api);

        let result = provider
            .create("myrasec_domain", &config(json!({"name": "example.com"})))
            .await;
        assert!(result.id.is_none());
        let diag = result.diagnostics.errors().next().unwrap();
        assert_eq!(diag.summary, "Myra API error");
        assert_eq!(diag.detail, "name: already exists");
    }

    #[tokio::test]
    async fn deleting_a_missing_object_succeeds() {
        let api = Arc::new(MockMyrasecApi::new());
        let provider = provider_with(&api);
        let created = provider
            .create("myrasec_domain", &config(json!({"name": "example.com"})))
            .await;
        let id = created.id.unwrap();
        let state = created.state.unwrap();

        let first = provider.delete("myrasec_domain", &id, state.clone()).await;
        assert!(first.is_ok());
        let second = provider.delete("myrasec_domain", &id, state).await;
        assert!(second.is_ok());
        assert!(second.diagnostics.is_empty());
        assert_eq!(api.call_count("delete_domain").await, 2);
    }

    #[tokio::test]
    async fn other_delete_failures_are_reported() {
        let api = Arc::new(MockMyrasecApi::new());
        let provider = provider_with(&api);
        let created = provider
            .create("myrasec_domain", &config(json!({"name": "example.com"})))
            .await;
        api.fail_next(
            "delete_domain",
            ApiError::Violation {
                violations: vec![myrasec_api::Violation {
                    property_path: None,
                    message: "domain is locked".into(),
                }],
            },
        )
        .await;

        let result = provider
            .delete("myrasec_domain", &created.id.unwrap(), created.state.unwrap())
            .await;
        assert!(!result.is_ok());
        assert_eq!(result.diagnostics.errors().next().unwrap().summary, "Myra API error");
    }

    #[tokio::test]
    async fn create_returns_state_and_id() {
        let api = Arc::new(MockMyrasecApi::new());
        let provider = provider_with(&api);
        let result = provider
            .create("myrasec_domain", &config(json!({"name": "Example.com."})))
            .await;
        assert!(result.is_ok());
        let state = result.state.unwrap();
        assert_eq!(state["name"], json!("example.com"));
        assert_eq!(
            result.id.as_deref(),
            state["domain_id"].as_i64().map(|i| i.to_string()).as_deref()
        );
    }
}
