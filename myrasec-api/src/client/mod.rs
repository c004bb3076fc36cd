//! reqwest based [`MyrasecApi`](crate::MyrasecApi) implementation

mod endpoints;
mod request;

use std::time::Duration;

use reqwest::Client;

use crate::cache::{DEFAULT_CACHE_TTL, ResponseCache};
use crate::error::{ApiError, Result};
use crate::sign::Signer;

/// Production API host.
pub const DEFAULT_BASE_URL: &str = "https://apiv2.myracloud.com";
/// Default API language (path prefix).
pub const DEFAULT_LANGUAGE: &str = "en";
/// Default `User-Agent` header.
pub const DEFAULT_USER_AGENT: &str = concat!("myrasec-api/", env!("CARGO_PKG_VERSION"));

const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_RETRIES: u32 = 2;

/// Myra API client.
///
/// Safe for concurrent use; share one instance behind an `Arc`.
///
/// ```rust,no_run
/// use myrasec_api::{ListParams, MyrasecApi, MyrasecClient};
///
/// # async fn run() -> myrasec_api::Result<()> {
/// let client = MyrasecClient::builder("api-key", "secret")
///     .language("de")
///     .build()?;
/// let domains = client.list_domains(&ListParams::default()).await?;
/// # let _ = domains;
/// # Ok(())
/// # }
/// ```
pub struct MyrasecClient {
    pub(crate) http: Client,
    pub(crate) signer: Signer,
    pub(crate) base_url: String,
    pub(crate) language: String,
    pub(crate) user_agent: String,
    pub(crate) max_retries: u32,
    pub(crate) cache: ResponseCache,
}

impl std::fmt::Debug for MyrasecClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MyrasecClient")
            .field("signer", &self.signer)
            .field("base_url", &self.base_url)
            .field("language", &self.language)
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

/// Builder for [`MyrasecClient`].
pub struct MyrasecClientBuilder {
    api_key: String,
    secret: String,
    base_url: String,
    language: String,
    user_agent: String,
    max_retries: u32,
    connect_timeout: Duration,
    request_timeout: Duration,
    cache_ttl: Duration,
}

impl MyrasecClientBuilder {
    fn new(api_key: String, secret: String) -> Self {
        Self {
            api_key,
            secret,
            base_url: DEFAULT_BASE_URL.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }

    /// Override the API host (default: [`DEFAULT_BASE_URL`]).
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// API language used as path prefix (default: `en`).
    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Maximum number of automatic retries for transient errors (default: 2).
    #[must_use]
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Lifetime of cached GET responses; `Duration::ZERO` disables the cache.
    #[must_use]
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn build(self) -> Result<MyrasecClient> {
        let http = Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.request_timeout)
            .build()
            .map_err(|e| ApiError::NetworkError {
                detail: format!("Failed to create HTTP client: {e}"),
            })?;

        Ok(MyrasecClient {
            http,
            signer: Signer::new(self.api_key, self.secret),
            base_url: self.base_url,
            language: self.language,
            user_agent: self.user_agent,
            max_retries: self.max_retries,
            cache: ResponseCache::new(self.cache_ttl),
        })
    }
}

impl MyrasecClient {
    /// Client with default settings.
    pub fn new(api_key: impl Into<String>, secret: impl Into<String>) -> Result<Self> {
        Self::builder(api_key, secret).build()
    }

    pub fn builder(api_key: impl Into<String>, secret: impl Into<String>) -> MyrasecClientBuilder {
        MyrasecClientBuilder::new(api_key.into(), secret.into())
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}
