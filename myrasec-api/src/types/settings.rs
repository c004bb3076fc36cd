use serde::{Deserialize, Serialize};

/// Subdomain or tag configuration flags.
///
/// The vendor uses snake_case keys for settings. Every field is optional:
/// a `None` field is not transmitted, which is what makes tag settings a
/// partial overlay on top of the inherited configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_log: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub antibot_post_flood: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub antibot_post_flood_threshold: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub antibot_proof_of_work: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub antibot_proof_of_work_threshold: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balancing_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_not_whitelisted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_tor_network: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_revalidate: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cdn: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_max_body_size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diffie_hellman_exchange: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_origin_sni: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forwarded_for_replacement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_header: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hsts: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hsts_include_subdomains: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hsts_max_age: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hsts_preload: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_origin_port: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_nocache: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_optimization: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit_allowed_http_method: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit_tls_version: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitoring_alert_threshold: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitoring_contact_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitoring_send_alert: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub myra_ssl_header: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_upstream: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub only_https: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_connection_header: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_cache_bypass: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_cache_stale: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_connect_timeout: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_host_header: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_read_timeout: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_limit_block: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_limit_level: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_limit_report: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_limit_report_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rewrite: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spdy: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl_origin_port: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waf_enable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waf_levels_enable: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waf_policy: Option<String>,
}
