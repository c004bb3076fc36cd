//! Endpoint bindings of [`MyrasecClient`].

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use crate::api::MyrasecApi;
use crate::error::{ApiError, Result};
use crate::http_client::HttpUtils;
use crate::types::{
    ApiKey, CacheSetting, DnsRecord, Domain, ErrorPage, IpFilter, IpRange, ListParams,
    Maintenance, MaintenanceTemplate, RateLimit, Redirect, Settings, SslCertificate,
    SslConfiguration, Tag, TagInformation, VHost, WafAction, WafCondition, WafRule, WaitingRoom,
};

use super::MyrasecClient;

// ==================== 路径 ====================

fn domain_path(domain_id: i64, kind: &str) -> String {
    format!("/domain/{domain_id}/{kind}")
}

fn subdomain_path(domain_id: i64, subdomain: &str, kind: &str) -> String {
    format!(
        "/domain/{domain_id}/{}/{kind}",
        urlencoding::encode(subdomain)
    )
}

fn tag_path(tag_id: i64, kind: &str) -> String {
    format!("/tag/{tag_id}/{kind}")
}

/// Settings endpoints answer with `{"domain": {...}, "parent": {...}}` for
/// subdomains; the subdomain's own object is under `domain`.
fn settings_from_value(value: Value) -> Result<Settings> {
    let target = match value {
        Value::Object(mut map) => match map.remove("domain") {
            Some(own @ Value::Object(_)) => own,
            _ => match map.remove("targetObject") {
                Some(Value::Array(mut items)) if !items.is_empty() => items.swap_remove(0),
                _ => Value::Object(map),
            },
        },
        other => other,
    };
    serde_json::from_value(target).map_err(|e| ApiError::ParseError {
        detail: e.to_string(),
    })
}

impl MyrasecClient {
    async fn put_settings(&self, path: &str, settings: &Settings) -> Result<Settings> {
        let text = self.write(Method::PUT, path, settings).await?;
        if text.trim().is_empty() {
            return Ok(settings.clone());
        }
        settings_from_value(HttpUtils::parse_json(&text)?)
    }
}

#[async_trait]
impl MyrasecApi for MyrasecClient {
    // ==================== 域名 ====================

    async fn list_domains(&self, params: &ListParams) -> Result<Vec<Domain>> {
        self.list("/domains", params).await
    }

    async fn fetch_domain_by_name(&self, name: &str) -> Result<Domain> {
        let wanted = name.trim_end_matches('.').to_lowercase();
        let params = ListParams::default().search(wanted.clone()).exact();
        let domains: Vec<Domain> = self.list("/domains", &params).await?;
        domains
            .into_iter()
            .find(|d| d.name.trim_end_matches('.').eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| ApiError::NotFound {
                path: "/domains".to_string(),
                raw_message: Some(format!("domain '{name}' not found")),
            })
    }

    async fn create_domain(&self, domain: &Domain) -> Result<Domain> {
        self.create("/domains", domain).await
    }

    async fn update_domain(&self, domain: &Domain) -> Result<Domain> {
        self.update("/domains", domain).await
    }

    async fn delete_domain(&self, domain: &Domain) -> Result<()> {
        self.remove("/domains", domain).await
    }

    // ==================== 子域名 ====================

    async fn list_subdomains(&self, domain_id: i64, params: &ListParams) -> Result<Vec<VHost>> {
        self.list(&domain_path(domain_id, "subdomains"), params).await
    }

    async fn list_all_subdomains(&self, params: &ListParams) -> Result<Vec<VHost>> {
        self.list("/subdomains", params).await
    }

    // ==================== DNS 记录 ====================

    async fn list_dns_records(
        &self,
        domain_id: i64,
        params: &ListParams,
    ) -> Result<Vec<DnsRecord>> {
        self.list(&domain_path(domain_id, "dns-records"), params)
            .await
    }

    async fn create_dns_record(&self, domain_id: i64, record: &DnsRecord) -> Result<DnsRecord> {
        self.create(&domain_path(domain_id, "dns-records"), record)
            .await
    }

    async fn update_dns_record(&self, domain_id: i64, record: &DnsRecord) -> Result<DnsRecord> {
        self.update(&domain_path(domain_id, "dns-records"), record)
            .await
    }

    async fn delete_dns_record(&self, domain_id: i64, record: &DnsRecord) -> Result<()> {
        self.remove(&domain_path(domain_id, "dns-records"), record)
            .await
    }

    // ==================== 缓存规则 ====================

    async fn list_cache_settings(
        &self,
        domain_id: i64,
        subdomain: &str,
        params: &ListParams,
    ) -> Result<Vec<CacheSetting>> {
        self.list(&subdomain_path(domain_id, subdomain, "cache-settings"), params)
            .await
    }

    async fn create_cache_setting(
        &self,
        domain_id: i64,
        subdomain: &str,
        setting: &CacheSetting,
    ) -> Result<CacheSetting> {
        self.create(&subdomain_path(domain_id, subdomain, "cache-settings"), setting)
            .await
    }

    async fn update_cache_setting(
        &self,
        domain_id: i64,
        subdomain: &str,
        setting: &CacheSetting,
    ) -> Result<CacheSetting> {
        self.update(&subdomain_path(domain_id, subdomain, "cache-settings"), setting)
            .await
    }

    async fn delete_cache_setting(
        &self,
        domain_id: i64,
        subdomain: &str,
        setting: &CacheSetting,
    ) -> Result<()> {
        self.remove(&subdomain_path(domain_id, subdomain, "cache-settings"), setting)
            .await
    }

    // ==================== 重定向 ====================

    async fn list_redirects(
        &self,
        domain_id: i64,
        subdomain: &str,
        params: &ListParams,
    ) -> Result<Vec<Redirect>> {
        self.list(&subdomain_path(domain_id, subdomain, "redirects"), params)
            .await
    }

    async fn create_redirect(
        &self,
        domain_id: i64,
        subdomain: &str,
        redirect: &Redirect,
    ) -> Result<Redirect> {
        self.create(&subdomain_path(domain_id, subdomain, "redirects"), redirect)
            .await
    }

    async fn update_redirect(
        &self,
        domain_id: i64,
        subdomain: &str,
        redirect: &Redirect,
    ) -> Result<Redirect> {
        self.update(&subdomain_path(domain_id, subdomain, "redirects"), redirect)
            .await
    }

    async fn delete_redirect(
        &self,
        domain_id: i64,
        subdomain: &str,
        redirect: &Redirect,
    ) -> Result<()> {
        self.remove(&subdomain_path(domain_id, subdomain, "redirects"), redirect)
            .await
    }

    // ==================== 限流 ====================

    async fn list_rate_limits(
        &self,
        domain_id: i64,
        subdomain: &str,
        params: &ListParams,
    ) -> Result<Vec<RateLimit>> {
        self.list(&subdomain_path(domain_id, subdomain, "ratelimits"), params)
            .await
    }

    async fn create_rate_limit(
        &self,
        domain_id: i64,
        subdomain: &str,
        limit: &RateLimit,
    ) -> Result<RateLimit> {
        self.create(&subdomain_path(domain_id, subdomain, "ratelimits"), limit)
            .await
    }

    async fn update_rate_limit(
        &self,
        domain_id: i64,
        subdomain: &str,
        limit: &RateLimit,
    ) -> Result<RateLimit> {
        self.update(&subdomain_path(domain_id, subdomain, "ratelimits"), limit)
            .await
    }

    async fn delete_rate_limit(
        &self,
        domain_id: i64,
        subdomain: &str,
        limit: &RateLimit,
    ) -> Result<()> {
        self.remove(&subdomain_path(domain_id, subdomain, "ratelimits"), limit)
            .await
    }

    // ==================== IP 过滤 ====================

    async fn list_ip_filters(
        &self,
        domain_id: i64,
        subdomain: &str,
        params: &ListParams,
    ) -> Result<Vec<IpFilter>> {
        self.list(&subdomain_path(domain_id, subdomain, "ip-filters"), params)
            .await
    }

    async fn create_ip_filter(
        &self,
        domain_id: i64,
        subdomain: &str,
        filter: &IpFilter,
    ) -> Result<IpFilter> {
        self.create(&subdomain_path(domain_id, subdomain, "ip-filters"), filter)
            .await
    }

    async fn update_ip_filter(
        &self,
        domain_id: i64,
        subdomain: &str,
        filter: &IpFilter,
    ) -> Result<IpFilter> {
        self.update(&subdomain_path(domain_id, subdomain, "ip-filters"), filter)
            .await
    }

    async fn delete_ip_filter(
        &self,
        domain_id: i64,
        subdomain: &str,
        filter: &IpFilter,
    ) -> Result<()> {
        self.remove(&subdomain_path(domain_id, subdomain, "ip-filters"), filter)
            .await
    }

    // ==================== 维护页 ====================

    async fn list_maintenances(
        &self,
        domain_id: i64,
        subdomain: &str,
        params: &ListParams,
    ) -> Result<Vec<Maintenance>> {
        self.list(&subdomain_path(domain_id, subdomain, "maintenances"), params)
            .await
    }

    async fn create_maintenance(
        &self,
        domain_id: i64,
        subdomain: &str,
        maintenance: &Maintenance,
    ) -> Result<Maintenance> {
        self.create(&subdomain_path(domain_id, subdomain, "maintenances"), maintenance)
            .await
    }

    async fn update_maintenance(
        &self,
        domain_id: i64,
        subdomain: &str,
        maintenance: &Maintenance,
    ) -> Result<Maintenance> {
        self.update(&subdomain_path(domain_id, subdomain, "maintenances"), maintenance)
            .await
    }

    async fn delete_maintenance(
        &self,
        domain_id: i64,
        subdomain: &str,
        maintenance: &Maintenance,
    ) -> Result<()> {
        self.remove(&subdomain_path(domain_id, subdomain, "maintenances"), maintenance)
            .await
    }

    async fn list_maintenance_templates(
        &self,
        domain_id: i64,
        params: &ListParams,
    ) -> Result<Vec<MaintenanceTemplate>> {
        self.list(&domain_path(domain_id, "maintenance-templates"), params)
            .await
    }

    async fn create_maintenance_template(
        &self,
        domain_id: i64,
        template: &MaintenanceTemplate,
    ) -> Result<MaintenanceTemplate> {
        self.create(&domain_path(domain_id, "maintenance-templates"), template)
            .await
    }

    async fn update_maintenance_template(
        &self,
        domain_id: i64,
        template: &MaintenanceTemplate,
    ) -> Result<MaintenanceTemplate> {
        self.update(&domain_path(domain_id, "maintenance-templates"), template)
            .await
    }

    async fn delete_maintenance_template(
        &self,
        domain_id: i64,
        template: &MaintenanceTemplate,
    ) -> Result<()> {
        self.remove(&domain_path(domain_id, "maintenance-templates"), template)
            .await
    }

    // ==================== 子域名设置 ====================

    async fn get_settings(&self, domain_id: i64, subdomain: &str) -> Result<Settings> {
        let value = self
            .fetch_value(&subdomain_path(domain_id, subdomain, "settings"))
            .await?;
        settings_from_value(value)
    }

    async fn update_settings(
        &self,
        domain_id: i64,
        subdomain: &str,
        settings: &Settings,
    ) -> Result<Settings> {
        self.put_settings(&subdomain_path(domain_id, subdomain, "settings"), settings)
            .await
    }

    // ==================== 错误页 ====================

    async fn list_error_pages(
        &self,
        domain_id: i64,
        params: &ListParams,
    ) -> Result<Vec<ErrorPage>> {
        self.list(&domain_path(domain_id, "errorpages"), params)
            .await
    }

    async fn create_error_page(&self, domain_id: i64, page: &ErrorPage) -> Result<ErrorPage> {
        self.create(&domain_path(domain_id, "errorpages"), page)
            .await
    }

    async fn update_error_page(&self, domain_id: i64, page: &ErrorPage) -> Result<ErrorPage> {
        self.update(&domain_path(domain_id, "errorpages"), page)
            .await
    }

    async fn delete_error_page(&self, domain_id: i64, page: &ErrorPage) -> Result<()> {
        self.remove(&domain_path(domain_id, "errorpages"), page)
            .await
    }

    // ==================== SSL ====================

    async fn list_ssl_certificates(
        &self,
        domain_id: i64,
        params: &ListParams,
    ) -> Result<Vec<SslCertificate>> {
        self.list(&domain_path(domain_id, "certificates"), params)
            .await
    }

    async fn get_ssl_certificate(&self, domain_id: i64, cert_id: i64) -> Result<SslCertificate> {
        self.fetch(&format!("/domain/{domain_id}/certificates/{cert_id}"))
            .await
    }

    async fn create_ssl_certificate(
        &self,
        domain_id: i64,
        cert: &SslCertificate,
    ) -> Result<SslCertificate> {
        self.create(&domain_path(domain_id, "certificates"), cert)
            .await
    }

    async fn update_ssl_certificate(
        &self,
        domain_id: i64,
        cert: &SslCertificate,
    ) -> Result<SslCertificate> {
        self.update(&domain_path(domain_id, "certificates"), cert)
            .await
    }

    async fn delete_ssl_certificate(&self, domain_id: i64, cert: &SslCertificate) -> Result<()> {
        self.remove(&domain_path(domain_id, "certificates"), cert)
            .await
    }

    async fn list_ssl_configurations(&self) -> Result<Vec<SslConfiguration>> {
        self.list("/ssl-configurations", &ListParams::default())
            .await
    }

    // ==================== WAF ====================

    async fn list_waf_rules(
        &self,
        domain_id: i64,
        subdomain: Option<&str>,
        params: &ListParams,
    ) -> Result<Vec<WafRule>> {
        let mut query = params.to_query();
        if let Some(subdomain) = subdomain.filter(|s| !s.is_empty()) {
            query.push(("subDomain".to_string(), subdomain.to_string()));
        }
        self.list_with_query(&domain_path(domain_id, "waf-rules"), &query)
            .await
    }

    async fn get_waf_rule(&self, rule_id: i64) -> Result<WafRule> {
        self.fetch(&format!("/waf-rules/{rule_id}")).await
    }

    async fn create_waf_rule(
        &self,
        domain_id: i64,
        subdomain: &str,
        rule: &WafRule,
    ) -> Result<WafRule> {
        let rule = self
            .create(&subdomain_path(domain_id, subdomain, "waf-rules"), rule)
            .await?;
        self.cache.prune(&domain_path(domain_id, "waf-rules")).await;
        Ok(rule)
    }

    async fn update_waf_rule(
        &self,
        domain_id: i64,
        subdomain: &str,
        rule: &WafRule,
    ) -> Result<WafRule> {
        let rule = self
            .update(&subdomain_path(domain_id, subdomain, "waf-rules"), rule)
            .await?;
        self.cache.prune(&domain_path(domain_id, "waf-rules")).await;
        Ok(rule)
    }

    async fn delete_waf_rule(&self, domain_id: i64, subdomain: &str, rule: &WafRule) -> Result<()> {
        self.remove(&subdomain_path(domain_id, subdomain, "waf-rules"), rule)
            .await?;
        self.cache.prune(&domain_path(domain_id, "waf-rules")).await;
        Ok(())
    }

    async fn list_waf_conditions(&self) -> Result<Vec<WafCondition>> {
        self.list("/waf-conditions", &ListParams::default()).await
    }

    async fn list_waf_actions(&self) -> Result<Vec<WafAction>> {
        self.list("/waf-actions", &ListParams::default()).await
    }

    // ==================== 标签 ====================

    async fn list_tags(&self, params: &ListParams) -> Result<Vec<Tag>> {
        self.list("/tags", params).await
    }

    async fn get_tag(&self, tag_id: i64) -> Result<Tag> {
        self.fetch(&format!("/tags/{tag_id}")).await
    }

    async fn create_tag(&self, tag: &Tag) -> Result<Tag> {
        self.create("/tags", tag).await
    }

    async fn update_tag(&self, tag: &Tag) -> Result<Tag> {
        self.update("/tags", tag).await
    }

    async fn delete_tag(&self, tag: &Tag) -> Result<()> {
        self.remove("/tags", tag).await
    }

    async fn list_tag_cache_settings(
        &self,
        tag_id: i64,
        params: &ListParams,
    ) -> Result<Vec<CacheSetting>> {
        self.list(&tag_path(tag_id, "cache-settings"), params).await
    }

    async fn create_tag_cache_setting(
        &self,
        tag_id: i64,
        setting: &CacheSetting,
    ) -> Result<CacheSetting> {
        self.create(&tag_path(tag_id, "cache-settings"), setting)
            .await
    }

    async fn update_tag_cache_setting(
        &self,
        tag_id: i64,
        setting: &CacheSetting,
    ) -> Result<CacheSetting> {
        self.update(&tag_path(tag_id, "cache-settings"), setting)
            .await
    }

    async fn delete_tag_cache_setting(&self, tag_id: i64, setting: &CacheSetting) -> Result<()> {
        self.remove(&tag_path(tag_id, "cache-settings"), setting)
            .await
    }

    async fn list_tag_waf_rules(&self, tag_id: i64, params: &ListParams) -> Result<Vec<WafRule>> {
        self.list(&tag_path(tag_id, "waf-rules"), params).await
    }

    async fn create_tag_waf_rule(&self, tag_id: i64, rule: &WafRule) -> Result<WafRule> {
        self.create(&tag_path(tag_id, "waf-rules"), rule).await
    }

    async fn update_tag_waf_rule(&self, tag_id: i64, rule: &WafRule) -> Result<WafRule> {
        self.update(&tag_path(tag_id, "waf-rules"), rule).await
    }

    async fn delete_tag_waf_rule(&self, tag_id: i64, rule: &WafRule) -> Result<()> {
        self.remove(&tag_path(tag_id, "waf-rules"), rule).await
    }

    async fn get_tag_settings(&self, tag_id: i64) -> Result<Settings> {
        let value = self.fetch_value(&tag_path(tag_id, "settings")).await?;
        settings_from_value(value)
    }

    async fn update_tag_settings(&self, tag_id: i64, settings: &Settings) -> Result<Settings> {
        self.put_settings(&tag_path(tag_id, "settings"), settings)
            .await
    }

    async fn list_tag_information(
        &self,
        tag_id: i64,
        params: &ListParams,
    ) -> Result<Vec<TagInformation>> {
        self.list(&tag_path(tag_id, "information"), params).await
    }

    // ==================== 等候室 ====================

    async fn list_waiting_rooms(
        &self,
        domain_id: i64,
        params: &ListParams,
    ) -> Result<Vec<WaitingRoom>> {
        self.list(&domain_path(domain_id, "waiting-rooms"), params)
            .await
    }

    async fn create_waiting_room(&self, domain_id: i64, room: &WaitingRoom) -> Result<WaitingRoom> {
        self.create(&domain_path(domain_id, "waiting-rooms"), room)
            .await
    }

    async fn update_waiting_room(&self, domain_id: i64, room: &WaitingRoom) -> Result<WaitingRoom> {
        self.update(&domain_path(domain_id, "waiting-rooms"), room)
            .await
    }

    async fn delete_waiting_room(&self, domain_id: i64, room: &WaitingRoom) -> Result<()> {
        self.remove(&domain_path(domain_id, "waiting-rooms"), room)
            .await
    }

    // ==================== 账户 ====================

    async fn list_api_keys(&self, params: &ListParams) -> Result<Vec<ApiKey>> {
        self.list("/apikeys", params).await
    }

    async fn create_api_key(&self, key: &ApiKey) -> Result<ApiKey> {
        self.create("/apikeys", key).await
    }

    async fn delete_api_key(&self, key: &ApiKey) -> Result<()> {
        self.remove("/apikeys", key).await
    }

    async fn list_ip_ranges(&self, params: &ListParams) -> Result<Vec<IpRange>> {
        self.list("/ip-ranges", params).await
    }

    // ==================== 缓存 ====================

    async fn prune_cache(&self, prefix: &str) {
        self.cache.prune(prefix).await;
    }
}
