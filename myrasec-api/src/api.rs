use async_trait::async_trait;

use crate::error::{ApiError, Result};
use crate::types::{
    ApiKey, CacheSetting, DnsRecord, Domain, ErrorPage, IpFilter, IpRange, ListParams,
    Maintenance, MaintenanceTemplate, RateLimit, Redirect, Settings, SslCertificate,
    SslConfiguration, Tag, TagInformation, VHost, WafAction, WafCondition, WafRule, WaitingRoom,
};

/// Myra API 接口
///
/// 每个方法对应一个 REST 端点。列表方法只返回单页结果，分页由调用方负责。
/// 子域名作用域的方法需要所属域名的 id 以及子域名的完整名称（FQDN）。
///
/// [`MyrasecClient`](crate::MyrasecClient) 是基于 reqwest 的实现；测试可以
/// 用内存实现替换。
#[async_trait]
pub trait MyrasecApi: Send + Sync {
    // ==================== 域名 ====================

    async fn list_domains(&self, params: &ListParams) -> Result<Vec<Domain>>;

    /// 按名称精确查询域名
    ///
    /// 默认返回 [`ApiError::Unsupported`]，调用方应回退到分页扫描。
    async fn fetch_domain_by_name(&self, name: &str) -> Result<Domain> {
        let _ = name;
        Err(ApiError::Unsupported {
            operation: "fetch_domain_by_name".to_string(),
        })
    }

    async fn create_domain(&self, domain: &Domain) -> Result<Domain>;
    async fn update_domain(&self, domain: &Domain) -> Result<Domain>;
    async fn delete_domain(&self, domain: &Domain) -> Result<()>;

    // ==================== 子域名 ====================

    async fn list_subdomains(&self, domain_id: i64, params: &ListParams) -> Result<Vec<VHost>>;

    /// 跨域名搜索子域名（配合 `search` 与 `filterType=exact`）
    async fn list_all_subdomains(&self, params: &ListParams) -> Result<Vec<VHost>>;

    // ==================== DNS 记录 ====================

    async fn list_dns_records(&self, domain_id: i64, params: &ListParams)
    -> Result<Vec<DnsRecord>>;
    async fn create_dns_record(&self, domain_id: i64, record: &DnsRecord) -> Result<DnsRecord>;
    async fn update_dns_record(&self, domain_id: i64, record: &DnsRecord) -> Result<DnsRecord>;
    async fn delete_dns_record(&self, domain_id: i64, record: &DnsRecord) -> Result<()>;

    // ==================== 缓存规则 ====================

    async fn list_cache_settings(
        &self,
        domain_id: i64,
        subdomain: &str,
        params: &ListParams,
    ) -> Result<Vec<CacheSetting>>;
    async fn create_cache_setting(
        &self,
        domain_id: i64,
        subdomain: &str,
        setting: &CacheSetting,
    ) -> Result<CacheSetting>;
    async fn update_cache_setting(
        &self,
        domain_id: i64,
        subdomain: &str,
        setting: &CacheSetting,
    ) -> Result<CacheSetting>;
    async fn delete_cache_setting(
        &self,
        domain_id: i64,
        subdomain: &str,
        setting: &CacheSetting,
    ) -> Result<()>;

    // ==================== 重定向 ====================

    async fn list_redirects(
        &self,
        domain_id: i64,
        subdomain: &str,
        params: &ListParams,
    ) -> Result<Vec<Redirect>>;
    async fn create_redirect(
        &self,
        domain_id: i64,
        subdomain: &str,
        redirect: &Redirect,
    ) -> Result<Redirect>;
    async fn update_redirect(
        &self,
        domain_id: i64,
        subdomain: &str,
        redirect: &Redirect,
    ) -> Result<Redirect>;
    async fn delete_redirect(&self, domain_id: i64, subdomain: &str, redirect: &Redirect)
    -> Result<()>;

    // ==================== 限流 ====================

    async fn list_rate_limits(
        &self,
        domain_id: i64,
        subdomain: &str,
        params: &ListParams,
    ) -> Result<Vec<RateLimit>>;
    async fn create_rate_limit(
        &self,
        domain_id: i64,
        subdomain: &str,
        limit: &RateLimit,
    ) -> Result<RateLimit>;
    async fn update_rate_limit(
        &self,
        domain_id: i64,
        subdomain: &str,
        limit: &RateLimit,
    ) -> Result<RateLimit>;
    async fn delete_rate_limit(&self, domain_id: i64, subdomain: &str, limit: &RateLimit)
    -> Result<()>;

    // ==================== IP 过滤 ====================

    async fn list_ip_filters(
        &self,
        domain_id: i64,
        subdomain: &str,
        params: &ListParams,
    ) -> Result<Vec<IpFilter>>;
    async fn create_ip_filter(
        &self,
        domain_id: i64,
        subdomain: &str,
        filter: &IpFilter,
    ) -> Result<IpFilter>;
    async fn update_ip_filter(
        &self,
        domain_id: i64,
        subdomain: &str,
        filter: &IpFilter,
    ) -> Result<IpFilter>;
    async fn delete_ip_filter(&self, domain_id: i64, subdomain: &str, filter: &IpFilter)
    -> Result<()>;

    // ==================== 维护页 ====================

    async fn list_maintenances(
        &self,
        domain_id: i64,
        subdomain: &str,
        params: &ListParams,
    ) -> Result<Vec<Maintenance>>;
    async fn create_maintenance(
        &self,
        domain_id: i64,
        subdomain: &str,
        maintenance: &Maintenance,
    ) -> Result<Maintenance>;
    async fn update_maintenance(
        &self,
        domain_id: i64,
        subdomain: &str,
        maintenance: &Maintenance,
    ) -> Result<Maintenance>;
    async fn delete_maintenance(
        &self,
        domain_id: i64,
        subdomain: &str,
        maintenance: &Maintenance,
    ) -> Result<()>;

    async fn list_maintenance_templates(
        &self,
        domain_id: i64,
        params: &ListParams,
    ) -> Result<Vec<MaintenanceTemplate>>;
    async fn create_maintenance_template(
        &self,
        domain_id: i64,
        template: &MaintenanceTemplate,
    ) -> Result<MaintenanceTemplate>;
    async fn update_maintenance_template(
        &self,
        domain_id: i64,
        template: &MaintenanceTemplate,
    ) -> Result<MaintenanceTemplate>;
    async fn delete_maintenance_template(
        &self,
        domain_id: i64,
        template: &MaintenanceTemplate,
    ) -> Result<()>;

    // ==================== 子域名设置 ====================

    async fn get_settings(&self, domain_id: i64, subdomain: &str) -> Result<Settings>;
    async fn update_settings(
        &self,
        domain_id: i64,
        subdomain: &str,
        settings: &Settings,
    ) -> Result<Settings>;

    // ==================== 错误页 ====================

    async fn list_error_pages(&self, domain_id: i64, params: &ListParams)
    -> Result<Vec<ErrorPage>>;
    async fn create_error_page(&self, domain_id: i64, page: &ErrorPage) -> Result<ErrorPage>;
    async fn update_error_page(&self, domain_id: i64, page: &ErrorPage) -> Result<ErrorPage>;
    async fn delete_error_page(&self, domain_id: i64, page: &ErrorPage) -> Result<()>;

    // ==================== SSL ====================

    async fn list_ssl_certificates(
        &self,
        domain_id: i64,
        params: &ListParams,
    ) -> Result<Vec<SslCertificate>>;
    async fn get_ssl_certificate(&self, domain_id: i64, cert_id: i64) -> Result<SslCertificate>;
    async fn create_ssl_certificate(
        &self,
        domain_id: i64,
        cert: &SslCertificate,
    ) -> Result<SslCertificate>;
    async fn update_ssl_certificate(
        &self,
        domain_id: i64,
        cert: &SslCertificate,
    ) -> Result<SslCertificate>;
    async fn delete_ssl_certificate(&self, domain_id: i64, cert: &SslCertificate) -> Result<()>;
    async fn list_ssl_configurations(&self) -> Result<Vec<SslConfiguration>>;

    // ==================== WAF ====================

    /// 列出域名下的 WAF 规则，`subdomain` 为空时不按子域名过滤
    async fn list_waf_rules(
        &self,
        domain_id: i64,
        subdomain: Option<&str>,
        params: &ListParams,
    ) -> Result<Vec<WafRule>>;
    async fn get_waf_rule(&self, rule_id: i64) -> Result<WafRule>;
    async fn create_waf_rule(&self, domain_id: i64, subdomain: &str, rule: &WafRule)
    -> Result<WafRule>;
    async fn update_waf_rule(&self, domain_id: i64, subdomain: &str, rule: &WafRule)
    -> Result<WafRule>;
    async fn delete_waf_rule(&self, domain_id: i64, subdomain: &str, rule: &WafRule)
    -> Result<()>;
    async fn list_waf_conditions(&self) -> Result<Vec<WafCondition>>;
    async fn list_waf_actions(&self) -> Result<Vec<WafAction>>;

    // ==================== 标签 ====================

    async fn list_tags(&self, params: &ListParams) -> Result<Vec<Tag>>;
    async fn get_tag(&self, tag_id: i64) -> Result<Tag>;
    async fn create_tag(&self, tag: &Tag) -> Result<Tag>;
    async fn update_tag(&self, tag: &Tag) -> Result<Tag>;
    async fn delete_tag(&self, tag: &Tag) -> Result<()>;

    async fn list_tag_cache_settings(
        &self,
        tag_id: i64,
        params: &ListParams,
    ) -> Result<Vec<CacheSetting>>;
    async fn create_tag_cache_setting(
        &self,
        tag_id: i64,
        setting: &CacheSetting,
    ) -> Result<CacheSetting>;
    async fn update_tag_cache_setting(
        &self,
        tag_id: i64,
        setting: &CacheSetting,
    ) -> Result<CacheSetting>;
    async fn delete_tag_cache_setting(&self, tag_id: i64, setting: &CacheSetting) -> Result<()>;

    async fn list_tag_waf_rules(&self, tag_id: i64, params: &ListParams) -> Result<Vec<WafRule>>;
    async fn create_tag_waf_rule(&self, tag_id: i64, rule: &WafRule) -> Result<WafRule>;
    async fn update_tag_waf_rule(&self, tag_id: i64, rule: &WafRule) -> Result<WafRule>;
    async fn delete_tag_waf_rule(&self, tag_id: i64, rule: &WafRule) -> Result<()>;

    /// 标签设置是部分覆盖：只有非 `None` 字段会被发送
    async fn get_tag_settings(&self, tag_id: i64) -> Result<Settings>;
    async fn update_tag_settings(&self, tag_id: i64, settings: &Settings) -> Result<Settings>;

    async fn list_tag_information(
        &self,
        tag_id: i64,
        params: &ListParams,
    ) -> Result<Vec<TagInformation>>;

    // ==================== 等候室 ====================

    async fn list_waiting_rooms(
        &self,
        domain_id: i64,
        params: &ListParams,
    ) -> Result<Vec<WaitingRoom>>;
    async fn create_waiting_room(&self, domain_id: i64, room: &WaitingRoom)
    -> Result<WaitingRoom>;
    async fn update_waiting_room(&self, domain_id: i64, room: &WaitingRoom)
    -> Result<WaitingRoom>;
    async fn delete_waiting_room(&self, domain_id: i64, room: &WaitingRoom) -> Result<()>;

    // ==================== 账户 ====================

    async fn list_api_keys(&self, params: &ListParams) -> Result<Vec<ApiKey>>;
    async fn create_api_key(&self, key: &ApiKey) -> Result<ApiKey>;
    async fn delete_api_key(&self, key: &ApiKey) -> Result<()>;

    async fn list_ip_ranges(&self, params: &ListParams) -> Result<Vec<IpRange>>;

    // ==================== 缓存 ====================

    /// 丢弃路径以 `prefix` 开头的缓存响应，空前缀清空全部缓存
    async fn prune_cache(&self, prefix: &str);
}
