//! Provider 端到端集成测试（真实 Myra API）
//!
//! 运行方式:
//! ```bash
//! MYRASEC_API_KEY=xxx MYRASEC_API_SECRET=xxx TEST_DOMAIN=example.com \
//!     cargo test -p myrasec-provider --test live_test -- --ignored --nocapture --test-threads=1
//! ```

mod common;

use common::{TestContext, config, generate_test_record_name};
use serde_json::json;

#[tokio::test]
#[ignore = "integration test: requires MYRASEC_API_KEY, MYRASEC_API_SECRET and TEST_DOMAIN"]
async fn test_dns_record_lifecycle() {
    skip_if_no_credentials!("MYRASEC_API_KEY", "MYRASEC_API_SECRET", "TEST_DOMAIN");

    let ctx = require_some!(TestContext::from_env(), "创建测试上下文失败");
    let name = generate_test_record_name(&ctx.domain);
    let desired = config(json!({
        "domain_name": ctx.domain,
        "name": name,
        "record_type": "A",
        "ttl": 300,
        "value": "192.0.2.10",
    }));

    // 1. 创建
    let created = ctx.provider.create("myrasec_dns_record", &desired).await;
    assert!(created.is_ok(), "创建记录失败: {:?}", created.diagnostics);
    let id = require_some!(created.id, "创建后应有 id");
    let state = require_some!(created.state, "创建后应有 state");
    println!("✓ 创建 {name} -> {id}");

    // 2. 无变更时计划为空
    let plan = ctx.provider.plan("myrasec_dns_record", Some(&state), &desired);
    let diff = require_some!(plan.diff, "计划失败: {:?}", plan.diagnostics);
    assert!(diff.is_empty(), "不应有漂移: {:?}", diff.changes);

    // 3. 更新
    let mut changed = desired.clone();
    changed.insert("value".into(), json!("192.0.2.11"));
    let updated = ctx
        .provider
        .update("myrasec_dns_record", &id, state, &changed)
        .await;
    assert!(updated.is_ok(), "更新记录失败: {:?}", updated.diagnostics);
    let state = require_some!(updated.state, "更新后应有 state");
    assert_eq!(state["value"], json!("192.0.2.11"));

    // 4. 导入
    let import_id = format!("{}:{id}", ctx.domain);
    let imported = ctx.provider.import("myrasec_dns_record", &import_id).await;
    assert!(imported.is_ok(), "导入失败: {:?}", imported.diagnostics);

    // 5. 删除后读取应清空 state
    let deleted = ctx
        .provider
        .delete("myrasec_dns_record", &id, state.clone())
        .await;
    assert!(deleted.is_ok(), "删除记录失败: {:?}", deleted.diagnostics);

    let gone = ctx.provider.read("myrasec_dns_record", &id, state).await;
    assert!(gone.state.is_none());
    assert!(!gone.diagnostics.has_error());

    println!("✓ DNS 记录生命周期测试通过");
}

#[tokio::test]
#[ignore = "integration test: requires MYRASEC_API_KEY, MYRASEC_API_SECRET and TEST_DOMAIN"]
async fn test_read_only_data_sources() {
    skip_if_no_credentials!("MYRASEC_API_KEY", "MYRASEC_API_SECRET", "TEST_DOMAIN");

    let ctx = require_some!(TestContext::from_env(), "创建测试上下文失败");
    for type_name in [
        "myrasec_ssl_configurations",
        "myrasec_waf_conditions",
        "myrasec_waf_actions",
        "myrasec_ip_ranges",
    ] {
        let result = ctx.provider.read_data_source(type_name, &config(json!({}))).await;
        assert!(result.is_ok(), "{type_name} 读取失败: {:?}", result.diagnostics);
        println!("✓ {type_name}");
    }

    let domains = ctx
        .provider
        .read_data_source(
            "myrasec_domains",
            &config(json!({"filter": [{"name": ctx.domain}]})),
        )
        .await;
    let state = require_some!(domains.state, "域名数据源读取失败: {:?}", domains.diagnostics);
    assert!(
        state["domains"].as_array().is_some_and(|d| !d.is_empty()),
        "TEST_DOMAIN 应出现在域名列表中"
    );
}
