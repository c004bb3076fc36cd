//! 共享测试工具和辅助函数

#![allow(dead_code)]

use std::env;
use std::path::PathBuf;

use myrasec_provider::Provider;
use serde_json::{Map, Value, json};

/// 跳过测试的宏（当环境变量缺失时）
#[macro_export]
macro_rules! skip_if_no_credentials {
    ($($var:expr),+) => {
        $(
            if std::env::var($var).is_err() {
                eprintln!("跳过测试: 缺少环境变量 {}", $var);
                return;
            }
        )+
    };
}

/// 断言 `Option` 为 `Some`，并解包返回内部值（失败则直接让测试失败）。
#[macro_export]
macro_rules! require_some {
    ($expr:expr, $($msg:tt)+) => {{
        let opt = $expr;
        assert!(opt.is_some(), "{}", format_args!($($msg)+));
        let Some(val) = opt else {
            return;
        };
        val
    }};
}

/// 断言 `Result` 为 `Ok`，并解包返回内部值（失败则直接让测试失败）。
#[macro_export]
macro_rules! require_ok {
    ($expr:expr, $($msg:tt)+) => {{
        let res = $expr;
        assert!(
            res.is_ok(),
            "{}: {res:?}",
            format_args!($($msg)+)
        );
        let Ok(val) = res else {
            return;
        };
        val
    }};
}

/// 读取 `tests/fixtures` 下的 PEM 文件
pub fn fixture(name: &str) -> String {
    let path: PathBuf = [env!("CARGO_MANIFEST_DIR"), "tests", "fixtures", name]
        .iter()
        .collect();
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("无法读取 fixture {}: {e}", path.display()))
}

/// JSON 对象 → 配置块
pub fn config(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("配置必须是 JSON 对象: {other}"),
    }
}

/// 生成唯一的测试记录名（带 uuid 前缀，避免与现有记录冲突）
pub fn generate_test_record_name(domain: &str) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("tf-test-{}.{domain}", &suffix[..8])
}

/// 测试上下文
pub struct TestContext {
    pub provider: Provider,
    pub domain: String,
}

impl TestContext {
    /// 从 `MYRASEC_API_KEY` / `MYRASEC_API_SECRET` / `TEST_DOMAIN` 构造
    pub fn from_env() -> Option<Self> {
        let domain = env::var("TEST_DOMAIN").ok()?;
        let mut provider = Provider::new();
        let diags = provider.configure(&config(json!({"language": "en"})));
        if diags.has_error() {
            eprintln!("provider 配置失败: {diags:?}");
            return None;
        }
        Some(Self { provider, domain })
    }
}
