//! 共享测试工具和辅助函数

#![allow(dead_code)]

use std::env;

use myrasec_api::MyrasecClient;

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

/// 测试上下文
pub struct TestContext {
    pub client: MyrasecClient,
    pub domain: String,
}

impl TestContext {
    /// 从 `MYRASEC_API_KEY` / `MYRASEC_API_SECRET` / `TEST_DOMAIN` 构造
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("MYRASEC_API_KEY").ok()?;
        let secret = env::var("MYRASEC_API_SECRET").ok()?;
        let domain = env::var("TEST_DOMAIN").ok()?;
        let client = MyrasecClient::builder(api_key, secret)
            .user_agent("myrasec-api-tests")
            .build()
            .ok()?;
        Some(Self { client, domain })
    }
}
