//! 客户端配置

use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// GitHub 单页上限
pub const MAX_PER_PAGE: u32 = 100;

/// GitHub 客户端配置
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub token: Option<String>,
    pub per_page: u32,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            per_page: MAX_PER_PAGE,
            timeout: Duration::from_secs(30),
            user_agent: concat!("kith/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("GITHUB_API_URL") {
            if !v.trim().is_empty() {
                config.api_url = v.trim().to_string();
            }
        }

        if let Ok(v) = std::env::var("GITHUB_TOKEN") {
            if !v.trim().is_empty() {
                config.token = Some(v.trim().to_string());
            }
        }

        if let Ok(v) = std::env::var("KITH_PER_PAGE") {
            if let Ok(n) = v.parse() {
                config = config.with_per_page(n);
            }
        }

        if let Ok(v) = std::env::var("KITH_HTTP_TIMEOUT_SECS") {
            if let Ok(secs) = v.parse() {
                config.timeout = Duration::from_secs(secs);
            }
        }

        config
    }

    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    pub fn with_api_url(mut self, url: &str) -> Self {
        self.api_url = url.to_string();
        self
    }

    /// 限制在 1..=100
    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page.clamp(1, MAX_PER_PAGE);
        self
    }
}
