//! 审计配置

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be a positive number, got {value}")]
    NonPositive { name: &'static str, value: f64 },
    #[error("{0} must be at least 1")]
    Zero(&'static str),
}

/// 审计配置 - 阈值、慢速检查的规模上限和并发上限
#[derive(Debug, Clone, PartialEq)]
pub struct AuditConfig {
    /// 快速检查: followers / following 超过该值视为可疑
    pub fast_ratio_threshold: f64,
    /// 慢速检查: 非互关 / 互关 超过该值视为可疑
    pub slow_ratio_threshold: f64,
    /// followers 数低于该值才做慢速检查
    pub max_followers_ceiling: u64,
    /// following 数低于该值才做慢速检查
    pub max_following_ceiling: u64,
    pub max_concurrent_pipelines: usize,
    /// 限流等待的上限
    pub max_backoff: Duration,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            fast_ratio_threshold: 10.0,
            slow_ratio_threshold: 0.5,
            max_followers_ceiling: 2400,
            max_following_ceiling: 2800,
            max_concurrent_pipelines: 8,
            max_backoff: Duration::from_secs(60),
        }
    }
}

impl AuditConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(v) = env_parse("KITH_FAST_RATIO") {
            config.fast_ratio_threshold = v;
        }
        if let Some(v) = env_parse("KITH_SLOW_RATIO") {
            config.slow_ratio_threshold = v;
        }
        if let Some(v) = env_parse("KITH_MAX_FOLLOWERS") {
            config.max_followers_ceiling = v;
        }
        if let Some(v) = env_parse("KITH_MAX_FOLLOWING") {
            config.max_following_ceiling = v;
        }
        if let Some(v) = env_parse("KITH_MAX_CONCURRENT") {
            config.max_concurrent_pipelines = v;
        }
        if let Some(secs) = env_parse("KITH_MAX_BACKOFF_SECS") {
            config.max_backoff = Duration::from_secs(secs);
        }

        config
    }

    pub fn with_fast_ratio(mut self, threshold: f64) -> Self {
        self.fast_ratio_threshold = threshold;
        self
    }

    pub fn with_slow_ratio(mut self, threshold: f64) -> Self {
        self.slow_ratio_threshold = threshold;
        self
    }

    pub fn with_ceilings(mut self, max_followers: u64, max_following: u64) -> Self {
        self.max_followers_ceiling = max_followers;
        self.max_following_ceiling = max_following;
        self
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent_pipelines = max_concurrent;
        self
    }

    pub fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("fast_ratio_threshold", self.fast_ratio_threshold),
            ("slow_ratio_threshold", self.slow_ratio_threshold),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositive { name, value });
            }
        }
        if self.max_followers_ceiling == 0 {
            return Err(ConfigError::Zero("max_followers_ceiling"));
        }
        if self.max_following_ceiling == 0 {
            return Err(ConfigError::Zero("max_following_ceiling"));
        }
        if self.max_concurrent_pipelines == 0 {
            return Err(ConfigError::Zero("max_concurrent_pipelines"));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok()?.trim().parse().ok()
}
