//! 限流退避 - 所有并发评估共享同一个暂停时间点

use async_trait::async_trait;
use hub::{AccountId, FollowSource, HubError, PagedSet, ProfileSummary, Relation};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

pub struct RateLimitGate {
    resume_at: Mutex<Option<Instant>>,
    max_backoff: Duration,
    tripped: AtomicBool,
}

impl RateLimitGate {
    pub fn new(max_backoff: Duration) -> Self {
        Self {
            resume_at: Mutex::new(None),
            max_backoff,
            tripped: AtomicBool::new(false),
        }
    }

    /// 等到暂停结束
    pub async fn wait(&self) {
        let resume_at = *self.resume_at.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(deadline) = resume_at {
            if deadline > Instant::now() {
                tokio::time::sleep_until(deadline).await;
            }
        }
    }

    /// 记录失败；限流信号会推迟所有后续请求
    pub fn record(&self, error: &HubError) {
        if !error.is_rate_limited() {
            return;
        }
        self.tripped.store(true, Ordering::Relaxed);

        let Some(retry_after) = error.retry_after() else {
            tracing::warn!("rate limited without a reset hint: {}", error);
            return;
        };
        let backoff = retry_after.min(self.max_backoff);
        let deadline = Instant::now() + backoff;

        let mut resume_at = self.resume_at.lock().unwrap_or_else(|e| e.into_inner());
        if resume_at.map_or(true, |current| deadline > current) {
            tracing::warn!(backoff_secs = backoff.as_secs_f64(), "rate limited, pausing requests");
            *resume_at = Some(deadline);
        }
    }

    /// 本次运行是否遇到过限流
    pub fn tripped(&self) -> bool {
        self.tripped.load(Ordering::Relaxed)
    }

    pub fn resume_at(&self) -> Option<Instant> {
        *self.resume_at.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// 在数据源前加一层限流闸门
pub struct Throttled<S: ?Sized> {
    gate: Arc<RateLimitGate>,
    inner: Arc<S>,
}

impl<S: ?Sized> Throttled<S> {
    pub fn new(inner: Arc<S>, gate: Arc<RateLimitGate>) -> Self {
        Self { gate, inner }
    }
}

#[async_trait]
impl<S: FollowSource + ?Sized> FollowSource for Throttled<S> {
    async fn fetch_profile_summary(&self, id: &AccountId) -> hub::Result<ProfileSummary> {
        self.gate.wait().await;
        let result = self.inner.fetch_profile_summary(id).await;
        if let Err(e) = &result {
            self.gate.record(e);
        }
        result
    }

    async fn fetch_paged_set(&self, relation: Relation, id: &AccountId) -> PagedSet {
        self.gate.wait().await;
        let set = self.inner.fetch_paged_set(relation, id).await;
        if let Some(e) = &set.failure {
            self.gate.record(e);
        }
        set
    }
}
