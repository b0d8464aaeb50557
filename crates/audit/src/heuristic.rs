use hub::{AccountId, FollowSource, ProfileSummary};
use serde::Serialize;

use crate::config::AuditConfig;
use crate::mutuality::{FollowSet, MutualCounts, MutualityReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Fast,
    Slow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    LikelySpam,
    LikelyGenuine,
    Inconclusive,
}

/// 单层检查的判定结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpamVerdict {
    pub id: AccountId,
    pub tier: Tier,
    /// 比值无定义时为 None (分母为 0 或计数未知)
    pub ratio: Option<f64>,
    pub classification: Classification,
    pub reason: String,
}

impl SpamVerdict {
    fn new(id: &AccountId, tier: Tier, ratio: Option<f64>, classification: Classification, reason: impl Into<String>) -> Self {
        Self {
            id: id.clone(),
            tier,
            ratio,
            classification,
            reason: reason.into(),
        }
    }

    pub fn is_spam(&self) -> bool {
        self.classification == Classification::LikelySpam
    }
}

/// 慢速检查的结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SlowOutcome {
    /// 规模超过上限，未尝试
    Gated,
    Evaluated { verdict: SpamVerdict, counts: MutualCounts },
    /// 抓取失败或不完整，沿用快速检查结果
    Inconclusive { verdict: SpamVerdict, counts: MutualCounts },
}

impl SlowOutcome {
    /// 被检查账号自身的互关计数
    pub fn counts(&self) -> Option<&MutualCounts> {
        match self {
            SlowOutcome::Gated => None,
            SlowOutcome::Evaluated { counts, .. } | SlowOutcome::Inconclusive { counts, .. } => Some(counts),
        }
    }
}

/// 单个账号的完整评估
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountAssessment {
    pub summary: ProfileSummary,
    pub fast: SpamVerdict,
    pub slow: SlowOutcome,
    pub rate_limited: bool,
}

impl AccountAssessment {
    /// 慢速检查有结果时以其为准
    pub fn final_verdict(&self) -> &SpamVerdict {
        match &self.slow {
            SlowOutcome::Evaluated { verdict, .. } => verdict,
            SlowOutcome::Gated | SlowOutcome::Inconclusive { .. } => &self.fast,
        }
    }
}

/// 两层垃圾账号启发式
#[derive(Debug, Clone)]
pub struct SpamHeuristicEngine {
    config: AuditConfig,
}

impl SpamHeuristicEngine {
    pub fn new(config: AuditConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    /// 快速检查 - 只看计数
    pub fn fast_tier(&self, summary: &ProfileSummary) -> SpamVerdict {
        let id = &summary.id;
        let following = match summary.following_count {
            Some(n) if n > 0 => n,
            _ => {
                return SpamVerdict::new(
                    id,
                    Tier::Fast,
                    None,
                    Classification::LikelySpam,
                    "zero or unknown following count",
                )
            }
        };
        let Some(followers) = summary.followers_count else {
            return SpamVerdict::new(id, Tier::Fast, None, Classification::Inconclusive, "unknown follower count");
        };

        let ratio = followers as f64 / following as f64;
        let threshold = self.config.fast_ratio_threshold;
        if ratio > threshold {
            SpamVerdict::new(
                id,
                Tier::Fast,
                Some(ratio),
                Classification::LikelySpam,
                format!("followers/following ratio {:.2} exceeds {}", ratio, threshold),
            )
        } else {
            SpamVerdict::new(
                id,
                Tier::Fast,
                Some(ratio),
                Classification::LikelyGenuine,
                format!("followers/following ratio {:.2} within {}", ratio, threshold),
            )
        }
    }

    /// 两个计数都已知且低于上限才允许慢速检查
    pub fn slow_gate_open(&self, summary: &ProfileSummary) -> bool {
        match (summary.followers_count, summary.following_count) {
            (Some(followers), Some(following)) => {
                followers < self.config.max_followers_ceiling && following < self.config.max_following_ceiling
            }
            _ => false,
        }
    }

    /// 慢速检查 - 基于互关分析
    pub fn slow_tier(&self, id: &AccountId, report: &MutualityReport) -> SpamVerdict {
        if !report.completeness().is_complete() {
            return SpamVerdict::new(
                id,
                Tier::Slow,
                None,
                Classification::Inconclusive,
                format!("follow sets incomplete ({:?})", report.completeness()),
            );
        }

        let mutual = report.mutual_followers_count();
        if mutual == 0 {
            return SpamVerdict::new(id, Tier::Slow, None, Classification::LikelySpam, "no mutual followers");
        }

        let ratio = report.non_mutual_followers_count() as f64 / mutual as f64;
        let threshold = self.config.slow_ratio_threshold;
        if ratio > threshold {
            SpamVerdict::new(
                id,
                Tier::Slow,
                Some(ratio),
                Classification::LikelySpam,
                format!("non-mutual/mutual ratio {:.2} exceeds {}", ratio, threshold),
            )
        } else {
            SpamVerdict::new(
                id,
                Tier::Slow,
                Some(ratio),
                Classification::LikelyGenuine,
                format!("non-mutual/mutual ratio {:.2} within {}", ratio, threshold),
            )
        }
    }

    /// 评估已取得概要的账号: 快速检查，再按规模上限决定是否慢速检查
    pub async fn evaluate<S: FollowSource + ?Sized>(&self, source: &S, summary: ProfileSummary) -> AccountAssessment {
        let fast = self.fast_tier(&summary);

        if !self.slow_gate_open(&summary) {
            tracing::debug!(account = %summary.id, "slow check skipped by size ceiling");
            return AccountAssessment {
                summary,
                fast,
                slow: SlowOutcome::Gated,
                rate_limited: false,
            };
        }

        let follow_set = FollowSet::fetch(source, &summary.id).await;
        let report = follow_set.mutuality();
        let verdict = self.slow_tier(&summary.id, &report);
        let counts = report.counts();
        let rate_limited = follow_set.rate_limited();

        let slow = if verdict.classification == Classification::Inconclusive {
            for (relation, e) in follow_set.failures() {
                tracing::warn!(account = %summary.id, "slow check degraded, {} fetch failed: {}", relation, e);
            }
            SlowOutcome::Inconclusive { verdict, counts }
        } else {
            SlowOutcome::Evaluated { verdict, counts }
        };

        AccountAssessment {
            summary,
            fast,
            slow,
            rate_limited,
        }
    }

    /// 获取概要后评估单个账号
    pub async fn assess<S: FollowSource + ?Sized>(&self, source: &S, id: &AccountId) -> hub::Result<AccountAssessment> {
        let summary = source.fetch_profile_summary(id).await?;
        Ok(self.evaluate(source, summary).await)
    }
}
