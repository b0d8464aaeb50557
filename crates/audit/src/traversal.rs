use hub::{AccountId, Completeness, FollowSource, PagedSet, ProfileSummary, Relation};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::AuditConfig;
use crate::error::{AuditError, Result};
use crate::heuristic::{AccountAssessment, SpamHeuristicEngine};
use crate::mutuality::{FollowSet, MutualityReport, SuspectKind};
use crate::throttle::{RateLimitGate, Throttled};

/// 可疑账号的评估结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SuspectOutcome {
    Assessed(AccountAssessment),
    /// 连概要都拿不到
    Unreachable { reason: String, rate_limited: bool },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuspectVerdict {
    pub relation: SuspectKind,
    pub outcome: SuspectOutcome,
}

/// 根账号分析结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RootAnalysis {
    pub root_summary: ProfileSummary,
    pub root_mutuality_report: MutualityReport,
    pub suspect_verdicts: BTreeMap<AccountId, SuspectVerdict>,
    /// 运行中是否遇到过限流
    pub rate_limited: bool,
}

impl RootAnalysis {
    pub fn verdicts_by(&self, relation: SuspectKind) -> impl Iterator<Item = (&AccountId, &SuspectOutcome)> {
        self.suspect_verdicts
            .iter()
            .filter(move |(_, v)| v.relation == relation)
            .map(|(id, v)| (id, &v.outcome))
    }
}

/// 关注图遍历
///
/// 先分析根账号的互关关系，再并发评估所有非互关账号。
pub struct GraphTraversal<S: ?Sized> {
    source: Arc<S>,
    engine: SpamHeuristicEngine,
}

impl<S: FollowSource + ?Sized + 'static> GraphTraversal<S> {
    pub fn new(source: Arc<S>, config: AuditConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            source,
            engine: SpamHeuristicEngine::new(config),
        })
    }

    pub fn engine(&self) -> &SpamHeuristicEngine {
        &self.engine
    }

    fn config(&self) -> &AuditConfig {
        self.engine.config()
    }

    /// 仅分析根账号，不展开
    pub async fn root_mutuality(&self, root: &AccountId) -> Result<(ProfileSummary, MutualityReport)> {
        let (summary, follow_set) = fetch_root(&*self.source, root).await?;
        Ok((summary, follow_set.mutuality()))
    }

    pub async fn analyze_root(&self, root: &AccountId) -> Result<RootAnalysis> {
        let gate = Arc::new(RateLimitGate::new(self.config().max_backoff));
        let source = Arc::new(Throttled::new(Arc::clone(&self.source), Arc::clone(&gate)));

        let (summary, follow_set) = fetch_root(&*source, root).await?;
        let mutuality = follow_set.mutuality();
        let suspects = mutuality.suspects()?;

        tracing::info!(
            root = %root,
            non_mutual_followers = mutuality.non_mutual_followers_count(),
            non_followers = mutuality.non_followers_count(),
            max_concurrent = self.config().max_concurrent_pipelines,
            "evaluating suspects"
        );

        let semaphore = Arc::new(Semaphore::new(self.config().max_concurrent_pipelines));
        let mut tasks = JoinSet::new();

        for id in suspects.keys() {
            let id = id.clone();
            let semaphore = Arc::clone(&semaphore);
            let source = Arc::clone(&source);
            let engine = self.engine.clone();

            tasks.spawn(async move {
                let outcome = match semaphore.acquire_owned().await {
                    Ok(_permit) => evaluate_suspect(&engine, &*source, &id).await,
                    Err(_) => SuspectOutcome::Unreachable {
                        reason: "pipeline pool closed".to_string(),
                        rate_limited: false,
                    },
                };
                (id, outcome)
            });
        }

        let mut outcomes = HashMap::with_capacity(suspects.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((id, outcome)) => {
                    outcomes.insert(id, outcome);
                }
                Err(e) => tracing::error!("suspect pipeline aborted: {}", e),
            }
        }

        // 每个可疑账号都要有结果
        let verdicts = suspects
            .into_iter()
            .map(|(id, relation)| {
                let outcome = outcomes.remove(&id).unwrap_or_else(|| SuspectOutcome::Unreachable {
                    reason: "evaluation task aborted".to_string(),
                    rate_limited: false,
                });
                (id, SuspectVerdict { relation, outcome })
            })
            .collect();

        tracing::info!(root = %root, "traversal finished");

        Ok(RootAnalysis {
            root_summary: summary,
            root_mutuality_report: mutuality,
            suspect_verdicts: verdicts,
            rate_limited: gate.tripped(),
        })
    }
}

async fn evaluate_suspect<S: FollowSource + ?Sized>(
    engine: &SpamHeuristicEngine,
    source: &S,
    id: &AccountId,
) -> SuspectOutcome {
    match engine.assess(source, id).await {
        Ok(assessment) => SuspectOutcome::Assessed(assessment),
        Err(e) => {
            tracing::warn!(account = %id, "profile unavailable: {}", e);
            SuspectOutcome::Unreachable {
                reason: e.to_string(),
                rate_limited: e.is_rate_limited(),
            }
        }
    }
}

/// 根账号不做规模限制；任何一端完全失败都中止
async fn fetch_root<S: FollowSource + ?Sized>(source: &S, root: &AccountId) -> Result<(ProfileSummary, FollowSet)> {
    tracing::info!(root = %root, "fetching root follow graph");

    let summary = source
        .fetch_profile_summary(root)
        .await
        .map_err(|e| AuditError::RootProfile {
            account: root.clone(),
            source: e,
        })?;

    let followers = require_pages(root, Relation::Followers, source.fetch_paged_set(Relation::Followers, root).await)?;
    let following = require_pages(root, Relation::Following, source.fetch_paged_set(Relation::Following, root).await)?;

    let follow_set = FollowSet::from_pages(root.clone(), followers, following);
    if follow_set.completeness() == Completeness::Partial {
        for (relation, e) in follow_set.failures() {
            tracing::warn!(root = %root, "root {} list is partial: {}", relation, e);
        }
    }

    Ok((summary, follow_set))
}

fn require_pages(root: &AccountId, relation: Relation, paged: PagedSet) -> Result<PagedSet> {
    match paged {
        PagedSet {
            pages: 0,
            failure: Some(source),
            ..
        } => Err(AuditError::RootFetch {
            account: root.clone(),
            relation,
            source,
        }),
        paged => Ok(paged),
    }
}
