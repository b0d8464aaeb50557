use hub::{AccountId, Completeness, FollowSource, HubError, PagedSet, Relation};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::error::{AuditError, Result};

/// 可疑账号与根账号的关系
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuspectKind {
    /// 关注了根账号，但根账号没有回关
    NonMutualFollower,
    /// 根账号关注了对方，但对方没有回关
    NonFollower,
}

/// 互关分析结果
///
/// 只能由 [`analyze`] 构造，三个分区两两不相交。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MutualityReport {
    non_mutual_followers: BTreeSet<AccountId>,
    mutual_followers: BTreeSet<AccountId>,
    non_followers: BTreeSet<AccountId>,
    completeness: Completeness,
}

/// 互关分析的计数视图
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MutualCounts {
    pub non_mutual_followers: usize,
    pub mutual_followers: usize,
    pub non_followers: usize,
    pub completeness: Completeness,
}

/// 计算 followers / following 的差集与交集
pub fn analyze(followers: &HashSet<AccountId>, following: &HashSet<AccountId>) -> MutualityReport {
    let mut non_mutual_followers = BTreeSet::new();
    let mut mutual_followers = BTreeSet::new();

    for id in followers {
        if following.contains(id) {
            mutual_followers.insert(id.clone());
        } else {
            non_mutual_followers.insert(id.clone());
        }
    }

    let non_followers = following
        .iter()
        .filter(|id| !followers.contains(*id))
        .cloned()
        .collect();

    MutualityReport {
        non_mutual_followers,
        mutual_followers,
        non_followers,
        completeness: Completeness::Complete,
    }
}

impl MutualityReport {
    pub fn non_mutual_followers(&self) -> &BTreeSet<AccountId> {
        &self.non_mutual_followers
    }

    pub fn mutual_followers(&self) -> &BTreeSet<AccountId> {
        &self.mutual_followers
    }

    pub fn non_followers(&self) -> &BTreeSet<AccountId> {
        &self.non_followers
    }

    pub fn non_mutual_followers_count(&self) -> usize {
        self.non_mutual_followers.len()
    }

    pub fn mutual_followers_count(&self) -> usize {
        self.mutual_followers.len()
    }

    pub fn non_followers_count(&self) -> usize {
        self.non_followers.len()
    }

    pub fn followers_count(&self) -> usize {
        self.non_mutual_followers.len() + self.mutual_followers.len()
    }

    pub fn following_count(&self) -> usize {
        self.non_followers.len() + self.mutual_followers.len()
    }

    pub fn counts(&self) -> MutualCounts {
        MutualCounts {
            non_mutual_followers: self.non_mutual_followers_count(),
            mutual_followers: self.mutual_followers_count(),
            non_followers: self.non_followers_count(),
            completeness: self.completeness,
        }
    }

    /// PARTIAL 时计数不可作为权威结果
    pub fn completeness(&self) -> Completeness {
        self.completeness
    }

    /// 待调查的账号: 非互关关注者 ∪ 未回关者
    ///
    /// 两个集合按构造不相交，这里仍逐个检查，重复时报错。
    pub fn suspects(&self) -> Result<BTreeMap<AccountId, SuspectKind>> {
        let mut suspects = BTreeMap::new();
        let tagged = self
            .non_mutual_followers
            .iter()
            .map(|id| (id, SuspectKind::NonMutualFollower))
            .chain(self.non_followers.iter().map(|id| (id, SuspectKind::NonFollower)));

        for (id, kind) in tagged {
            if suspects.insert(id.clone(), kind).is_some() {
                return Err(AuditError::OverlappingSuspects(id.clone()));
            }
        }
        Ok(suspects)
    }
}

/// 账号的完整关注图
pub struct FollowSet {
    id: AccountId,
    followers: HashSet<AccountId>,
    following: HashSet<AccountId>,
    completeness: Completeness,
    failures: Vec<(Relation, HubError)>,
}

impl FollowSet {
    /// 依次抓取 followers 和 following
    ///
    /// followers 有任何失败时结果已不完整，不再请求 following。
    pub async fn fetch<S: FollowSource + ?Sized>(source: &S, id: &AccountId) -> Self {
        let followers = source.fetch_paged_set(Relation::Followers, id).await;
        if followers.failure.is_some() {
            tracing::debug!(account = %id, "followers fetch failed, skipping following");
            return Self::followers_only(id.clone(), followers);
        }
        let following = source.fetch_paged_set(Relation::Following, id).await;
        Self::from_pages(id.clone(), followers, following)
    }

    /// following 未抓取
    fn followers_only(id: AccountId, followers: PagedSet) -> Self {
        let (followers, completeness, failure) = followers.into_parts();
        Self {
            id,
            followers,
            following: HashSet::new(),
            completeness: completeness.worst(Completeness::Partial),
            failures: failure.map(|e| (Relation::Followers, e)).into_iter().collect(),
        }
    }

    pub fn from_pages(id: AccountId, followers: PagedSet, following: PagedSet) -> Self {
        let (followers, followers_state, followers_failure) = followers.into_parts();
        let (following, following_state, following_failure) = following.into_parts();

        let failures = [
            (Relation::Followers, followers_failure),
            (Relation::Following, following_failure),
        ]
        .into_iter()
        .filter_map(|(relation, failure)| failure.map(|e| (relation, e)))
        .collect();

        Self {
            id,
            followers,
            following,
            completeness: followers_state.worst(following_state),
            failures,
        }
    }

    pub fn id(&self) -> &AccountId {
        &self.id
    }

    pub fn followers(&self) -> &HashSet<AccountId> {
        &self.followers
    }

    pub fn following(&self) -> &HashSet<AccountId> {
        &self.following
    }

    pub fn completeness(&self) -> Completeness {
        self.completeness
    }

    pub fn failures(&self) -> &[(Relation, HubError)] {
        &self.failures
    }

    pub fn rate_limited(&self) -> bool {
        self.failures.iter().any(|(_, e)| e.is_rate_limited())
    }

    /// 互关分析，报告带上抓取完整度
    pub fn mutuality(&self) -> MutualityReport {
        MutualityReport {
            completeness: self.completeness,
            ..analyze(&self.followers, &self.following)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(logins: &[&str]) -> HashSet<AccountId> {
        logins.iter().map(|l| AccountId::from(*l)).collect()
    }

    fn sorted(logins: &[&str]) -> BTreeSet<AccountId> {
        logins.iter().map(|l| AccountId::from(*l)).collect()
    }

    fn assert_partition(followers: &HashSet<AccountId>, following: &HashSet<AccountId>) {
        let report = analyze(followers, following);

        assert!(report.non_mutual_followers().is_disjoint(report.mutual_followers()));
        assert!(report.mutual_followers().is_disjoint(report.non_followers()));
        assert!(report.non_mutual_followers().is_disjoint(report.non_followers()));

        assert_eq!(followers.len(), report.non_mutual_followers_count() + report.mutual_followers_count());
        assert_eq!(following.len(), report.non_followers_count() + report.mutual_followers_count());

        let union: BTreeSet<_> = followers.union(following).cloned().collect();
        let parts: BTreeSet<_> = report
            .non_mutual_followers()
            .iter()
            .chain(report.mutual_followers())
            .chain(report.non_followers())
            .cloned()
            .collect();
        assert_eq!(union, parts);
    }

    #[test]
    fn test_analyze_basic_partition() {
        let report = analyze(&ids(&["a", "b", "c"]), &ids(&["b", "c", "d"]));

        assert_eq!(report.non_mutual_followers(), &sorted(&["a"]));
        assert_eq!(report.mutual_followers(), &sorted(&["b", "c"]));
        assert_eq!(report.non_followers(), &sorted(&["d"]));
        assert_eq!(report.completeness(), Completeness::Complete);
    }

    #[test]
    fn test_analyze_partition_invariants() {
        assert_partition(&ids(&[]), &ids(&[]));
        assert_partition(&ids(&["a"]), &ids(&[]));
        assert_partition(&ids(&[]), &ids(&["a"]));
        assert_partition(&ids(&["a", "b"]), &ids(&["a", "b"]));
        assert_partition(&ids(&["a", "b", "c", "d"]), &ids(&["c", "d", "e", "f", "g"]));
        assert_partition(&ids(&["x", "y"]), &ids(&["p", "q"]));
    }

    #[test]
    fn test_analyze_is_case_sensitive() {
        let report = analyze(&ids(&["Alice"]), &ids(&["alice"]));
        assert_eq!(report.mutual_followers_count(), 0);
        assert_eq!(report.non_mutual_followers_count(), 1);
        assert_eq!(report.non_followers_count(), 1);
    }

    #[test]
    fn test_suspects_tagged_by_relation() {
        let report = analyze(&ids(&["a", "b", "c"]), &ids(&["b", "c", "d"]));
        let suspects = report.suspects().unwrap();

        assert_eq!(suspects.len(), 2);
        assert_eq!(suspects[&AccountId::from("a")], SuspectKind::NonMutualFollower);
        assert_eq!(suspects[&AccountId::from("d")], SuspectKind::NonFollower);
    }

    #[test]
    fn test_suspects_rejects_overlap() {
        let mut report = analyze(&ids(&["a"]), &ids(&[]));
        report.non_followers.insert(AccountId::from("a"));
        assert!(matches!(report.suspects(), Err(AuditError::OverlappingSuspects(_))));
    }

    #[test]
    fn test_follow_set_labels_partial_report() {
        let err = HubError::Status { status: 502, url: "u".into() };
        let followers = PagedSet::aborted(ids(&["a", "b"]), 1, err);
        let following = PagedSet::complete(ids(&["b"]), 1);

        let set = FollowSet::from_pages(AccountId::from("root"), followers, following);
        assert_eq!(set.completeness(), Completeness::Partial);
        assert_eq!(set.failures().len(), 1);
        assert_eq!(set.failures()[0].0, Relation::Followers);
        assert!(!set.rate_limited());

        let report = set.mutuality();
        assert_eq!(report.completeness(), Completeness::Partial);
        assert_eq!(report.mutual_followers(), &sorted(&["b"]));
    }

    #[test]
    fn test_counts_view() {
        let counts = analyze(&ids(&["a", "b", "c"]), &ids(&["b", "c", "d"])).counts();
        assert_eq!(
            counts,
            MutualCounts {
                non_mutual_followers: 1,
                mutual_followers: 2,
                non_followers: 1,
                completeness: Completeness::Complete,
            }
        );
    }

    #[test]
    fn test_followers_only_is_never_complete() {
        let err = HubError::Status { status: 502, url: "u".into() };
        let set = FollowSet::followers_only(AccountId::from("x"), PagedSet::aborted(ids(&["a"]), 1, err));
        assert_eq!(set.completeness(), Completeness::Partial);
        assert!(set.following().is_empty());
        assert_eq!(set.failures().len(), 1);

        let err = HubError::RateLimited { url: "u".into(), retry_after: None };
        let set = FollowSet::followers_only(AccountId::from("x"), PagedSet::aborted(ids(&[]), 0, err));
        assert_eq!(set.completeness(), Completeness::Failed);
        assert!(set.rate_limited());
    }
}
