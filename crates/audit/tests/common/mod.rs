//! 内存关注图 - 用于驱动遍历测试

#![allow(dead_code)]

use async_trait::async_trait;
use hub::{AccountId, FollowSource, HubError, PagedSet, ProfileSummary, Relation};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
pub enum Failure {
    Status,
    RateLimited,
    /// 限流并附带 retry-after
    RateLimitedFor(Duration),
}

impl Failure {
    fn to_error(self, url: String) -> HubError {
        match self {
            Failure::Status => HubError::Status { status: 502, url },
            Failure::RateLimited => HubError::RateLimited { url, retry_after: None },
            Failure::RateLimitedFor(wait) => HubError::RateLimited {
                url,
                retry_after: Some(wait),
            },
        }
    }
}

#[derive(Default)]
pub struct FakeGraph {
    profiles: HashMap<AccountId, (Option<u64>, Option<u64>)>,
    edges: HashMap<(AccountId, Relation), HashSet<AccountId>>,
    profile_failures: HashMap<AccountId, Failure>,
    set_failures: HashSet<(AccountId, Relation)>,
    partial_sets: HashSet<(AccountId, Relation)>,
    delay: Duration,
    profile_calls: Mutex<Vec<(AccountId, Instant)>>,
    set_calls: Mutex<Vec<(AccountId, Relation)>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

pub fn id(login: &str) -> AccountId {
    AccountId::from(login)
}

impl FakeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加账号，计数取列表长度
    pub fn account(mut self, login: &str, followers: &[&str], following: &[&str]) -> Self {
        let followers: HashSet<_> = followers.iter().map(|l| id(l)).collect();
        let following: HashSet<_> = following.iter().map(|l| id(l)).collect();
        self.profiles.insert(
            id(login),
            (Some(followers.len() as u64), Some(following.len() as u64)),
        );
        self.edges.insert((id(login), Relation::Followers), followers);
        self.edges.insert((id(login), Relation::Following), following);
        self
    }

    /// 只设置计数，不提供关注列表
    pub fn counts(mut self, login: &str, followers: Option<u64>, following: Option<u64>) -> Self {
        self.profiles.insert(id(login), (followers, following));
        self
    }

    pub fn fail_profile(mut self, login: &str, failure: Failure) -> Self {
        self.profile_failures.insert(id(login), failure);
        self
    }

    pub fn fail_set(mut self, login: &str, relation: Relation) -> Self {
        self.set_failures.insert((id(login), relation));
        self
    }

    pub fn partial_set(mut self, login: &str, relation: Relation) -> Self {
        self.partial_sets.insert((id(login), relation));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn profile_calls(&self) -> Vec<AccountId> {
        self.profile_calls.lock().unwrap().iter().map(|(a, _)| a.clone()).collect()
    }

    /// 第一次请求该账号概要的时间
    pub fn profile_called_at(&self, login: &str) -> Option<Instant> {
        let login = id(login);
        self.profile_calls
            .lock()
            .unwrap()
            .iter()
            .find(|(a, _)| *a == login)
            .map(|(_, at)| *at)
    }

    pub fn set_calls_for(&self, login: &str) -> usize {
        let login = id(login);
        self.set_calls.lock().unwrap().iter().filter(|(a, _)| *a == login).count()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    async fn simulate_latency(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        } else {
            tokio::task::yield_now().await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl FollowSource for FakeGraph {
    async fn fetch_profile_summary(&self, account: &AccountId) -> hub::Result<ProfileSummary> {
        self.profile_calls.lock().unwrap().push((account.clone(), Instant::now()));
        self.simulate_latency().await;

        let url = format!("fake://users/{}", account);
        if let Some(failure) = self.profile_failures.get(account) {
            return Err(failure.to_error(url));
        }
        match self.profiles.get(account) {
            Some((followers, following)) => Ok(ProfileSummary::new(account.clone(), *followers, *following)),
            None => Err(HubError::Status { status: 404, url }),
        }
    }

    async fn fetch_paged_set(&self, relation: Relation, account: &AccountId) -> PagedSet {
        self.set_calls.lock().unwrap().push((account.clone(), relation));
        self.simulate_latency().await;

        let key = (account.clone(), relation);
        let url = format!("fake://users/{}/{}", account, relation);
        if self.set_failures.contains(&key) {
            return PagedSet::aborted(HashSet::new(), 0, Failure::Status.to_error(url));
        }
        let Some(members) = self.edges.get(&key) else {
            return PagedSet::aborted(HashSet::new(), 0, HubError::Status { status: 404, url });
        };
        if self.partial_sets.contains(&key) {
            return PagedSet::aborted(members.clone(), 1, Failure::Status.to_error(url));
        }
        PagedSet::complete(members.clone(), 1)
    }
}
