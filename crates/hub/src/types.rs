use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::client::HubError;

/// 账号标识 - GitHub login，按字符串精确比较
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(login: impl Into<String>) -> Self {
        Self(login.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(login: &str) -> Self {
        Self::new(login)
    }
}

impl From<String> for AccountId {
    fn from(login: String) -> Self {
        Self(login)
    }
}

/// 账号概要 - 关注者/关注数
///
/// 计数为 `None` 表示 API 没有给出该字段 (UNAVAILABLE)，与真实的 0 区分。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileSummary {
    pub id: AccountId,
    pub followers_count: Option<u64>,
    pub following_count: Option<u64>,
}

impl ProfileSummary {
    pub fn new(id: AccountId, followers_count: Option<u64>, following_count: Option<u64>) -> Self {
        Self {
            id,
            followers_count,
            following_count,
        }
    }
}

/// 关系端点
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    Followers,
    Following,
}

impl Relation {
    /// URL 路径段
    pub fn path_segment(self) -> &'static str {
        match self {
            Relation::Followers => "followers",
            Relation::Following => "following",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

/// 分页抓取的完整度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Completeness {
    Complete,
    Partial,
    Failed,
}

impl Completeness {
    /// 合并两个结果，取更差的那个
    pub fn worst(self, other: Completeness) -> Completeness {
        self.max(other)
    }

    pub fn is_complete(self) -> bool {
        self == Completeness::Complete
    }
}

/// 分页集合抓取结果
///
/// 中途失败时 `members` 保留已累积的部分，`failure` 记录原因。
#[derive(Debug)]
pub struct PagedSet {
    pub members: HashSet<AccountId>,
    pub pages: usize,
    pub failure: Option<HubError>,
}

impl PagedSet {
    pub fn complete(members: HashSet<AccountId>, pages: usize) -> Self {
        Self {
            members,
            pages,
            failure: None,
        }
    }

    pub fn aborted(members: HashSet<AccountId>, pages: usize, failure: HubError) -> Self {
        Self {
            members,
            pages,
            failure: Some(failure),
        }
    }

    pub fn completeness(&self) -> Completeness {
        match (&self.failure, self.pages) {
            (None, _) => Completeness::Complete,
            (Some(_), 0) => Completeness::Failed,
            (Some(_), _) => Completeness::Partial,
        }
    }

    /// 拆分为成员集合和失败原因
    pub fn into_parts(self) -> (HashSet<AccountId>, Completeness, Option<HubError>) {
        let completeness = self.completeness();
        (self.members, completeness, self.failure)
    }
}
