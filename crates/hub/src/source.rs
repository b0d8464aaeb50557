use async_trait::async_trait;
use std::sync::Arc;

use crate::client::Result;
use crate::types::{AccountId, PagedSet, ProfileSummary, Relation};

/// 关注图数据源 trait
#[async_trait]
pub trait FollowSource: Send + Sync {
    /// 获取账号的关注者/关注数
    async fn fetch_profile_summary(&self, id: &AccountId) -> Result<ProfileSummary>;

    /// 沿分页链接抓取完整集合，失败时返回已累积部分
    async fn fetch_paged_set(&self, relation: Relation, id: &AccountId) -> PagedSet;
}

#[async_trait]
impl<S: FollowSource + ?Sized> FollowSource for Arc<S> {
    async fn fetch_profile_summary(&self, id: &AccountId) -> Result<ProfileSummary> {
        (**self).fetch_profile_summary(id).await
    }

    async fn fetch_paged_set(&self, relation: Relation, id: &AccountId) -> PagedSet {
        (**self).fetch_paged_set(relation, id).await
    }
}
