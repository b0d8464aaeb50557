//! hub - GitHub 关注图数据源
//!
//! 分页抓取 followers/following 集合和账号概要

mod client;
mod config;
mod source;
mod types;

pub use client::{classify_failure, next_link, GithubClient, HubError, Result};
pub use config::{ClientConfig, DEFAULT_API_URL, MAX_PER_PAGE};
pub use source::FollowSource;
pub use types::{AccountId, Completeness, PagedSet, ProfileSummary, Relation};
