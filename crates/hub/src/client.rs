use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, LINK, RETRY_AFTER};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::collections::HashSet;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use url::Url;

use crate::config::ClientConfig;
use crate::source::FollowSource;
use crate::types::{AccountId, PagedSet, ProfileSummary, Relation};

#[derive(Error, Debug)]
pub enum HubError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{url} returned status {status}")]
    Status { status: u16, url: String },
    #[error("rate limited on {url}")]
    RateLimited {
        url: String,
        retry_after: Option<Duration>,
    },
    #[error("JSON error: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
    #[error("invalid API base URL: {0}")]
    InvalidBase(String),
    #[error("invalid token: {0}")]
    InvalidToken(String),
    #[error("next page link points off the API host: {0}")]
    ForeignLink(String),
    #[error("pagination loops back to {0}")]
    PaginationLoop(String),
}

impl HubError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, HubError::RateLimited { .. })
    }

    /// 限流时服务端给出的等待时长
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            HubError::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, HubError>;

#[derive(Deserialize)]
struct UserResponse {
    #[serde(default)]
    followers: Option<u64>,
    #[serde(default)]
    following: Option<u64>,
}

#[derive(Deserialize)]
struct UserEntry {
    login: String,
}

/// GitHub REST 客户端
pub struct GithubClient {
    http: Client,
    base: Url,
    per_page: u32,
}

impl GithubClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let base = Url::parse(&config.api_url)?;
        if base.cannot_be_a_base() {
            return Err(HubError::InvalidBase(config.api_url));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        if let Some(token) = &config.token {
            let mut value = HeaderValue::from_str(&format!("token {}", token))
                .map_err(|e| HubError::InvalidToken(e.to_string()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base,
            per_page: config.per_page,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| HubError::InvalidBase(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn relation_url(&self, relation: Relation, id: &AccountId) -> Result<Url> {
        let mut url = self.endpoint(&["users", id.as_str(), relation.path_segment()])?;
        url.query_pairs_mut()
            .append_pair("per_page", &self.per_page.to_string());
        Ok(url)
    }

    async fn get(&self, url: Url) -> Result<Response> {
        let response = self.http.get(url.clone()).send().await?;
        if response.status().is_success() {
            return Ok(response);
        }
        Err(classify_failure(
            response.status(),
            response.headers(),
            url.as_str(),
            SystemTime::now(),
        ))
    }

    /// 下一页必须与 API 同源且未访问过
    fn check_next(&self, next: Url, seen: &HashSet<Url>) -> Result<Url> {
        if next.origin() != self.base.origin() {
            return Err(HubError::ForeignLink(next.to_string()));
        }
        if seen.contains(&next) {
            return Err(HubError::PaginationLoop(next.to_string()));
        }
        Ok(next)
    }

    /// 抓取单页，返回本页 login 和下一页地址
    async fn fetch_page(&self, url: Url) -> Result<(Vec<AccountId>, Option<Url>)> {
        let response = self.get(url).await?;
        let next = response
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(next_link)
            .map(|s| Url::parse(&s))
            .transpose()?;

        let body = response.bytes().await?;
        let entries: Vec<UserEntry> = serde_json::from_slice(&body)?;
        let logins = entries.into_iter().map(|e| AccountId::from(e.login)).collect();
        Ok((logins, next))
    }
}

#[async_trait]
impl FollowSource for GithubClient {
    async fn fetch_profile_summary(&self, id: &AccountId) -> Result<ProfileSummary> {
        let url = self.endpoint(&["users", id.as_str()])?;
        tracing::debug!(%url, "fetching profile");

        let response = self.get(url).await?;
        let body = response.bytes().await?;
        let user: UserResponse = serde_json::from_slice(&body)?;

        Ok(ProfileSummary::new(id.clone(), user.followers, user.following))
    }

    async fn fetch_paged_set(&self, relation: Relation, id: &AccountId) -> PagedSet {
        let mut members = HashSet::new();
        let mut pages = 0;

        let mut next = match self.relation_url(relation, id) {
            Ok(url) => Some(url),
            Err(e) => return PagedSet::aborted(members, pages, e),
        };

        let mut seen = HashSet::new();
        while let Some(url) = next.take() {
            tracing::debug!(%url, page = pages + 1, "fetching {} page", relation);
            seen.insert(url.clone());

            let step = match self.fetch_page(url).await {
                Ok((logins, next_url)) => {
                    members.extend(logins);
                    pages += 1;
                    next_url.map(|u| self.check_next(u, &seen)).transpose()
                }
                Err(e) => Err(e),
            };
            match step {
                Ok(next_url) => next = next_url,
                Err(e) => {
                    tracing::warn!(
                        account = %id,
                        pages,
                        collected = members.len(),
                        "{} pagination aborted: {}",
                        relation,
                        e
                    );
                    return PagedSet::aborted(members, pages, e);
                }
            }
        }

        PagedSet::complete(members, pages)
    }
}

/// 从 Link 头中取出 rel="next" 的地址
pub fn next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|entry| {
        let mut parts = entry.split(';');
        let target = parts.next()?.trim();
        let target = target.strip_prefix('<')?.strip_suffix('>')?;

        let is_next = parts.any(|param| {
            let Some((key, value)) = param.split_once('=') else {
                return false;
            };
            key.trim().eq_ignore_ascii_case("rel")
                && value
                    .trim()
                    .trim_matches('"')
                    .split_whitespace()
                    .any(|rel| rel.eq_ignore_ascii_case("next"))
        });

        is_next.then(|| target.to_string())
    })
}

/// 把非 2xx 响应归类为限流或普通失败
pub fn classify_failure(status: StatusCode, headers: &HeaderMap, url: &str, now: SystemTime) -> HubError {
    let header_str = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    let exhausted = header_str("x-ratelimit-remaining").map(str::trim) == Some("0");
    let rate_limited = status == StatusCode::TOO_MANY_REQUESTS
        || (status == StatusCode::FORBIDDEN && (exhausted || headers.contains_key(RETRY_AFTER)));

    if !rate_limited {
        return HubError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        };
    }

    let retry_after = header_str(RETRY_AFTER.as_str())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .or_else(|| {
            let reset = header_str("x-ratelimit-reset")?.trim().parse::<u64>().ok()?;
            let now = now.duration_since(UNIX_EPOCH).ok()?.as_secs();
            Some(Duration::from_secs(reset.saturating_sub(now)))
        });

    HubError::RateLimited {
        url: url.to_string(),
        retry_after,
    }
}
