//! GitHub repository contents client
//!
//! `GET {endpoint}/repos/{owner}/{repo}/contents/{path}?ref={branch}` returns a
//! JSON object for a file and a JSON array for a directory. Directory listings
//! may be split across pages linked with `Link: <...>; rel="next"`.

use super::{ContentFetcher, FetchResponse, RateInfo};
use crate::config::ClientSettings;
use crate::error::{ConfigError, FetchError};
use crate::throttle::RateLimiter;
use crate::tree::{ChildEntry, ContentNode, DirectoryNode, EntryKind, FileMetadata, FileNode};
use crate::types::RepoRef;
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, LINK, RETRY_AFTER};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

const HEADER_LIMIT: &str = "x-ratelimit-limit";
const HEADER_REMAINING: &str = "x-ratelimit-remaining";
const HEADER_RESET: &str = "x-ratelimit-reset";

/// Fallback wait when the service signals exhaustion without a reset header
const FALLBACK_RESET_SECS: u64 = 60;

/// One element of a contents response
#[derive(Debug, Deserialize)]
struct ContentItem {
    #[serde(rename = "type")]
    kind: EntryKind,
    name: String,
    path: String,
    #[serde(default)]
    sha: String,
    #[serde(default)]
    size: u64,
    #[serde(default)]
    download_url: Option<String>,
    #[serde(default)]
    html_url: Option<String>,
}

/// A contents response page, before directory pages are merged
#[derive(Debug)]
enum ContentsPage {
    File(FileNode),
    Listing(Vec<ChildEntry>),
}

/// Content fetcher backed by the GitHub REST API
pub struct GitHubFetcher {
    http: reqwest::Client,
    endpoint: Url,
    token: String,
    /// Extra listing pages are outbound requests too
    page_throttle: Option<Arc<RateLimiter>>,
}

impl GitHubFetcher {
    /// Build a client authenticating with `token`
    pub fn new(token: impl Into<String>, settings: &ClientSettings) -> Result<Self, ConfigError> {
        let endpoint = Url::parse(&settings.endpoint).map_err(|e| ConfigError::InvalidParameter {
            name: "endpoint".to_string(),
            value: settings.endpoint.clone(),
            reason: e.to_string(),
        })?;
        if endpoint.cannot_be_a_base() {
            return Err(ConfigError::InvalidParameter {
                name: "endpoint".to_string(),
                value: settings.endpoint.clone(),
                reason: "not a base URL".to_string(),
            });
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            HeaderValue::from_static("2022-11-28"),
        );

        let http = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(Duration::from_secs(settings.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;

        Ok(Self {
            http,
            endpoint,
            token: token.into(),
            page_throttle: None,
        })
    }

    /// Throttle follow-up listing pages with the walker's limiter
    pub fn with_page_throttle(mut self, throttle: Arc<RateLimiter>) -> Self {
        self.page_throttle = Some(throttle);
        self
    }

    fn contents_url(&self, repo: &RepoRef, path: &str) -> Result<Url, FetchError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::Request(format!("invalid endpoint {}", self.endpoint)))?
            .pop_if_empty()
            .extend(["repos", repo.owner.as_str(), repo.repo.as_str(), "contents"])
            .extend(path.split('/').filter(|segment| !segment.is_empty()));
        url.query_pairs_mut().append_pair("ref", &repo.branch);
        Ok(url)
    }

    async fn fetch_page(
        &self,
        url: Url,
        path: &str,
    ) -> Result<(ContentsPage, Option<RateInfo>, Option<String>), FetchError> {
        debug!(url = %url, "GET contents");
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = response.status();
        let headers = response.headers().clone();
        let rate = parse_rate_info(&headers);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &headers, &body, path, Utc::now()));
        }

        let next = next_page_link(&headers);
        let body: serde_json::Value = response.json().await?;
        let page = classify_body(body)?;
        Ok((page, rate, next))
    }

    /// Resolve a `Link` target, refusing hosts other than the endpoint's
    fn next_page_url(&self, link: &str) -> Result<Url, FetchError> {
        let url = Url::parse(link)
            .map_err(|e| FetchError::Decode(format!("bad Link header: {}", e)))?;
        if url.origin() != self.endpoint.origin() {
            return Err(FetchError::Decode(format!(
                "next page link leaves {}: {}",
                self.endpoint.origin().ascii_serialization(),
                url.origin().ascii_serialization()
            )));
        }
        Ok(url)
    }

    /// Wait for the permit of a follow-up page unless the walk is cancelled.
    async fn wait_for_page(&self, ctx: &CancellationToken) -> Result<(), FetchError> {
        if ctx.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        if let Some(throttle) = &self.page_throttle {
            tokio::select! {
                biased;
                _ = ctx.cancelled() => return Err(FetchError::Cancelled),
                _ = throttle.acquire() => {}
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ContentFetcher for GitHubFetcher {
    async fn fetch(
        &self,
        ctx: &CancellationToken,
        repo: &RepoRef,
        path: &str,
    ) -> Result<FetchResponse, FetchError> {
        let mut url = self.contents_url(repo, path)?;
        let mut children = Vec::new();

        loop {
            let (page, rate, next) = self.fetch_page(url, path).await?;
            match page {
                ContentsPage::File(file) => {
                    return Ok(FetchResponse {
                        node: ContentNode::File(file),
                        rate,
                    });
                }
                ContentsPage::Listing(mut entries) => children.append(&mut entries),
            }

            match next {
                Some(link) => {
                    url = self.next_page_url(&link)?;
                    self.wait_for_page(ctx).await?;
                }
                None => {
                    return Ok(FetchResponse {
                        node: ContentNode::Directory(DirectoryNode {
                            path: path.trim_matches('/').to_string(),
                            children,
                        }),
                        rate,
                    });
                }
            }
        }
    }
}

/// Object body is a file, array body is a directory page.
fn classify_body(body: serde_json::Value) -> Result<ContentsPage, FetchError> {
    match body {
        serde_json::Value::Array(_) => {
            let items: Vec<ContentItem> =
                serde_json::from_value(body).map_err(|e| FetchError::Decode(e.to_string()))?;
            Ok(ContentsPage::Listing(
                items
                    .into_iter()
                    .map(|item| ChildEntry {
                        path: item.path,
                        name: item.name,
                        kind: item.kind,
                    })
                    .collect(),
            ))
        }
        serde_json::Value::Object(_) => {
            let item: ContentItem =
                serde_json::from_value(body).map_err(|e| FetchError::Decode(e.to_string()))?;
            Ok(ContentsPage::File(FileNode {
                path: item.path,
                name: item.name,
                metadata: FileMetadata {
                    sha: item.sha,
                    size: item.size,
                    kind: Some(item.kind),
                    download_url: item.download_url,
                    html_url: item.html_url,
                },
            }))
        }
        other => Err(FetchError::Decode(format!(
            "expected object or array, got {}",
            other
        ))),
    }
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}

fn epoch_to_utc(secs: u64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(i64::try_from(secs).ok()?, 0).single()
}

/// `now + secs`, saturating at the latest representable instant
fn seconds_after(now: DateTime<Utc>, secs: u64) -> DateTime<Utc> {
    i64::try_from(secs)
        .ok()
        .and_then(ChronoDuration::try_seconds)
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Read the `x-ratelimit-*` headers, if all three are present.
pub(crate) fn parse_rate_info(headers: &HeaderMap) -> Option<RateInfo> {
    Some(RateInfo {
        limit: header_u64(headers, HEADER_LIMIT)?,
        remaining: header_u64(headers, HEADER_REMAINING)?,
        reset: epoch_to_utc(header_u64(headers, HEADER_RESET)?)?,
    })
}

/// Map a non-success response onto a fetch error.
///
/// 403 and 429 are rate-limit errors when the primary window is exhausted
/// (`x-ratelimit-remaining: 0`) or the secondary limiter sent `Retry-After`.
pub(crate) fn classify_failure(
    status: StatusCode,
    headers: &HeaderMap,
    body: &str,
    path: &str,
    now: DateTime<Utc>,
) -> FetchError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string());

    if status == StatusCode::NOT_FOUND {
        return FetchError::NotFound {
            path: path.to_string(),
        };
    }

    if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
        if header_u64(headers, HEADER_REMAINING) == Some(0) {
            let reset = header_u64(headers, HEADER_RESET)
                .and_then(epoch_to_utc)
                .unwrap_or_else(|| seconds_after(now, FALLBACK_RESET_SECS));
            return FetchError::RateLimited { reset, message };
        }
        if let Some(retry_after) = header_u64(headers, RETRY_AFTER.as_str()) {
            return FetchError::RateLimited {
                reset: seconds_after(now, retry_after),
                message,
            };
        }
    }

    FetchError::Status {
        status: status.as_u16(),
        message,
    }
}

/// Extract the `rel="next"` target from a `Link` header.
pub(crate) fn next_page_link(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(LINK)?.to_str().ok()?;
    value.split(',').find_map(|part| {
        let mut pieces = part.split(';');
        let target = pieces.next()?.trim();
        let is_next = pieces.any(|param| param.trim() == r#"rel="next""#);
        if !is_next {
            return None;
        }
        target
            .strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
            .map(str::to_string)
    })
}
