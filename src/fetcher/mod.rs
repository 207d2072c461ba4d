//! Content fetcher contract
//!
//! The walker never talks HTTP directly. It asks a `ContentFetcher` to classify
//! one path at a time and reacts to the result. The GitHub implementation lives
//! in `github`; tests drive the walker with in-memory fetchers.

pub mod github;

use crate::error::FetchError;
use crate::tree::ContentNode;
use crate::types::RepoRef;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

pub use github::GitHubFetcher;

/// Rate-limit window as reported by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateInfo {
    pub limit: u64,
    pub remaining: u64,
    pub reset: DateTime<Utc>,
}

/// Successful fetch: the classified node plus the rate window after the call
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub node: ContentNode,
    pub rate: Option<RateInfo>,
}

impl FetchResponse {
    pub fn new(node: ContentNode) -> Self {
        Self { node, rate: None }
    }
}

/// Source of repository content.
///
/// Implementations must be safe to share across concurrently running walk
/// tasks. Rate-limit exhaustion is reported as `FetchError::RateLimited`
/// carrying the instant the window resets.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Classify `path` in `repo` as a file or a directory listing.
    ///
    /// A fetch spanning several requests may stop between them once `ctx` is
    /// cancelled and return `FetchError::Cancelled`. A request already sent is
    /// left to finish.
    async fn fetch(
        &self,
        ctx: &CancellationToken,
        repo: &RepoRef,
        path: &str,
    ) -> Result<FetchResponse, FetchError>;
}
