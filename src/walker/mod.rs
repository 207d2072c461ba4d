//! Repository walker
//!
//! Recursively enumerates every file reachable from a root path, one content
//! fetch per path, and hands each file to a caller-supplied callback.
//!
//! # Per-path flow
//!
//! ```text
//! Pending ─► (cancelled? → done, Ok)
//!    │
//!    ▼
//! permit ─► fetch ──rate limited + wait-on-reset──► sleep until reset ─┐
//!    ▲                                                                   │
//!    └───────────────────────────────────────────────────────────────────┘
//!           │
//!           ├─ File      → callback(ctx, file)
//!           └─ Directory → children, sequential (in order, fail fast)
//!                          or concurrent (one task each, first error wins)
//! ```
//!
//! Cancellation is cooperative: a cancelled walk stops issuing new requests and
//! returns `Ok(())`. It is never reported as an error.

pub mod callback;
pub mod stats;

use crate::concurrency::{fan_out, FanoutLimit};
use crate::config::{RepoWalkConfig, WalkerUri};
use crate::error::{FetchError, Result, WalkError};
use crate::fetcher::{ContentFetcher, GitHubFetcher, RateInfo};
use crate::throttle::RateLimiter;
use crate::tree::{ContentNode, DirectoryNode};
use crate::types::RepoRef;
use chrono::Utc;
use futures::future::{BoxFuture, FutureExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

pub use callback::{callback_fn, FileCallback, FnCallback};
pub use stats::WalkStats;
use stats::WalkCounters;

/// Walk behaviour switches
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkOptions {
    /// Walk directory entries concurrently instead of in order
    pub concurrent: bool,
    /// Sleep until the reset instant and retry when rate limited
    pub wait_on_reset: bool,
    /// Cap on walk tasks doing work at once; `None` leaves only the throttle
    pub max_in_flight: Option<usize>,
}

struct WalkerInner {
    repo: RepoRef,
    options: WalkOptions,
    fetcher: Arc<dyn ContentFetcher>,
    throttle: Arc<RateLimiter>,
    limit: Option<FanoutLimit>,
    counters: WalkCounters,
}

/// Walker over one repository.
///
/// Cloning is cheap; clones share the throttle, fetcher and counters.
#[derive(Clone)]
pub struct RepoWalker {
    inner: Arc<WalkerInner>,
}

impl RepoWalker {
    /// Create a walker from its parts. The throttle is shared by every fetch
    /// this walker issues.
    pub fn new(
        repo: RepoRef,
        fetcher: Arc<dyn ContentFetcher>,
        throttle: Arc<RateLimiter>,
        options: WalkOptions,
    ) -> Self {
        let limit = options.max_in_flight.map(FanoutLimit::new);
        Self {
            inner: Arc::new(WalkerInner {
                repo,
                options,
                fetcher,
                throttle,
                limit,
                counters: WalkCounters::default(),
            }),
        }
    }

    /// Create a GitHub-backed walker from a walker URI string.
    pub fn from_uri_str(uri: &str, settings: &RepoWalkConfig) -> Result<Self> {
        let uri = WalkerUri::parse(uri)?;
        Self::from_uri(&uri, settings)
    }

    /// Create a GitHub-backed walker. URI options take precedence over settings.
    pub fn from_uri(uri: &WalkerUri, settings: &RepoWalkConfig) -> Result<Self> {
        let rate = uri.rate.unwrap_or(settings.throttle.permits_per_second);
        let throttle = Arc::new(RateLimiter::new(rate)?);

        let mut client = settings.client.clone();
        if let Some(endpoint) = &uri.endpoint {
            client.endpoint = endpoint.clone();
        }
        let fetcher = GitHubFetcher::new(uri.access_token.clone(), &client)?
            .with_page_throttle(Arc::clone(&throttle));

        debug!(
            repo = %uri.repo,
            concurrent = uri.concurrent,
            wait_on_reset = uri.wait_on_reset,
            permits_per_second = rate,
            "Configured walker"
        );

        Ok(Self::new(
            uri.repo.clone(),
            Arc::new(fetcher),
            throttle,
            WalkOptions {
                concurrent: uri.concurrent,
                wait_on_reset: uri.wait_on_reset,
                max_in_flight: uri.max_in_flight,
            },
        ))
    }

    pub fn repo(&self) -> &RepoRef {
        &self.inner.repo
    }

    pub fn options(&self) -> &WalkOptions {
        &self.inner.options
    }

    /// Counters accumulated over every walk of this walker
    pub fn stats(&self) -> WalkStats {
        self.inner.counters.snapshot()
    }

    /// Rate window reported by the most recent successful fetch
    pub fn last_rate_info(&self) -> Option<RateInfo> {
        self.inner.counters.last_rate()
    }

    /// Walk everything below `path`, invoking `callback` once per file.
    ///
    /// Returns `Ok(())` when the walk completed or was cancelled through `ctx`.
    /// Callbacks that already ran are not undone when an error is returned.
    pub async fn walk_uri(
        &self,
        ctx: &CancellationToken,
        path: &str,
        callback: Arc<dyn FileCallback>,
    ) -> Result<()> {
        let root = path.trim_matches('/').to_string();
        let before = self.stats();
        let started = Instant::now();
        info!(repo = %self.inner.repo, path = %root, "Walk started");

        let result = walk_path(Arc::clone(&self.inner), ctx.clone(), root.clone(), callback).await;

        let delta = self.stats().since(&before);
        match &result {
            Ok(()) => info!(
                path = %root,
                files = delta.files,
                directories = delta.directories,
                requests = delta.requests,
                cancelled = ctx.is_cancelled(),
                duration_ms = started.elapsed().as_millis() as u64,
                "Walk finished"
            ),
            Err(err) => warn!(
                path = %root,
                files = delta.files,
                error = %err,
                duration_ms = started.elapsed().as_millis() as u64,
                "Walk failed"
            ),
        }
        result
    }
}

/// One traversal call. Boxed because it recurses and is spawned.
fn walk_path(
    inner: Arc<WalkerInner>,
    ctx: CancellationToken,
    path: String,
    callback: Arc<dyn FileCallback>,
) -> BoxFuture<'static, Result<()>> {
    async move {
        let permit = match &inner.limit {
            Some(limit) => match limit.acquire(&ctx).await {
                Some(permit) => {
                    trace!(path = %path, available = limit.available(), "Walk slot acquired");
                    Some(permit)
                }
                None => return Ok(()),
            },
            None => None,
        };

        let node = match fetch_node(&inner, &ctx, &path).await? {
            Some(node) => node,
            None => return Ok(()),
        };
        trace!(path = node.path(), file = matches!(node, ContentNode::File(_)), "Classified");

        match node {
            ContentNode::File(file) => {
                inner.counters.record_file();
                let result = callback
                    .on_file(&ctx, &file)
                    .await
                    .map_err(|source| WalkError::Callback { path, source });
                drop(permit);
                result
            }
            ContentNode::Directory(dir) => {
                inner.counters.record_directory();
                drop(permit);
                walk_children(&inner, ctx, dir, callback).await
            }
        }
    }
    .boxed()
}

/// Fetch and classify `path`, retrying after rate-limit resets when enabled.
///
/// `Ok(None)` means the walk was cancelled before a node was obtained.
async fn fetch_node(
    inner: &WalkerInner,
    ctx: &CancellationToken,
    path: &str,
) -> Result<Option<ContentNode>> {
    loop {
        if ctx.is_cancelled() {
            return Ok(None);
        }

        tokio::select! {
            biased;
            _ = ctx.cancelled() => return Ok(None),
            _ = inner.throttle.acquire() => {}
        }

        inner.counters.record_request();
        debug!(path, "Fetching");

        match inner.fetcher.fetch(ctx, &inner.repo, path).await {
            Ok(response) => {
                if let Some(rate) = response.rate {
                    trace!(remaining = rate.remaining, limit = rate.limit, "Rate window");
                    inner.counters.record_rate(rate);
                }
                return Ok(Some(response.node));
            }
            Err(FetchError::Cancelled) if ctx.is_cancelled() => return Ok(None),
            Err(source) => {
                let reset = match source.reset_instant() {
                    Some(reset) if inner.options.wait_on_reset => reset,
                    _ => {
                        return Err(WalkError::Fetch {
                            path: path.to_string(),
                            source,
                        })
                    }
                };
                let delay = (reset - Utc::now()).to_std().unwrap_or(Duration::ZERO);
                inner.counters.record_rate_limit_wait();
                warn!(
                    path,
                    reset = %reset,
                    delay_ms = delay.as_millis() as u64,
                    "Rate limit exceeded, waiting for reset"
                );
                tokio::select! {
                    biased;
                    _ = ctx.cancelled() => return Ok(None),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }
    }
}

async fn walk_children(
    inner: &Arc<WalkerInner>,
    ctx: CancellationToken,
    dir: DirectoryNode,
    callback: Arc<dyn FileCallback>,
) -> Result<()> {
    if dir.children.is_empty() {
        return Ok(());
    }

    if inner.options.concurrent {
        let shared = Arc::clone(inner);
        return fan_out(&ctx, &dir.path, dir.children, move |scope, child| {
            walk_path(Arc::clone(&shared), scope, child.path, Arc::clone(&callback))
        })
        .await;
    }

    for child in dir.children {
        if ctx.is_cancelled() {
            return Ok(());
        }
        walk_path(Arc::clone(inner), ctx.clone(), child.path, Arc::clone(&callback)).await?;
    }
    Ok(())
}
