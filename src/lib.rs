//! Repowalk: rate-limited recursive walker over a repository contents API
//!
//! Enumerates every file reachable from a root path of a hosted repository,
//! one contents request per path, handing each file to a callback. Requests
//! share a single throttle; directory entries can be walked in order or
//! concurrently; rate-limit rejections can be waited out; a cancellation token
//! stops the walk cleanly.

pub mod concurrency;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod logging;
pub mod throttle;
pub mod tooling;
pub mod tree;
pub mod types;
pub mod walker;

pub use config::{RepoWalkConfig, WalkerUri};
pub use error::{ConfigError, FetchError, WalkError};
pub use fetcher::{ContentFetcher, FetchResponse, GitHubFetcher, RateInfo};
pub use throttle::RateLimiter;
pub use tree::{ChildEntry, ContentNode, DirectoryNode, EntryKind, FileMetadata, FileNode};
pub use types::RepoRef;
pub use walker::{callback_fn, FileCallback, RepoWalker, WalkOptions, WalkStats};
