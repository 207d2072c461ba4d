//! File callback contract.
//!
//! Invoked exactly once per file node the walk discovers. An error aborts the
//! branch of the walk that produced the file.

use crate::tree::FileNode;
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Handler for discovered files
#[async_trait]
pub trait FileCallback: Send + Sync {
    /// Handle one file. `ctx` is the cancellation token of the walk branch.
    async fn on_file(&self, ctx: &CancellationToken, file: &FileNode) -> anyhow::Result<()>;
}

/// Adapter turning a synchronous closure into a `FileCallback`
pub struct FnCallback<F> {
    f: F,
}

impl<F> FnCallback<F>
where
    F: Fn(&CancellationToken, &FileNode) -> anyhow::Result<()> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> FileCallback for FnCallback<F>
where
    F: Fn(&CancellationToken, &FileNode) -> anyhow::Result<()> + Send + Sync,
{
    async fn on_file(&self, ctx: &CancellationToken, file: &FileNode) -> anyhow::Result<()> {
        (self.f)(ctx, file)
    }
}

/// Wrap a closure as a shareable callback.
pub fn callback_fn<F>(f: F) -> Arc<dyn FileCallback>
where
    F: Fn(&CancellationToken, &FileNode) -> anyhow::Result<()> + Send + Sync + 'static,
{
    Arc::new(FnCallback::new(f))
}
