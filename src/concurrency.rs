//! Concurrent fan-out over the entries of a directory
//!
//! One task per child, one result channel sized to the number of children,
//! and a scope cancellation token shared by the children. The parent blocks on
//! the channel until every child reported success or the first error arrives;
//! on the first error the scope is cancelled so siblings stop recursing at
//! their next checkpoint. Requests already in flight are left to finish.

use crate::error::WalkError;
use crate::tree::ChildEntry;
use futures::future::BoxFuture;
use std::sync::Arc;
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Cap on the number of walk tasks doing work at the same time.
///
/// A task holds its permit while fetching its own path and running the file
/// callback, and releases it before waiting on its children, so nested
/// fan-outs cannot starve each other.
#[derive(Debug, Clone)]
pub struct FanoutLimit {
    semaphore: Arc<Semaphore>,
}

impl FanoutLimit {
    pub fn new(max: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max.max(1))),
        }
    }

    /// Permits not currently held by a task
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Wait for a slot. Returns `None` if `ctx` is cancelled first.
    pub(crate) async fn acquire(&self, ctx: &CancellationToken) -> Option<OwnedSemaphorePermit> {
        tokio::select! {
            biased;
            _ = ctx.cancelled() => None,
            permit = Arc::clone(&self.semaphore).acquire_owned() => permit.ok(),
        }
    }
}

/// Walk `children` concurrently and join on the results.
///
/// `walk_child` receives the scope token and the child entry and returns the
/// child's walk. Returns the first error observed, `Ok(())` once all children
/// succeeded, or `TaskFailed` if a child task ended without reporting (panic).
/// The scope token is cancelled whenever this function returns.
pub(crate) async fn fan_out<F>(
    ctx: &CancellationToken,
    parent_path: &str,
    children: Vec<ChildEntry>,
    walk_child: F,
) -> Result<(), WalkError>
where
    F: Fn(CancellationToken, ChildEntry) -> BoxFuture<'static, Result<(), WalkError>>,
{
    let total = children.len();
    if total == 0 {
        return Ok(());
    }

    let scope = ctx.child_token();
    let _scope_guard = scope.clone().drop_guard();
    let (tx, mut rx) = mpsc::channel::<Result<(), WalkError>>(total);

    for child in children {
        let tx = tx.clone();
        let task = walk_child(scope.clone(), child);
        tokio::spawn(async move {
            let result = task.await;
            // receiver is gone once the parent returned early
            let _ = tx.send(result).await;
        });
    }
    drop(tx);

    let mut remaining = total;
    while remaining > 0 {
        match rx.recv().await {
            Some(Ok(())) => remaining -= 1,
            Some(Err(err)) => {
                debug!(
                    path = parent_path,
                    remaining,
                    error = %err,
                    "Child walk failed, cancelling siblings"
                );
                scope.cancel();
                return Err(err);
            }
            None => {
                return Err(WalkError::TaskFailed {
                    path: parent_path.to_string(),
                    reason: format!("{} child task(s) ended without reporting", remaining),
                });
            }
        }
    }

    Ok(())
}
