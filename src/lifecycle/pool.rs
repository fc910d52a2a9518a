//! Supervised task pool bound to a cancellable lifecycle.
//!
//! Every task launched through a [`Pool`] is raced against the pool's
//! cancellation token, so stopping the pool ends all tasks in bounded time
//! even when a task never checks the token itself.

use std::future::Future;

use futures_util::future::BoxFuture;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Task-launching facility handed to the aggregator and to every provider.
pub trait TaskPool: Send + Sync {
    /// Launch a task whose lifetime is bounded by the pool.
    fn go(&self, task: BoxFuture<'static, ()>);

    /// The token governing this pool's lifecycle.
    fn token(&self) -> CancellationToken;
}

/// Tokio-backed [`TaskPool`] that tracks its tasks and awaits them on stop.
#[derive(Debug, Clone)]
pub struct Pool {
    token: CancellationToken,
    tracker: TaskTracker,
}

impl Pool {
    /// Create a pool with its own root token.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            tracker: TaskTracker::new(),
        }
    }

    /// Create a pool that is cancelled together with `parent`.
    pub fn with_parent(parent: &CancellationToken) -> Self {
        Self {
            token: parent.child_token(),
            tracker: TaskTracker::new(),
        }
    }

    /// Launch a task built from the pool's token.
    pub fn go_ctx<F, Fut>(&self, f: F)
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let task = f(self.token.clone());
        self.go(Box::pin(task));
    }

    /// Number of tasks still running.
    pub fn len(&self) -> usize {
        self.tracker.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracker.is_empty()
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Cancel every task and wait for all of them to finish.
    pub async fn stop(&self) {
        self.token.cancel();
        self.tracker.close();
        self.tracker.wait().await;
        tracing::debug!("Task pool stopped");
    }
}

impl Default for Pool {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskPool for Pool {
    fn go(&self, task: BoxFuture<'static, ()>) {
        let token = self.token.clone();
        self.tracker.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = task => {}
            }
        });
    }

    fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}
