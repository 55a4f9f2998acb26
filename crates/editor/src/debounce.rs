//! Keyed trailing-edge debouncer.
//!
//! Scheduling a task under a key cancels the task still waiting under the
//! same key, so only the last of a burst runs, one window after it arrived.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

type Pending = Arc<Mutex<HashMap<String, (u64, CancellationToken)>>>;

#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    pending: Pending,
    next_id: AtomicU64,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(0),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Run `task` once the window elapses without another task being
    /// scheduled under `key`. The handle yields `None` if the task was
    /// preempted or cancelled.
    pub fn schedule<F>(&self, key: impl Into<String>, task: F) -> JoinHandle<Option<F::Output>>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let key = key.into();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();

        if let Some((_, previous)) = lock(&self.pending).insert(key.clone(), (id, token.clone())) {
            tracing::debug!(key = %key, "Debounced task preempted");
            previous.cancel();
        }

        let pending = Arc::clone(&self.pending);
        let window = self.window;
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => None,
                _ = tokio::time::sleep(window) => {
                    {
                        let mut pending = lock(&pending);
                        if pending.get(&key).is_some_and(|(current, _)| *current == id) {
                            pending.remove(&key);
                        }
                    }
                    Some(task.await)
                }
            }
        })
    }

    /// Cancel every task still waiting for its window.
    pub fn cancel_all(&self) {
        let drained: Vec<_> = lock(&self.pending).drain().collect();
        if !drained.is_empty() {
            tracing::debug!(cancelled = drained.len(), "Pending debounced tasks cancelled");
        }
        for (_, (_, token)) in drained {
            token.cancel();
        }
    }

    /// Number of tasks still waiting.
    pub fn pending(&self) -> usize {
        lock(&self.pending).len()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
