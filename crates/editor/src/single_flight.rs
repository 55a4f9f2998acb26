//! Single-flight guard: concurrent callers share one in-flight run.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};

use crate::error::EditorError;

pub type SharedResult<T> = Result<T, Arc<EditorError>>;

type Flight<T> = Shared<BoxFuture<'static, SharedResult<T>>>;

/// While a run is in flight, [`SingleFlight::run`] hands every caller the
/// same future instead of starting another one. The slot is emptied when
/// the run finishes, whether it succeeded or failed.
pub struct SingleFlight<T: Clone> {
    slot: Arc<Mutex<Option<(u64, Flight<T>)>>>,
    next_id: Arc<AtomicU64>,
}

impl<T: Clone> Clone for SingleFlight<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
            next_id: Arc::clone(&self.next_id),
        }
    }
}

impl<T: Clone> Default for SingleFlight<T> {
    fn default() -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }
}

/// Empties the slot once the owning run completes or is dropped.
struct Release<T: Clone> {
    slot: Arc<Mutex<Option<(u64, Flight<T>)>>>,
    id: u64,
}

impl<T: Clone> Drop for Release<T> {
    fn drop(&mut self) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|(id, _)| *id == self.id) {
            *slot = None;
        }
    }
}

impl<T> SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the in-flight run, or start `start()` if there is none.
    pub async fn run<F, Fut>(&self, start: F) -> SharedResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, EditorError>> + Send + 'static,
    {
        let flight = {
            let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
            match slot.as_ref() {
                Some((_, existing)) => {
                    tracing::debug!("Joining in-flight run");
                    existing.clone()
                }
                None => {
                    let work = start();
                    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                    let release = Release {
                        slot: Arc::clone(&self.slot),
                        id,
                    };
                    let flight = async move {
                        let _release = release;
                        work.await.map_err(Arc::new)
                    }
                    .boxed()
                    .shared();
                    *slot = Some((id, flight.clone()));
                    flight
                }
            }
        };
        flight.await
    }

    pub fn in_flight(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}
