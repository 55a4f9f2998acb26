//! Turns layer mutations into history entries.
//!
//! The recorder is called explicitly by [`LayerService`](crate::layers::LayerService)
//! after each mutation commits. Every entry it produces goes through
//! [`HistoryRecorder::commit`], which pushes onto the in-memory stack first
//! and then mirrors the push into the store.
//!
//! | Mutation                 | Entry                                           |
//! |--------------------------|-------------------------------------------------|
//! | create                   | immediate, icon `created`                       |
//! | delete                   | after removal, icon `deleted`, pre-delete name  |
//! | bitmap change            | immediate, labeled by the active tool           |
//! | visibility only          | none                                            |
//! | name / opacity / zIndex  | debounced per layer and label, icon `edit`      |

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use layerdraw_core::history::{HistoryEntry, HistoryIcon};
use layerdraw_core::labels;
use layerdraw_core::layer::{Layer, LayerPatch, UpdateKind};
use layerdraw_core::snapshot::EditorSnapshot;
use layerdraw_core::CoreError;
use layerdraw_db::repositories::HistoryRepo;
use layerdraw_db::{Store, StoreError};
use layerdraw_events::{event_types, EditorEvent, EventBus};
use serde_json::json;
use tokio::task::JoinHandle;

use crate::config::EditorConfig;
use crate::debounce::Debouncer;
use crate::error::EditorError;
use crate::session::EditorSession;

/// What became of one recorded mutation.
#[derive(Debug)]
pub enum Recording {
    /// An entry was pushed and persisted.
    Pushed,
    /// An entry will be pushed once the debounce window closes.
    Scheduled(JoinHandle<Option<Result<(), EditorError>>>),
    /// The mutation is not history-worthy.
    Ignored,
}

/// Name and snapshot of a layer about to be deleted.
#[derive(Debug, Clone)]
pub struct PendingDeletion {
    pub name: String,
    pub state: EditorSnapshot,
}

#[derive(Clone)]
pub struct HistoryRecorder {
    store: Arc<dyn Store>,
    session: Arc<EditorSession>,
    events: Arc<EventBus>,
    debouncer: Arc<Debouncer>,
    persist_retries: u32,
    persist_backoff: Duration,
}

impl HistoryRecorder {
    pub fn new(
        store: Arc<dyn Store>,
        session: Arc<EditorSession>,
        events: Arc<EventBus>,
        config: &EditorConfig,
    ) -> Self {
        Self {
            store,
            session,
            events,
            debouncer: Arc::new(Debouncer::new(config.debounce)),
            persist_retries: config.persist_retries.max(1),
            persist_backoff: config.persist_backoff,
        }
    }

    // -----------------------------------------------------------------------
    // Mutation hooks
    // -----------------------------------------------------------------------

    pub async fn record_created(&self, layer: &Layer) -> Result<(), EditorError> {
        let snapshot = self.session.capture().await?;
        let entry = HistoryEntry::new(labels::created_label(&layer.name), snapshot)
            .with_icon(HistoryIcon::Created);
        self.commit(entry).await
    }

    /// Capture what the deletion entry of `layer_id` needs. Must be called
    /// while the layer is still in the directory.
    pub async fn prepare_deletion(&self, layer_id: &str) -> Result<PendingDeletion, EditorError> {
        let name = self
            .session
            .directory
            .read()
            .await
            .get(layer_id)
            .map(|l| l.name.clone())
            .ok_or_else(|| CoreError::not_found("layer", layer_id))?;
        let state = self.session.capture_without(layer_id).await?;
        Ok(PendingDeletion { name, state })
    }

    /// Push the deletion entry once the layer is gone. The entry is stamped
    /// here so it sorts after anything pushed while the removal ran.
    pub async fn record_deleted(&self, pending: PendingDeletion) -> Result<(), EditorError> {
        let entry = HistoryEntry::new(labels::deleted_label(&pending.name), pending.state)
            .with_icon(HistoryIcon::Deleted);
        self.commit(entry).await
    }

    /// Record an update of one layer.
    ///
    /// `layers_before` is the directory in paint order before the update;
    /// reorder labels are derived from it.
    pub async fn record_updated(
        &self,
        before: &Layer,
        after: &Layer,
        patch: &LayerPatch,
        layers_before: &[Layer],
    ) -> Result<Recording, EditorError> {
        let label = match patch.classify(before) {
            UpdateKind::Drawing => {
                let tool = self.session.view.read().await.tool;
                let snapshot = self.session.capture().await?;
                let entry = HistoryEntry::new(labels::tool_label(tool.tool, tool.shape), snapshot)
                    .with_tool(tool.tool, tool.shape);
                self.commit(entry).await?;
                return Ok(Recording::Pushed);
            }
            UpdateKind::VisibilityOnly | UpdateKind::Unchanged => return Ok(Recording::Ignored),
            UpdateKind::ZIndex => labels::reorder_label(after, layers_before),
            UpdateKind::Rename => labels::renamed_label(&after.name),
            UpdateKind::Opacity => labels::opacity_label(&after.name),
        };

        // Only an edit producing the same label preempts a pending one.
        let key = format!("{}:{label}", after.id);
        let snapshot = self.session.capture().await?;

        let recorder = self.clone();
        let handle = self
            .debouncer
            .schedule(key, async move {
                let entry = HistoryEntry::new(label, snapshot).with_icon(HistoryIcon::Edit);
                recorder.commit(entry).await
            });
        Ok(Recording::Scheduled(handle))
    }

    /// Drop debounced entries that have not been pushed yet.
    pub fn cancel_pending(&self) {
        self.debouncer.cancel_all();
    }

    pub fn pending(&self) -> usize {
        self.debouncer.pending()
    }

    // -----------------------------------------------------------------------
    // Push + persist
    // -----------------------------------------------------------------------

    /// Push `entry` onto the stack and mirror the push into the store.
    ///
    /// The in-memory push always stands. Store writes are retried with
    /// exponential backoff; when they keep failing the error is returned and
    /// a `history.persist_failed` event is published.
    pub async fn commit(&self, entry: HistoryEntry) -> Result<(), EditorError> {
        let (discarded, index) = {
            let mut history = self.session.history.write().await;
            let discarded = history.push(entry.clone());
            (discarded, history.current_index())
        };
        let project_id = entry.state.project_id.clone();

        self.events.publish(
            EditorEvent::new(event_types::HISTORY_PUSHED)
                .for_project(project_id.as_str())
                .with_payload(json!({
                    "entryId": entry.id,
                    "label": entry.label,
                    "currentIndex": index,
                    "discarded": discarded.len(),
                })),
        );

        if !discarded.is_empty() {
            self.persist(&project_id, "delete discarded entries", || {
                HistoryRepo::delete_many(self.store.as_ref(), &discarded)
            })
            .await?;
        }
        self.persist(&project_id, "insert entry", || {
            HistoryRepo::insert(self.store.as_ref(), &entry)
        })
        .await
    }

    async fn persist<F, Fut>(&self, project_id: &str, action: &str, op: F) -> Result<(), EditorError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<(), StoreError>>,
    {
        let mut attempt = 1;
        let mut delay = self.persist_backoff;
        loop {
            match op().await {
                Ok(()) => return Ok(()),
                Err(e) if attempt < self.persist_retries => {
                    tracing::warn!(project_id, action, attempt, error = %e, "History write failed, retrying");
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(project_id, action, attempts = attempt, error = %e, "History write failed");
                    self.events.publish(
                        EditorEvent::new(event_types::HISTORY_PERSIST_FAILED)
                            .for_project(project_id)
                            .with_payload(json!({
                                "action": action,
                                "attempts": attempt,
                                "error": e.to_string(),
                            })),
                    );
                    return Err(EditorError::Persist {
                        attempts: attempt,
                        source: e,
                    });
                }
            }
        }
    }
}
