//! Undo, redo, jump and apply.
//!
//! Each navigation moves the cursor synchronously under the history lock,
//! then reconciles the directory, store and surfaces with the entry under
//! the cursor through the [`SnapshotApplier`]. Reconciliation failures are
//! logged and otherwise swallowed: the canvas restore is best effort.

use std::sync::Arc;

use layerdraw_core::history::{HistoryEntry, HistoryIcon};
use layerdraw_core::labels::APPLIED_LABEL;
use layerdraw_core::types::{EntryId, Timestamp};
use layerdraw_events::{event_types, EditorEvent, EventBus};
use serde::Serialize;
use serde_json::json;

use crate::applier::{ApplyOutcome, SnapshotApplier};
use crate::error::EditorError;
use crate::recorder::HistoryRecorder;
use crate::session::EditorSession;

/// One row of the history panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub index: usize,
    pub id: EntryId,
    pub label: String,
    pub icon: Option<HistoryIcon>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: Timestamp,
    pub is_current: bool,
}

#[derive(Clone)]
pub struct HistoryController {
    session: Arc<EditorSession>,
    applier: Arc<SnapshotApplier>,
    recorder: HistoryRecorder,
    events: Arc<EventBus>,
}

#[derive(Debug, Clone, Copy)]
enum Move {
    Undo,
    Redo,
    Jump(usize),
}

impl HistoryController {
    pub fn new(
        session: Arc<EditorSession>,
        applier: Arc<SnapshotApplier>,
        recorder: HistoryRecorder,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            session,
            applier,
            recorder,
            events,
        }
    }

    /// Step back one entry. Returns whether the cursor moved; at the oldest
    /// entry the state still enters preview.
    pub async fn undo(&self) -> bool {
        self.navigate(Move::Undo).await
    }

    pub async fn redo(&self) -> bool {
        self.navigate(Move::Redo).await
    }

    /// Move the cursor to `index`. Out-of-range indices change nothing.
    pub async fn jump_to(&self, index: usize) -> bool {
        self.navigate(Move::Jump(index)).await
    }

    /// Commit the previewed entry as the new present.
    ///
    /// Pushes an "Applied snapshot" entry carrying the previewed state, which
    /// discards everything after the cursor and ends the preview. Returns
    /// `false` when not previewing.
    pub async fn apply_current(&self) -> Result<bool, EditorError> {
        let current = {
            let history = self.session.history.read().await;
            if !history.is_preview() {
                return Ok(false);
            }
            history.current().cloned()
        };
        let Some(current) = current else {
            return Ok(false);
        };

        self.recorder.cancel_pending();
        let entry = HistoryEntry::new(APPLIED_LABEL, current.state).with_icon(HistoryIcon::Applied);
        tracing::info!(from = %current.id, "Applying previewed snapshot");
        self.recorder.commit(entry).await?;
        Ok(true)
    }

    pub async fn items(&self) -> Vec<HistoryItem> {
        let history = self.session.history.read().await;
        let current = history.current_index();
        history
            .entries()
            .iter()
            .enumerate()
            .map(|(index, entry)| HistoryItem {
                index,
                id: entry.id.clone(),
                label: entry.label.clone(),
                icon: entry.icon,
                timestamp: entry.timestamp,
                is_current: index as isize == current,
            })
            .collect()
    }

    pub async fn can_undo(&self) -> bool {
        self.session.history.read().await.can_undo()
    }

    pub async fn can_redo(&self) -> bool {
        self.session.history.read().await.can_redo()
    }

    pub async fn is_preview(&self) -> bool {
        self.session.history.read().await.is_preview()
    }

    pub async fn current_index(&self) -> isize {
        self.session.history.read().await.current_index()
    }

    async fn navigate(&self, step: Move) -> bool {
        // Debounced edits belong to the present being left.
        self.recorder.cancel_pending();

        let (moved, target, index) = {
            let mut history = self.session.history.write().await;
            let moved = match step {
                Move::Undo => history.undo(),
                Move::Redo => history.redo(),
                Move::Jump(i) => history.jump_to(i),
            };
            (moved, history.current().cloned(), history.current_index())
        };

        if let Move::Jump(_) = step {
            if !moved {
                return false;
            }
        }

        if let Some(entry) = &target {
            self.events.publish(
                EditorEvent::new(event_types::HISTORY_NAVIGATED)
                    .for_project(entry.state.project_id.as_str())
                    .with_payload(json!({
                        "step": format!("{step:?}"),
                        "moved": moved,
                        "currentIndex": index,
                        "entryId": entry.id,
                    })),
            );
            self.reconcile(entry).await;
        }
        moved
    }

    async fn reconcile(&self, target: &HistoryEntry) {
        match self.applier.apply_snapshot(&target.state).await {
            Ok(ApplyOutcome::Applied(_)) => {
                {
                    let mut view = self.session.view.write().await;
                    view.tool.tool = target.state.active_tool;
                    view.viewport = target.state.viewport;
                }
                let mut history = self.session.history.write().await;
                let still_current = history.current().is_some_and(|e| e.id == target.id);
                if still_current && history.is_at_head() {
                    history.set_preview(false);
                }
            }
            Ok(ApplyOutcome::Superseded) => {}
            Ok(ApplyOutcome::ProjectMissing) => {
                tracing::info!(entry_id = %target.id, "Project missing, navigation not reconciled");
            }
            Err(e) => {
                tracing::warn!(entry_id = %target.id, error = %e, "Failed to reconcile history entry");
            }
        }
    }
}
