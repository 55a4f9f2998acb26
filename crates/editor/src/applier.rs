//! Snapshot reconciliation.
//!
//! [`SnapshotApplier::apply_snapshot`] makes the layer directory, the
//! persisted layer rows and the mounted surfaces match one
//! [`EditorSnapshot`], in that order:
//!
//! 1. rebuild the directory from the snapshot layers,
//! 2. swap the project's stored layers in one atomic replace,
//! 3. wait one render frame so every layer has a surface,
//! 4. clear and redraw each surface from its bitmap reference.
//!
//! Applications are serialized through an async gate. Each request takes a
//! ticket first; a request that finds a newer ticket issued by the time it
//! enters the gate is dropped as [`ApplyOutcome::Superseded`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use layerdraw_core::snapshot::EditorSnapshot;
use layerdraw_core::types::{now, LayerId};
use layerdraw_db::repositories::{LayerRepo, ProjectRepo};
use layerdraw_db::Store;
use layerdraw_events::{event_types, EditorEvent, EventBus};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::canvas::Canvas;
use crate::error::EditorError;
use crate::session::EditorSession;

/// Per-surface results of one redraw pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RedrawReport {
    /// Surfaces repainted from a bitmap.
    pub redrawn: usize,
    /// Surfaces of layers without a bitmap, left blank.
    pub cleared: usize,
    /// Layers with no mounted surface.
    pub skipped: usize,
    /// Layers whose bitmap could not be decoded.
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied(RedrawReport),
    /// The project was deleted; nothing was touched.
    ProjectMissing,
    /// A newer application was requested before this one started.
    Superseded,
}

pub struct SnapshotApplier {
    store: Arc<dyn Store>,
    session: Arc<EditorSession>,
    canvas: Canvas,
    events: Arc<EventBus>,
    gate: Mutex<()>,
    latest_ticket: AtomicU64,
}

impl SnapshotApplier {
    pub fn new(
        store: Arc<dyn Store>,
        session: Arc<EditorSession>,
        canvas: Canvas,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            store,
            session,
            canvas,
            events,
            gate: Mutex::new(()),
            latest_ticket: AtomicU64::new(0),
        }
    }

    /// Reconcile directory, store and surfaces with `snapshot`.
    pub async fn apply_snapshot(
        &self,
        snapshot: &EditorSnapshot,
    ) -> Result<ApplyOutcome, EditorError> {
        let ticket = self.latest_ticket.fetch_add(1, Ordering::SeqCst) + 1;
        let _gate = self.gate.lock().await;

        if self.latest_ticket.load(Ordering::SeqCst) != ticket {
            tracing::debug!(ticket, "Snapshot application superseded");
            return Ok(ApplyOutcome::Superseded);
        }

        let project_id = snapshot.project_id.as_str();
        if !ProjectRepo::exists(self.store.as_ref(), project_id).await? {
            tracing::info!(project_id, "Project no longer exists, snapshot not applied");
            return Ok(ApplyOutcome::ProjectMissing);
        }

        let layers = self
            .session
            .directory
            .write()
            .await
            .replace_all(project_id, &snapshot.layers, now());
        LayerRepo::replace_for_project(self.store.as_ref(), project_id, &layers).await?;

        let layer_ids: Vec<LayerId> = layers.iter().map(|l| l.id.clone()).collect();
        self.canvas.barrier.next_frame(&layer_ids).await;

        let report = self.redraw(snapshot).await;
        tracing::debug!(
            project_id,
            layers = layers.len(),
            redrawn = report.redrawn,
            skipped = report.skipped,
            failed = report.failed,
            "Snapshot applied"
        );
        self.events.publish(
            EditorEvent::new(event_types::SNAPSHOT_APPLIED)
                .for_project(project_id)
                .with_payload(serde_json::to_value(report).unwrap_or_default()),
        );
        Ok(ApplyOutcome::Applied(report))
    }

    async fn redraw(&self, snapshot: &EditorSnapshot) -> RedrawReport {
        let mut report = RedrawReport::default();

        for layer in &snapshot.layers {
            let Some(surface) = self.canvas.surfaces.locate(&layer.id) else {
                tracing::debug!(layer_id = %layer.id, "No surface mounted, redraw skipped");
                report.skipped += 1;
                continue;
            };

            surface.clear();
            let Some(bitmap_ref) = layer.bitmap() else {
                report.cleared += 1;
                continue;
            };

            match self.canvas.codec.decode(bitmap_ref).await {
                Ok(image) => {
                    surface.draw_image_at(&image, 0, 0);
                    report.redrawn += 1;
                }
                Err(e) => {
                    tracing::warn!(layer_id = %layer.id, error = %e, "Bitmap decode failed, layer left blank");
                    report.failed += 1;
                }
            }
        }

        report
    }
}
