//! Project open and restore.
//!
//! [`ProjectLoader::load_project_data`] brings the session in line with one
//! stored project:
//!
//! 1. reset the history stack,
//! 2. ensure a base layer exists, recording its creation directly,
//! 3. load the persisted history oldest first, normalizing icons,
//! 4. apply the newest entry's snapshot to the canvas.
//!
//! [`ProjectLoader::restore_active_project`] resolves which project to open
//! (explicit id first, remembered pointer second) and runs the load under a
//! [`SingleFlight`] guard so concurrent restores share one load.

use std::sync::Arc;

use layerdraw_core::history::{HistoryEntry, HistoryIcon, HistoryState};
use layerdraw_core::labels;
use layerdraw_core::layer::{Layer, NewLayer, BASE_LAYER_NAME};
use layerdraw_core::types::{new_id, now, ProjectId};
use layerdraw_core::CoreError;
use layerdraw_db::repositories::{
    ActiveProjectRepo, HistoryRepo, LayerRepo, ProjectRepo, ViewStateRepo,
};
use layerdraw_db::Store;
use layerdraw_events::{event_types, EditorEvent, EventBus};
use serde_json::json;

use crate::applier::{ApplyOutcome, SnapshotApplier};
use crate::error::EditorError;
use crate::recorder::HistoryRecorder;
use crate::session::{EditorSession, ViewSettings};
use crate::single_flight::SingleFlight;

#[derive(Clone)]
pub struct ProjectLoader {
    store: Arc<dyn Store>,
    session: Arc<EditorSession>,
    applier: Arc<SnapshotApplier>,
    recorder: HistoryRecorder,
    events: Arc<EventBus>,
    restore_flight: SingleFlight<Option<ProjectId>>,
}

impl ProjectLoader {
    pub fn new(
        store: Arc<dyn Store>,
        session: Arc<EditorSession>,
        applier: Arc<SnapshotApplier>,
        recorder: HistoryRecorder,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            store,
            session,
            applier,
            recorder,
            events,
            restore_flight: SingleFlight::new(),
        }
    }

    /// Open `project_id`: reset history, ensure a base layer, load history
    /// and replay the newest snapshot.
    ///
    /// A project that no longer exists is left alone: nothing is reset or
    /// written.
    pub async fn load_project_data(&self, project_id: &str) -> Result<(), EditorError> {
        let store = self.store.as_ref();
        if !ProjectRepo::exists(store, project_id).await? {
            tracing::info!(project_id, "Project no longer exists, load skipped");
            return Ok(());
        }

        self.recorder.cancel_pending();
        self.session.history.write().await.reset();
        self.events
            .publish(EditorEvent::new(event_types::HISTORY_RESET).for_project(project_id));

        let view = ViewStateRepo::find(store, project_id)
            .await?
            .map(|v| ViewSettings {
                tool: v.tool,
                viewport: v.viewport,
            })
            .unwrap_or_default();
        *self.session.view.write().await = view;

        let layers = LayerRepo::list_for_project(store, project_id).await?;
        if layers.is_empty() {
            self.create_base_layer(project_id).await?;
        } else {
            self.session.directory.write().await.load(project_id, layers);
        }

        let entries: Vec<HistoryEntry> = HistoryRepo::list_for_project(store, project_id)
            .await?
            .into_iter()
            .map(HistoryEntry::normalized)
            .collect();
        let newest = entries.last().cloned();
        let depth = entries.len();
        *self.session.history.write().await = HistoryState::load(entries);

        if let Some(newest) = newest {
            match self.applier.apply_snapshot(&newest.state).await? {
                ApplyOutcome::ProjectMissing => {
                    tracing::info!(project_id, "Project deleted while loading");
                    return Ok(());
                }
                ApplyOutcome::Superseded => {
                    tracing::debug!(project_id, "Initial snapshot superseded");
                }
                ApplyOutcome::Applied(_) => {}
            }
        }

        tracing::info!(project_id, entries = depth, "Project loaded");
        self.events.publish(
            EditorEvent::new(event_types::PROJECT_LOADED)
                .for_project(project_id)
                .with_payload(json!({ "entries": depth })),
        );
        Ok(())
    }

    async fn create_base_layer(&self, project_id: &str) -> Result<(), EditorError> {
        let layer = Layer::new(
            new_id(),
            project_id.to_string(),
            NewLayer::named(BASE_LAYER_NAME),
            0,
            now(),
        );
        {
            let mut directory = self.session.directory.write().await;
            directory.load(project_id, vec![layer.clone()]);
            directory.set_active(Some(&layer.id))?;
        }
        LayerRepo::save(self.store.as_ref(), &layer).await?;

        let snapshot = self.session.capture().await?;
        let entry = HistoryEntry::new(labels::base_layer_label(&layer.name), snapshot)
            .with_icon(HistoryIcon::Created);
        HistoryRepo::insert(self.store.as_ref(), &entry).await?;

        tracing::info!(project_id, layer_id = %layer.id, "Base layer created");
        Ok(())
    }

    /// Open the project named by `url_project_id`, or the remembered one.
    ///
    /// Concurrent calls share a single run and its result. An unknown
    /// remembered id clears the pointer; an unknown explicit id leaves the
    /// pointer alone. Either way nothing is loaded and `None` is returned.
    pub async fn restore_active_project(
        &self,
        url_project_id: Option<String>,
    ) -> Result<Option<ProjectId>, EditorError> {
        let loader = self.clone();
        self.restore_flight
            .run(move || async move { loader.restore(url_project_id).await })
            .await
            .map_err(EditorError::Shared)
    }

    async fn restore(&self, url_project_id: Option<String>) -> Result<Option<ProjectId>, EditorError> {
        let store = self.store.as_ref();
        let (project_id, from_url) = match url_project_id {
            Some(id) => (id, true),
            None => match ActiveProjectRepo::get(store).await? {
                Some(id) => (id, false),
                None => {
                    tracing::debug!("No remembered project");
                    return Ok(None);
                }
            },
        };

        if !ProjectRepo::exists(store, &project_id).await? {
            if from_url {
                tracing::info!(project_id = %project_id, "Requested project does not exist");
            } else {
                tracing::info!(project_id = %project_id, "Remembered project is gone, clearing pointer");
                ActiveProjectRepo::clear(store).await?;
            }
            return Ok(None);
        }

        ActiveProjectRepo::set(store, &project_id).await?;
        self.load_project_data(&project_id).await?;
        Ok(Some(project_id))
    }

    /// Remember `project_id` and load it.
    pub async fn open_project(&self, project_id: &str) -> Result<(), EditorError> {
        if !ProjectRepo::exists(self.store.as_ref(), project_id).await? {
            return Err(CoreError::not_found("project", project_id).into());
        }
        ActiveProjectRepo::set(self.store.as_ref(), project_id).await?;
        self.load_project_data(project_id).await
    }
}
