//! Layer mutations of the open project.
//!
//! Each operation validates, mutates the directory, writes the layer row
//! and then hands the change to the [`HistoryRecorder`].

use std::sync::Arc;

use layerdraw_core::layer::{Layer, LayerPatch, NewLayer};
use layerdraw_core::snapshot::{ToolState, Viewport};
use layerdraw_core::types::{new_id, now};
use layerdraw_core::CoreError;
use layerdraw_db::models::ViewState;
use layerdraw_db::repositories::{LayerRepo, ViewStateRepo};
use layerdraw_db::Store;
use layerdraw_events::{event_types, EditorEvent, EventBus};
use serde_json::json;

use crate::error::EditorError;
use crate::recorder::{HistoryRecorder, Recording};
use crate::session::EditorSession;

#[derive(Clone)]
pub struct LayerService {
    store: Arc<dyn Store>,
    session: Arc<EditorSession>,
    recorder: HistoryRecorder,
    events: Arc<EventBus>,
}

impl LayerService {
    pub fn new(
        store: Arc<dyn Store>,
        session: Arc<EditorSession>,
        recorder: HistoryRecorder,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            store,
            session,
            recorder,
            events,
        }
    }

    /// Create a layer on top of the stack (unless `input.z_index` says
    /// otherwise) and make it active.
    pub async fn create_layer(&self, input: NewLayer) -> Result<Layer, EditorError> {
        input.validate()?;

        let layer = {
            let mut directory = self.session.directory.write().await;
            let project_id = directory
                .project_id()
                .ok_or(EditorError::NoActiveProject)?
                .to_string();
            let default_z = directory.next_z_index();
            let layer = Layer::new(new_id(), project_id, input, default_z, now());
            directory.insert(layer.clone())?;
            directory.set_active(Some(&layer.id))?;
            layer
        };

        LayerRepo::save(self.store.as_ref(), &layer).await?;
        tracing::info!(layer_id = %layer.id, name = %layer.name, "Layer created");
        self.publish(event_types::LAYER_CREATED, &layer);

        self.recorder.record_created(&layer).await?;
        Ok(layer)
    }

    /// Apply `patch` to a layer.
    ///
    /// Returns the updated layer and what the recorder did with the change.
    pub async fn update_layer(
        &self,
        layer_id: &str,
        patch: LayerPatch,
    ) -> Result<(Layer, Recording), EditorError> {
        patch.validate()?;

        let (before, after, layers_before) = {
            let mut directory = self.session.directory.write().await;
            let layers_before = directory.ordered_cloned();
            let (before, after) = directory.update(layer_id, &patch, now())?;
            (before, after, layers_before)
        };

        LayerRepo::save(self.store.as_ref(), &after).await?;
        self.publish(event_types::LAYER_UPDATED, &after);

        let recording = self
            .recorder
            .record_updated(&before, &after, &patch, &layers_before)
            .await?;
        Ok((after, recording))
    }

    /// Delete a layer. The last layer of a project cannot be deleted.
    pub async fn delete_layer(&self, layer_id: &str) -> Result<Layer, EditorError> {
        {
            let directory = self.session.directory.read().await;
            if directory.get(layer_id).is_some() && directory.len() == 1 {
                return Err(CoreError::Validation("Cannot delete the last layer".into()).into());
            }
        }

        // Name and snapshot must be taken while the layer is still present.
        let pending = self.recorder.prepare_deletion(layer_id).await?;

        let removed = self.session.directory.write().await.remove(layer_id)?;
        LayerRepo::delete(self.store.as_ref(), layer_id).await?;
        tracing::info!(layer_id, name = %removed.name, "Layer deleted");
        self.publish(event_types::LAYER_DELETED, &removed);

        self.recorder.record_deleted(pending).await?;
        Ok(removed)
    }

    pub async fn set_active_layer(&self, layer_id: Option<&str>) -> Result<(), EditorError> {
        self.session.directory.write().await.set_active(layer_id)?;
        Ok(())
    }

    pub async fn active_layer(&self) -> Option<Layer> {
        let directory = self.session.directory.read().await;
        directory
            .active_layer_id()
            .and_then(|id| directory.get(id))
            .cloned()
    }

    /// Layers of the open project in paint order.
    pub async fn layers(&self) -> Vec<Layer> {
        self.session.directory.read().await.ordered_cloned()
    }

    pub async fn set_tool(&self, tool: ToolState) -> Result<(), EditorError> {
        self.session.view.write().await.tool = tool;
        self.save_view().await
    }

    pub async fn set_viewport(&self, viewport: Viewport) -> Result<(), EditorError> {
        self.session.view.write().await.viewport = viewport;
        self.save_view().await
    }

    async fn save_view(&self) -> Result<(), EditorError> {
        let project_id = self.session.require_project().await?;
        let view = *self.session.view.read().await;
        ViewStateRepo::save(
            self.store.as_ref(),
            &ViewState {
                project_id,
                viewport: view.viewport,
                tool: view.tool,
            },
        )
        .await?;
        Ok(())
    }

    fn publish(&self, event_type: &str, layer: &Layer) {
        self.events.publish(
            EditorEvent::new(event_type)
                .for_project(layer.project_id.as_str())
                .with_payload(json!({ "layerId": layer.id, "name": layer.name })),
        );
    }
}
