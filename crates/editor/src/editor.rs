//! The [`Editor`] facade wiring every service around one session.

use std::sync::Arc;

use layerdraw_db::models::{CreateProject, Project};
use layerdraw_db::repositories::ProjectRepo;
use layerdraw_db::Store;
use layerdraw_events::EventBus;

use crate::applier::SnapshotApplier;
use crate::canvas::Canvas;
use crate::config::EditorConfig;
use crate::error::EditorError;
use crate::history::HistoryController;
use crate::layers::LayerService;
use crate::lifecycle::ProjectLoader;
use crate::recorder::HistoryRecorder;
use crate::session::EditorSession;

/// One editor instance: a session plus the services that act on it.
///
/// Cheap to clone; clones share the session.
#[derive(Clone)]
pub struct Editor {
    pub layers: LayerService,
    pub history: HistoryController,
    pub loader: ProjectLoader,
    pub session: Arc<EditorSession>,
    pub applier: Arc<SnapshotApplier>,
    pub recorder: HistoryRecorder,
    store: Arc<dyn Store>,
    events: Arc<EventBus>,
}

impl Editor {
    pub fn new(
        store: Arc<dyn Store>,
        canvas: Canvas,
        events: Arc<EventBus>,
        config: &EditorConfig,
    ) -> Self {
        let session = Arc::new(EditorSession::new());
        let applier = Arc::new(SnapshotApplier::new(
            Arc::clone(&store),
            Arc::clone(&session),
            canvas,
            Arc::clone(&events),
        ));
        let recorder = HistoryRecorder::new(
            Arc::clone(&store),
            Arc::clone(&session),
            Arc::clone(&events),
            config,
        );
        let layers = LayerService::new(
            Arc::clone(&store),
            Arc::clone(&session),
            recorder.clone(),
            Arc::clone(&events),
        );
        let history = HistoryController::new(
            Arc::clone(&session),
            Arc::clone(&applier),
            recorder.clone(),
            Arc::clone(&events),
        );
        let loader = ProjectLoader::new(
            Arc::clone(&store),
            Arc::clone(&session),
            Arc::clone(&applier),
            recorder.clone(),
            Arc::clone(&events),
        );

        Self {
            layers,
            history,
            loader,
            session,
            applier,
            recorder,
            store,
            events,
        }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub async fn create_project(&self, name: &str) -> Result<Project, EditorError> {
        let project = ProjectRepo::create(
            self.store.as_ref(),
            CreateProject {
                name: name.to_string(),
            },
        )
        .await?;
        tracing::info!(project_id = %project.id, name, "Project created");
        Ok(project)
    }

    pub async fn open_project(&self, project_id: &str) -> Result<(), EditorError> {
        self.loader.open_project(project_id).await
    }

    pub async fn restore_active_project(
        &self,
        url_project_id: Option<String>,
    ) -> Result<Option<String>, EditorError> {
        self.loader.restore_active_project(url_project_id).await
    }
}
