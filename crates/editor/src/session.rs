//! Mutable in-memory state of the open project.

use layerdraw_core::directory::LayerDirectory;
use layerdraw_core::history::HistoryState;
use layerdraw_core::snapshot::{EditorSnapshot, ToolState, Viewport};
use layerdraw_core::types::ProjectId;
use tokio::sync::RwLock;

use crate::error::EditorError;

/// Tool and viewport selection. Captured in snapshots, never recorded on
/// its own.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ViewSettings {
    pub tool: ToolState,
    pub viewport: Viewport,
}

/// Shared editor state.
///
/// Guards are never held across store or canvas awaits.
#[derive(Debug, Default)]
pub struct EditorSession {
    pub directory: RwLock<LayerDirectory>,
    pub history: RwLock<HistoryState>,
    pub view: RwLock<ViewSettings>,
}

impl EditorSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn project_id(&self) -> Option<ProjectId> {
        self.directory.read().await.project_id().map(str::to_string)
    }

    pub async fn require_project(&self) -> Result<ProjectId, EditorError> {
        self.project_id().await.ok_or(EditorError::NoActiveProject)
    }

    /// Snapshot of the present: layers in paint order, tool and viewport.
    pub async fn capture(&self) -> Result<EditorSnapshot, EditorError> {
        let view = *self.view.read().await;
        let directory = self.directory.read().await;
        let project_id = directory
            .project_id()
            .ok_or(EditorError::NoActiveProject)?;
        Ok(EditorSnapshot::capture(
            project_id,
            directory.ordered(),
            view.tool.tool,
            view.viewport,
        ))
    }

    /// Capture as [`capture`](Self::capture) but leave one layer out.
    pub async fn capture_without(&self, layer_id: &str) -> Result<EditorSnapshot, EditorError> {
        let mut snapshot = self.capture().await?;
        snapshot.layers.retain(|l| l.id != layer_id);
        Ok(snapshot)
    }
}
