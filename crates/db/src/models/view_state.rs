//! Per-project viewport and tool selection.

use layerdraw_core::snapshot::{ToolState, Viewport};
use layerdraw_core::types::ProjectId;
use serde::{Deserialize, Serialize};

/// A row from the `viewStates` table, keyed by project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub project_id: ProjectId,
    pub viewport: Viewport,
    #[serde(default)]
    pub tool: ToolState,
}
