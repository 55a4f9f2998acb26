//! Single-row pointer to the last opened project.

use layerdraw_core::types::ProjectId;
use serde::{Deserialize, Serialize};

/// Fixed key of the only row in the `activeProject` table.
pub const ACTIVE_POINTER_KEY: &str = "current";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivePointer {
    pub id: String,
    pub project_id: ProjectId,
}

impl ActivePointer {
    pub fn new(project_id: impl Into<ProjectId>) -> Self {
        Self {
            id: ACTIVE_POINTER_KEY.to_string(),
            project_id: project_id.into(),
        }
    }
}
