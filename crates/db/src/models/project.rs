//! Project entity model and DTOs.

use layerdraw_core::types::{new_id, now, ProjectId, Timestamp};
use serde::{Deserialize, Serialize};

/// A row from the `projects` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: Timestamp,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: Timestamp,
}

/// DTO for creating a project.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProject {
    pub name: String,
}

impl Project {
    pub fn new(input: CreateProject) -> Self {
        let ts = now();
        Self {
            id: new_id(),
            name: input.name,
            created_at: ts,
            updated_at: ts,
        }
    }
}
