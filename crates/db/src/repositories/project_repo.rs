//! Repository for the `projects` table.

use crate::models::project::{CreateProject, Project};
use crate::store::{Store, StoreError, Table};

use super::{decode, encode, HistoryRepo};

/// Provides lookups and lifecycle operations for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    pub async fn find_by_id(store: &dyn Store, id: &str) -> Result<Option<Project>, StoreError> {
        store.get(Table::Projects, id).await?.map(decode).transpose()
    }

    pub async fn exists(store: &dyn Store, id: &str) -> Result<bool, StoreError> {
        Ok(store.get(Table::Projects, id).await?.is_some())
    }

    pub async fn create(store: &dyn Store, input: CreateProject) -> Result<Project, StoreError> {
        let project = Project::new(input);
        store.put(Table::Projects, encode(&project)?).await?;
        Ok(project)
    }

    /// Delete a project together with its layers, history and view state.
    pub async fn delete(store: &dyn Store, id: &str) -> Result<(), StoreError> {
        store.delete(Table::Projects, id).await?;
        store
            .replace_by_field(Table::Layers, "projectId", id, Vec::new())
            .await?;
        HistoryRepo::clear_for_project(store, id).await?;
        store.delete(Table::ViewStates, id).await
    }
}
