//! Repository for the single-row `activeProject` pointer.

use layerdraw_core::types::ProjectId;

use crate::models::active_project::{ActivePointer, ACTIVE_POINTER_KEY};
use crate::store::{Store, StoreError, Table};

use super::{decode, encode};

pub struct ActiveProjectRepo;

impl ActiveProjectRepo {
    /// The remembered project id, if any.
    pub async fn get(store: &dyn Store) -> Result<Option<ProjectId>, StoreError> {
        let pointer: Option<ActivePointer> = store
            .get(Table::ActiveProject, ACTIVE_POINTER_KEY)
            .await?
            .map(decode)
            .transpose()?;
        Ok(pointer.map(|p| p.project_id))
    }

    pub async fn set(store: &dyn Store, project_id: &str) -> Result<(), StoreError> {
        store
            .put(Table::ActiveProject, encode(&ActivePointer::new(project_id))?)
            .await?;
        Ok(())
    }

    pub async fn clear(store: &dyn Store) -> Result<(), StoreError> {
        store.delete(Table::ActiveProject, ACTIVE_POINTER_KEY).await
    }
}
