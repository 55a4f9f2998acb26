//! Repository for the `history` table.
//!
//! Entries are stored whole; the owning project is read from
//! `state.projectId`.

use layerdraw_core::history::HistoryEntry;

use super::{decode_all, encode};
use crate::store::{Store, StoreError, Table};

const PROJECT_FIELD: &str = "state.projectId";

/// Provides persistence for history entries.
pub struct HistoryRepo;

impl HistoryRepo {
    /// All entries of a project, oldest first.
    pub async fn list_for_project(
        store: &dyn Store,
        project_id: &str,
    ) -> Result<Vec<HistoryEntry>, StoreError> {
        let docs = store
            .query_by_field(Table::History, PROJECT_FIELD, project_id, Some("timestamp"))
            .await?;
        decode_all(docs)
    }

    pub async fn insert(store: &dyn Store, entry: &HistoryEntry) -> Result<(), StoreError> {
        store.put(Table::History, encode(entry)?).await?;
        Ok(())
    }

    /// Delete the given entries, e.g. a discarded redo branch.
    pub async fn delete_many(store: &dyn Store, entries: &[HistoryEntry]) -> Result<(), StoreError> {
        for entry in entries {
            store.delete(Table::History, &entry.id).await?;
        }
        Ok(())
    }

    /// Atomically swap the full persisted stack of a project.
    pub async fn replace_for_project(
        store: &dyn Store,
        project_id: &str,
        entries: &[HistoryEntry],
    ) -> Result<(), StoreError> {
        let docs = entries.iter().map(encode).collect::<Result<Vec<_>, _>>()?;
        store
            .replace_by_field(Table::History, PROJECT_FIELD, project_id, docs)
            .await
    }

    pub async fn clear_for_project(store: &dyn Store, project_id: &str) -> Result<(), StoreError> {
        Self::replace_for_project(store, project_id, &[]).await
    }
}
