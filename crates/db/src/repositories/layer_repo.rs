//! Repository for the `layers` table.

use layerdraw_core::layer::Layer;

use super::{decode, decode_all, encode};
use crate::store::{Store, StoreError, Table};

/// Provides persistence for per-project layer rows.
pub struct LayerRepo;

impl LayerRepo {
    /// All layers of a project in paint order.
    pub async fn list_for_project(
        store: &dyn Store,
        project_id: &str,
    ) -> Result<Vec<Layer>, StoreError> {
        let docs = store
            .query_by_field(Table::Layers, "projectId", project_id, Some("zIndex"))
            .await?;
        decode_all(docs)
    }

    pub async fn find_by_id(store: &dyn Store, id: &str) -> Result<Option<Layer>, StoreError> {
        store.get(Table::Layers, id).await?.map(decode).transpose()
    }

    /// Insert or overwrite one layer row.
    pub async fn save(store: &dyn Store, layer: &Layer) -> Result<(), StoreError> {
        store.put(Table::Layers, encode(layer)?).await?;
        Ok(())
    }

    pub async fn delete(store: &dyn Store, id: &str) -> Result<(), StoreError> {
        store.delete(Table::Layers, id).await
    }

    /// Atomically swap the full layer set of a project.
    pub async fn replace_for_project(
        store: &dyn Store,
        project_id: &str,
        layers: &[Layer],
    ) -> Result<(), StoreError> {
        let docs = layers.iter().map(encode).collect::<Result<Vec<_>, _>>()?;
        store
            .replace_by_field(Table::Layers, "projectId", project_id, docs)
            .await
    }
}
