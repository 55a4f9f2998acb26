//! Repository for the `viewStates` table.

use crate::models::view_state::ViewState;
use crate::store::{Store, StoreError, Table};

use super::{decode, encode};

pub struct ViewStateRepo;

impl ViewStateRepo {
    pub async fn find(store: &dyn Store, project_id: &str) -> Result<Option<ViewState>, StoreError> {
        store
            .get(Table::ViewStates, project_id)
            .await?
            .map(decode)
            .transpose()
    }

    pub async fn save(store: &dyn Store, view: &ViewState) -> Result<(), StoreError> {
        store.put(Table::ViewStates, encode(view)?).await?;
        Ok(())
    }
}
