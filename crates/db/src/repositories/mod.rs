//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&dyn Store` as the first argument and speak domain types.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::store::StoreError;

pub mod active_project_repo;
pub mod history_repo;
pub mod layer_repo;
pub mod project_repo;
pub mod view_state_repo;

pub use active_project_repo::ActiveProjectRepo;
pub use history_repo::HistoryRepo;
pub use layer_repo::LayerRepo;
pub use project_repo::ProjectRepo;
pub use view_state_repo::ViewStateRepo;

fn encode<T: Serialize>(record: &T) -> Result<Value, StoreError> {
    Ok(serde_json::to_value(record)?)
}

fn decode<T: DeserializeOwned>(doc: Value) -> Result<T, StoreError> {
    Ok(serde_json::from_value(doc)?)
}

fn decode_all<T: DeserializeOwned>(docs: Vec<Value>) -> Result<Vec<T>, StoreError> {
    docs.into_iter().map(decode).collect()
}
