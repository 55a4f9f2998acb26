//! Records that exist only in storage.
//!
//! `Layer` and `HistoryEntry` documents are the domain types from
//! `layerdraw_core`, stored as-is.

pub mod active_project;
pub mod project;
pub mod view_state;

pub use active_project::{ActivePointer, ACTIVE_POINTER_KEY};
pub use project::{CreateProject, Project};
pub use view_state::ViewState;
