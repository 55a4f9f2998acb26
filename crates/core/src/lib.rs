//! Domain model for the layered drawing editor.
//!
//! Pure, synchronous building blocks shared by the storage and editor crates:
//!
//! - [`layer`] — `Layer`, `SerializedLayer` and the create/patch DTOs.
//! - [`snapshot`] — `EditorSnapshot`, tool and viewport state.
//! - [`history`] — `HistoryEntry` and the `HistoryState` undo/redo machine.
//! - [`directory`] — `LayerDirectory`, the normalized in-memory layer set.
//! - [`labels`] — history label derivation.

pub mod directory;
pub mod error;
pub mod history;
pub mod labels;
pub mod layer;
pub mod snapshot;
pub mod types;

pub use directory::LayerDirectory;
pub use error::CoreError;
pub use history::{HistoryEntry, HistoryIcon, HistoryState};
pub use layer::{Layer, LayerPatch, NewLayer, SerializedLayer, UpdateKind};
pub use snapshot::{EditorSnapshot, ShapeType, ToolState, ToolType, Viewport};
