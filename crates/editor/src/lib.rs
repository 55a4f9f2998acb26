//! Undo/redo history and layer reconciliation for the layered drawing
//! editor.
//!
//! - [`layers`] — layer mutations, each handed to the [`recorder`].
//! - [`recorder`] — builds history entries, debouncing metadata edits.
//! - [`history`] — undo, redo, jump and apply over the history stack.
//! - [`applier`] — reconciles directory, store and canvas with a snapshot.
//! - [`lifecycle`] — project load and single-flight restore.
//! - [`canvas`] — surface, codec and render-barrier seams.

pub mod applier;
pub mod canvas;
pub mod config;
pub mod debounce;
pub mod editor;
pub mod error;
pub mod history;
pub mod layers;
pub mod lifecycle;
pub mod recorder;
pub mod session;
pub mod single_flight;

pub use applier::{ApplyOutcome, RedrawReport, SnapshotApplier};
pub use canvas::{Canvas, DataUrlCodec, PixelSurface, SurfaceRegistry};
pub use config::EditorConfig;
pub use editor::Editor;
pub use error::EditorError;
pub use history::{HistoryController, HistoryItem};
pub use layers::LayerService;
pub use lifecycle::ProjectLoader;
pub use recorder::{HistoryRecorder, PendingDeletion, Recording};
pub use session::{EditorSession, ViewSettings};
