use std::sync::Arc;

use layerdraw_core::error::CoreError;
use layerdraw_db::StoreError;

use crate::canvas::BitmapError;

/// Errors surfaced by the editor services.
///
/// Race conditions (a project deleted mid-restore, a superseded
/// reconciliation) are not errors; see [`ApplyOutcome`](crate::applier::ApplyOutcome).
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Bitmap(#[from] BitmapError),

    /// A history write kept failing after every retry. The in-memory stack
    /// still holds the entry.
    #[error("History write failed after {attempts} attempts: {source}")]
    Persist {
        attempts: u32,
        #[source]
        source: StoreError,
    },

    /// Failure of a restore shared by several concurrent callers.
    #[error("{0}")]
    Shared(Arc<EditorError>),

    #[error("No project is open")]
    NoActiveProject,

    #[error("Invalid configuration: {0}")]
    Config(String),
}
