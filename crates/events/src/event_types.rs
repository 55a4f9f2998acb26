//! Dot-separated event names published by the editor.

pub const HISTORY_PUSHED: &str = "history.pushed";
pub const HISTORY_NAVIGATED: &str = "history.navigated";
pub const HISTORY_RESET: &str = "history.reset";
pub const HISTORY_PERSIST_FAILED: &str = "history.persist_failed";

pub const SNAPSHOT_APPLIED: &str = "snapshot.applied";

pub const LAYER_CREATED: &str = "layer.created";
pub const LAYER_UPDATED: &str = "layer.updated";
pub const LAYER_DELETED: &str = "layer.deleted";

pub const PROJECT_LOADED: &str = "project.loaded";
