//! Shared fixtures for store integration tests.

#![allow(dead_code)]

use layerdraw_core::history::HistoryEntry;
use layerdraw_core::layer::{Layer, NewLayer};
use layerdraw_core::snapshot::{EditorSnapshot, ToolType, Viewport};
use layerdraw_core::types::now;
use layerdraw_db::{DbPool, SqliteStore};

/// Fresh in-memory SQLite store. A single connection keeps the database
/// alive for the pool's lifetime.
pub async fn sqlite_memory_store() -> SqliteStore {
    let pool: DbPool = layerdraw_db::create_pool("sqlite::memory:", 1)
        .await
        .expect("in-memory pool");
    layerdraw_db::run_migrations(&pool)
        .await
        .expect("migrations");
    SqliteStore::new(pool)
}

pub fn layer(id: &str, project_id: &str, z: i64) -> Layer {
    Layer::new(
        id.to_string(),
        project_id.to_string(),
        NewLayer::named(id.to_uppercase()),
        z,
        now(),
    )
}

pub fn entry(label: &str, project_id: &str, layers: &[Layer]) -> HistoryEntry {
    HistoryEntry::new(
        label,
        EditorSnapshot::capture(project_id, layers, ToolType::Brush, Viewport::default()),
    )
}

/// Entry with an explicit timestamp offset (milliseconds from a fixed base).
pub fn entry_at(label: &str, project_id: &str, offset_ms: i64) -> HistoryEntry {
    let mut e = entry(label, project_id, &[]);
    e.timestamp = chrono::DateTime::from_timestamp_millis(1_700_000_000_000 + offset_ms)
        .expect("valid timestamp");
    e
}
