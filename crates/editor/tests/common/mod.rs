//! Shared fixtures for editor integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use image::{Rgba, RgbaImage};
use serde_json::Value;

use layerdraw_db::repositories::HistoryRepo;
use layerdraw_db::{MemoryStore, Store, StoreError, Table};
use layerdraw_editor::{Canvas, DataUrlCodec, Editor, EditorConfig, SurfaceRegistry};
use layerdraw_events::EventBus;

/// Surface size used by every test canvas.
pub const CANVAS_SIZE: u32 = 8;

/// Build a test `EditorConfig`: production debounce window, fast retries.
pub fn test_config() -> EditorConfig {
    EditorConfig {
        persist_backoff: Duration::from_millis(1),
        ..EditorConfig::default()
    }
}

/// In-memory store that yields on every call, counts reads and can be told
/// to fail history writes.
#[derive(Debug, Default)]
pub struct CountingStore {
    inner: MemoryStore,
    layer_queries: AtomicUsize,
    project_reads: AtomicUsize,
    failing_history_writes: AtomicU32,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `layers` range queries served.
    pub fn layer_queries(&self) -> usize {
        self.layer_queries.load(Ordering::SeqCst)
    }

    pub fn project_reads(&self) -> usize {
        self.project_reads.load(Ordering::SeqCst)
    }

    /// Make the next `n` writes to the `history` table fail.
    pub fn fail_next_history_writes(&self, n: u32) {
        self.failing_history_writes.store(n, Ordering::SeqCst);
    }

    fn take_history_failure(&self) -> bool {
        self.failing_history_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl Store for CountingStore {
    async fn get(&self, table: Table, key: &str) -> Result<Option<Value>, StoreError> {
        tokio::task::yield_now().await;
        if table == Table::Projects {
            self.project_reads.fetch_add(1, Ordering::SeqCst);
        }
        self.inner.get(table, key).await
    }

    async fn put(&self, table: Table, value: Value) -> Result<String, StoreError> {
        tokio::task::yield_now().await;
        if table == Table::History && self.take_history_failure() {
            return Err(StoreError::Unavailable("injected history failure".into()));
        }
        self.inner.put(table, value).await
    }

    async fn delete(&self, table: Table, key: &str) -> Result<(), StoreError> {
        tokio::task::yield_now().await;
        self.inner.delete(table, key).await
    }

    async fn query_by_field(
        &self,
        table: Table,
        field: &str,
        value: &str,
        sort_by: Option<&str>,
    ) -> Result<Vec<Value>, StoreError> {
        tokio::task::yield_now().await;
        if table == Table::Layers {
            self.layer_queries.fetch_add(1, Ordering::SeqCst);
        }
        self.inner.query_by_field(table, field, value, sort_by).await
    }

    async fn clear_table(&self, table: Table) -> Result<(), StoreError> {
        tokio::task::yield_now().await;
        self.inner.clear_table(table).await
    }

    async fn replace_by_field(
        &self,
        table: Table,
        field: &str,
        value: &str,
        rows: Vec<Value>,
    ) -> Result<(), StoreError> {
        tokio::task::yield_now().await;
        self.inner.replace_by_field(table, field, value, rows).await
    }
}

pub struct TestEditor {
    pub editor: Editor,
    pub registry: Arc<SurfaceRegistry>,
    pub events: Arc<EventBus>,
}

/// Editor over `store` with a headless canvas.
pub fn editor_on(store: Arc<dyn Store>) -> TestEditor {
    let registry = Arc::new(SurfaceRegistry::new(CANVAS_SIZE, CANVAS_SIZE));
    let events = Arc::new(EventBus::default());
    let editor = Editor::new(
        store,
        Canvas::headless(Arc::clone(&registry)),
        Arc::clone(&events),
        &test_config(),
    );
    TestEditor {
        editor,
        registry,
        events,
    }
}

/// Create a project and open it. Returns the project id.
pub async fn open_new_project(editor: &Editor) -> String {
    let project = editor
        .create_project("Test project")
        .await
        .expect("create project");
    editor.open_project(&project.id).await.expect("open project");
    project.id
}

pub async fn stored_labels(store: &dyn Store, project_id: &str) -> Vec<String> {
    HistoryRepo::list_for_project(store, project_id)
        .await
        .expect("list history")
        .into_iter()
        .map(|e| e.label)
        .collect()
}

pub async fn labels(editor: &Editor) -> Vec<String> {
    editor
        .history
        .items()
        .await
        .into_iter()
        .map(|i| i.label)
        .collect()
}

pub fn solid(color: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(CANVAS_SIZE, CANVAS_SIZE, Rgba(color))
}

pub fn solid_data_url(color: [u8; 4]) -> String {
    DataUrlCodec::encode(&solid(color)).expect("encode png")
}
