//! Behavior of the SQLite backend, checked against the in-memory backend.

mod common;

use assert_matches::assert_matches;
use layerdraw_db::repositories::{HistoryRepo, LayerRepo};
use layerdraw_db::{MemoryStore, Store, StoreError, Table};
use serde_json::json;

use common::{entry_at, layer, sqlite_memory_store};

async fn crud_contract(store: &dyn Store) {
    let key = store
        .put(Table::Projects, json!({"id": "p1", "name": "One"}))
        .await
        .unwrap();
    assert_eq!(key, "p1");
    assert_eq!(
        store.get(Table::Projects, "p1").await.unwrap().unwrap()["name"],
        "One"
    );

    store
        .put(Table::Projects, json!({"id": "p1", "name": "Renamed"}))
        .await
        .unwrap();
    assert_eq!(
        store.get(Table::Projects, "p1").await.unwrap().unwrap()["name"],
        "Renamed"
    );

    store.delete(Table::Projects, "p1").await.unwrap();
    assert!(store.get(Table::Projects, "p1").await.unwrap().is_none());

    assert_matches!(
        store.put(Table::Projects, json!({"name": "keyless"})).await,
        Err(StoreError::MissingKey { .. })
    );
}

async fn ordering_contract(store: &dyn Store) {
    for (label, offset) in [("third", 30), ("first", 10), ("second", 20)] {
        HistoryRepo::insert(store, &entry_at(label, "p", offset))
            .await
            .unwrap();
    }
    HistoryRepo::insert(store, &entry_at("other", "q", 0))
        .await
        .unwrap();

    let labels: Vec<String> = HistoryRepo::list_for_project(store, "p")
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.label)
        .collect();
    assert_eq!(labels, vec!["first", "second", "third"]);

    // Equal timestamps fall back to insertion order.
    HistoryRepo::insert(store, &entry_at("tie-a", "t", 5))
        .await
        .unwrap();
    HistoryRepo::insert(store, &entry_at("tie-b", "t", 5))
        .await
        .unwrap();
    let ties: Vec<String> = HistoryRepo::list_for_project(store, "t")
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.label)
        .collect();
    assert_eq!(ties, vec!["tie-a", "tie-b"]);
}

async fn replace_contract(store: &dyn Store) {
    LayerRepo::save(store, &layer("a", "p", 0)).await.unwrap();
    LayerRepo::save(store, &layer("b", "p", 1)).await.unwrap();
    LayerRepo::save(store, &layer("x", "q", 0)).await.unwrap();

    LayerRepo::replace_for_project(store, "p", &[layer("c", "p", 3), layer("b", "p", 2)])
        .await
        .unwrap();

    let ids: Vec<String> = LayerRepo::list_for_project(store, "p")
        .await
        .unwrap()
        .into_iter()
        .map(|l| l.id)
        .collect();
    assert_eq!(ids, vec!["b", "c"]);
    assert!(LayerRepo::find_by_id(store, "a").await.unwrap().is_none());
    assert!(LayerRepo::find_by_id(store, "x").await.unwrap().is_some());

    store.clear_table(Table::Layers).await.unwrap();
    assert!(LayerRepo::list_for_project(store, "q").await.unwrap().is_empty());
}

#[tokio::test]
async fn sqlite_crud() {
    crud_contract(&sqlite_memory_store().await).await;
}

#[tokio::test]
async fn memory_crud() {
    crud_contract(&MemoryStore::new()).await;
}

#[tokio::test]
async fn sqlite_ordering() {
    ordering_contract(&sqlite_memory_store().await).await;
}

#[tokio::test]
async fn memory_ordering() {
    ordering_contract(&MemoryStore::new()).await;
}

#[tokio::test]
async fn sqlite_replace() {
    replace_contract(&sqlite_memory_store().await).await;
}

#[tokio::test]
async fn memory_replace() {
    replace_contract(&MemoryStore::new()).await;
}

#[tokio::test]
async fn sqlite_file_survives_reconnect() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("draw.db").display());

    {
        let store = layerdraw_db::SqliteStore::connect(&url, 2).await.unwrap();
        LayerRepo::save(&store, &layer("a", "p", 0)).await.unwrap();
        store.pool().close().await;
    }

    let store = layerdraw_db::SqliteStore::connect(&url, 2).await.unwrap();
    layerdraw_db::health_check(store.pool()).await.unwrap();
    let layers = LayerRepo::list_for_project(&store, "p").await.unwrap();
    assert_eq!(layers.len(), 1);
    assert_eq!(layers[0].name, "A");
}
