mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use layerdraw_core::history::HistoryIcon;
use layerdraw_core::layer::{LayerPatch, NewLayer};
use layerdraw_core::snapshot::{ToolState, ToolType, Viewport};
use layerdraw_db::models::CreateProject;
use layerdraw_db::repositories::{ActiveProjectRepo, HistoryRepo, LayerRepo, ProjectRepo};
use layerdraw_db::{MemoryStore, SqliteStore, Store};
use layerdraw_editor::{ApplyOutcome, EditorError};
use layerdraw_events::event_types;

use common::{editor_on, labels, open_new_project, solid, solid_data_url, CountingStore};

// ---------------------------------------------------------------------------
// load_project_data
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_project_gets_base_layer_and_entry() {
    let store = Arc::new(MemoryStore::new());
    let t = editor_on(store.clone());
    let project_id = open_new_project(&t.editor).await;

    let layers = t.editor.layers.layers().await;
    assert_eq!(layers.len(), 1);
    assert_eq!(layers[0].name, "Layer 1");
    assert_eq!(
        t.editor.layers.active_layer().await.map(|l| l.id),
        Some(layers[0].id.clone())
    );

    let items = t.editor.history.items().await;
    assert_eq!(items.len(), 1);
    assert!(items[0].label.contains("Layer 1"));
    assert_eq!(items[0].icon, Some(HistoryIcon::Created));
    assert_eq!(t.editor.history.current_index().await, 0);
    assert!(!t.editor.history.is_preview().await);

    let stored = LayerRepo::list_for_project(store.as_ref(), &project_id)
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert!(t.registry.surface(&layers[0].id).is_some());
}

#[tokio::test]
async fn reopening_does_not_duplicate_base_layer() {
    let store = Arc::new(MemoryStore::new());
    let t = editor_on(store.clone());
    let project_id = open_new_project(&t.editor).await;

    t.editor.open_project(&project_id).await.unwrap();

    assert_eq!(t.editor.layers.layers().await.len(), 1);
    assert_eq!(t.editor.history.items().await.len(), 1);
}

#[tokio::test]
async fn switching_projects_resets_history() {
    let store = Arc::new(MemoryStore::new());
    let t = editor_on(store.clone());
    open_new_project(&t.editor).await;
    t.editor
        .layers
        .create_layer(NewLayer::named("Only in first"))
        .await
        .unwrap();

    open_new_project(&t.editor).await;

    assert_eq!(
        labels(&t.editor).await,
        vec!["Base layer created: Layer 1"]
    );
    assert_eq!(t.editor.layers.layers().await.len(), 1);
}

#[tokio::test]
async fn view_state_is_restored_on_load() {
    let store = Arc::new(MemoryStore::new());
    let t = editor_on(store.clone());
    let project_id = open_new_project(&t.editor).await;
    let viewport = Viewport {
        scale: 2.5,
        offset_x: -10.0,
        offset_y: 4.0,
    };
    t.editor.layers.set_viewport(viewport).await.unwrap();
    t.editor
        .layers
        .set_tool(ToolState {
            tool: ToolType::Line,
            ..ToolState::default()
        })
        .await
        .unwrap();
    assert_eq!(t.editor.history.items().await.len(), 1);

    let reopened = editor_on(store.clone());
    reopened.editor.open_project(&project_id).await.unwrap();

    let view = *reopened.editor.session.view.read().await;
    assert_eq!(view.viewport, viewport);
    assert_eq!(view.tool.tool, ToolType::Line);
}

#[tokio::test]
async fn loading_missing_project_writes_nothing() {
    let store = Arc::new(MemoryStore::new());
    let t = editor_on(store.clone());
    let mut rx = t.events.subscribe();

    t.editor.loader.load_project_data("ghost").await.unwrap();

    assert!(LayerRepo::list_for_project(store.as_ref(), "ghost")
        .await
        .unwrap()
        .is_empty());
    assert!(HistoryRepo::list_for_project(store.as_ref(), "ghost")
        .await
        .unwrap()
        .is_empty());
    assert_eq!(t.editor.session.project_id().await, None);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn loading_deleted_project_keeps_current_session() {
    let store = Arc::new(MemoryStore::new());
    let t = editor_on(store.clone());
    let open_id = open_new_project(&t.editor).await;
    let doomed = t.editor.create_project("Doomed").await.unwrap();
    ProjectRepo::delete(store.as_ref(), &doomed.id).await.unwrap();

    t.editor.loader.load_project_data(&doomed.id).await.unwrap();

    assert!(LayerRepo::list_for_project(store.as_ref(), &doomed.id)
        .await
        .unwrap()
        .is_empty());
    assert!(HistoryRepo::list_for_project(store.as_ref(), &doomed.id)
        .await
        .unwrap()
        .is_empty());
    assert_eq!(t.editor.session.project_id().await, Some(open_id));
    assert_eq!(t.editor.history.items().await.len(), 1);
}

#[tokio::test]
async fn load_publishes_reset_then_loaded() {
    let store = Arc::new(MemoryStore::new());
    let t = editor_on(store.clone());
    let project = t.editor.create_project("P").await.unwrap();
    let mut rx = t.events.subscribe();

    t.editor.loader.load_project_data(&project.id).await.unwrap();

    let mut seen = Vec::new();
    while let Ok(event) = rx.try_recv() {
        seen.push(event.event_type);
    }
    assert_eq!(seen.first().map(String::as_str), Some(event_types::HISTORY_RESET));
    assert_eq!(seen.last().map(String::as_str), Some(event_types::PROJECT_LOADED));
}

#[tokio::test]
async fn opening_unknown_project_is_not_found() {
    let t = editor_on(Arc::new(MemoryStore::new()));
    let err = t.editor.open_project("missing").await.unwrap_err();
    assert_matches!(
        err,
        EditorError::Core(layerdraw_core::CoreError::NotFound { entity: "project", .. })
    );
}

// ---------------------------------------------------------------------------
// restore_active_project
// ---------------------------------------------------------------------------

#[tokio::test]
async fn concurrent_restores_share_one_load() {
    let store = Arc::new(CountingStore::new());
    let project = ProjectRepo::create(store.as_ref(), CreateProject { name: "P".into() })
        .await
        .unwrap();
    let t = editor_on(store.clone());

    let (a, b) = tokio::join!(
        t.editor.restore_active_project(Some(project.id.clone())),
        t.editor.restore_active_project(Some(project.id.clone())),
    );

    assert_eq!(a.unwrap(), Some(project.id.clone()));
    assert_eq!(b.unwrap(), Some(project.id.clone()));
    assert_eq!(store.layer_queries(), 1);
    assert_eq!(t.editor.history.items().await.len(), 1);
}

#[tokio::test]
async fn sequential_restores_each_run() {
    let store = Arc::new(CountingStore::new());
    let project = ProjectRepo::create(store.as_ref(), CreateProject { name: "P".into() })
        .await
        .unwrap();
    let t = editor_on(store.clone());

    t.editor
        .restore_active_project(Some(project.id.clone()))
        .await
        .unwrap();
    t.editor.restore_active_project(None).await.unwrap();

    assert_eq!(store.layer_queries(), 2);
}

#[tokio::test]
async fn remembered_pointer_to_deleted_project_is_cleared() {
    let store = Arc::new(MemoryStore::new());
    ActiveProjectRepo::set(store.as_ref(), "ghost").await.unwrap();
    let t = editor_on(store.clone());

    assert_eq!(t.editor.restore_active_project(None).await.unwrap(), None);
    assert_eq!(ActiveProjectRepo::get(store.as_ref()).await.unwrap(), None);
    assert!(t.editor.layers.layers().await.is_empty());
}

#[tokio::test]
async fn unknown_url_project_leaves_pointer_alone() {
    let store = Arc::new(MemoryStore::new());
    let real = ProjectRepo::create(store.as_ref(), CreateProject { name: "P".into() })
        .await
        .unwrap();
    ActiveProjectRepo::set(store.as_ref(), &real.id).await.unwrap();
    let t = editor_on(store.clone());

    let restored = t
        .editor
        .restore_active_project(Some("ghost".into()))
        .await
        .unwrap();

    assert_eq!(restored, None);
    assert_eq!(
        ActiveProjectRepo::get(store.as_ref()).await.unwrap(),
        Some(real.id)
    );
    assert!(t.editor.layers.layers().await.is_empty());
    assert!(LayerRepo::list_for_project(store.as_ref(), "ghost")
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn restore_without_pointer_is_a_no_op() {
    let t = editor_on(Arc::new(MemoryStore::new()));
    assert_eq!(t.editor.restore_active_project(None).await.unwrap(), None);
    assert_eq!(t.editor.history.current_index().await, -1);
}

// ---------------------------------------------------------------------------
// Round trips
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fresh_editor_reproduces_layers_and_pixels() {
    let store = Arc::new(MemoryStore::new());
    let first = editor_on(store.clone());
    let project_id = open_new_project(&first.editor).await;
    let base = first.editor.layers.layers().await.remove(0);

    first
        .editor
        .layers
        .update_layer(&base.id, LayerPatch::bitmap(solid_data_url([200, 10, 10, 255])))
        .await
        .unwrap();
    let ink = first
        .editor
        .layers
        .create_layer(NewLayer {
            opacity: Some(0.25),
            visible: Some(false),
            ..NewLayer::named("Ink")
        })
        .await
        .unwrap();

    let snapshot = first
        .editor
        .session
        .history
        .read()
        .await
        .current()
        .unwrap()
        .state
        .clone();

    let second = editor_on(store.clone());
    assert_eq!(
        second.editor.restore_active_project(None).await.unwrap(),
        Some(project_id)
    );

    let rebuilt = second.editor.layers.layers().await;
    assert_eq!(rebuilt.len(), snapshot.layers.len());
    for (layer, captured) in rebuilt.iter().zip(&snapshot.layers) {
        assert_eq!(layer.id, captured.id);
        assert_eq!(Some(&layer.name), captured.name.as_ref());
        assert_eq!(Some(layer.visible), captured.visible);
        assert_eq!(Some(layer.opacity), captured.opacity);
        assert_eq!(layer.z_index, captured.z_index);
    }

    let redrawn = second.registry.surface(&base.id).unwrap().pixels();
    assert_eq!(redrawn, solid([200, 10, 10, 255]));
    assert!(second.registry.surface(&ink.id).unwrap().is_blank());
}

#[tokio::test]
async fn applier_reports_deleted_project() {
    let store = Arc::new(MemoryStore::new());
    let t = editor_on(store.clone());
    let project_id = open_new_project(&t.editor).await;
    let snapshot = t.editor.session.capture().await.unwrap();

    ProjectRepo::delete(store.as_ref(), &project_id).await.unwrap();
    let before = t.editor.layers.layers().await;

    let outcome = t.editor.applier.apply_snapshot(&snapshot).await.unwrap();
    assert_eq!(outcome, ApplyOutcome::ProjectMissing);
    assert_eq!(t.editor.layers.layers().await, before);
}

#[tokio::test]
async fn sqlite_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("editor.db").display());

    let project_id = {
        let store: Arc<dyn Store> = Arc::new(SqliteStore::connect(&url, 1).await.unwrap());
        let t = editor_on(store);
        let project_id = open_new_project(&t.editor).await;
        let base = t.editor.layers.layers().await.remove(0);
        t.editor
            .layers
            .update_layer(&base.id, LayerPatch::bitmap(solid_data_url([0, 0, 255, 255])))
            .await
            .unwrap();
        t.editor
            .layers
            .create_layer(NewLayer::named("Top"))
            .await
            .unwrap();
        t.editor.history.undo().await;
        t.editor
            .layers
            .create_layer(NewLayer::named("Replacement"))
            .await
            .unwrap();
        project_id
    };

    let store: Arc<dyn Store> = Arc::new(SqliteStore::connect(&url, 1).await.unwrap());
    let t = editor_on(store);
    assert_eq!(
        t.editor.restore_active_project(None).await.unwrap(),
        Some(project_id)
    );

    assert_eq!(
        labels(&t.editor).await,
        vec![
            "Base layer created: Layer 1",
            "Brush stroke",
            "Created layer: Replacement",
        ]
    );
    let names: Vec<String> = t
        .editor
        .layers
        .layers()
        .await
        .into_iter()
        .map(|l| l.name)
        .collect();
    assert_eq!(names, vec!["Layer 1", "Replacement"]);
    let base = t.editor.layers.layers().await.remove(0);
    assert_eq!(
        t.registry.surface(&base.id).unwrap().pixels(),
        solid([0, 0, 255, 255])
    );
}
