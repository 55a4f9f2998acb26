use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use layerdraw_db::SqliteStore;
use layerdraw_editor::{Canvas, Editor, EditorConfig, SurfaceRegistry};
use layerdraw_events::{EventBus, EventLog};

/// Surface size of the headless canvas.
const CANVAS_WIDTH: u32 = 800;
const CANVAS_HEIGHT: u32 = 600;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "layerdraw_editor=debug,layerdraw_db=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = EditorConfig::from_env()?;
    tracing::info!(database_url = %config.database_url, "Loaded editor configuration");

    // --- Database ---
    let store = SqliteStore::connect(&config.database_url, config.db_max_connections).await?;
    layerdraw_db::health_check(store.pool()).await?;
    tracing::info!("Database health check passed");

    // --- Event bus ---
    let events = Arc::new(EventBus::default());
    let log_handle = tokio::spawn(EventLog::run(events.subscribe()));

    // --- Editor ---
    let registry = Arc::new(SurfaceRegistry::new(CANVAS_WIDTH, CANVAS_HEIGHT));
    let editor = Editor::new(
        Arc::new(store),
        Canvas::headless(registry),
        Arc::clone(&events),
        &config,
    );

    // An optional project id argument plays the role of the URL parameter.
    let url_project_id = std::env::args().nth(1);
    let explicit = url_project_id.is_some();

    let project_id = match editor.restore_active_project(url_project_id).await? {
        Some(id) => id,
        None if explicit => {
            tracing::warn!("Requested project not found, nothing to restore");
            return Ok(());
        }
        None => {
            let project = editor.create_project("Untitled").await?;
            editor.open_project(&project.id).await?;
            project.id
        }
    };

    let items = editor.history.items().await;
    tracing::info!(project_id = %project_id, entries = items.len(), "Project restored");
    for item in items {
        tracing::info!(
            index = item.index,
            label = %item.label,
            current = item.is_current,
            "History entry"
        );
    }

    drop(editor);
    drop(events);
    match tokio::time::timeout(Duration::from_secs(1), log_handle).await {
        Ok(Ok(seen)) => tracing::debug!(events = seen, "Event log drained"),
        _ => tracing::warn!("Event log did not shut down in time"),
    }
    Ok(())
}
