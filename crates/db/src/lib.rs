//! Persistent store for projects, layers, history and view state.
//!
//! - [`store`] — the async key-value [`Store`] contract and [`StoreError`].
//! - [`memory`] — [`MemoryStore`], an in-process backend.
//! - [`sqlite`] — [`SqliteStore`], the durable SQLite backend.
//! - [`models`] — records that exist only in storage (projects, pointers).
//! - [`repositories`] — typed, zero-sized repositories over a `&dyn Store`.

use sqlx::sqlite::SqlitePoolOptions;

pub mod memory;
pub mod models;
pub mod repositories;
pub mod sqlite;
pub mod store;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use store::{Store, StoreError, Table};

pub type DbPool = sqlx::SqlitePool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Apply the embedded schema migrations.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Round-trip a trivial query to verify the connection.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
