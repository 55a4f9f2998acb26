//! Durable [`Store`] backend on SQLite.
//!
//! Every logical table lives in the single `records(tbl, key, value)` table
//! created by the embedded migrations. Field queries use `json_extract`;
//! insertion order is the SQLite `rowid`, which an upsert preserves.

use async_trait::async_trait;
use serde_json::Value;

use crate::store::{extract_key, Store, StoreError, Table};
use crate::DbPool;

const UPSERT: &str = "INSERT INTO records (tbl, key, value) VALUES (?1, ?2, ?3) \
                      ON CONFLICT (tbl, key) DO UPDATE SET value = excluded.value";

/// SQLite-backed document store.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    /// Wrap a pool whose schema is already migrated.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Connect, migrate, and wrap in one step.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = crate::create_pool(database_url, max_connections).await?;
        crate::run_migrations(&pool).await?;
        tracing::info!(database_url, "SQLite store ready");
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

/// JSON path for a dotted field name.
fn json_path(field: &str) -> String {
    format!("$.{field}")
}

fn decode(raw: String) -> Result<Value, StoreError> {
    Ok(serde_json::from_str(&raw)?)
}

#[async_trait]
impl Store for SqliteStore {
    async fn get(&self, table: Table, key: &str) -> Result<Option<Value>, StoreError> {
        let raw: Option<String> =
            sqlx::query_scalar("SELECT value FROM records WHERE tbl = ?1 AND key = ?2")
                .bind(table.as_str())
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        raw.map(decode).transpose()
    }

    async fn put(&self, table: Table, value: Value) -> Result<String, StoreError> {
        let key = extract_key(table, &value)?;
        sqlx::query(UPSERT)
            .bind(table.as_str())
            .bind(&key)
            .bind(serde_json::to_string(&value)?)
            .execute(&self.pool)
            .await?;
        Ok(key)
    }

    async fn delete(&self, table: Table, key: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM records WHERE tbl = ?1 AND key = ?2")
            .bind(table.as_str())
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn query_by_field(
        &self,
        table: Table,
        field: &str,
        value: &str,
        sort_by: Option<&str>,
    ) -> Result<Vec<Value>, StoreError> {
        let rows: Vec<String> = match sort_by {
            Some(sort) => {
                sqlx::query_scalar(
                    "SELECT value FROM records \
                     WHERE tbl = ?1 AND json_extract(value, ?2) = ?3 \
                     ORDER BY json_extract(value, ?4), rowid",
                )
                .bind(table.as_str())
                .bind(json_path(field))
                .bind(value)
                .bind(json_path(sort))
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_scalar(
                    "SELECT value FROM records \
                     WHERE tbl = ?1 AND json_extract(value, ?2) = ?3 \
                     ORDER BY rowid",
                )
                .bind(table.as_str())
                .bind(json_path(field))
                .bind(value)
                .fetch_all(&self.pool)
                .await?
            }
        };
        rows.into_iter().map(decode).collect()
    }

    async fn clear_table(&self, table: Table) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM records WHERE tbl = ?1")
            .bind(table.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn replace_by_field(
        &self,
        table: Table,
        field: &str,
        value: &str,
        rows: Vec<Value>,
    ) -> Result<(), StoreError> {
        let keyed = rows
            .iter()
            .map(|doc| Ok((extract_key(table, doc)?, serde_json::to_string(doc)?)))
            .collect::<Result<Vec<_>, StoreError>>()?;

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM records WHERE tbl = ?1 AND json_extract(value, ?2) = ?3")
            .bind(table.as_str())
            .bind(json_path(field))
            .bind(value)
            .execute(&mut *tx)
            .await?;
        for (key, raw) in keyed {
            sqlx::query(UPSERT)
                .bind(table.as_str())
                .bind(key)
                .bind(raw)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        tracing::debug!(table = %table, field, value, "Rows replaced");
        Ok(())
    }
}
