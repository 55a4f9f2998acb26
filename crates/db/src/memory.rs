//! In-process [`Store`] backend.
//!
//! Keeps every table in a `BTreeMap` behind one `tokio::sync::RwLock`, so each
//! operation (including [`Store::replace_by_field`]) is atomic with respect to
//! other tasks. Used for tests and ephemeral sessions.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::store::{compare_fields, extract_key, field, field_equals, Store, StoreError, Table};

#[derive(Debug, Clone)]
struct Row {
    /// First-insertion sequence; kept when a key is overwritten.
    seq: u64,
    value: Value,
}

#[derive(Debug, Default)]
struct Tables {
    next_seq: u64,
    rows: HashMap<Table, BTreeMap<String, Row>>,
}

impl Tables {
    fn upsert(&mut self, table: Table, key: String, value: Value) {
        let next_seq = &mut self.next_seq;
        let rows = self.rows.entry(table).or_default();
        match rows.get_mut(&key) {
            Some(row) => row.value = value,
            None => {
                *next_seq += 1;
                rows.insert(
                    key,
                    Row {
                        seq: *next_seq,
                        value,
                    },
                );
            }
        }
    }
}

/// Volatile store holding all documents in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a table.
    pub async fn count(&self, table: Table) -> usize {
        self.tables
            .read()
            .await
            .rows
            .get(&table)
            .map_or(0, BTreeMap::len)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, table: Table, key: &str) -> Result<Option<Value>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .rows
            .get(&table)
            .and_then(|rows| rows.get(key))
            .map(|row| row.value.clone()))
    }

    async fn put(&self, table: Table, value: Value) -> Result<String, StoreError> {
        let key = extract_key(table, &value)?;
        self.tables.write().await.upsert(table, key.clone(), value);
        Ok(key)
    }

    async fn delete(&self, table: Table, key: &str) -> Result<(), StoreError> {
        if let Some(rows) = self.tables.write().await.rows.get_mut(&table) {
            rows.remove(key);
        }
        Ok(())
    }

    async fn query_by_field(
        &self,
        table: Table,
        field_path: &str,
        value: &str,
        sort_by: Option<&str>,
    ) -> Result<Vec<Value>, StoreError> {
        let tables = self.tables.read().await;
        let Some(rows) = tables.rows.get(&table) else {
            return Ok(Vec::new());
        };

        let mut matched: Vec<&Row> = rows
            .values()
            .filter(|row| field_equals(&row.value, field_path, value))
            .collect();
        matched.sort_by(|a, b| {
            let primary = match sort_by {
                Some(path) => compare_fields(field(&a.value, path), field(&b.value, path)),
                None => std::cmp::Ordering::Equal,
            };
            primary.then(a.seq.cmp(&b.seq))
        });

        Ok(matched.into_iter().map(|row| row.value.clone()).collect())
    }

    async fn clear_table(&self, table: Table) -> Result<(), StoreError> {
        self.tables.write().await.rows.remove(&table);
        Ok(())
    }

    async fn replace_by_field(
        &self,
        table: Table,
        field_path: &str,
        value: &str,
        rows: Vec<Value>,
    ) -> Result<(), StoreError> {
        // Validate every key before touching anything.
        let keyed = rows
            .into_iter()
            .map(|doc| extract_key(table, &doc).map(|key| (key, doc)))
            .collect::<Result<Vec<_>, _>>()?;

        let mut tables = self.tables.write().await;
        if let Some(existing) = tables.rows.get_mut(&table) {
            existing.retain(|_, row| !field_equals(&row.value, field_path, value));
        }
        for (key, doc) in keyed {
            tables.upsert(table, key, doc);
        }
        Ok(())
    }
}
