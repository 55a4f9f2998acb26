//! The async key-value contract every storage backend implements.
//!
//! Values are JSON documents. Each logical [`Table`] names the document field
//! that acts as its primary key; [`Store::put`] extracts it from the value.
//! Field lookups accept dotted paths (`"state.projectId"`).

use std::cmp::Ordering;
use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// Logical tables of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Layers,
    History,
    Projects,
    ViewStates,
    /// Single-row pointer to the last opened project.
    ActiveProject,
}

impl Table {
    pub const ALL: [Table; 5] = [
        Table::Layers,
        Table::History,
        Table::Projects,
        Table::ViewStates,
        Table::ActiveProject,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Layers => "layers",
            Self::History => "history",
            Self::Projects => "projects",
            Self::ViewStates => "viewStates",
            Self::ActiveProject => "activeProject",
        }
    }

    /// Document field holding the primary key.
    pub fn key_field(self) -> &'static str {
        match self {
            Self::ViewStates => "projectId",
            _ => "id",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// StoreError
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Record in {table} has no string key field '{field}'")]
    MissingKey { table: Table, field: &'static str },

    /// Raised by backends that simulate or proxy failures.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Async key-value table store.
///
/// Implementations must be safe to share across tasks (`Arc<dyn Store>`).
#[async_trait]
pub trait Store: Send + Sync {
    /// Fetch a document by primary key.
    async fn get(&self, table: Table, key: &str) -> Result<Option<Value>, StoreError>;

    /// Insert or replace a document, returning its key.
    async fn put(&self, table: Table, value: Value) -> Result<String, StoreError>;

    /// Remove a document. Missing keys are not an error.
    async fn delete(&self, table: Table, key: &str) -> Result<(), StoreError>;

    /// All documents whose string `field` equals `value`.
    ///
    /// Sorted ascending by `sort_by` when given, then by first-insertion order.
    async fn query_by_field(
        &self,
        table: Table,
        field: &str,
        value: &str,
        sort_by: Option<&str>,
    ) -> Result<Vec<Value>, StoreError>;

    /// Remove every document of a table.
    async fn clear_table(&self, table: Table) -> Result<(), StoreError>;

    /// Atomically remove every document whose `field` equals `value` and
    /// insert `rows` in their place. Readers observe either the old or the
    /// new set, never a mix.
    async fn replace_by_field(
        &self,
        table: Table,
        field: &str,
        value: &str,
        rows: Vec<Value>,
    ) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// Document helpers shared by the backends
// ---------------------------------------------------------------------------

/// Resolve a dotted field path inside a document.
pub fn field<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |cur, part| cur.get(part))
}

/// Whether the string at `path` equals `expected`.
pub fn field_equals(doc: &Value, path: &str, expected: &str) -> bool {
    field(doc, path).and_then(Value::as_str) == Some(expected)
}

/// Extract the primary key of a document for `table`.
pub fn extract_key(table: Table, doc: &Value) -> Result<String, StoreError> {
    let key_field = table.key_field();
    field(doc, key_field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(StoreError::MissingKey {
            table,
            field: key_field,
        })
}

/// Ordering used for `sort_by`: numbers numerically, strings lexically,
/// missing values first.
pub fn compare_fields(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn dotted_paths_resolve() {
        let doc = json!({"id": "e1", "state": {"projectId": "p1"}});
        assert!(field_equals(&doc, "state.projectId", "p1"));
        assert!(!field_equals(&doc, "state.missing", "p1"));
        assert!(field(&doc, "id.deeper").is_none());
    }

    #[test]
    fn key_extraction_uses_table_key_field() {
        let view = json!({"projectId": "p1", "viewport": {}});
        assert_eq!(extract_key(Table::ViewStates, &view).unwrap(), "p1");
        assert_matches!(
            extract_key(Table::Layers, &view),
            Err(StoreError::MissingKey { table: Table::Layers, field: "id" })
        );
        assert_matches!(
            extract_key(Table::Layers, &json!({"id": 7})),
            Err(StoreError::MissingKey { .. })
        );
    }

    #[test]
    fn numeric_sort_is_numeric() {
        let (a, b) = (json!(9), json!(10));
        assert_eq!(compare_fields(Some(&a), Some(&b)), Ordering::Less);
        let (a, b) = (json!("b"), json!("a"));
        assert_eq!(compare_fields(Some(&a), Some(&b)), Ordering::Greater);
        assert_eq!(compare_fields(None, Some(&b)), Ordering::Less);
    }

    #[test]
    fn table_names_match_stored_names() {
        let names: Vec<&str> = Table::ALL.iter().map(|t| t.as_str()).collect();
        assert_eq!(
            names,
            vec!["layers", "history", "projects", "viewStates", "activeProject"]
        );
    }
}
