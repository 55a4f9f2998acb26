use std::str::FromStr;
use std::time::Duration;

use crate::error::EditorError;

/// Editor configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct EditorConfig {
    /// SQLite database backing the durable store.
    pub database_url: String,
    /// Pool size (default: `5`).
    pub db_max_connections: u32,
    /// Window in which metadata edits of one layer coalesce (default: 700ms).
    pub debounce: Duration,
    /// Attempts for one history write (default: `3`).
    pub persist_retries: u32,
    /// Backoff before the second attempt, doubled afterwards (default: 50ms).
    pub persist_backoff: Duration,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://layerdraw.db?mode=rwc".into(),
            db_max_connections: 5,
            debounce: Duration::from_millis(700),
            persist_retries: 3,
            persist_backoff: Duration::from_millis(50),
        }
    }
}

impl EditorConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                        | Default                          |
    /// |--------------------------------|----------------------------------|
    /// | `LAYERDRAW_DATABASE_URL`       | `sqlite://layerdraw.db?mode=rwc` |
    /// | `LAYERDRAW_DB_MAX_CONNECTIONS` | `5`                              |
    /// | `HISTORY_DEBOUNCE_MS`          | `700`                            |
    /// | `HISTORY_PERSIST_RETRIES`      | `3`                              |
    /// | `HISTORY_PERSIST_BACKOFF_MS`   | `50`                             |
    pub fn from_env() -> Result<Self, EditorError> {
        let defaults = Self::default();

        let database_url =
            std::env::var("LAYERDRAW_DATABASE_URL").unwrap_or(defaults.database_url);
        let db_max_connections =
            parse_var("LAYERDRAW_DB_MAX_CONNECTIONS", defaults.db_max_connections)?;
        let debounce_ms = parse_var("HISTORY_DEBOUNCE_MS", 700u64)?;
        let persist_retries = parse_var("HISTORY_PERSIST_RETRIES", defaults.persist_retries)?;
        let backoff_ms = parse_var("HISTORY_PERSIST_BACKOFF_MS", 50u64)?;

        if persist_retries == 0 {
            return Err(EditorError::Config(
                "HISTORY_PERSIST_RETRIES must be at least 1".into(),
            ));
        }

        Ok(Self {
            database_url,
            db_max_connections,
            debounce: Duration::from_millis(debounce_ms),
            persist_retries,
            persist_backoff: Duration::from_millis(backoff_ms),
        })
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, EditorError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| EditorError::Config(format!("{name} must be a number, got '{raw}'"))),
        Err(_) => Ok(default),
    }
}
