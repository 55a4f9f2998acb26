/// Projects are keyed by opaque string ids (UUID v4 for records created here).
pub type ProjectId = String;

/// Layer ids are unique across all projects.
pub type LayerId = String;

/// History entry ids.
pub type EntryId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Generate a fresh record id.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Current time truncated to millisecond precision, matching the stored format.
pub fn now() -> Timestamp {
    let now = chrono::Utc::now();
    chrono::DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}
