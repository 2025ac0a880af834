/// Database row id (SQLite `INTEGER PRIMARY KEY`).
pub type DbId = i64;

/// UTC timestamp used across all entities.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
