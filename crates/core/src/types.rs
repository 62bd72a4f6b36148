/// Primary keys of append-only bookkeeping tables (e.g. `events`) are BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
