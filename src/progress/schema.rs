//! Progress store schema
//!
//! This module contains the SQL schema of the progress database.

/// SQL schema for the progress database
pub const SCHEMA_SQL: &str = r#"
-- Latest known state of each crawl, keyed by the caller's reference
CREATE TABLE IF NOT EXISTS crawl_progress (
    job_ref TEXT PRIMARY KEY,
    status TEXT NOT NULL,
    seed_url TEXT,
    max_pages INTEGER,
    pages_crawled INTEGER NOT NULL DEFAULT 0,
    total_pages INTEGER,
    crawled_pages_path TEXT,
    error_message TEXT,
    started_at TEXT,
    modified_at TEXT NOT NULL
);

-- Append-only event log
CREATE TABLE IF NOT EXISTS progress_events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    job_ref TEXT NOT NULL,
    event TEXT NOT NULL,
    payload TEXT NOT NULL,
    recorded_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_progress_events_ref ON progress_events(job_ref);
"#;

/// Initializes the progress schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
