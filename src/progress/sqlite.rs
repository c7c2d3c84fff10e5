//! SQLite-backed progress reporter
//!
//! Events are queued on an unbounded channel and written by one dedicated
//! thread that owns the database connection, so crawl workers never wait on
//! the progress store.

use crate::progress::schema::initialize_schema;
use crate::progress::{ProgressError, ProgressEvent, ProgressReporter};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection};
use std::sync::{Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::mpsc;

/// How long `shutdown` waits for queued events to be written
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

struct QueuedEvent {
    external_ref: String,
    event: ProgressEvent,
}

/// Progress reporter writing to a SQLite database
pub struct SqliteProgressReporter {
    sender: Mutex<Option<mpsc::UnboundedSender<QueuedEvent>>>,
    writer: Mutex<Option<JoinHandle<()>>>,
}

impl SqliteProgressReporter {
    /// Opens (or creates) the progress database and starts the writer thread
    ///
    /// # Arguments
    ///
    /// * `database_url` - A file path, optionally prefixed with `sqlite://`,
    ///   or `:memory:`
    pub fn open(database_url: &str) -> Result<Self, ProgressError> {
        let path = database_path(database_url);
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;
        initialize_schema(&conn)?;

        let (sender, receiver) = mpsc::unbounded_channel();
        let writer = std::thread::Builder::new()
            .name("progress-writer".to_string())
            .spawn(move || run_writer(conn, receiver))?;

        tracing::info!("Progress reporting to SQLite database {}", path);
        Ok(Self {
            sender: Mutex::new(Some(sender)),
            writer: Mutex::new(Some(writer)),
        })
    }
}

#[async_trait]
impl ProgressReporter for SqliteProgressReporter {
    fn report(&self, external_ref: &str, event: ProgressEvent) {
        let guard = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(sender) = guard.as_ref() else {
            tracing::debug!("Progress reporter closed, dropping {} event", event.name());
            return;
        };

        let queued = QueuedEvent {
            external_ref: external_ref.to_string(),
            event,
        };
        if sender.send(queued).is_err() {
            tracing::warn!("Progress writer stopped, dropping event for {}", external_ref);
        }
    }

    async fn shutdown(&self) {
        // Dropping the sender lets the writer drain the queue and exit.
        drop(
            self.sender
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take(),
        );

        let handle = self
            .writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(handle) = handle else {
            return;
        };

        let join = tokio::task::spawn_blocking(move || handle.join());
        match tokio::time::timeout(DRAIN_TIMEOUT, join).await {
            Ok(Ok(Ok(()))) => tracing::info!("Progress reporter flushed"),
            Ok(_) => tracing::error!("Progress writer thread panicked"),
            Err(_) => tracing::warn!(
                "Progress writer did not drain within {:?}, pending events dropped",
                DRAIN_TIMEOUT
            ),
        }
    }
}

fn database_path(database_url: &str) -> &str {
    let trimmed = database_url.trim();
    trimmed
        .strip_prefix("sqlite://")
        .or_else(|| trimmed.strip_prefix("sqlite:"))
        .unwrap_or(trimmed)
}

fn run_writer(mut conn: Connection, mut receiver: mpsc::UnboundedReceiver<QueuedEvent>) {
    tracing::debug!("Progress writer started");

    while let Some(queued) = receiver.blocking_recv() {
        if let Err(e) = write_event(&mut conn, &queued.external_ref, &queued.event) {
            tracing::warn!(
                "Failed to record {} event for {}: {}",
                queued.event.name(),
                queued.external_ref,
                e
            );
        }
    }

    tracing::debug!("Progress writer stopped");
}

fn write_event(
    conn: &mut Connection,
    external_ref: &str,
    event: &ProgressEvent,
) -> Result<(), rusqlite::Error> {
    let now = Utc::now().to_rfc3339();
    let status = event.status().as_str();
    let tx = conn.transaction()?;

    match event {
        ProgressEvent::Started {
            seed_url,
            max_pages,
        } => {
            tx.execute(
                "INSERT INTO crawl_progress
                    (job_ref, status, seed_url, max_pages, pages_crawled, started_at, modified_at)
                 VALUES (?1, ?2, ?3, ?4, 0, ?5, ?5)
                 ON CONFLICT(job_ref) DO UPDATE SET
                    status = excluded.status,
                    seed_url = excluded.seed_url,
                    max_pages = excluded.max_pages,
                    pages_crawled = 0,
                    total_pages = NULL,
                    crawled_pages_path = NULL,
                    error_message = NULL,
                    started_at = excluded.started_at,
                    modified_at = excluded.modified_at",
                params![external_ref, status, seed_url, *max_pages as i64, now],
            )?;
        }
        ProgressEvent::PageCrawled { pages_crawled } => {
            tx.execute(
                "INSERT INTO crawl_progress (job_ref, status, pages_crawled, modified_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(job_ref) DO UPDATE SET
                    pages_crawled = MAX(crawl_progress.pages_crawled, excluded.pages_crawled),
                    modified_at = excluded.modified_at",
                params![external_ref, status, *pages_crawled as i64, now],
            )?;
        }
        ProgressEvent::Completed {
            total_pages,
            location,
        } => {
            tx.execute(
                "INSERT INTO crawl_progress
                    (job_ref, status, pages_crawled, total_pages, crawled_pages_path, modified_at)
                 VALUES (?1, ?2, ?3, ?3, ?4, ?5)
                 ON CONFLICT(job_ref) DO UPDATE SET
                    status = excluded.status,
                    pages_crawled = excluded.pages_crawled,
                    total_pages = excluded.total_pages,
                    crawled_pages_path = excluded.crawled_pages_path,
                    modified_at = excluded.modified_at",
                params![external_ref, status, *total_pages as i64, location, now],
            )?;
        }
        ProgressEvent::Failed { error } => {
            tx.execute(
                "INSERT INTO crawl_progress (job_ref, status, error_message, modified_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(job_ref) DO UPDATE SET
                    status = excluded.status,
                    error_message = excluded.error_message,
                    modified_at = excluded.modified_at",
                params![external_ref, status, error, now],
            )?;
        }
    }

    let payload = serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string());
    tx.execute(
        "INSERT INTO progress_events (job_ref, event, payload, recorded_at) VALUES (?1, ?2, ?3, ?4)",
        params![external_ref, event.name(), payload, now],
    )?;

    tx.commit()
}
