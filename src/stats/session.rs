//! Session statistics of the event logger.
//!
//! Counts what the logger consumed and wrote, and optionally carries the
//! totals across runs in a small JSON file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters for the current session.
#[derive(Debug)]
pub struct SessionLog {
    /// Number of batches processed
    batches: AtomicU64,
    /// Number of vectors consumed
    vectors: AtomicU64,
    /// Number of tags merged into the metadata state
    tags_merged: AtomicU64,
    /// Number of event rows logged
    events_logged: AtomicU64,
    /// Number of vector timestamp rows logged
    vectors_logged: AtomicU64,
    /// Number of unknown tag reports
    unknown_tags: AtomicU64,
    /// Number of rows that could not be written
    write_failures: AtomicU64,
    /// Session start time
    session_start: DateTime<Utc>,
    /// Path for persisting stats
    persist_path: Option<PathBuf>,
}

impl SessionLog {
    /// Create a new session log.
    pub fn new() -> Self {
        Self {
            batches: AtomicU64::new(0),
            vectors: AtomicU64::new(0),
            tags_merged: AtomicU64::new(0),
            events_logged: AtomicU64::new(0),
            vectors_logged: AtomicU64::new(0),
            unknown_tags: AtomicU64::new(0),
            write_failures: AtomicU64::new(0),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create a session log that starts from, and saves to, `path`.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);

        if let Err(e) = log.load() {
            tracing::warn!("Could not load previous session stats: {e}");
        }

        log
    }

    /// Record a processed batch of `vectors` vectors.
    pub fn record_batch(&self, vectors: u64) {
        self.batches.fetch_add(1, Ordering::Relaxed);
        self.vectors.fetch_add(vectors, Ordering::Relaxed);
    }

    pub fn record_tags_merged(&self, count: u64) {
        self.tags_merged.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_event_logged(&self) {
        self.events_logged.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_vector_logged(&self) {
        self.vectors_logged.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unknown_tags(&self, count: u64) {
        self.unknown_tags.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_write_failure(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            batches: self.batches.load(Ordering::Relaxed),
            vectors: self.vectors.load(Ordering::Relaxed),
            tags_merged: self.tags_merged.load(Ordering::Relaxed),
            events_logged: self.events_logged.load(Ordering::Relaxed),
            vectors_logged: self.vectors_logged.load(Ordering::Relaxed),
            unknown_tags: self.unknown_tags.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Session Statistics:\n\
             - Batches processed: {}\n\
             - Vectors consumed: {}\n\
             - Tags merged: {}\n\
             - Events logged: {}\n\
             - Vector timestamps logged: {}\n\
             - Unknown tags reported: {}\n\
             - Write failures: {}\n\
             - Session duration: {} seconds",
            stats.batches,
            stats.vectors,
            stats.tags_merged,
            stats.events_logged,
            stats.vectors_logged,
            stats.unknown_tags,
            stats.write_failures,
            stats.session_duration_secs
        )
    }

    /// Save stats to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedStats {
                batches: stats.batches,
                vectors: stats.vectors,
                tags_merged: stats.tags_merged,
                events_logged: stats.events_logged,
                vectors_logged: stats.vectors_logged,
                unknown_tags: stats.unknown_tags,
                write_failures: stats.write_failures,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;
            std::fs::write(path, json)?;
        }
        Ok(())
    }

    /// Load stats from disk.
    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedStats =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                self.batches.store(persisted.batches, Ordering::Relaxed);
                self.vectors.store(persisted.vectors, Ordering::Relaxed);
                self.tags_merged
                    .store(persisted.tags_merged, Ordering::Relaxed);
                self.events_logged
                    .store(persisted.events_logged, Ordering::Relaxed);
                self.vectors_logged
                    .store(persisted.vectors_logged, Ordering::Relaxed);
                self.unknown_tags
                    .store(persisted.unknown_tags, Ordering::Relaxed);
                self.write_failures
                    .store(persisted.write_failures, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.batches.store(0, Ordering::Relaxed);
        self.vectors.store(0, Ordering::Relaxed);
        self.tags_merged.store(0, Ordering::Relaxed);
        self.events_logged.store(0, Ordering::Relaxed);
        self.vectors_logged.store(0, Ordering::Relaxed);
        self.unknown_tags.store(0, Ordering::Relaxed);
        self.write_failures.store(0, Ordering::Relaxed);
    }
}

impl Default for SessionLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of session statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub batches: u64,
    pub vectors: u64,
    pub tags_merged: u64,
    pub events_logged: u64,
    pub vectors_logged: u64,
    pub unknown_tags: u64,
    pub write_failures: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Stats format for persistence.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedStats {
    batches: u64,
    vectors: u64,
    tags_merged: u64,
    events_logged: u64,
    vectors_logged: u64,
    unknown_tags: u64,
    write_failures: u64,
    last_updated: DateTime<Utc>,
}

/// Session log shared between the logger and its driver.
pub type SharedSessionLog = Arc<SessionLog>;

/// Create a new shared session log.
pub fn create_shared_log() -> SharedSessionLog {
    Arc::new(SessionLog::new())
}

/// Create a new shared session log with persistence.
pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedSessionLog {
    Arc::new(SessionLog::with_persistence(path))
}
