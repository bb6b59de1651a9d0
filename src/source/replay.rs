//! Replay of recorded tagged batches from a JSON Lines stream.
//!
//! Each line describes one batch:
//!
//! ```text
//! {"vectors": 4, "tags": [{"offset": 0, "key": "VMJD", "value": 58500.5}]}
//! ```
//!
//! A reader thread parses lines and hands batches to the consumer over a
//! bounded channel. End of input disconnects the channel.

use crate::source::types::{SampleBatch, StreamTag, Tag, TagValue, TaggedBatch};
use crossbeam_channel::{bounded, Receiver, Sender};
use serde::Deserialize;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use thiserror::Error;

/// Where to read batches from and how to shape them.
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Input path, `-` for stdin
    pub input: PathBuf,
    /// Channels per vector
    pub vlen: usize,
    /// Bound of the batch channel
    pub channel_capacity: usize,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("-"),
            vlen: 1024,
            channel_capacity: 1_000,
        }
    }
}

/// Errors that can occur while starting a replay.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Replay source is already running")]
    AlreadyRunning,
    #[error("Could not open {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Most samples a single replayed batch may hold (16 Mi, 128 MiB of `Complex32`).
pub const MAX_BATCH_SAMPLES: usize = 1 << 24;

/// Why a replay line was rejected.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Batch of {vectors} vectors of {vlen} channels exceeds {max} samples", max = MAX_BATCH_SAMPLES)]
    TooLarge { vectors: usize, vlen: usize },
}

#[derive(Debug, Deserialize)]
struct BatchRecord {
    vectors: usize,
    #[serde(default)]
    tags: Vec<TagRecord>,
}

#[derive(Debug, Deserialize)]
struct TagRecord {
    #[serde(default)]
    offset: u64,
    key: String,
    value: TagValue,
}

impl BatchRecord {
    fn into_tagged(self, vlen: usize) -> Result<TaggedBatch, BatchError> {
        match self.vectors.checked_mul(vlen) {
            Some(samples) if samples <= MAX_BATCH_SAMPLES => {}
            _ => {
                return Err(BatchError::TooLarge {
                    vectors: self.vectors,
                    vlen,
                })
            }
        }

        Ok(TaggedBatch {
            batch: SampleBatch::zeroed(self.vectors, vlen),
            tags: self
                .tags
                .into_iter()
                .map(|t| StreamTag::new(t.offset, Tag::resolve(&t.key, t.value)))
                .collect(),
        })
    }
}

/// Parse one JSON line into a tagged batch.
pub fn parse_line(line: &str, vlen: usize) -> Result<TaggedBatch, BatchError> {
    let record: BatchRecord = serde_json::from_str(line)?;
    record.into_tagged(vlen)
}

/// A source that replays batches from a JSON Lines file or stdin.
pub struct ReplaySource {
    config: ReplayConfig,
    sender: Sender<TaggedBatch>,
    receiver: Receiver<TaggedBatch>,
    running: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
}

impl ReplaySource {
    /// Create a new replay source. Nothing is read until [`start`](Self::start).
    pub fn new(config: ReplayConfig) -> Self {
        let (sender, receiver) = bounded(config.channel_capacity.max(1));
        Self {
            config,
            sender,
            receiver,
            running: Arc::new(AtomicBool::new(false)),
            reader: None,
        }
    }

    /// Open the input and start the reader thread.
    ///
    /// The source hands its sender to the reader, so the channel disconnects
    /// once the input is exhausted.
    pub fn start(&mut self) -> Result<(), SourceError> {
        if self.running.load(Ordering::SeqCst) || self.reader.is_some() {
            return Err(SourceError::AlreadyRunning);
        }

        let input: Box<dyn BufRead + Send> = if self.config.input.as_os_str() == "-" {
            Box::new(BufReader::new(io::stdin()))
        } else {
            let file = File::open(&self.config.input).map_err(|source| SourceError::Io {
                path: self.config.input.clone(),
                source,
            })?;
            Box::new(BufReader::new(file))
        };

        // Swap in a dead sender so that only the reader keeps the channel alive.
        let (dead, _) = bounded(0);
        let sender = std::mem::replace(&mut self.sender, dead);
        let running = Arc::clone(&self.running);
        let vlen = self.config.vlen;

        running.store(true, Ordering::SeqCst);
        self.reader = Some(thread::spawn(move || {
            read_batches(input, vlen, &sender, &running);
            running.store(false, Ordering::SeqCst);
        }));

        tracing::debug!(input = ?self.config.input, "replay started");
        Ok(())
    }

    /// Ask the reader to stop after the line in flight.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Check if the reader is still producing batches.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Get the receiver for tagged batches.
    pub fn receiver(&self) -> &Receiver<TaggedBatch> {
        &self.receiver
    }

}

impl Drop for ReplaySource {
    fn drop(&mut self) {
        self.stop();
        // a reader blocked on stdin cannot be joined, so it is left detached
        if let Some(handle) = self.reader.take() {
            if handle.is_finished() {
                let _ = handle.join();
            }
        }
    }
}

fn read_batches(
    input: Box<dyn BufRead + Send>,
    vlen: usize,
    sender: &Sender<TaggedBatch>,
    running: &AtomicBool,
) {
    for (index, line) in input.lines().enumerate() {
        if !running.load(Ordering::SeqCst) {
            break;
        }
        let line_no = index + 1;

        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(line = line_no, "Replay read failed: {e}");
                break;
            }
        };
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }

        match parse_line(&line, vlen) {
            Ok(batch) => {
                if sender.send(batch).is_err() {
                    // consumer went away
                    break;
                }
            }
            Err(e) => tracing::warn!(line = line_no, "Skipping malformed batch: {e}"),
        }
    }
}
