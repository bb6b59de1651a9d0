//! RA Event Log - durable log of detected events for radio astronomy pipelines.
//!
//! This library takes the bookkeeping off a real-time detection pipeline. It
//! consumes streamed complex sample vectors together with metadata tags
//! (event time, peak, noise RMS, vector counters) and appends a fixed-width,
//! human-readable row for every new event and every new vector timestamp.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                        RA Event Log                           │
//! ├───────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐          │
//! │  │   Source    │──▶│  Tag Merge  │──▶│  Detector   │          │
//! │  │  (batches)  │   │ (last known)│   │ (watermarks)│          │
//! │  └─────────────┘   └─────────────┘   └─────────────┘          │
//! │                                             │                 │
//! │                                             ▼                 │
//! │  ┌─────────────┐                     ┌─────────────┐          │
//! │  │   Session   │◀────────────────────│  Event Log  │          │
//! │  │    Stats    │                     │ (text file) │          │
//! │  └─────────────┘                     └─────────────┘          │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use ra_event_log::{EventLogger, LoggerSettings, SampleBatch, StreamTag, Tag};
//!
//! let mut logger = EventLogger::new(LoggerSettings::new("Event.log", "test", 1024, 1.42))
//!     .expect("Failed to open event log");
//!
//! let batch = SampleBatch::zeroed(4, 1024);
//! let tags = [StreamTag::new(0, Tag::Mjd(58500.5)), StreamTag::new(0, Tag::Peak(3.2))];
//! assert_eq!(logger.work(&batch, &tags), 4);
//! assert_eq!(logger.event_count(), 1);
//! ```

pub mod config;
pub mod core;
pub mod eventlog;
pub mod logger;
pub mod source;
pub mod stats;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError, WriteFailurePolicy};
pub use crate::core::{Detection, Detector, MjdParts, TagMerger, TagState, Watermarks};
pub use eventlog::LogFile;
pub use logger::{EventLogger, LoggerError, LoggerSettings};
pub use source::{ReplayConfig, ReplaySource, SampleBatch, StreamTag, Tag, TagValue, TaggedBatch};
pub use stats::{SessionLog, SessionStats, SharedSessionLog};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Description of the log file columns.
pub const COLUMN_LEGEND: &str = r#"
Event rows (E):
  MJD        event time, Modified Julian Day
  vector #   index of the vector holding the event
  second     whole seconds into the day
  micro.sec  microseconds into the second
  NV         zero-crossing counter (ENV)
  Zero#      vector sample offset
  Peak       peak amplitude
  RMS        noise RMS at event time
  Event#     running event number
  Offset     sample offset of the event in its vector

Vector rows (V):
  MJD        vector time, Modified Julian Day
  vector #   running vector count
  second     whole seconds into the day
  micro.sec  microseconds into the second
  NV         samples represented by the vector
  Zero#      vector sample offset
"#;
