//! The host-pipeline boundary.
//!
//! This module defines the batches and tags the logger consumes, and a replay
//! source that feeds recorded batches to it from JSON Lines.

pub mod replay;
pub mod types;

// Re-export commonly used types
pub use replay::{parse_line, BatchError, ReplayConfig, ReplaySource, SourceError, MAX_BATCH_SAMPLES};
pub use types::{SampleBatch, StreamTag, Tag, TagValue, TaggedBatch};
