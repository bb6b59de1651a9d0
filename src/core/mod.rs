//! Core functionality of the event logger.
//!
//! This module contains:
//! - Tag merging into the last known metadata
//! - Watermark-based detection of new events and vector timestamps
//! - Fixed-width formatting of log rows and the header

pub mod detect;
pub mod format;
pub mod tags;

// Re-export commonly used types
pub use detect::{Detection, Detector, EventRecord, VectorRecord, Watermarks, PRINT_INTERVAL_DAYS};
pub use format::{
    default_log_name, format_event_line, format_header, format_vector_line, MjdParts,
    EVENT_LEGEND, VECTOR_LEGEND,
};
pub use tags::{MergeReport, TagMerger, TagState};
