//! Decides when a new event or a new vector timestamp has arrived.
//!
//! Detection is a pure step over the accumulated [`TagState`]: it compares the
//! event and vector timestamps against independent watermarks and returns what
//! should be logged. Nothing here touches the filesystem.

use crate::core::tags::TagState;
use serde::{Deserialize, Serialize};

/// Minimum spacing of vector status prints: one minute of MJD.
pub const PRINT_INTERVAL_DAYS: f64 = 1.0 / 1440.0;

/// Slack on the print throttle comparison, about 9 microseconds.
const PRINT_TOLERANCE_DAYS: f64 = 1.0e-10;

/// Highest timestamps already committed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Watermarks {
    /// Last logged event MJD
    pub event_mjd: f64,
    /// Last logged vector MJD
    pub vector_mjd: f64,
    /// Vector MJD before which no status print happens
    pub print_mjd: f64,
}

/// A new event to log.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventRecord {
    pub mjd: f64,
    /// Index of the vector holding the event
    pub vector: i64,
    pub peak: f64,
    pub rms: f64,
    pub env: i64,
    /// Sample offset of the event within its vector
    pub offset: i64,
    pub vector_offset: i64,
    /// 1-based event number
    pub count: u64,
    /// Event watermark before this record advanced it
    pub previous_watermark: f64,
}

/// A new vector timestamp to log.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VectorRecord {
    pub mjd: f64,
    /// Running vector index (VCOUNT)
    pub count: i64,
    /// Samples represented by the vector (NV)
    pub samples: i64,
    pub offset: i64,
    /// Whether this row is due for a status print
    pub print: bool,
    /// Vector watermark before this record advanced it
    pub previous_watermark: f64,
}

/// What a batch produced. Both triggers are independent.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Detection {
    pub event: Option<EventRecord>,
    pub vector: Option<VectorRecord>,
}

impl Detection {
    pub fn is_empty(&self) -> bool {
        self.event.is_none() && self.vector.is_none()
    }
}

/// Watermark bookkeeping for event and vector rows.
#[derive(Debug, Clone)]
pub struct Detector {
    watermarks: Watermarks,
    event_count: u64,
    print_interval: f64,
}

impl Default for Detector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector {
    pub fn new() -> Self {
        Self::with_print_interval(PRINT_INTERVAL_DAYS)
    }

    /// Create a detector with a custom status print spacing, in days.
    pub fn with_print_interval(print_interval: f64) -> Self {
        Self {
            watermarks: Watermarks::default(),
            event_count: 0,
            print_interval,
        }
    }

    pub fn watermarks(&self) -> Watermarks {
        self.watermarks
    }

    /// Events detected so far.
    pub fn event_count(&self) -> u64 {
        self.event_count
    }

    /// Compare the state against the watermarks and advance them.
    ///
    /// An empty batch never produces a row, even if the state is newer.
    pub fn detect(&mut self, state: &TagState, n_vectors: usize) -> Detection {
        if n_vectors == 0 {
            return Detection::default();
        }

        Detection {
            event: self.detect_event(state),
            vector: self.detect_vector(state),
        }
    }

    fn detect_event(&mut self, state: &TagState) -> Option<EventRecord> {
        // NaN never passes
        if !(state.event_mjd > self.watermarks.event_mjd) {
            return None;
        }

        self.event_count += 1;
        let previous_watermark = self.watermarks.event_mjd;
        self.watermarks.event_mjd = state.event_mjd;

        Some(EventRecord {
            mjd: state.event_mjd,
            vector: state.event_vector,
            peak: state.event_peak,
            rms: state.event_rms,
            env: state.env,
            offset: state.event_offset,
            vector_offset: state.vector_offset,
            count: self.event_count,
            previous_watermark,
        })
    }

    fn detect_vector(&mut self, state: &TagState) -> Option<VectorRecord> {
        if !(state.vector_mjd > self.watermarks.vector_mjd) {
            return None;
        }

        let print = state.vector_mjd + PRINT_TOLERANCE_DAYS >= self.watermarks.print_mjd;
        if print {
            self.watermarks.print_mjd = state.vector_mjd + self.print_interval;
        }

        let previous_watermark = self.watermarks.vector_mjd;
        self.watermarks.vector_mjd = state.vector_mjd;

        Some(VectorRecord {
            mjd: state.vector_mjd,
            count: state.vector_count,
            samples: state.vector_samples,
            offset: state.vector_offset,
            print,
            previous_watermark,
        })
    }

    /// Undo an event that could not be persisted, so it is detected again.
    pub fn rewind_event(&mut self, event: &EventRecord) {
        if self.watermarks.event_mjd == event.mjd && self.event_count == event.count {
            self.watermarks.event_mjd = event.previous_watermark;
            self.event_count -= 1;
        }
    }

    /// Undo a vector row that could not be persisted.
    ///
    /// The print throttle is left alone; a status line already went out.
    pub fn rewind_vector(&mut self, vector: &VectorRecord) {
        if self.watermarks.vector_mjd == vector.mjd {
            self.watermarks.vector_mjd = vector.previous_watermark;
        }
    }
}
