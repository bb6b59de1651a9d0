//! Accumulation of tag-carried metadata across batches.
//!
//! Fields persist between batches until a new tag overwrites them, so a
//! timestamp tagged in one batch is still visible when the next one arrives.

use crate::source::types::Tag;
use serde::{Deserialize, Serialize};

/// The last known value of every metadata field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TagState {
    /// Event timestamp (MJD)
    pub event_mjd: f64,
    /// Index of the vector holding the event
    pub event_vector: i64,
    /// Peak amplitude of the event
    pub event_peak: f64,
    /// Noise RMS at event time
    pub event_rms: f64,
    /// Running sample-vector index (VCOUNT)
    pub vector_count: i64,
    /// Zero-crossing counter (ENV)
    pub env: i64,
    /// Sample offset of the event within its vector
    pub event_offset: i64,
    /// Sample offset tied to the vector timestamp
    pub vector_offset: i64,
    /// Timestamp of the current vector (VMJD)
    pub vector_mjd: f64,
    /// Samples represented by the vector (NV)
    pub vector_samples: i64,
}

impl TagState {
    /// Apply one tag. Returns false for tags that carry no known field.
    pub fn apply(&mut self, tag: &Tag) -> bool {
        match *tag {
            Tag::Mjd(v) => self.event_mjd = v,
            Tag::VMjd(v) => self.vector_mjd = v,
            Tag::Peak(v) => self.event_peak = v,
            Tag::Rms(v) => self.event_rms = v,
            Tag::VCount(v) => self.vector_count = v,
            Tag::EVector(v) => self.event_vector = v,
            Tag::Env(v) => self.env = v,
            Tag::EOffset(v) => self.event_offset = v,
            Tag::VOffset(v) => self.vector_offset = v,
            Tag::Nv(v) => self.vector_samples = v,
            Tag::Unrecognized { .. } => return false,
        }
        true
    }
}

/// Outcome of merging one batch worth of tags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeReport {
    /// Tags that updated a field
    pub merged: usize,
    /// Unrecognized keys that were reported, in order
    pub reported_unknown: Vec<String>,
}

/// Merges tags into a [`TagState`], reporting unknown keys.
///
/// A run of tags with the same unknown key is reported once; the suppression
/// ends when a different unknown key shows up.
#[derive(Debug, Clone, Default)]
pub struct TagMerger {
    state: TagState,
    last_unknown: Option<String>,
}

impl TagMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current accumulated state.
    pub fn state(&self) -> &TagState {
        &self.state
    }

    /// Merge tags in order, last writer wins.
    pub fn merge<'a, I>(&mut self, tags: I) -> MergeReport
    where
        I: IntoIterator<Item = &'a Tag>,
    {
        let mut report = MergeReport::default();

        for tag in tags {
            if self.state.apply(tag) {
                report.merged += 1;
                continue;
            }

            if let Tag::Unrecognized { key, value } = tag {
                if self.last_unknown.as_deref() != Some(key.as_str()) {
                    tracing::warn!("Unknown tag: {key} = {value}");
                    self.last_unknown = Some(key.clone());
                    report.reported_unknown.push(key.clone());
                }
            }
        }

        if report.merged > 0 {
            tracing::debug!(merged = report.merged, state = ?self.state, "tags merged");
        }
        report
    }
}
