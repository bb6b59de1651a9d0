//! Sample batches and metadata tags delivered by the host pipeline.
//!
//! Tags arrive as string keys with dynamically typed values. They are resolved
//! into the closed [`Tag`] enum once, here at the boundary, so the core merge
//! never compares strings.

use num_complex::Complex32;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A batch of fixed-length complex sample vectors.
///
/// The sample values are carried but never inspected by the logger.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBatch {
    /// Channels per vector
    pub vlen: usize,
    /// Flat sample buffer, `len() * vlen` values
    pub samples: Vec<Complex32>,
}

impl SampleBatch {
    /// Create a batch from a flat buffer. Trailing samples that do not fill a
    /// whole vector are not counted.
    pub fn new(vlen: usize, samples: Vec<Complex32>) -> Self {
        Self { vlen, samples }
    }

    /// Create a batch of `vectors` zero-valued vectors.
    pub fn zeroed(vectors: usize, vlen: usize) -> Self {
        Self {
            vlen,
            samples: vec![Complex32::new(0.0, 0.0); vectors * vlen],
        }
    }

    /// Number of whole vectors in the batch.
    pub fn len(&self) -> usize {
        if self.vlen == 0 {
            return 0;
        }
        self.samples.len() / self.vlen
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A typed tag value as delivered by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl TagValue {
    fn as_f64(&self) -> Option<f64> {
        match self {
            TagValue::Int(v) => Some(*v as f64),
            TagValue::Float(v) => Some(*v),
            TagValue::Bool(_) | TagValue::Text(_) => None,
        }
    }

    fn as_i64(&self) -> Option<i64> {
        match self {
            TagValue::Int(v) => Some(*v),
            // truncates toward zero, saturating at the i64 bounds
            TagValue::Float(v) if v.is_finite() => Some(*v as i64),
            _ => None,
        }
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagValue::Bool(v) => write!(f, "{v}"),
            TagValue::Int(v) => write!(f, "{v}"),
            TagValue::Float(v) => write!(f, "{v}"),
            TagValue::Text(v) => write!(f, "{v:?}"),
        }
    }
}

/// A metadata tag resolved to the field it updates.
#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    /// Event timestamp (MJD)
    Mjd(f64),
    /// Timestamp of the vector currently streamed (VMJD)
    VMjd(f64),
    /// Peak amplitude of the event
    Peak(f64),
    /// Noise RMS at event time
    Rms(f64),
    /// Running sample-vector index (VCOUNT)
    VCount(i64),
    /// Index of the vector holding the event
    EVector(i64),
    /// Auxiliary zero-crossing counter (ENV)
    Env(i64),
    /// Sample offset of the event within its vector
    EOffset(i64),
    /// Sample offset tied to the vector timestamp
    VOffset(i64),
    /// Samples represented by this vector (NV)
    Nv(i64),
    /// Any key the logger does not know, or a known key with a non-numeric value
    Unrecognized { key: String, value: TagValue },
}

impl Tag {
    /// Resolve a host `(key, value)` pair.
    pub fn resolve(key: &str, value: TagValue) -> Self {
        let resolved = match key {
            "MJD" => value.as_f64().map(Tag::Mjd),
            "VMJD" => value.as_f64().map(Tag::VMjd),
            "PEAK" => value.as_f64().map(Tag::Peak),
            "RMS" => value.as_f64().map(Tag::Rms),
            "VCOUNT" => value.as_i64().map(Tag::VCount),
            "EVECTOR" => value.as_i64().map(Tag::EVector),
            "ENV" => value.as_i64().map(Tag::Env),
            "EOFFSET" => value.as_i64().map(Tag::EOffset),
            "VOFFSET" => value.as_i64().map(Tag::VOffset),
            "NV" => value.as_i64().map(Tag::Nv),
            _ => None,
        };

        resolved.unwrap_or_else(|| Tag::Unrecognized {
            key: key.to_string(),
            value,
        })
    }

    /// The host key this tag was resolved from.
    pub fn key(&self) -> &str {
        match self {
            Tag::Mjd(_) => "MJD",
            Tag::VMjd(_) => "VMJD",
            Tag::Peak(_) => "PEAK",
            Tag::Rms(_) => "RMS",
            Tag::VCount(_) => "VCOUNT",
            Tag::EVector(_) => "EVECTOR",
            Tag::Env(_) => "ENV",
            Tag::EOffset(_) => "EOFFSET",
            Tag::VOffset(_) => "VOFFSET",
            Tag::Nv(_) => "NV",
            Tag::Unrecognized { key, .. } => key,
        }
    }
}

/// A tag positioned at a vector offset relative to the start of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamTag {
    pub offset: u64,
    pub tag: Tag,
}

impl StreamTag {
    pub fn new(offset: u64, tag: Tag) -> Self {
        Self { offset, tag }
    }

    /// Whether this tag falls inside a batch of `n_vectors` vectors.
    pub fn in_window(&self, n_vectors: usize) -> bool {
        self.offset < n_vectors as u64
    }
}

/// A batch together with the tags scoped to it.
#[derive(Debug, Clone)]
pub struct TaggedBatch {
    pub batch: SampleBatch,
    pub tags: Vec<StreamTag>,
}
