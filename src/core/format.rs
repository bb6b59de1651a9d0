//! Fixed-width text layout of the event log.
//!
//! Column widths match the printf layouts the log has always used, so existing
//! readers of these files keep working:
//!
//! ```text
//! event:  %18.12f %15d %05d %10.3f %3d %5d %10.6f %10.6f %5d %5d
//! vector: %18.12f %15d %05d %10.3f %5d %5d
//! ```

use crate::core::detect::{EventRecord, VectorRecord};
use chrono::{DateTime, Utc};

/// Seconds in one day.
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Column legend for event rows.
pub const EVENT_LEGEND: &str =
    "#E       MJD           vector #   second  micro.sec  NV  Zero#   Peak       RMS    Event# Offset";

/// Column legend for vector rows.
pub const VECTOR_LEGEND: &str = "#V       MJD           vector #   second  micro.sec  NV  Zero#";

/// An MJD split into whole day, whole second of day and microseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MjdParts {
    pub day: i64,
    pub whole_seconds: i64,
    pub microseconds: f64,
}

impl MjdParts {
    /// Split with floor semantics on both the day and the second.
    pub fn split(mjd: f64) -> Self {
        let day = mjd.floor();
        let seconds = (mjd - day) * SECONDS_PER_DAY;
        let whole_seconds = seconds.floor();
        let microseconds = (seconds - whole_seconds) * 1.0e6;

        Self {
            day: day as i64,
            whole_seconds: whole_seconds as i64,
            microseconds,
        }
    }

    /// Rebuild the fractional-day timestamp.
    pub fn to_mjd(&self) -> f64 {
        let seconds = self.whole_seconds as f64 + self.microseconds * 1.0e-6;
        self.day as f64 + seconds / SECONDS_PER_DAY
    }
}

/// Format one event row, newline terminated.
pub fn format_event_line(event: &EventRecord) -> String {
    let parts = MjdParts::split(event.mjd);
    format!(
        "{:18.12} {:15} {:05} {:10.3} {:3} {:5} {:10.6} {:10.6} {:5} {:5}\n",
        event.mjd,
        event.vector,
        parts.whole_seconds,
        parts.microseconds,
        event.env,
        event.vector_offset,
        event.peak,
        event.rms,
        event.count,
        event.offset,
    )
}

/// Format one vector row, newline terminated.
pub fn format_vector_line(vector: &VectorRecord) -> String {
    let parts = MjdParts::split(vector.mjd);
    format!(
        "{:18.12} {:15} {:05} {:10.3} {:5} {:5}\n",
        vector.mjd,
        vector.count,
        parts.whole_seconds,
        parts.microseconds,
        vector.samples,
        vector.offset,
    )
}

/// ISO-8601 timestamp used in the header, microsecond precision, no zone.
pub fn header_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// Build the six header lines written when a log is opened.
pub fn format_header(opened: DateTime<Utc>, note: &str, bandwidth: f64, vlen: usize) -> String {
    format!(
        "# Event Log Opened on {}\n\
         # {}\n\
         # bandwidth = {:15.6} MHz\n\
         # vlen      = {:6}\n\
         {}\n\
         {}\n",
        header_timestamp(opened),
        note,
        bandwidth,
        vlen,
        EVENT_LEGEND,
        VECTOR_LEGEND,
    )
}

/// Log name derived from a UTC time, e.g. `Event-19-01-19T012345.log`.
pub fn default_log_name(at: DateTime<Utc>) -> String {
    format!("Event-{}.log", at.format("%y-%m-%dT%H%M%S"))
}
