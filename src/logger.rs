//! The event logger: tag merge, detection and persistence per batch.
//!
//! The host calls [`EventLogger::work`] once per batch. Every batch is consumed
//! in full, and nothing that goes wrong while logging is reported back to the
//! host; failures become diagnostics and session counters.

use crate::config::{ConfigError, WriteFailurePolicy};
use crate::core::detect::{Detector, EventRecord, VectorRecord, Watermarks};
use crate::core::format::{default_log_name, format_event_line, format_header, format_vector_line};
use crate::core::tags::{TagMerger, TagState};
use crate::eventlog::LogFile;
use crate::source::types::{SampleBatch, StreamTag};
use crate::stats::{create_shared_log, SharedSessionLog};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Construction parameters of an [`EventLogger`].
#[derive(Debug, Clone)]
pub struct LoggerSettings {
    /// Log file path; empty derives one from the start time
    pub log_name: String,
    /// Directory of derived log names; empty is the working directory
    pub log_dir: PathBuf,
    pub note: String,
    /// Channels per sample vector
    pub vlen: usize,
    pub bandwidth: f64,
    pub write_failure: WriteFailurePolicy,
}

impl LoggerSettings {
    pub fn new(log_name: impl Into<String>, note: impl Into<String>, vlen: usize, bandwidth: f64) -> Self {
        Self {
            log_name: log_name.into(),
            log_dir: PathBuf::new(),
            note: note.into(),
            vlen,
            bandwidth,
            write_failure: WriteFailurePolicy::default(),
        }
    }
}

impl From<&crate::config::Config> for LoggerSettings {
    fn from(config: &crate::config::Config) -> Self {
        Self {
            log_name: config.log_name.clone(),
            log_dir: config.log_dir.clone(),
            note: config.note.clone(),
            vlen: config.vlen,
            bandwidth: config.bandwidth,
            write_failure: config.write_failure,
        }
    }
}

/// Errors from (re)opening the log file.
#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("Could not open event log {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Writes detected events and vector timestamps to a text log.
pub struct EventLogger {
    note: String,
    vlen: usize,
    bandwidth: f64,
    start_utc: DateTime<Utc>,
    log_dir: PathBuf,
    log: Option<LogFile>,
    merger: TagMerger,
    detector: Detector,
    write_failure: WriteFailurePolicy,
    session: SharedSessionLog,
}

impl EventLogger {
    /// Create a logger and open its log file.
    ///
    /// The note and bandwidth are applied before the log name, since opening
    /// the file writes both into the header.
    pub fn new(settings: LoggerSettings) -> Result<Self, LoggerError> {
        Self::with_session(settings, create_shared_log())
    }

    /// Create a logger that records into an existing session log.
    pub fn with_session(
        settings: LoggerSettings,
        session: SharedSessionLog,
    ) -> Result<Self, LoggerError> {
        let mut logger = Self {
            note: String::new(),
            vlen: settings.vlen,
            bandwidth: settings.bandwidth,
            start_utc: Utc::now(),
            log_dir: settings.log_dir,
            log: None,
            merger: TagMerger::new(),
            detector: Detector::new(),
            write_failure: settings.write_failure,
            session,
        };

        logger.set_note(settings.note);
        // a rejected bandwidth keeps the constructor value; the warning is enough
        let _ = logger.set_bandwidth(settings.bandwidth);
        logger.set_logname(&settings.log_name)?;

        Ok(logger)
    }

    /// Update the note. Takes effect in the header of the next opened log.
    pub fn set_note(&mut self, note: impl Into<String>) {
        self.note = note.into();
    }

    pub fn note(&self) -> &str {
        &self.note
    }

    /// Save the vector length.
    pub fn set_vlen(&mut self, vlen: usize) {
        self.vlen = vlen;
    }

    pub fn vlen(&self) -> usize {
        self.vlen
    }

    /// Set the bandwidth. Zero is rejected and the previous value kept.
    pub fn set_bandwidth(&mut self, bandwidth: f64) -> Result<(), ConfigError> {
        if bandwidth == 0.0 {
            tracing::warn!("Invalid bandwidth: {bandwidth}");
            return Err(ConfigError::ZeroBandwidth);
        }
        self.bandwidth = bandwidth;
        tracing::info!("Setting bandwidth: {:10.6} MHz", self.bandwidth);
        Ok(())
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    /// Open (truncate) the log and write its header.
    ///
    /// An empty name derives `Event-YY-MM-DDTHHMMSS.log` from the time the
    /// logger was created, placed in the configured log directory. Returns the
    /// path that was opened.
    pub fn set_logname(&mut self, log_name: &str) -> Result<PathBuf, LoggerError> {
        let path = if log_name.is_empty() {
            self.log_dir.join(default_log_name(self.start_utc))
        } else {
            PathBuf::from(log_name)
        };

        let header = format_header(self.start_utc, &self.note, self.bandwidth, self.vlen);
        let log = LogFile::create(&path, &header).map_err(|source| LoggerError::Open {
            path: path.clone(),
            source,
        })?;

        tracing::info!(path = ?log.path(), "Event log opened");
        self.log = Some(log);
        Ok(path)
    }

    /// Path of the current log file.
    pub fn log_path(&self) -> Option<&Path> {
        self.log.as_ref().map(|log| log.path())
    }

    /// Number of events logged so far.
    pub fn event_count(&self) -> u64 {
        self.detector.event_count()
    }

    pub fn watermarks(&self) -> Watermarks {
        self.detector.watermarks()
    }

    /// Last known metadata.
    pub fn tag_state(&self) -> &TagState {
        self.merger.state()
    }

    pub fn session(&self) -> &SharedSessionLog {
        &self.session
    }

    /// Consume one batch and its tags. Returns the number of vectors consumed,
    /// which is always the whole batch.
    pub fn work(&mut self, batch: &SampleBatch, tags: &[StreamTag]) -> usize {
        let n_vectors = batch.len();

        let report = self.merger.merge(
            tags.iter()
                .filter(|t| t.in_window(n_vectors))
                .map(|t| &t.tag),
        );
        self.session.record_tags_merged(report.merged as u64);
        self.session
            .record_unknown_tags(report.reported_unknown.len() as u64);

        let detection = self.detector.detect(self.merger.state(), n_vectors);
        if let Some(event) = detection.event {
            self.log_event(&event);
        }
        if let Some(vector) = detection.vector {
            self.log_vector(&vector);
        }

        self.session.record_batch(n_vectors as u64);
        n_vectors
    }

    fn log_event(&mut self, event: &EventRecord) {
        tracing::info!(
            "Event : {:15.9} {:16} {:9.4} {:8.4} {:4}",
            event.mjd,
            event.vector,
            event.peak,
            event.rms,
            event.count
        );

        if self.append(&format_event_line(event)) {
            self.session.record_event_logged();
        } else if self.write_failure == WriteFailurePolicy::HoldWatermark {
            self.detector.rewind_event(event);
        }
    }

    fn log_vector(&mut self, vector: &VectorRecord) {
        if vector.print {
            tracing::info!(
                "Vector: {:15.9} {:16} {:4} {:5}",
                vector.mjd,
                vector.count,
                vector.samples,
                vector.offset
            );
        }

        if self.append(&format_vector_line(vector)) {
            self.session.record_vector_logged();
        } else if self.write_failure == WriteFailurePolicy::HoldWatermark {
            self.detector.rewind_vector(vector);
        }
    }

    /// Best-effort append. Returns whether the line reached the file.
    fn append(&self, line: &str) -> bool {
        let result = match self.log {
            Some(ref log) => log.append(line),
            None => Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no log file open",
            )),
        };

        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Can not log: {e}");
                self.session.record_write_failure();
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::types::{Tag, TagValue};

    fn logger_in(dir: &Path) -> EventLogger {
        let path = dir.join("Event.log");
        EventLogger::new(LoggerSettings::new(path.to_string_lossy(), "test", 1024, 1.42)).unwrap()
    }

    fn data_lines(logger: &EventLogger) -> Vec<String> {
        std::fs::read_to_string(logger.log_path().unwrap())
            .unwrap()
            .lines()
            .filter(|l| !l.starts_with('#'))
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_header_written_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let logger = logger_in(dir.path());
        let content = std::fs::read_to_string(logger.log_path().unwrap()).unwrap();
        let lines: Vec<&str> = content.lines().collect();

        assert_eq!(lines.len(), 6);
        assert!(lines[0].starts_with("# Event Log Opened on "));
        assert_eq!(lines[1], "# test");
        assert_eq!(lines[2], "# bandwidth =        1.420000 MHz");
        assert_eq!(lines[3], "# vlen      =   1024");
    }

    #[test]
    fn test_work_consumes_whole_batch() {
        let dir = tempfile::tempdir().unwrap();
        let mut logger = logger_in(dir.path());

        assert_eq!(logger.work(&SampleBatch::zeroed(5, 1024), &[]), 5);
        assert_eq!(logger.work(&SampleBatch::zeroed(0, 1024), &[]), 0);
        assert_eq!(logger.session().stats().vectors, 5);
    }

    #[test]
    fn test_event_and_vector_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut logger = logger_in(dir.path());
        let tags = [
            StreamTag::new(0, Tag::Mjd(58500.5)),
            StreamTag::new(0, Tag::Peak(2.5)),
            StreamTag::new(1, Tag::VMjd(58500.25)),
        ];

        logger.work(&SampleBatch::zeroed(2, 1024), &tags);

        let lines = data_lines(&logger);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("58500.500000000000"));
        assert!(lines[1].starts_with("58500.250000000000"));
        assert_eq!(logger.event_count(), 1);
    }

    #[test]
    fn test_tags_outside_window_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut logger = logger_in(dir.path());

        logger.work(
            &SampleBatch::zeroed(2, 1024),
            &[StreamTag::new(2, Tag::Mjd(58500.5))],
        );

        assert_eq!(logger.tag_state().event_mjd, 0.0);
        assert!(data_lines(&logger).is_empty());
    }

    #[test]
    fn test_zero_bandwidth_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut logger = logger_in(dir.path());
        let path = logger.log_path().unwrap().to_path_buf();
        let before = std::fs::read_to_string(&path).unwrap();

        assert!(matches!(
            logger.set_bandwidth(0.0),
            Err(ConfigError::ZeroBandwidth)
        ));
        assert_eq!(logger.bandwidth(), 1.42);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn test_default_log_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = LoggerSettings::new("", "test", 1024, 1.42);
        settings.log_dir = dir.path().to_path_buf();
        let logger = EventLogger::new(settings).unwrap();

        let path = logger.log_path().unwrap().to_path_buf();
        assert_eq!(path.parent(), Some(dir.path()));
        let header = std::fs::read_to_string(&path).unwrap();

        let name = path.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("Event-"));
        assert!(name.ends_with(".log"));
        assert_eq!(name.len(), "Event-19-01-19T012345.log".len());
        assert_eq!(name.as_bytes()[14], b'T');
        assert!(header.starts_with("# Event Log Opened on "));
    }

    #[test]
    fn test_write_failure_advances_watermark() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("gone");
        let mut logger = EventLogger::new(LoggerSettings::new(
            sub.join("Event.log").to_string_lossy(),
            "test",
            16,
            1.0,
        ))
        .unwrap();
        std::fs::remove_dir_all(&sub).unwrap();

        let consumed = logger.work(
            &SampleBatch::zeroed(1, 16),
            &[StreamTag::new(0, Tag::Mjd(58500.5))],
        );

        assert_eq!(consumed, 1);
        assert_eq!(logger.watermarks().event_mjd, 58500.5);
        assert_eq!(logger.event_count(), 1);
        assert_eq!(logger.session().stats().write_failures, 1);
    }

    #[test]
    fn test_write_failure_hold_watermark() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("gone");
        let mut settings =
            LoggerSettings::new(sub.join("Event.log").to_string_lossy(), "test", 16, 1.0);
        settings.write_failure = WriteFailurePolicy::HoldWatermark;
        let mut logger = EventLogger::new(settings).unwrap();
        std::fs::remove_dir_all(&sub).unwrap();

        logger.work(
            &SampleBatch::zeroed(1, 16),
            &[StreamTag::new(0, Tag::Mjd(58500.5))],
        );
        assert_eq!(logger.watermarks().event_mjd, 0.0);
        assert_eq!(logger.event_count(), 0);

        // once the directory is back the pending event goes out
        std::fs::create_dir_all(&sub).unwrap();
        logger.work(&SampleBatch::zeroed(1, 16), &[]);
        assert_eq!(logger.event_count(), 1);
        let content = std::fs::read_to_string(sub.join("Event.log")).unwrap();
        assert!(content.starts_with("58500.500000000000"));
    }

    #[test]
    fn test_unknown_tags_counted() {
        let dir = tempfile::tempdir().unwrap();
        let mut logger = logger_in(dir.path());
        let unknown = |key: &str| {
            StreamTag::new(
                0,
                Tag::Unrecognized {
                    key: key.to_string(),
                    value: TagValue::Float(1.0),
                },
            )
        };

        logger.work(
            &SampleBatch::zeroed(1, 1024),
            &[unknown("A"), unknown("A"), unknown("B")],
        );
        assert_eq!(logger.session().stats().unknown_tags, 2);
    }
}
