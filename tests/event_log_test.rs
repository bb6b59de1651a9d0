//! Integration tests for the event logger

use ra_event_log::{
    core::MjdParts, source::parse_line, EventLogger, LoggerSettings, SampleBatch, StreamTag, Tag,
    TagValue,
};
use std::path::{Path, PathBuf};

fn open_logger(dir: &Path) -> (EventLogger, PathBuf) {
    let path = dir.join("Event.log");
    let logger =
        EventLogger::new(LoggerSettings::new(path.to_string_lossy(), "test", 1024, 1.42))
            .expect("Failed to open event log");
    (logger, path)
}

fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .expect("Failed to read log")
        .lines()
        .map(str::to_string)
        .collect()
}

fn event_rows(path: &Path) -> Vec<String> {
    read_lines(path)
        .into_iter()
        .filter(|l| !l.starts_with('#') && l.split_whitespace().count() == 10)
        .collect()
}

fn vector_rows(path: &Path) -> Vec<String> {
    read_lines(path)
        .into_iter()
        .filter(|l| !l.starts_with('#') && l.split_whitespace().count() == 6)
        .collect()
}

fn batch() -> SampleBatch {
    SampleBatch::zeroed(1, 1024)
}

#[test]
fn test_header_layout() {
    let dir = tempfile::tempdir().unwrap();
    let (_logger, path) = open_logger(dir.path());
    let lines = read_lines(&path);

    assert_eq!(lines.len(), 6);
    assert!(lines[0].starts_with("# Event Log Opened on "));
    assert_eq!(lines[1], "# test");
    assert_eq!(lines[2], "# bandwidth =        1.420000 MHz");
    assert_eq!(lines[3], "# vlen      =   1024");
    assert!(lines[4].starts_with("#E       MJD"));
    assert!(lines[5].starts_with("#V       MJD"));
}

#[test]
fn test_event_monotonicity() {
    let dir = tempfile::tempdir().unwrap();
    let (mut logger, path) = open_logger(dir.path());

    // binary-exact MJDs so the printed column is exact too
    for mjd in [58500.125, 58500.125, 58500.0625, 58500.25, 58500.1875, 58500.375] {
        logger.work(&batch(), &[StreamTag::new(0, Tag::Mjd(mjd))]);
    }

    let rows = event_rows(&path);
    let logged: Vec<&str> = rows
        .iter()
        .map(|r| r.split_whitespace().next().unwrap())
        .collect();
    assert_eq!(
        logged,
        vec!["58500.125000000000", "58500.250000000000", "58500.375000000000"]
    );
    assert_eq!(logger.event_count(), 3);

    // an MJD without an exact binary form still parses back from its row
    logger.work(&batch(), &[StreamTag::new(0, Tag::Mjd(58500.4))]);
    let last = event_rows(&path).pop().unwrap();
    let first: f64 = last.split_whitespace().next().unwrap().parse().unwrap();
    assert!((first - 58500.4).abs() < 1e-9);

    let rows = event_rows(&path);
    assert_eq!(rows.len(), 4);

    // event numbers run 1..=4 in the ninth column
    let numbers: Vec<&str> = rows
        .iter()
        .map(|r| r.split_whitespace().nth(8).unwrap())
        .collect();
    assert_eq!(numbers, vec!["1", "2", "3", "4"]);
}

#[test]
fn test_vector_only_batch() {
    let dir = tempfile::tempdir().unwrap();
    let (mut logger, path) = open_logger(dir.path());

    logger.work(
        &batch(),
        &[
            StreamTag::new(0, Tag::VMjd(58500.5)),
            StreamTag::new(0, Tag::VCount(2048)),
            StreamTag::new(0, Tag::Nv(4096)),
            StreamTag::new(0, Tag::VOffset(3)),
        ],
    );

    assert!(event_rows(&path).is_empty());
    assert_eq!(
        vector_rows(&path),
        vec!["58500.500000000000            2048 43200      0.000  4096     3"]
    );
}

#[test]
fn test_event_only_batch() {
    let dir = tempfile::tempdir().unwrap();
    let (mut logger, path) = open_logger(dir.path());

    logger.work(
        &batch(),
        &[
            StreamTag::new(0, Tag::Mjd(58500.5)),
            StreamTag::new(0, Tag::EVector(1234)),
            StreamTag::new(0, Tag::Peak(2.5)),
            StreamTag::new(0, Tag::Rms(0.125)),
            StreamTag::new(0, Tag::Env(3)),
            StreamTag::new(0, Tag::VOffset(42)),
            StreamTag::new(0, Tag::EOffset(17)),
        ],
    );

    assert!(vector_rows(&path).is_empty());
    assert_eq!(
        event_rows(&path),
        vec!["58500.500000000000            1234 43200      0.000   3    42   2.500000   0.125000     1    17"]
    );
}

#[test]
fn test_metadata_carries_across_batches() {
    let dir = tempfile::tempdir().unwrap();
    let (mut logger, path) = open_logger(dir.path());

    // peak arrives one batch ahead of its event time
    logger.work(&batch(), &[StreamTag::new(0, Tag::Peak(7.25))]);
    logger.work(&batch(), &[StreamTag::new(0, Tag::Mjd(58500.75))]);

    let rows = event_rows(&path);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].split_whitespace().nth(6), Some("7.250000"));
}

#[test]
fn test_unknown_tags_never_abort() {
    let dir = tempfile::tempdir().unwrap();
    let (mut logger, path) = open_logger(dir.path());

    let consumed = logger.work(
        &SampleBatch::zeroed(3, 1024),
        &[
            StreamTag::new(0, Tag::resolve("GAIN", TagValue::Float(1.0))),
            StreamTag::new(1, Tag::resolve("GAIN", TagValue::Float(2.0))),
            StreamTag::new(2, Tag::Mjd(58500.5)),
        ],
    );

    assert_eq!(consumed, 3);
    assert_eq!(event_rows(&path).len(), 1);
    assert_eq!(logger.session().stats().unknown_tags, 1);
}

#[test]
fn test_throttled_print_does_not_throttle_rows() {
    let dir = tempfile::tempdir().unwrap();
    let (mut logger, path) = open_logger(dir.path());

    for k in 0..8 {
        let vmjd = 58500.0 + k as f64 / 2880.0;
        logger.work(&batch(), &[StreamTag::new(0, Tag::VMjd(vmjd))]);
    }

    assert_eq!(vector_rows(&path).len(), 8);
    assert_eq!(logger.session().stats().vectors_logged, 8);
}

#[test]
fn test_zero_bandwidth_keeps_file() {
    let dir = tempfile::tempdir().unwrap();
    let (mut logger, path) = open_logger(dir.path());
    let before = std::fs::read_to_string(&path).unwrap();

    assert!(logger.set_bandwidth(0.0).is_err());
    assert_eq!(logger.bandwidth(), 1.42);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn test_reopen_truncates_with_new_note() {
    let dir = tempfile::tempdir().unwrap();
    let (mut logger, path) = open_logger(dir.path());
    logger.work(&batch(), &[StreamTag::new(0, Tag::Mjd(58500.5))]);

    logger.set_note("second run");
    logger.set_logname(&path.to_string_lossy()).unwrap();

    let lines = read_lines(&path);
    assert_eq!(lines.len(), 6);
    assert_eq!(lines[1], "# second run");
}

#[test]
fn test_replayed_line_through_logger() {
    let dir = tempfile::tempdir().unwrap();
    let (mut logger, path) = open_logger(dir.path());

    let tagged = parse_line(
        r#"{"vectors": 2, "tags": [{"offset": 1, "key": "MJD", "value": 58500.5}, {"offset": 1, "key": "PEAK", "value": 3}]}"#,
        1024,
    )
    .unwrap();
    assert_eq!(logger.work(&tagged.batch, &tagged.tags), 2);
    assert_eq!(event_rows(&path).len(), 1);
}

#[test]
fn test_logged_time_reconstructs_mjd() {
    let dir = tempfile::tempdir().unwrap();
    let (mut logger, path) = open_logger(dir.path());
    let mjd = 58500.123456789;

    logger.work(&batch(), &[StreamTag::new(0, Tag::Mjd(mjd))]);

    let rows = event_rows(&path);
    let fields: Vec<&str> = rows[0].split_whitespace().collect();
    let parts = MjdParts {
        day: 58500,
        whole_seconds: fields[2].parse().unwrap(),
        microseconds: fields[3].parse().unwrap(),
    };
    assert!((parts.to_mjd() - mjd).abs() < 1e-6);
}
