//! Demonstration of the event logger.
//!
//! This example shows how to:
//! 1. Open an event log
//! 2. Feed tagged batches as a detection pipeline would
//! 3. Read back the session statistics
//!
//! Run with: cargo run --example replay_demo

use ra_event_log::{EventLogger, LoggerSettings, SampleBatch, StreamTag, Tag, COLUMN_LEGEND};

fn main() {
    println!("RA Event Log - Replay Demo");
    println!("==========================");
    println!("{COLUMN_LEGEND}");

    let path = std::env::temp_dir().join("ra-event-log-demo.log");
    let settings = LoggerSettings::new(path.to_string_lossy(), "Replay demo", 256, 2.4);
    let mut logger = match EventLogger::new(settings) {
        Ok(logger) => logger,
        Err(e) => {
            eprintln!("Error: {e}");
            return;
        }
    };

    // Ten minutes of data, one batch every 30 seconds, an event every third batch
    let start_mjd = 58500.25;
    for i in 0..20i64 {
        let vmjd = start_mjd + i as f64 * 30.0 / 86_400.0;
        let mut tags = vec![
            StreamTag::new(0, Tag::VMjd(vmjd)),
            StreamTag::new(0, Tag::VCount(i * 16)),
            StreamTag::new(0, Tag::Nv(256)),
        ];
        if i % 3 == 0 {
            tags.push(StreamTag::new(8, Tag::Mjd(vmjd + 1.0e-6)));
            tags.push(StreamTag::new(8, Tag::EVector(i * 16 + 8)));
            tags.push(StreamTag::new(8, Tag::Peak(4.0 + i as f64 * 0.1)));
            tags.push(StreamTag::new(8, Tag::Rms(0.5)));
        }

        logger.work(&SampleBatch::zeroed(16, 256), &tags);
    }

    println!("Events logged: {}", logger.event_count());
    println!("{}", logger.session().summary());

    if let Ok(content) = std::fs::read_to_string(&path) {
        println!();
        println!("{content}");
    }
}
