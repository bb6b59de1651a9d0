//! Persistence of the event log.

pub mod file;

pub use file::LogFile;
