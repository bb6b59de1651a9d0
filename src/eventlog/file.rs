//! The append-only log file.
//!
//! No handle is held between writes. Every line is an open-append-close cycle,
//! so the file can be tailed while it grows and a crash loses at most the line
//! being written.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// A log file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFile {
    path: PathBuf,
}

impl LogFile {
    /// Truncate (or create) the file and write `header` to it.
    pub fn create(path: impl Into<PathBuf>, header: &str) -> io::Result<Self> {
        let path = path.into();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = File::create(&path)?;
        file.write_all(header.as_bytes())?;
        file.flush()?;

        Ok(Self { path })
    }

    /// Append one line. The handle is released before returning.
    pub fn append(&self, line: &str) -> io::Result<()> {
        let mut file = OpenOptions::new().append(true).create(true).open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.flush()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Event.log");
        fs::write(&path, "stale contents\n").unwrap();

        let log = LogFile::create(&path, "# header\n").unwrap();
        assert_eq!(fs::read_to_string(log.path()).unwrap(), "# header\n");
    }

    #[test]
    fn test_append_lines() {
        let dir = tempfile::tempdir().unwrap();
        let log = LogFile::create(dir.path().join("Event.log"), "# h\n").unwrap();

        log.append("one\n").unwrap();
        log.append("two\n").unwrap();

        assert_eq!(fs::read_to_string(log.path()).unwrap(), "# h\none\ntwo\n");
    }

    #[test]
    fn test_create_makes_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("logs").join("Event.log");
        let log = LogFile::create(&path, "").unwrap();
        assert!(log.path().exists());
    }

    #[test]
    fn test_append_to_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let log = LogFile::create(dir.path().join("sub").join("Event.log"), "").unwrap();
        fs::remove_dir_all(dir.path().join("sub")).unwrap();

        assert!(log.append("lost\n").is_err());
    }
}
