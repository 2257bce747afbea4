//! File-based poll source.
//!
//! Re-reads a JSON file holding one poll whenever it is rewritten.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use ratewatch_types::Poll;

use super::PollSource;

/// A poll source backed by a JSON file.
///
/// The fetch process overwrites the file on every cycle. The source
/// tracks the file's modification time and only returns a poll when the
/// file has been updated, so one write is enriched exactly once.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    description: String,
    last_error: Option<String>,
    last_modified: Option<SystemTime>,
}

impl FileSource {
    /// Create a new file source for the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("file: {}", path.display());
        Self {
            path,
            description,
            last_error: None,
            last_modified: None,
        }
    }

    /// Returns the path being watched.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn modified_time(&self) -> Option<SystemTime> {
        fs::metadata(&self.path).ok()?.modified().ok()
    }

    fn read_file(&mut self) -> Option<Poll> {
        match fs::read_to_string(&self.path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(poll) => {
                    self.last_error = None;
                    Some(poll)
                }
                Err(e) => {
                    self.last_error = Some(format!("Parse error: {}", e));
                    None
                }
            },
            Err(e) => {
                self.last_error = Some(format!("Read error: {}", e));
                None
            }
        }
    }
}

impl PollSource for FileSource {
    fn poll(&mut self) -> Option<Poll> {
        let current_modified = self.modified_time();

        let file_changed = match (&self.last_modified, &current_modified) {
            (None, _) => true,        // First poll, always read
            (Some(_), None) => false, // File disappeared, keep waiting
            (Some(last), Some(current)) => current > last,
        };

        if !file_changed {
            return None;
        }

        let poll = self.read_file()?;
        self.last_modified = current_modified;
        Some(poll)
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<String> {
        self.last_error.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn sample_json() -> &'static str {
        r#"{
            "timestamp_ms": 1000,
            "entities": {
                "node1": { "counters": { "indexing_index_total": 10, "merges_total": null } }
            }
        }"#
    }

    #[test]
    fn test_file_source_new() {
        let source = FileSource::new("/tmp/poll.json");
        assert_eq!(source.path(), Path::new("/tmp/poll.json"));
        assert_eq!(source.description(), "file: /tmp/poll.json");
        assert!(source.error().is_none());
        assert!(!source.is_exhausted());
    }

    #[test]
    fn test_file_source_reads_once_per_write() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", sample_json()).unwrap();

        let mut source = FileSource::new(file.path());

        let poll = source.poll().unwrap();
        assert_eq!(poll.timestamp_ms, Some(1000));
        let node1 = poll.get("node1").unwrap();
        assert_eq!(node1.counter("indexing_index_total"), Some(10));
        assert_eq!(node1.counter("merges_total"), None);

        // Unchanged file yields nothing
        assert!(source.poll().is_none());
    }

    #[test]
    fn test_file_source_missing_file() {
        let mut source = FileSource::new("/nonexistent/path/poll.json");

        assert!(source.poll().is_none());
        assert!(source.error().unwrap().contains("Read error"));
    }

    #[test]
    fn test_file_source_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid json").unwrap();

        let mut source = FileSource::new(file.path());

        assert!(source.poll().is_none());
        assert!(source.error().unwrap().contains("Parse error"));
    }

    #[test]
    fn test_file_source_recovers_after_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid json").unwrap();

        let mut source = FileSource::new(file.path());
        assert!(source.poll().is_none());

        // A failed read does not record the mtime, so the next poll retries
        std::fs::write(file.path(), sample_json()).unwrap();
        assert!(source.poll().is_some());
        assert!(source.error().is_none());
    }
}
