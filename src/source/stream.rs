//! Stream-based poll source.
//!
//! Receives polls from an async byte stream: stdin, a replay file
//! recorded earlier, or a TCP connection to the fetch process.

use std::sync::Arc;

use parking_lot::Mutex;
use ratewatch_types::Poll;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tracing::debug;

use super::PollSource;

/// A poll source fed by a background task reading newline-delimited JSON.
///
/// Malformed lines are recorded as the source's error and skipped; the
/// stream keeps going. Once the reader hits EOF and every queued poll has
/// been taken, the source reports itself exhausted.
///
/// # Example
///
/// ```
/// use std::io::Cursor;
/// use ratewatch::StreamSource;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let data = b"{\"timestamp_ms\": 1000, \"entities\": {}}\n";
/// let source = StreamSource::spawn(Cursor::new(data.to_vec()), "example");
/// # });
/// ```
#[derive(Debug)]
pub struct StreamSource {
    receiver: mpsc::Receiver<Poll>,
    description: String,
    last_error: Arc<Mutex<Option<String>>>,
    exhausted: bool,
}

impl StreamSource {
    /// Spawn a background task that reads from the given async reader.
    ///
    /// Each line is parsed as a complete [`Poll`]. Must be called from
    /// within a tokio runtime.
    pub fn spawn<R>(reader: R, description: &str) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(16);
        let last_error = Arc::new(Mutex::new(None));
        let error_handle = last_error.clone();
        let desc = description.to_string();

        tokio::spawn(async move {
            let mut reader = BufReader::new(reader);
            let mut line = String::new();
            let mut line_no = 0usize;

            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => {
                        debug!(source = %desc, lines = line_no, "stream ended");
                        break;
                    }
                    Ok(_) => {
                        line_no += 1;
                        let trimmed = line.trim();
                        if trimmed.is_empty() {
                            continue;
                        }
                        match serde_json::from_str::<Poll>(trimmed) {
                            Ok(poll) => {
                                *error_handle.lock() = None;
                                if tx.send(poll).await.is_err() {
                                    // Receiver dropped
                                    break;
                                }
                            }
                            Err(e) => {
                                *error_handle.lock() =
                                    Some(format!("Parse error on line {}: {}", line_no, e));
                            }
                        }
                    }
                    Err(e) => {
                        *error_handle.lock() = Some(format!("Read error: {}", e));
                        break;
                    }
                }
            }
        });

        Self {
            receiver: rx,
            description: format!("stream: {}", description),
            last_error,
            exhausted: false,
        }
    }
}

impl PollSource for StreamSource {
    fn poll(&mut self) -> Option<Poll> {
        match self.receiver.try_recv() {
            Ok(poll) => Some(poll),
            Err(mpsc::error::TryRecvError::Empty) => None,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                self.exhausted = true;
                None
            }
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }

    fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_json(ts: u64, total: u64) -> String {
        format!(
            r#"{{"timestamp_ms":{},"entities":{{"node1":{{"counters":{{"indexing_index_total":{}}}}}}}}}"#,
            ts, total
        )
    }

    #[tokio::test]
    async fn test_stream_source_spawn() {
        let data = format!("{}\n", sample_json(1_000, 10));
        let mut source = StreamSource::spawn(Cursor::new(data), "test");

        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

        let poll = source.poll().unwrap();
        assert_eq!(poll.timestamp_ms, Some(1_000));
        assert_eq!(
            poll.get("node1").and_then(|s| s.counter("indexing_index_total")),
            Some(10)
        );
    }

    #[tokio::test]
    async fn test_stream_source_keeps_order_and_exhausts() {
        let data = format!("{}\n\n{}\n", sample_json(1_000, 10), sample_json(11_000, 30));
        let mut source = StreamSource::spawn(Cursor::new(data), "test");

        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

        assert_eq!(source.poll().unwrap().timestamp_ms, Some(1_000));
        assert_eq!(source.poll().unwrap().timestamp_ms, Some(11_000));
        assert!(!source.is_exhausted());

        assert!(source.poll().is_none());
        assert!(source.is_exhausted());
    }

    #[tokio::test]
    async fn test_stream_source_description() {
        let source = StreamSource::spawn(Cursor::new(""), "tcp://localhost:9090");
        assert_eq!(source.description(), "stream: tcp://localhost:9090");
    }

    #[tokio::test]
    async fn test_stream_source_skips_invalid_lines() {
        let data = format!("not valid json\n{}\n", sample_json(1_000, 10));
        let mut source = StreamSource::spawn(Cursor::new(data), "test");

        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

        assert!(source.poll().is_some());
        assert!(source.poll().is_none());
    }

    #[tokio::test]
    async fn test_stream_source_records_parse_error() {
        let mut source = StreamSource::spawn(Cursor::new("not valid json\n"), "test");

        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

        assert!(source.poll().is_none());
        assert!(source.error().unwrap().contains("line 1"));
    }
}
