//! Poll sources.
//!
//! A source hands the collector one [`Poll`] at a time, from whatever
//! fetch process produced it: a JSON file rewritten in place, or a
//! newline-delimited stream (stdin, a replay file, a TCP connection).

mod file;
mod stream;

pub use file::FileSource;
pub use stream::StreamSource;

use std::fmt::Debug;

use ratewatch_types::Poll;

/// Trait for receiving polls from various sources.
///
/// # Example
///
/// ```
/// use ratewatch::{FileSource, PollSource};
///
/// let mut source = FileSource::new("poll.json");
/// if let Some(poll) = source.poll() {
///     println!("Got {} entities", poll.len());
/// }
/// ```
pub trait PollSource: Send + Debug {
    /// Take the next poll, if one is ready.
    ///
    /// Never blocks.
    fn poll(&mut self) -> Option<Poll>;

    /// Human-readable description of the source, used in logs.
    fn description(&self) -> &str;

    /// The error from the last read, if it failed.
    fn error(&self) -> Option<String>;

    /// True once the source can never produce another poll.
    fn is_exhausted(&self) -> bool {
        false
    }
}
