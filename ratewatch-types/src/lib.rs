//! # ratewatch-types
//!
//! Core types shared by the ratewatch engine and its collaborators: the
//! per-entity counter snapshot, the poll that groups snapshots for one
//! cycle, and the millisecond clock values that stamp each poll.
//!
//! ## Features
//!
//! - `serde`: JSON/etc. serialization via serde
//!
//! ## Example
//!
//! ```rust
//! use ratewatch_types::Poll;
//!
//! let poll = Poll::builder()
//!     .timestamp_ms(11_000)
//!     .entity("node1", |e| e.counter("indexing_index_total", 30))
//!     .entity("node2", |e| e.counter("indexing_index_total", 7).absent("merges_total"))
//!     .build();
//!
//! assert_eq!(poll.len(), 2);
//! assert_eq!(poll.get("node1").and_then(|s| s.counter("indexing_index_total")), Some(30));
//! assert_eq!(poll.get("node2").and_then(|s| s.counter("merges_total")), None);
//! ```

mod millis;
mod poll;
mod snapshot;
mod version;

pub use millis::*;
pub use poll::*;
pub use snapshot::*;
pub use version::*;

/// Current schema version.
///
/// Increment this when making breaking changes to the poll format.
pub const SCHEMA_VERSION: u32 = 1;
