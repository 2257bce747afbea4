//! # ratewatch
//!
//! Enriches polled cluster statistics with per-interval rates and
//! latencies, and emits them as JSON lines.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  ┌─────────┐    ┌───────────┐    ┌──────────┐    ┌────────┐  │
//! │  │ source  │───▶│ collector │───▶│  output  │───▶│ stdout │  │
//! │  │ (input) │    │ (engine)  │    │ (emitter)│    │        │  │
//! │  └─────────┘    └───────────┘    └──────────┘    └────────┘  │
//! │       ▲                                                      │
//! │       └── FileSource | StreamSource                          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`source`]**: the [`PollSource`] trait with a file watcher and a
//!   newline-delimited stream reader
//! - **[`collector`]**: runs each poll through the delta engine, one
//!   history per monitored target
//! - **[`output`]**: flattens enriched entities into JSON lines
//! - **[`settings`]**: rule and target configuration
//!
//! ## Usage
//!
//! ```bash
//! # Watch a file the fetch process rewrites every cycle
//! ratewatch --file poll.json --target prod
//!
//! # Replay recorded polls
//! ratewatch --replay polls.jsonl --output enriched.jsonl
//!
//! # Read polls from a pipe
//! fetcher | ratewatch --stdin
//! ```

pub mod collector;
pub mod duration;
pub mod output;
pub mod settings;
pub mod source;

pub use collector::{Collector, EnrichedPoll};
pub use output::Emitter;
pub use settings::Settings;
pub use source::{FileSource, PollSource, StreamSource};
