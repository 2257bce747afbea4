//! JSON-lines emission of enriched polls.

use std::io::Write;

use anyhow::Result;
use ratewatch_types::{CounterSnapshot, EntityId};
use serde_json::{Map, Value};
use tracing::warn;

use crate::EnrichedPoll;

/// Writes each enriched entity as one flat JSON object per line.
///
/// ```text
/// {"target":"prod","entity":"node1","timestamp_ms":11000,"indexing_index_total":30,"indexRatePerSecond":2.0,"timestampDiff":10000}
/// ```
///
/// Counters reported as absent are written as `null`; derived fields that
/// could not be computed are left out. A counter or derived field named
/// like one of the header keys is dropped from the line with a warning.
#[derive(Debug)]
pub struct Emitter<W> {
    writer: W,
    written: u64,
}

impl<W: Write> Emitter<W> {
    /// Create an emitter writing to `writer`.
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Write every entity of the poll and flush.
    pub fn emit(&mut self, poll: &EnrichedPoll) -> Result<()> {
        for (id, snapshot) in &poll.entities {
            let record = flatten(poll, id, snapshot);
            serde_json::to_writer(&mut self.writer, &record)?;
            self.writer.write_all(b"\n")?;
            self.written += 1;
        }
        self.writer.flush()?;
        Ok(())
    }

    /// Number of lines written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Consume the emitter and return the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Keys every line carries; snapshot fields may not shadow them.
const HEADER_KEYS: &[&str] = &["target", "entity", "timestamp_ms", "timestampDiff"];

fn insert_field(record: &mut Map<String, Value>, id: &EntityId, name: &str, value: Value) {
    if HEADER_KEYS.iter().any(|key| *key == name) {
        warn!(entity = %id, field = name, "field collides with a header key, dropping it");
        return;
    }
    record.insert(name.to_string(), value);
}

fn flatten(poll: &EnrichedPoll, id: &EntityId, snapshot: &CounterSnapshot) -> Value {
    let mut record = Map::new();
    record.insert("target".to_string(), Value::from(poll.target.as_str()));
    record.insert("entity".to_string(), Value::from(id.as_str()));
    record.insert("timestamp_ms".to_string(), Value::from(poll.timestamp.as_millis()));

    for (name, value) in &snapshot.counters {
        insert_field(&mut record, id, name, value.map_or(Value::Null, Value::from));
    }
    for (name, value) in &snapshot.derived {
        // Non-finite values have no JSON form
        if let Some(number) = serde_json::Number::from_f64(*value) {
            insert_field(&mut record, id, name, Value::Number(number));
        }
    }
    if let Some(diff) = snapshot.timestamp_diff {
        record.insert("timestampDiff".to_string(), Value::from(diff));
    }

    Value::Object(record)
}
