//! Gain log - the outbound record of committed resource deltas.

use resource_rules::ResourceId;
use serde::{Deserialize, Serialize};

/// One committed, non-zero delta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GainEntry {
    pub resource_id: ResourceId,
    pub amount: i64,
}

/// Append-only sink owned by the caller. The engine never reads it back.
pub trait GainLog {
    fn record(&mut self, entry: GainEntry);
}

impl GainLog for Vec<GainEntry> {
    fn record(&mut self, entry: GainEntry) {
        self.push(entry);
    }
}

/// Sink that drops every entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardGainLog;

impl GainLog for DiscardGainLog {
    fn record(&mut self, _entry: GainEntry) {}
}
