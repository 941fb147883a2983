use serde::Serialize;
use std::collections::BTreeMap;

/// Result of one batch: how many records ended in each status.
///
/// Owned by the driver loop and handed back when the batch is done.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub counts: BTreeMap<String, usize>,
    pub processed: usize,
    pub failures: usize,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, status: &str) {
        *self.counts.entry(status.to_string()).or_insert(0) += 1;
        self.processed += 1;
    }

    pub fn record_failure(&mut self, status: &str) {
        self.record(status);
        self.failures += 1;
    }

    pub fn count(&self, status: &str) -> usize {
        self.counts.get(status).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.processed == 0
    }

    /// Status table as printed at the end of a run.
    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.counts)
    }
}
