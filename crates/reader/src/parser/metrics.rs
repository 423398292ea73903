use serde::Serialize;

use super::model::{DiagnosticCategory, GcEvent};

/// Diagnostic counters by category
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DiagnosticCounts {
    pub header: u64,
    pub time: u64,
    pub tail: u64,
    pub orphan: u64,
    pub tags: u64,
}

impl DiagnosticCounts {
    pub fn total(&self) -> u64 {
        self.header + self.time + self.tail + self.orphan + self.tags
    }
}

/// Counters for one parsing run.
///
/// A run is single-threaded, so these are plain integers. Take a snapshot
/// with `clone()`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ParseStats {
    pub lines_read: u64,
    pub candidates: u64,
    pub noise: u64,
    pub auxiliary: u64,
    pub events_emitted: u64,
    pub concurrent_events: u64,
    pub diagnostics: DiagnosticCounts,
    /// Cycles still pending when the input ended
    pub abandoned_cycles: u64,
}

impl ParseStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_event(&mut self, event: &GcEvent) {
        self.events_emitted += 1;
        if event.is_concurrent() {
            self.concurrent_events += 1;
        }
    }

    #[inline]
    pub fn record_diagnostic(&mut self, category: DiagnosticCategory) {
        let counter = match category {
            DiagnosticCategory::Header => &mut self.diagnostics.header,
            DiagnosticCategory::Time => &mut self.diagnostics.time,
            DiagnosticCategory::Tail => &mut self.diagnostics.tail,
            DiagnosticCategory::Orphan => &mut self.diagnostics.orphan,
            DiagnosticCategory::Tags => &mut self.diagnostics.tags,
        };
        *counter += 1;
    }
}
