//! Per-file roll-up of the events read.

use serde::Serialize;
use std::fmt;

use reader::parser::EventVariant;
use reader::{GcEvent, ParseStats};

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub file: String,
    pub events: u64,
    pub stop_the_world: u64,
    pub concurrent: u64,
    pub vm_operations: u64,
    /// Seconds the application was paused, concurrent phases excluded
    pub total_pause: f64,
    pub max_pause: f64,
    pub stats: ParseStats,
}

impl RunSummary {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            ..Self::default()
        }
    }

    pub fn record(&mut self, event: &GcEvent) {
        self.events += 1;
        match event.variant {
            EventVariant::Simple => self.stop_the_world += 1,
            EventVariant::Concurrent => {
                self.concurrent += 1;
                return;
            }
            EventVariant::VmOperation => self.vm_operations += 1,
        }
        if let Some(pause) = event.pause {
            self.total_pause += pause;
            self.max_pause = self.max_pause.max(pause);
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.file)?;
        writeln!(
            f,
            "  events:         {} ({} stop-the-world, {} concurrent, {} vm operations)",
            self.events, self.stop_the_world, self.concurrent, self.vm_operations
        )?;
        writeln!(f, "  total pause:    {:.6}s", self.total_pause)?;
        writeln!(f, "  max pause:      {:.6}s", self.max_pause)?;
        writeln!(
            f,
            "  lines:          {} read, {} candidates, {} auxiliary",
            self.stats.lines_read, self.stats.candidates, self.stats.auxiliary
        )?;
        write!(
            f,
            "  diagnostics:    {} (abandoned cycles: {})",
            self.stats.diagnostics.total(),
            self.stats.abandoned_cycles
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reader::parser::types;
    use reader::parser::{ExtendedType, GcType};

    fn event(gc_type: &'static GcType, pause: Option<f64>) -> GcEvent {
        let mut e = GcEvent::new(ExtendedType::new(gc_type.name, gc_type), 1);
        e.pause = pause;
        e
    }

    #[test]
    fn test_record_counts_variants() {
        let mut summary = RunSummary::new("gc.log");
        summary.record(&event(&types::PAUSE_YOUNG, Some(0.002)));
        summary.record(&event(&types::PAUSE_FULL, Some(0.010)));
        summary.record(&event(&types::CONCURRENT_MARK, Some(0.500)));
        summary.record(&event(&types::APPLICATION_STOPPED_TIME, Some(0.001)));

        assert_eq!(summary.events, 4);
        assert_eq!(summary.stop_the_world, 2);
        assert_eq!(summary.concurrent, 1);
        assert_eq!(summary.vm_operations, 1);
        assert!((summary.total_pause - 0.013).abs() < 1e-12);
        assert!((summary.max_pause - 0.010).abs() < 1e-12);
    }

    #[test]
    fn test_missing_pause() {
        let mut summary = RunSummary::new("gc.log");
        summary.record(&event(&types::PAUSE_YOUNG, None));
        assert_eq!(summary.stop_the_world, 1);
        assert_eq!(summary.total_pause, 0.0);
    }

    #[test]
    fn test_display() {
        let mut summary = RunSummary::new("gc.log");
        summary.record(&event(&types::PAUSE_YOUNG, Some(0.25)));
        let text = summary.to_string();
        assert!(text.starts_with("gc.log\n"));
        assert!(text.contains("1 stop-the-world"));
        assert!(text.contains("max pause:      0.250000s"));
    }

    #[test]
    fn test_serialize() {
        let summary = RunSummary::new("gc.log");
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["file"], "gc.log");
        assert_eq!(json["stats"]["lines_read"], 0);
    }
}
