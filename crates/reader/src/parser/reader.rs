//! The reader pipeline: filter, extract, classify, route.

use tracing::{debug, info};

use super::types::BuiltinTypes;
use super::decorators::Decorators;
use super::filter::{self, LineClass, LineFilter};
use super::metrics::ParseStats;
use super::model::{Diagnostic, GcEvent, LineError};
use super::router::{ParseState, TagSet};
use super::traits::{DiagnosticSink, TypeClassifier};
use super::MAX_LINE_SIZE;
use crate::conf::ReaderConfig;

/// Reads unified jvm logging output into gc events.
///
/// The reader itself holds no per-run state, so one instance can serve
/// any number of inputs, one [`GcEvents`] iterator each.
pub struct UnifiedLogReader {
    filter: LineFilter,
    classifier: Box<dyn TypeClassifier>,
    max_line_size: usize,
    region_size_kb: Option<u64>,
}

impl Default for UnifiedLogReader {
    fn default() -> Self {
        Self {
            filter: LineFilter::default(),
            classifier: Box::new(BuiltinTypes::new()),
            max_line_size: MAX_LINE_SIZE,
            region_size_kb: None,
        }
    }
}

impl UnifiedLogReader {
    pub fn new(config: &ReaderConfig) -> Self {
        Self {
            filter: LineFilter::new(&config.extra_exclude_markers, &config.extra_log_only_markers),
            classifier: Box::new(BuiltinTypes::new()),
            max_line_size: config.max_line_size,
            region_size_kb: config.region_size_kb,
        }
    }

    pub fn with_classifier(mut self, classifier: impl TypeClassifier + 'static) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    /// Lazily parse `lines`, reporting anomalies to `sink`.
    pub fn events<I, S>(&self, lines: I, sink: S) -> GcEvents<'_, I::IntoIter, S>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        S: DiagnosticSink,
    {
        info!("Reading unified jvm logging format");
        GcEvents {
            reader: self,
            lines: lines.into_iter(),
            sink,
            state: ParseState::new(self.region_size_kb),
            stats: ParseStats::new(),
            line_number: 0,
            finished: false,
        }
    }

    fn parse_candidate(
        &self,
        state: &mut ParseState,
        line: &str,
        line_number: usize,
        warnings: &mut Vec<LineError>,
    ) -> Result<Option<GcEvent>, LineError> {
        if line.len() > self.max_line_size {
            return Err(LineError::LineTooLarge(line.len(), self.max_line_size));
        }
        let decorators = Decorators::extract(line)?;
        let extended_type = self.classifier.classify(decorators.type_label)?;
        let cycle = decorators.cycle()?;
        let stamps = decorators.timestamps()?;

        let mut event = GcEvent::new(extended_type, line_number);
        event.cycle = cycle;
        event.datestamp = stamps.datestamp;
        event.uptime = stamps.uptime;

        let tags = TagSet::parse(decorators.tags);
        state.route(event, &tags, decorators.tail, warnings)
    }
}

/// Single-pass iterator over the events of one input.
pub struct GcEvents<'r, I, S> {
    reader: &'r UnifiedLogReader,
    lines: I,
    sink: S,
    state: ParseState,
    stats: ParseStats,
    line_number: usize,
    finished: bool,
}

impl<'r, I, S> GcEvents<'r, I, S>
where
    I: Iterator,
    I::Item: AsRef<str>,
    S: DiagnosticSink,
{
    pub fn stats(&self) -> &ParseStats {
        &self.stats
    }

    /// Region size currently in effect, in kilobytes.
    pub fn region_size_kb(&self) -> Option<u64> {
        self.state.region_size_kb
    }

    pub fn into_parts(self) -> (ParseStats, S) {
        (self.stats, self.sink)
    }

    fn report(&mut self, line: &str, error: LineError) {
        self.stats.record_diagnostic(error.category());
        self.sink.report(Diagnostic {
            line_number: self.line_number,
            line: line.to_string(),
            error,
        });
    }

    fn process_line(&mut self, line: &str) -> Option<GcEvent> {
        self.line_number += 1;
        self.stats.lines_read += 1;

        match self.reader.filter.classify(line) {
            LineClass::Noise => {
                self.stats.noise += 1;
                None
            }
            LineClass::Auxiliary(text) => {
                self.stats.auxiliary += 1;
                info!("{}", text.trim());
                match filter::region_size_kb(text) {
                    Some(Ok(size)) => {
                        debug!(region_size_kb = size, "Heap region size announced");
                        self.state.region_size_kb = Some(size);
                    }
                    Some(Err(e)) => self.report(line, e),
                    None => {}
                }
                None
            }
            LineClass::Candidate => {
                self.stats.candidates += 1;
                let mut warnings = Vec::new();
                let result = self.reader.parse_candidate(
                    &mut self.state,
                    line,
                    self.line_number,
                    &mut warnings,
                );
                for warning in warnings {
                    self.report(line, warning);
                }
                match result {
                    Ok(Some(event)) => {
                        self.stats.record_event(&event);
                        Some(event)
                    }
                    Ok(None) => None,
                    Err(e) => {
                        self.report(line, e);
                        None
                    }
                }
            }
        }
    }

    fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.stats.abandoned_cycles = self.state.abandon() as u64;
        info!(
            lines = self.stats.lines_read,
            events = self.stats.events_emitted,
            diagnostics = self.stats.diagnostics.total(),
            "Reading done"
        );
    }
}

impl<'r, I, S> Iterator for GcEvents<'r, I, S>
where
    I: Iterator,
    I::Item: AsRef<str>,
    S: DiagnosticSink,
{
    type Item = GcEvent;

    fn next(&mut self) -> Option<GcEvent> {
        if self.finished {
            return None;
        }
        while let Some(line) = self.lines.next() {
            if let Some(event) = self.process_line(line.as_ref()) {
                return Some(event);
            }
        }
        self.finish();
        None
    }
}

impl<'r, I, S> std::iter::FusedIterator for GcEvents<'r, I, S>
where
    I: Iterator,
    I::Item: AsRef<str>,
    S: DiagnosticSink,
{
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::diagnostics::CollectingSink;
    use crate::parser::model::{DiagnosticCategory, EventVariant};

    fn read(lines: &[&str]) -> (Vec<GcEvent>, ParseStats, CollectingSink) {
        let reader = UnifiedLogReader::default();
        let mut sink = CollectingSink::new();
        let mut events = reader.events(lines.iter(), &mut sink);
        let out: Vec<GcEvent> = events.by_ref().collect();
        let stats = events.stats().clone();
        drop(events);
        (out, stats, sink)
    }

    #[test]
    fn test_single_line_event() {
        let (events, stats, sink) = read(&[
            "[0.731s][info][gc           ] GC(0) Pause Init Mark 1.021ms",
        ]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].line_number, 1);
        assert_eq!(events[0].cycle, Some(0));
        assert_eq!(stats.events_emitted, 1);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_noise_is_inert() {
        let (events, stats, sink) = read(&["nothing to see", "[0.1s][debug][gc] GC(0) whatever"]);
        assert!(events.is_empty());
        assert_eq!(stats.noise, 2);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_region_size_announcement() {
        let (events, stats, _) = read(&[
            "[0.003s][info][gc,heap] Heap region size: 1M",
            "[0.100s][info][gc,start    ] GC(0) Pause Young (Normal) (G1 Evacuation Pause)",
            "[0.101s][info][gc,heap     ] GC(0) Eden regions: 7->0(9)",
            "[0.102s][info][gc          ] GC(0) Pause Young (Normal) (G1 Evacuation Pause) 7M->1M(256M) 2.000ms",
        ]);
        assert_eq!(stats.auxiliary, 1);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].pre_used, 7 * 1024);
        assert_eq!(events[0].total, 9 * 1024);
    }

    #[test]
    fn test_bad_region_size_is_reported() {
        let (events, stats, sink) = read(&[
            "[0.004s][info][gc,heap] Heap region size: 99999999999999999999M",
        ]);
        assert!(events.is_empty());
        assert_eq!(stats.auxiliary, 1);
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.diagnostics[0].line_number, 1);
        assert!(matches!(sink.diagnostics[0].error, LineError::Number(_)));
        assert_eq!(stats.diagnostics.tail, 1);
        assert_eq!(stats.diagnostics.total(), 1);
    }

    #[test]
    fn test_preset_region_size() {
        let config = ReaderConfig {
            region_size_kb: Some(2048),
            ..ReaderConfig::default()
        };
        let reader = UnifiedLogReader::new(&config);
        let lines = [
            "[0.100s][info][gc,start    ] GC(0) Pause Young (Normal) (G1 Evacuation Pause)",
            "[0.101s][info][gc,heap     ] GC(0) Eden regions: 1->0(3)",
            "[0.102s][info][gc          ] GC(0) Pause Young (Normal) (G1 Evacuation Pause) 7M->1M(256M) 2.000ms",
        ];
        let events: Vec<GcEvent> = reader.events(lines, CollectingSink::new()).collect();
        assert_eq!(events[0].pre_used, 2048);
        assert_eq!(events[0].total, 3 * 2048);
    }

    #[test]
    fn test_diagnostics_are_numbered() {
        let (events, stats, sink) = read(&[
            "[0.1s][info][gc] Using Serial",
            "[0.2s][info][gc] GC(0) Pause Bogus 1.0ms",
            "[info][gc] GC(1) Pause Init Mark 1.0ms",
        ]);
        assert!(events.is_empty());
        assert_eq!(sink.len(), 2);
        assert_eq!(sink.diagnostics[0].line_number, 2);
        assert_eq!(sink.diagnostics[0].error, LineError::UnknownType("Pause Bogus".into()));
        assert_eq!(sink.diagnostics[1].line_number, 3);
        assert_eq!(sink.diagnostics[1].error, LineError::NoTime);
        assert_eq!(stats.diagnostics.header, 1);
        assert_eq!(stats.diagnostics.time, 1);
    }

    #[test]
    fn test_tail_mismatch_still_emits() {
        let (events, _, sink) = read(&["[0.2s][info][gc] GC(0) Pause Init Mark 1 apple"]);
        assert_eq!(events.len(), 1);
        assert!(events[0].pause.is_none());
        assert_eq!(sink.in_category(DiagnosticCategory::Tail).count(), 1);
    }

    #[test]
    fn test_line_too_large() {
        let config = ReaderConfig {
            max_line_size: 32,
            ..ReaderConfig::default()
        };
        let reader = UnifiedLogReader::new(&config);
        let mut sink = CollectingSink::new();
        let lines = ["[0.731s][info][gc           ] GC(0) Pause Init Mark 1.021ms"];
        let events: Vec<GcEvent> = reader.events(lines, &mut sink).collect();
        assert!(events.is_empty());
        assert!(matches!(sink.diagnostics[0].error, LineError::LineTooLarge(_, 32)));
    }

    #[test]
    fn test_truncated_cycle_is_not_emitted() {
        let (events, stats, _) = read(&[
            "[0.100s][info][gc,start    ] GC(0) Pause Young (Allocation Failure)",
            "[0.102s][info][gc,heap     ] GC(0) DefNew: 4416K->512K(4928K)",
        ]);
        assert!(events.is_empty());
        assert_eq!(stats.abandoned_cycles, 1);
    }

    #[test]
    fn test_refeeding_line_is_deterministic() {
        let line = "[0.731s][info][gc] GC(0) Concurrent marking 74M->74M(128M) 3.688ms";
        let (events, _, _) = read(&[line, line]);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].variant, EventVariant::Concurrent);
        let mut second = events[1].clone();
        second.line_number = events[0].line_number;
        assert_eq!(events[0], second);
    }

    #[test]
    fn test_fused_after_end() {
        let reader = UnifiedLogReader::default();
        let mut events = reader.events(Vec::<String>::new(), CollectingSink::new());
        assert!(events.next().is_none());
        assert!(events.next().is_none());
        let (stats, sink) = events.into_parts();
        assert_eq!(stats.lines_read, 0);
        assert!(sink.is_empty());
    }
}
