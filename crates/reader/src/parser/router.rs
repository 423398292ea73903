//! Tag routing and the partial-event store.
//!
//! One collection is usually logged as a `gc,start` line, a few detail
//! lines (`gc,heap`, `gc,metaspace`, `gc,phases`) and a closing `gc` line.
//! Pending events live in the store keyed by their cycle number until the
//! closing line arrives.

use std::collections::HashMap;
use std::fmt;
use tracing::{debug, trace};

use super::model::{GcEvent, LineError};
use super::tail::{self, Measurement};
use super::types;

/// The closed set of tag sets the router understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagSet {
    Gc,
    GcStart,
    GcHeap,
    GcMetaspace,
    GcPhases,
    Safepoint,
    Other(String),
}

impl TagSet {
    pub fn parse(tags: &str) -> Self {
        match tags {
            "gc" => TagSet::Gc,
            "gc,start" => TagSet::GcStart,
            "gc,heap" => TagSet::GcHeap,
            "gc,metaspace" => TagSet::GcMetaspace,
            "gc,phases" => TagSet::GcPhases,
            "safepoint" => TagSet::Safepoint,
            other => TagSet::Other(other.to_string()),
        }
    }
}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TagSet::Gc => "gc",
            TagSet::GcStart => "gc,start",
            TagSet::GcHeap => "gc,heap",
            TagSet::GcMetaspace => "gc,metaspace",
            TagSet::GcPhases => "gc,phases",
            TagSet::Safepoint => "safepoint",
            TagSet::Other(s) => s,
        };
        f.write_str(s)
    }
}

/// Pending events by cycle number. Events without a cycle number never get in.
#[derive(Debug, Default)]
pub struct PartialEventStore {
    pending: HashMap<u32, GcEvent>,
}

impl PartialEventStore {
    pub fn insert(&mut self, cycle: u32, event: GcEvent) -> Option<GcEvent> {
        self.pending.insert(cycle, event)
    }

    pub fn get(&self, cycle: Option<u32>) -> Option<&GcEvent> {
        cycle.and_then(|c| self.pending.get(&c))
    }

    pub fn get_mut(&mut self, cycle: Option<u32>) -> Option<&mut GcEvent> {
        cycle.and_then(|c| self.pending.get_mut(&c))
    }

    pub fn remove(&mut self, cycle: Option<u32>) -> Option<GcEvent> {
        cycle.and_then(|c| self.pending.remove(&c))
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop every pending event, returning their cycle numbers in order.
    pub fn drain(&mut self) -> Vec<u32> {
        let mut cycles: Vec<u32> = self.pending.drain().map(|(c, _)| c).collect();
        cycles.sort_unstable();
        cycles
    }
}

/// Everything that survives from one line to the next within a run.
#[derive(Debug, Default)]
pub struct ParseState {
    pub store: PartialEventStore,
    /// Kilobytes per region, from the "Heap region size" line
    pub region_size_kb: Option<u64>,
}

impl ParseState {
    pub fn new(region_size_kb: Option<u64>) -> Self {
        Self {
            store: PartialEventStore::default(),
            region_size_kb,
        }
    }

    /// Route one classified event. Returns the event to emit, if any.
    ///
    /// Non-fatal problems go to `warnings`; an `Err` means the line is dropped.
    pub fn route(
        &mut self,
        event: GcEvent,
        tags: &TagSet,
        tail: Option<&str>,
        warnings: &mut Vec<LineError>,
    ) -> Result<Option<GcEvent>, LineError> {
        trace!(tags = %tags, kind = %event.extended_type, cycle = ?event.cycle, "routing");
        match tags {
            TagSet::Safepoint => self.on_safepoint(event, tail, warnings),
            TagSet::GcStart => self.on_start(event),
            TagSet::GcHeap => self.on_heap(event, tail, warnings),
            TagSet::GcMetaspace => self.on_detail(event, tail, warnings),
            TagSet::Gc => self.on_gc(event, tail, warnings),
            TagSet::GcPhases => self.on_phase(event, tail, warnings),
            TagSet::Other(tags) => Err(LineError::UnexpectedTags(tags.clone())),
        }
    }

    /// Pending events left when the input ends. They are never emitted.
    pub fn abandon(&mut self) -> usize {
        let cycles = self.store.drain();
        if !cycles.is_empty() {
            debug!(?cycles, "Dropping {} incomplete gc cycle(s) at end of input", cycles.len());
        }
        cycles.len()
    }

    fn measure(
        &self,
        event: &GcEvent,
        tail: Option<&str>,
        warnings: &mut Vec<LineError>,
    ) -> Result<Measurement, LineError> {
        let region_size = self.region_size_kb.unwrap_or_default();
        match tail::parse(event.extended_type.pattern(), tail, region_size) {
            Ok(m) => Ok(m),
            Err(e) if e.keeps_event() => {
                warnings.push(e);
                Ok(Measurement::Nothing)
            }
            Err(e) => Err(e),
        }
    }

    fn parse_into(
        &self,
        mut event: GcEvent,
        tail: Option<&str>,
        warnings: &mut Vec<LineError>,
    ) -> Result<GcEvent, LineError> {
        self.measure(&event, tail, warnings)?.apply(&mut event);
        Ok(event)
    }

    fn on_safepoint(
        &mut self,
        mut event: GcEvent,
        tail: Option<&str>,
        warnings: &mut Vec<LineError>,
    ) -> Result<Option<GcEvent>, LineError> {
        match tail.and_then(|t| t.split(' ').next()) {
            Some(token) => {
                let value: f64 = token.replace(',', ".").parse()?;
                event.pause = Some(value / 1000.0);
            }
            None => warnings.push(LineError::TailMismatch {
                expected: "pause",
                tail: None,
            }),
        }
        Ok(Some(event))
    }

    fn on_start(&mut self, event: GcEvent) -> Result<Option<GcEvent>, LineError> {
        let cycle = event
            .cycle
            .ok_or_else(|| LineError::MissingCycle(event.extended_type.to_string()))?;
        if let Some(previous) = self.store.insert(cycle, event) {
            debug!(cycle, kind = %previous.extended_type, "Replacing pending event");
        }
        Ok(None)
    }

    fn on_heap(
        &mut self,
        event: GcEvent,
        tail: Option<&str>,
        warnings: &mut Vec<LineError>,
    ) -> Result<Option<GcEvent>, LineError> {
        if event.extended_type.is(&types::ZGC_HEAP_CAPACITY) && self.store.get(event.cycle).is_some() {
            let capacity = self.parse_into(event, tail, warnings)?;
            if let Some(parent) = self.store.get_mut(capacity.cycle) {
                parent.total = capacity.total;
            }
            return Ok(None);
        }
        self.on_detail(event, tail, warnings)
    }

    /// Detail lines (generations, metaspace, regions) fold into their parent.
    fn on_detail(
        &mut self,
        event: GcEvent,
        tail: Option<&str>,
        warnings: &mut Vec<LineError>,
    ) -> Result<Option<GcEvent>, LineError> {
        // ZGC style "19M used, 19M capacity, 19M committed, 20M reserved"
        if event.extended_type.is(&types::METASPACE)
            && tail.is_some_and(|t| t.contains("used,") && t.contains("committed,"))
        {
            return Ok(None);
        }
        let Some(cycle) = event.cycle else {
            trace!(kind = %event.extended_type, "Ignoring detail without gc cycle");
            return Ok(None);
        };

        let detail = self.parse_into(event, tail, warnings)?;
        if detail.extended_type.is(&types::CMS_CONCURRENT_OLD) {
            return Ok(None);
        }
        match self.store.get_mut(Some(cycle)) {
            Some(parent) => {
                parent.merge_detail(detail);
                Ok(None)
            }
            None => Err(LineError::MissingParent {
                kind: detail.extended_type.to_string(),
                cycle,
            }),
        }
    }

    fn on_gc(
        &mut self,
        event: GcEvent,
        tail: Option<&str>,
        warnings: &mut Vec<LineError>,
    ) -> Result<Option<GcEvent>, LineError> {
        let same_type = match self.store.get(event.cycle) {
            None => return Ok(Some(self.parse_into(event, tail, warnings)?)),
            Some(parent) => parent.extended_type == event.extended_type,
        };

        if same_type {
            // measure first so a bad number leaves the store untouched
            let measurement = self.measure(&event, tail, warnings)?;
            let Some(mut parent) = self.store.remove(event.cycle) else {
                return Ok(None);
            };
            parent.datestamp = event.datestamp;
            parent.uptime = event.uptime;
            parent.line_number = event.line_number;
            measurement.apply(&mut parent);
            Ok(Some(parent))
        } else {
            let detail = self.parse_into(event, tail, warnings)?;
            if let Some(parent) = self.store.get_mut(detail.cycle) {
                parent.merge_detail(detail);
            }
            Ok(None)
        }
    }

    fn on_phase(
        &mut self,
        event: GcEvent,
        tail: Option<&str>,
        warnings: &mut Vec<LineError>,
    ) -> Result<Option<GcEvent>, LineError> {
        let accumulates = match self.store.get(event.cycle) {
            Some(parent) => parent.variant.accumulates_phases(),
            None => {
                return match event.cycle {
                    Some(cycle) => Err(LineError::MissingParent {
                        kind: event.extended_type.to_string(),
                        cycle,
                    }),
                    None => Ok(None),
                };
            }
        };
        if !accumulates {
            trace!(kind = %event.extended_type, "Parent does not take phases");
            return Ok(None);
        }

        let phase = self.parse_into(event, tail, warnings)?;
        // ZGC logs its concurrent work as phases; those stand on their own
        if phase.is_concurrent() {
            return Ok(Some(phase));
        }
        if let Some(parent) = self.store.get_mut(phase.cycle) {
            parent.add_phase(phase);
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::model::{EventVariant, ExtendedType, GcType};

    fn event(gc_type: &'static GcType, label: &str, cycle: Option<u32>, line: usize) -> GcEvent {
        let mut e = GcEvent::new(ExtendedType::new(label, gc_type), line);
        e.cycle = cycle;
        e.uptime = Some(line as f64);
        e
    }

    fn route(
        state: &mut ParseState,
        e: GcEvent,
        tags: &str,
        tail: Option<&str>,
    ) -> (Result<Option<GcEvent>, LineError>, Vec<LineError>) {
        let mut warnings = Vec::new();
        let result = state.route(e, &TagSet::parse(tags), tail, &mut warnings);
        (result, warnings)
    }

    const YOUNG: &str = "Pause Young (Allocation Failure)";

    #[test]
    fn test_tag_set_parse() {
        assert_eq!(TagSet::parse("gc"), TagSet::Gc);
        assert_eq!(TagSet::parse("gc,metaspace"), TagSet::GcMetaspace);
        assert_eq!(TagSet::parse("gc,cpu"), TagSet::Other("gc,cpu".into()));
        assert_eq!(TagSet::parse("gc,phases").to_string(), "gc,phases");
    }

    #[test]
    fn test_start_detail_end() {
        let mut state = ParseState::default();
        let (r, _) = route(&mut state, event(&types::PAUSE_YOUNG, YOUNG, Some(0), 1), "gc,start", None);
        assert_eq!(r.unwrap(), None);
        assert_eq!(state.store.len(), 1);

        let (r, _) = route(&mut state, event(&types::DEF_NEW, "DefNew", Some(0), 2), "gc,heap", Some("4416K->512K(4928K)"));
        assert_eq!(r.unwrap(), None);
        let (r, _) = route(&mut state, event(&types::TENURED, "Tenured", Some(0), 3), "gc,heap", Some("0K->1000K(10944K)"));
        assert_eq!(r.unwrap(), None);
        let (r, _) = route(&mut state, event(&types::METASPACE, "Metaspace", Some(0), 4), "gc,metaspace", Some("2100K->2100K(1056768K)"));
        assert_eq!(r.unwrap(), None);

        let (r, w) = route(&mut state, event(&types::PAUSE_YOUNG, YOUNG, Some(0), 5), "gc", Some("4M->1M(15M) 2.000ms"));
        let done = r.unwrap().unwrap();
        assert!(w.is_empty());
        assert!(state.store.is_empty());
        assert_eq!(done.pre_used, 4416 + 2100);
        assert_eq!(done.post_used, 512 + 1000 + 2100);
        assert_eq!(done.total, 4928 + 10944 + 1056768);
        assert_eq!(done.details.len(), 3);
        assert_eq!(done.uptime, Some(5.0));
        assert_eq!(done.line_number, 5);
        assert!((done.pause.unwrap() - 0.002).abs() < 1e-12);
    }

    #[test]
    fn test_start_without_cycle() {
        let mut state = ParseState::default();
        let (r, _) = route(&mut state, event(&types::PAUSE_YOUNG, YOUNG, None, 1), "gc,start", None);
        assert!(matches!(r, Err(LineError::MissingCycle(_))));
        assert!(state.store.is_empty());
    }

    #[test]
    fn test_gc_without_parent_emits() {
        let mut state = ParseState::default();
        let (r, _) = route(&mut state, event(&types::SHEN_PAUSE_INIT_MARK, "Pause Init Mark", Some(0), 1), "gc", Some("1.021ms"));
        let e = r.unwrap().unwrap();
        assert!((e.pause.unwrap() - 0.001021).abs() < 1e-12);
    }

    #[test]
    fn test_gc_with_other_type_merges() {
        let mut state = ParseState::default();
        route(&mut state, event(&types::PAUSE_FULL, "Pause Full (Allocation Failure)", Some(3), 1), "gc,start", None)
            .0
            .unwrap();
        let (r, _) = route(&mut state, event(&types::PS_YOUNG_GEN, "PSYoungGen", Some(3), 2), "gc", Some("100K->0K(200K)"));
        assert_eq!(r.unwrap(), None);
        let parent = state.store.get(Some(3)).unwrap();
        assert_eq!(parent.total, 200);
        assert_eq!(parent.details.len(), 1);
    }

    #[test]
    fn test_number_error_leaves_store_unchanged() {
        let mut state = ParseState::default();
        route(&mut state, event(&types::PAUSE_YOUNG, YOUNG, Some(0), 1), "gc,start", None).0.unwrap();
        let (r, _) = route(
            &mut state,
            event(&types::PAUSE_YOUNG, YOUNG, Some(0), 2),
            "gc",
            Some("99999999999999999999M->1M(15M) 2.000ms"),
        );
        assert!(matches!(r, Err(LineError::Number(_))));
        assert_eq!(state.store.len(), 1);
    }

    #[test]
    fn test_tail_mismatch_keeps_event() {
        let mut state = ParseState::default();
        let (r, w) = route(&mut state, event(&types::PAUSE_YOUNG, YOUNG, None, 1), "gc", Some("1 garbage"));
        let e = r.unwrap().unwrap();
        assert_eq!(e.total, 0);
        assert_eq!(w.len(), 1);
        assert!(matches!(w[0], LineError::TailMismatch { .. }));
    }

    #[test]
    fn test_detail_without_parent() {
        let mut state = ParseState::default();
        let (r, _) = route(&mut state, event(&types::METASPACE, "Metaspace", Some(9), 1), "gc,metaspace", Some("1K->1K(2K)"));
        assert_eq!(
            r,
            Err(LineError::MissingParent { kind: "Metaspace".into(), cycle: 9 })
        );
    }

    #[test]
    fn test_detail_ignored_cases() {
        let mut state = ParseState::default();
        route(&mut state, event(&types::ZGC_GARBAGE_COLLECTION, "Garbage Collection (Warmup)", Some(0), 1), "gc,start", None)
            .0
            .unwrap();
        // ZGC metaspace capacity report
        let (r, w) = route(
            &mut state,
            event(&types::METASPACE, "Metaspace", Some(0), 2),
            "gc,metaspace",
            Some("4M used, 4M capacity, 5M committed, 8M reserved"),
        );
        assert_eq!(r.unwrap(), None);
        assert!(w.is_empty());
        // no cycle number
        let (r, _) = route(&mut state, event(&types::METASPACE, "Metaspace", None, 3), "gc,metaspace", Some("1K->1K(2K)"));
        assert_eq!(r.unwrap(), None);
        assert_eq!(state.store.get(Some(0)).unwrap().total, 0);
    }

    #[test]
    fn test_cms_concurrent_old_is_dropped() {
        let mut state = ParseState::default();
        route(&mut state, event(&types::PAUSE_REMARK, "Pause Remark", Some(13), 1), "gc,start", None).0.unwrap();
        let (r, _) = route(&mut state, event(&types::CMS_CONCURRENT_OLD, "Old", Some(13), 2), "gc,heap", Some("7127K->3840K(10944K)"));
        assert_eq!(r.unwrap(), None);
        assert_eq!(state.store.get(Some(13)).unwrap().total, 0);
    }

    #[test]
    fn test_zgc_heap_capacity() {
        let mut state = ParseState::default();
        route(&mut state, event(&types::ZGC_GARBAGE_COLLECTION, "Garbage Collection (Warmup)", Some(0), 1), "gc,start", None)
            .0
            .unwrap();
        let (r, _) = route(&mut state, event(&types::ZGC_HEAP_CAPACITY, "Capacity", Some(0), 2), "gc,heap", Some("512M (100%)        512M (100%)"));
        assert_eq!(r.unwrap(), None);
        assert_eq!(state.store.get(Some(0)).unwrap().total, 512 * 1024);
        assert!(state.store.get(Some(0)).unwrap().details.is_empty());

        let (r, _) = route(
            &mut state,
            event(&types::ZGC_GARBAGE_COLLECTION, "Garbage Collection (Warmup)", Some(0), 3),
            "gc",
            Some("106M(10%)->88M(9%)"),
        );
        let e = r.unwrap().unwrap();
        assert_eq!(e.total, 512 * 1024);
        assert_eq!(e.pre_used, 106 * 1024);
    }

    #[test]
    fn test_zgc_heap_capacity_mismatch_zeroes_total() {
        let mut state = ParseState::default();
        route(&mut state, event(&types::ZGC_GARBAGE_COLLECTION, "Garbage Collection (Warmup)", Some(0), 1), "gc,start", None)
            .0
            .unwrap();
        route(&mut state, event(&types::ZGC_HEAP_CAPACITY, "Capacity", Some(0), 2), "gc,heap", Some("512M (100%)"))
            .0
            .unwrap();
        assert_eq!(state.store.get(Some(0)).unwrap().total, 512 * 1024);

        let (r, w) = route(&mut state, event(&types::ZGC_HEAP_CAPACITY, "Capacity", Some(0), 3), "gc,heap", Some("- (n/a)"));
        assert_eq!(r.unwrap(), None);
        assert_eq!(w.len(), 1);
        assert!(matches!(w[0], LineError::TailMismatch { expected: "heap memory percentage", .. }));
        assert_eq!(state.store.get(Some(0)).unwrap().total, 0);
    }

    #[test]
    fn test_phases() {
        let mut state = ParseState::default();
        route(&mut state, event(&types::ZGC_GARBAGE_COLLECTION, "Garbage Collection (Warmup)", Some(0), 1), "gc,start", None)
            .0
            .unwrap();
        let (r, _) = route(&mut state, event(&types::ZGC_PAUSE_MARK_START, "Pause Mark Start", Some(0), 2), "gc,phases", Some("0.034ms"));
        assert_eq!(r.unwrap(), None);
        let (r, _) = route(&mut state, event(&types::CONCURRENT_MARK, "Concurrent Mark", Some(0), 3), "gc,phases", Some("1.897ms"));
        let concurrent = r.unwrap().unwrap();
        assert_eq!(concurrent.variant, EventVariant::Concurrent);

        let parent = state.store.get(Some(0)).unwrap();
        assert_eq!(parent.phases.len(), 1);
        assert_eq!(parent.phases[0].extended_type.full_name, "Pause Mark Start");
    }

    #[test]
    fn test_orphan_phase() {
        let mut state = ParseState::default();
        let (r, _) = route(&mut state, event(&types::G1_PHASE_OTHER, "Other", Some(4), 1), "gc,phases", Some("0.3ms"));
        assert!(matches!(r, Err(LineError::MissingParent { cycle: 4, .. })));
        let (r, _) = route(&mut state, event(&types::G1_PHASE_OTHER, "Other", None, 2), "gc,phases", Some("0.3ms"));
        assert_eq!(r.unwrap(), None);
    }

    #[test]
    fn test_safepoint() {
        let mut state = ParseState::default();
        let (r, _) = route(
            &mut state,
            event(&types::APPLICATION_STOPPED_TIME, "Total time for which application threads were stopped", None, 1),
            "safepoint",
            Some("0.0001004 seconds, Stopping threads took: 0.0000183 seconds"),
        );
        let e = r.unwrap().unwrap();
        assert_eq!(e.variant, EventVariant::VmOperation);
        assert!((e.pause.unwrap() - 0.0000001004).abs() < 1e-15);
    }

    #[test]
    fn test_unexpected_tags() {
        let mut state = ParseState::default();
        let (r, _) = route(&mut state, event(&types::PAUSE_YOUNG, YOUNG, Some(0), 1), "gc,phases,ref", None);
        assert_eq!(r, Err(LineError::UnexpectedTags("gc,phases,ref".into())));
    }

    #[test]
    fn test_abandon() {
        let mut state = ParseState::default();
        route(&mut state, event(&types::PAUSE_YOUNG, YOUNG, Some(1), 1), "gc,start", None).0.unwrap();
        route(&mut state, event(&types::PAUSE_YOUNG, YOUNG, Some(2), 2), "gc,start", None).0.unwrap();
        assert_eq!(state.abandon(), 2);
        assert!(state.store.is_empty());
        assert_eq!(state.abandon(), 0);
    }
}
