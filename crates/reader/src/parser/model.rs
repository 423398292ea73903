use std::fmt;
use thiserror::Error;
use serde::Serialize;
use chrono::{DateTime, FixedOffset};

/// Shape of the value text that follows a type label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GcPattern {
    /// `1.070ms`
    Pause,
    /// `4848M->4855M(4998M)`
    Memory,
    /// `4848M->4855M(4998M) 2.872ms`
    MemoryPause,
    /// `7->3(2)` (region counts)
    Region,
    /// `106M(0%)->88M(0%)`
    MemoryPercentage,
    /// `300M (1%)`
    HeapMemoryPercentage,
    /// Nothing may follow the label
    None,
}

impl GcPattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            GcPattern::Pause => "pause",
            GcPattern::Memory => "memory",
            GcPattern::MemoryPause => "memory and pause",
            GcPattern::Region => "region",
            GcPattern::MemoryPercentage => "memory percentage",
            GcPattern::HeapMemoryPercentage => "heap memory percentage",
            GcPattern::None => "nothing",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Concurrency {
    StopTheWorld,
    Concurrent,
}

/// Canonical gc event type, one entry of the classifier table.
#[derive(Debug, PartialEq, Eq, Hash, Serialize)]
pub struct GcType {
    pub name: &'static str,
    pub pattern: GcPattern,
    pub concurrency: Concurrency,
}

impl GcType {
    pub const fn new(name: &'static str, concurrency: Concurrency, pattern: GcPattern) -> Self {
        Self { name, pattern, concurrency }
    }
}

/// A type label as it appeared in the log, resolved to its canonical type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ExtendedType {
    /// Label as logged, e.g. "Pause Young (Normal) (G1 Evacuation Pause)"
    pub full_name: String,
    #[serde(rename = "kind")]
    pub gc_type: &'static GcType,
}

impl ExtendedType {
    pub fn new(full_name: impl Into<String>, gc_type: &'static GcType) -> Self {
        Self {
            full_name: full_name.into(),
            gc_type,
        }
    }

    pub fn pattern(&self) -> GcPattern {
        self.gc_type.pattern
    }

    pub fn concurrency(&self) -> Concurrency {
        self.gc_type.concurrency
    }

    pub fn is(&self, gc_type: &GcType) -> bool {
        self.gc_type == gc_type
    }
}

impl fmt::Display for ExtendedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventVariant {
    /// Stop-the-world collection (or a detail/phase of one)
    Simple,
    /// Concurrent collection phase
    Concurrent,
    /// Safepoint / "application stopped" record
    VmOperation,
}

impl EventVariant {
    /// Decided once per line, from the classified type alone.
    pub fn for_type(extended_type: &ExtendedType) -> Self {
        if extended_type.concurrency() == Concurrency::Concurrent {
            EventVariant::Concurrent
        } else if extended_type.is(&super::types::APPLICATION_STOPPED_TIME) {
            EventVariant::VmOperation
        } else {
            EventVariant::Simple
        }
    }

    pub fn accumulates_phases(&self) -> bool {
        matches!(self, EventVariant::Simple | EventVariant::Concurrent)
    }
}

/// One garbage collection event, possibly assembled from several lines.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GcEvent {
    pub variant: EventVariant,
    pub extended_type: ExtendedType,
    pub cycle: Option<u32>,
    /// Wall-clock time of the (closing) line
    pub datestamp: Option<DateTime<FixedOffset>>,
    /// Seconds since runtime start
    pub uptime: Option<f64>,
    /// Pause in seconds
    pub pause: Option<f64>,
    /// Memory figures in kilobytes; 0 means unknown
    pub pre_used: u64,
    pub post_used: u64,
    pub total: u64,
    pub phases: Vec<GcEvent>,
    /// Detail lines folded into this event by the additive merge
    pub details: Vec<GcEvent>,
    /// 1-based line number of the line this event was built from
    pub line_number: usize,
}

impl GcEvent {
    pub fn new(extended_type: ExtendedType, line_number: usize) -> Self {
        Self {
            variant: EventVariant::for_type(&extended_type),
            extended_type,
            cycle: None,
            datestamp: None,
            uptime: None,
            pause: None,
            pre_used: 0,
            post_used: 0,
            total: 0,
            phases: Vec::new(),
            details: Vec::new(),
            line_number,
        }
    }

    pub fn is_concurrent(&self) -> bool {
        self.variant == EventVariant::Concurrent
    }

    pub fn has_memory(&self) -> bool {
        self.total > 0
    }

    /// Additive merge of a detail line (generation, metaspace, region set).
    pub fn merge_detail(&mut self, detail: GcEvent) {
        self.pre_used += detail.pre_used;
        self.post_used += detail.post_used;
        self.total += detail.total;
        self.details.push(detail);
    }

    /// Returns false (and drops the phase) if this variant cannot hold phases.
    pub fn add_phase(&mut self, phase: GcEvent) -> bool {
        if !self.variant.accumulates_phases() {
            return false;
        }
        self.phases.push(phase);
        true
    }
}

/// Everything that can go wrong with a single line. None of these stop a run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LineError {
    #[error("no match")]
    NoMatch,

    #[error("unknown gc type \"{0}\"")]
    UnknownType(String),

    #[error("no valid time or timestamp")]
    NoTime,

    #[error("invalid timestamp \"{0}\"")]
    InvalidTimestamp(String),

    #[error("line too large: {0} bytes (max: {1} bytes)")]
    LineTooLarge(usize, usize),

    #[error("expected {expected} in the end of the line (tail={tail:?})")]
    TailMismatch {
        expected: &'static str,
        tail: Option<String>,
    },

    #[error("unexpected tail present in the end of the line (tail=\"{0}\")")]
    UnexpectedTail(String),

    #[error("didn't find parent event for {kind} in gc cycle {cycle}")]
    MissingParent { kind: String, cycle: u32 },

    #[error("start of {0} without gc cycle number")]
    MissingCycle(String),

    #[error("unexpected tag set \"{0}\"")]
    UnexpectedTags(String),

    #[error("invalid number: {0}")]
    Number(String),
}

impl LineError {
    /// Tail mismatches and stray tails keep the event; everything else drops the line.
    pub fn keeps_event(&self) -> bool {
        matches!(self, LineError::TailMismatch { .. } | LineError::UnexpectedTail(_))
    }

    pub fn category(&self) -> DiagnosticCategory {
        match self {
            LineError::NoMatch | LineError::UnknownType(_) | LineError::LineTooLarge(..) => {
                DiagnosticCategory::Header
            }
            LineError::NoTime | LineError::InvalidTimestamp(_) => DiagnosticCategory::Time,
            LineError::TailMismatch { .. } | LineError::UnexpectedTail(_) | LineError::Number(_) => {
                DiagnosticCategory::Tail
            }
            LineError::MissingParent { .. } | LineError::MissingCycle(_) => DiagnosticCategory::Orphan,
            LineError::UnexpectedTags(_) => DiagnosticCategory::Tags,
        }
    }
}

impl From<std::num::ParseIntError> for LineError {
    fn from(e: std::num::ParseIntError) -> Self {
        LineError::Number(e.to_string())
    }
}

impl From<std::num::ParseFloatError> for LineError {
    fn from(e: std::num::ParseFloatError) -> Self {
        LineError::Number(e.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticCategory {
    Header,
    Time,
    Tail,
    Orphan,
    Tags,
}

/// One anomaly, tagged with where it happened.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub line_number: usize,
    pub line: String,
    pub error: LineError,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} on line number {} (line=\"{}\")",
            self.error, self.line_number, self.line
        )
    }
}
