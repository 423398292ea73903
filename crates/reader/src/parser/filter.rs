//! First-pass line filter: decides whether a raw line is worth parsing.

use once_cell::sync::Lazy;
use regex::Regex;

use super::model::LineError;
use super::units::parse_memory;

/// Substrings marking a line as a possible gc event.
pub const INCLUDE_MARKERS: &[&str] = &[
    "[gc ",
    "[gc]",
    "[gc,start",
    "[gc,heap",
    "[gc,metaspace",
    "[gc,phases",
    "[gc,init",
    "Total time for which application threads were stopped",
];

/// Substrings that disqualify a line even if it carries an include marker.
pub const EXCLUDE_MARKERS: &[&str] = &[
    "Cancelling concurrent GC",
    "[debug",
    "[trace",
    "gc,heap,coops",
    "gc,heap,exit",
    "gc,metaspace,freelist,oom",
    "[gc,phases,start",
    "Trigger: ",
    "Failed to allocate",
    "Cancelling GC",
    // metaspace preamble (JDK 17)
    "CDS archive(s) mapped at",
    "Compressed class space mapped at",
    "Narrow klass base",
    // ZGC heap table
    "  Mark Start  ",
    "Reserve:",
    "Free:",
    "Used:",
    "Live:",
    "Allocated:",
    "Garbage:",
    "Reclaimed:",
    "Page Cache Flushed:",
    "Min Capacity:",
    "Max Capacity:",
    "Soft Max Capacity:",
    "Uncommitted:",
];

/// Candidates carrying one of these are informational only.
pub const LOG_ONLY_MARKERS: &[&str] = &[
    "Using",
    "Heap region size",
    "Heap Region Size",
    "Consider",
    "Heuristics ergonomically sets",
    "Soft Max Heap Size",
    "[gc,init",
];

static HEAP_REGION_SIZE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Heap [Rr]egion [Ss]ize: ([0-9]+)([KMG])$").expect("valid region size regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass<'a> {
    Candidate,
    Noise,
    /// Informational line; carries the text after the last `]`.
    Auxiliary(&'a str),
}

#[derive(Debug, Clone)]
pub struct LineFilter {
    exclude: Vec<String>,
    log_only: Vec<String>,
}

impl Default for LineFilter {
    fn default() -> Self {
        Self::new(&[], &[])
    }
}

impl LineFilter {
    /// Built-in markers plus any extras from configuration.
    pub fn new(extra_exclude: &[String], extra_log_only: &[String]) -> Self {
        let exclude = EXCLUDE_MARKERS
            .iter()
            .map(|s| s.to_string())
            .chain(extra_exclude.iter().filter(|s| !s.is_empty()).cloned())
            .collect();
        let log_only = LOG_ONLY_MARKERS
            .iter()
            .map(|s| s.to_string())
            .chain(extra_log_only.iter().filter(|s| !s.is_empty()).cloned())
            .collect();
        Self { exclude, log_only }
    }

    pub fn classify<'a>(&self, line: &'a str) -> LineClass<'a> {
        let included = INCLUDE_MARKERS.iter().any(|m| line.contains(m));
        if !included || self.exclude.iter().any(|m| line.contains(m.as_str())) {
            return LineClass::Noise;
        }
        if self.log_only.iter().any(|m| line.contains(m.as_str())) {
            let text = line.rfind(']').map(|i| &line[i + 1..]).unwrap_or(line);
            return LineClass::Auxiliary(text);
        }
        LineClass::Candidate
    }
}

/// Region size announced by an auxiliary line, in kilobytes.
pub fn region_size_kb(text: &str) -> Option<Result<u64, LineError>> {
    let caps = HEAP_REGION_SIZE.captures(text.trim())?;
    Some(parse_memory(&caps[1], &caps[2]))
}
