//! Grammars for the value text that follows a type label.
//!
//! Parsing is pure: [`parse`] turns a tail into a [`Measurement`] and only
//! [`Measurement::apply`] touches an event.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::model::{GcEvent, GcPattern, LineError};
use super::units::{millis_to_seconds, parse_memory};

const PAUSE: &str = r"([0-9]+[.,][0-9]+)ms";
const MEMORY: &str = r"(([0-9]+)([BKMG])(?:\([0-9]+[BKMG]\))?->([0-9]+)([BKMG])\(([0-9]+)([BKMG])\))";

static PAUSE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("^{}", PAUSE)).expect("valid pause regex"));
static MEMORY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("^{}", MEMORY)).expect("valid memory regex"));
static MEMORY_PAUSE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("^{}(?:(?: {})|$)?", MEMORY, PAUSE)).expect("valid memory pause regex")
});
static REGION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]+)->([0-9]+)(?:\(([0-9]+)\))?").expect("valid region regex"));
static MEMORY_PERCENTAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]+)([BKMG])\(([0-9]+)%\)->([0-9]+)([BKMG])\(([0-9]+)%\)")
        .expect("valid memory percentage regex")
});
static HEAP_MEMORY_PERCENTAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]+)([BKMG]) \(([0-9]+)%\)").expect("valid heap memory percentage regex")
});

/// Values read from one tail. Memory in kilobytes, pause in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measurement {
    /// Absent tail where one is tolerated
    Nothing,
    Pause(f64),
    Memory { pre: u64, post: u64, total: u64 },
    MemoryPause { pre: u64, post: u64, total: u64, pause: Option<f64> },
    Region { pre: u64, post: u64, total: Option<u64> },
    MemoryPercentage { pre: u64, post: u64, post_percent: u64 },
    HeapCapacity { total: u64 },
}

/// Parse `tail` with `pattern`.
///
/// `TailMismatch`/`UnexpectedTail` errors mean "keep the event unchanged";
/// `Number` errors mean the line must be dropped.
pub fn parse(pattern: GcPattern, tail: Option<&str>, region_size_kb: u64) -> Result<Measurement, LineError> {
    match pattern {
        GcPattern::None => match tail {
            Some(t) => Err(LineError::UnexpectedTail(t.to_string())),
            None => Ok(Measurement::Nothing),
        },
        // concurrent cycle starts are logged under "gc" without a pause
        GcPattern::Pause => match tail {
            None => Ok(Measurement::Nothing),
            Some(t) => {
                let caps = matched(&PAUSE_RE, pattern, Some(t))?;
                Ok(Measurement::Pause(millis_to_seconds(&caps[1])?))
            }
        },
        GcPattern::Memory => {
            let caps = matched(&MEMORY_RE, pattern, tail)?;
            let (pre, post, total) = memory(&caps)?;
            Ok(Measurement::Memory { pre, post, total })
        }
        GcPattern::MemoryPause => {
            let caps = matched(&MEMORY_PAUSE_RE, pattern, tail)?;
            let (pre, post, total) = memory(&caps)?;
            let pause = caps.get(8).map(|m| millis_to_seconds(m.as_str())).transpose()?;
            Ok(Measurement::MemoryPause { pre, post, total, pause })
        }
        GcPattern::Region => {
            let caps = matched(&REGION_RE, pattern, tail)?;
            let regions = |i: usize| -> Result<Option<u64>, LineError> {
                caps.get(i)
                    .map(|m| -> Result<u64, LineError> {
                        let count: u64 = m.as_str().parse()?;
                        count
                            .checked_mul(region_size_kb)
                            .ok_or_else(|| LineError::Number(format!("{} regions overflow", count)))
                    })
                    .transpose()
            };
            Ok(Measurement::Region {
                pre: regions(1)?.unwrap_or_default(),
                post: regions(2)?.unwrap_or_default(),
                total: regions(3)?,
            })
        }
        GcPattern::MemoryPercentage => {
            let caps = matched(&MEMORY_PERCENTAGE_RE, pattern, tail)?;
            Ok(Measurement::MemoryPercentage {
                pre: parse_memory(&caps[1], &caps[2])?,
                post: parse_memory(&caps[4], &caps[5])?,
                post_percent: caps[6].parse()?,
            })
        }
        GcPattern::HeapMemoryPercentage => {
            let caps = matched(&HEAP_MEMORY_PERCENTAGE_RE, pattern, tail)?;
            Ok(Measurement::HeapCapacity {
                total: parse_memory(&caps[1], &caps[2])?,
            })
        }
    }
}

fn matched<'t>(re: &Regex, pattern: GcPattern, tail: Option<&'t str>) -> Result<Captures<'t>, LineError> {
    tail.and_then(|t| re.captures(t)).ok_or_else(|| LineError::TailMismatch {
        expected: pattern.as_str(),
        tail: tail.map(str::to_string),
    })
}

fn memory(caps: &Captures<'_>) -> Result<(u64, u64, u64), LineError> {
    Ok((
        parse_memory(&caps[2], &caps[3])?,
        parse_memory(&caps[4], &caps[5])?,
        parse_memory(&caps[6], &caps[7])?,
    ))
}

impl Measurement {
    pub fn apply(self, event: &mut GcEvent) {
        match self {
            Measurement::Nothing => {}
            Measurement::Pause(pause) => event.pause = Some(pause),
            Measurement::Memory { pre, post, total } => set_memory(event, pre, post, total),
            Measurement::MemoryPause { pre, post, total, pause } => {
                if pause.is_some() {
                    event.pause = pause;
                }
                // detail lines already summed up the memory
                if !event.has_memory() {
                    set_memory(event, pre, post, total);
                }
            }
            Measurement::Region { pre, post, total } => {
                event.pre_used = pre;
                event.post_used = post;
                if let Some(total) = total {
                    event.total = total;
                }
            }
            Measurement::MemoryPercentage { pre, post, post_percent } => {
                event.pre_used = pre;
                event.post_used = post;
                if event.total == 0 && post_percent != 0 {
                    event.total = post / post_percent * 100;
                }
            }
            Measurement::HeapCapacity { total } => event.total = total,
        }
    }
}

fn set_memory(event: &mut GcEvent, pre: u64, post: u64, total: u64) {
    event.pre_used = pre;
    event.post_used = post;
    event.total = total;
}
