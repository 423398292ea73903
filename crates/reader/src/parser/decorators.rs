//! Decorator extraction and timestamp resolution.
//!
//! A unified-logging line looks like
//! `[2023-01-01T00:00:14.206+0000][14.206s][1672531214206ms][14205ms][1000014205707082ns][14205707082ns][6000][6008][info ][gc      ] GC(0) Pause Young (Normal) (G1 Evacuation Pause) 4115M->103M(8192M) 28.115ms`
//! where every bracket before `[level]` is optional but order is fixed.

use chrono::{DateTime, FixedOffset, Local, TimeZone};
use once_cell::sync::Lazy;
use regex::Regex;

use super::model::LineError;
use super::MIN_VALID_UNIX_TIME_MILLIS;

// The type alternatives cover plain labels, labels with the digit of "G1",
// serial "Phase N: ..." labels and ZGC stalls with thread names.
static DECORATORS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^",
        r"(?:\[(?P<time>[0-9T:.+\-]*)\])?",
        r"(?:\[(?P<uptime>[0-9.,]+)s *\])?",
        r"(?:\[(?P<timemillis>[0-9]+)ms *\])?",
        r"(?:\[(?P<uptimemillis>[0-9]+)ms *\])?",
        r"(?:\[(?P<timenanos>[0-9]+)ns *\])?",
        r"(?:\[(?P<uptimenanos>[0-9]+)ns *\])?",
        r"(?:\[(?P<pid>[0-9]+) *\])?",
        r"(?:\[(?P<tid>[0-9]+) *\])?",
        r"\[(?P<level>[^\]]+)\]",
        r"\[(?P<tags>[^\] ]+) *\]",
        r" ",
        r"(?:GC\((?P<gcnumber>[0-9]+)\) )?",
        r"(?P<type>(?:Phase [0-9]: [a-zA-Z ]+)|[-.a-zA-Z: ()]+|[a-zA-Z1 ()]+|[a-zA-Z ]+\(.+\))",
        r"(?: (?P<tail>[0-9].*)|$)",
    ))
    .expect("valid decorator regex")
});

/// Raw header fields of one line, borrowed from it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decorators<'a> {
    pub time: Option<&'a str>,
    pub uptime: Option<&'a str>,
    pub time_millis: Option<&'a str>,
    pub uptime_millis: Option<&'a str>,
    pub time_nanos: Option<&'a str>,
    pub uptime_nanos: Option<&'a str>,
    pub pid: Option<&'a str>,
    pub tid: Option<&'a str>,
    pub level: &'a str,
    pub tags: &'a str,
    pub gc_number: Option<&'a str>,
    pub type_label: &'a str,
    pub tail: Option<&'a str>,
}

impl<'a> Decorators<'a> {
    pub fn extract(line: &'a str) -> Result<Self, LineError> {
        let caps = DECORATORS.captures(line).ok_or(LineError::NoMatch)?;
        let get = |name: &str| caps.name(name).map(|m| m.as_str());
        Ok(Self {
            time: get("time"),
            uptime: get("uptime"),
            time_millis: get("timemillis"),
            uptime_millis: get("uptimemillis"),
            time_nanos: get("timenanos"),
            uptime_nanos: get("uptimenanos"),
            pid: get("pid"),
            tid: get("tid"),
            level: get("level").map(str::trim).unwrap_or_default(),
            tags: get("tags").map(str::trim).unwrap_or_default(),
            gc_number: get("gcnumber"),
            type_label: get("type").unwrap_or_default(),
            tail: get("tail"),
        })
    }

    pub fn cycle(&self) -> Result<Option<u32>, LineError> {
        self.gc_number.map(str::parse::<u32>).transpose().map_err(LineError::from)
    }

    /// Resolve wall-clock and uptime from whichever decorators are present.
    pub fn timestamps(&self) -> Result<Timestamps, LineError> {
        let mut stamps = Timestamps::default();

        if let Some(time) = self.time {
            stamps.datestamp = Some(parse_datestamp(time)?);
        }
        if let Some(uptime) = self.uptime.filter(|s| !s.is_empty()) {
            stamps.uptime = Some(uptime.replace(',', ".").parse::<f64>()?);
        }

        match (self.time_millis, self.uptime_millis) {
            // with two millisecond stamps the second one is the uptime
            (Some(epoch), Some(uptime)) => {
                if stamps.datestamp.is_none() {
                    stamps.datestamp = Some(datestamp_from_epoch_millis(epoch.parse::<i64>()?)?);
                }
                stamps.uptime = Some(uptime.parse::<u64>()? as f64 / 1000.0);
            }
            (Some(millis), None) => {
                let millis: i64 = millis.parse()?;
                if millis < MIN_VALID_UNIX_TIME_MILLIS {
                    stamps.uptime = Some(millis as f64 / 1000.0);
                } else {
                    stamps.datestamp = Some(datestamp_from_epoch_millis(millis)?);
                }
            }
            _ => {}
        }

        if let (Some(_), Some(uptime)) = (self.time_nanos, self.uptime_nanos) {
            stamps.uptime = Some(uptime.parse::<u64>()? as f64 / 1_000_000_000.0);
        }

        if stamps.datestamp.is_none() && stamps.uptime.is_none() {
            return Err(LineError::NoTime);
        }
        Ok(stamps)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Timestamps {
    pub datestamp: Option<DateTime<FixedOffset>>,
    /// seconds
    pub uptime: Option<f64>,
}

fn parse_datestamp(text: &str) -> Result<DateTime<FixedOffset>, LineError> {
    DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f%z")
        .or_else(|_| DateTime::parse_from_rfc3339(text))
        .map_err(|_| LineError::InvalidTimestamp(text.to_string()))
}

fn datestamp_from_epoch_millis(millis: i64) -> Result<DateTime<FixedOffset>, LineError> {
    Local
        .timestamp_millis_opt(millis)
        .single()
        .map(|dt| dt.fixed_offset())
        .ok_or_else(|| LineError::InvalidTimestamp(format!("{}ms", millis)))
}
