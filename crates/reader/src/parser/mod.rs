/// Unified jvm logging parser
///
/// Turns the line-oriented gc output of `-Xlog:gc*` into structured gc
/// events, stitching multi-line collections back together.
///
/// # Architecture
///
/// - `filter.rs`: Candidate / noise / auxiliary line classification
/// - `decorators.rs`: Bracketed header fields and timestamp resolution
/// - `types.rs`: Built-in table of gc type labels
/// - `tail.rs`: Grammars for the values after the type label
/// - `router.rs`: Tag routing and the partial-event store
/// - `reader.rs`: The lazy per-input event iterator
/// - `metrics.rs`: Per-run counters
///
/// # Error Handling
///
/// Nothing that happens to a single line stops a run. Every anomaly is
/// reported to a `DiagnosticSink` with its line number and raw text.

pub mod traits;
pub mod model;
pub mod units;
pub mod types;
pub mod filter;
pub mod decorators;
pub mod tail;
pub mod router;
pub mod reader;
pub mod metrics;
pub mod diagnostics;

// Re-export commonly used types
pub use traits::{DiagnosticSink, TypeClassifier};
pub use model::{
    Concurrency, Diagnostic, DiagnosticCategory, EventVariant, ExtendedType, GcEvent, GcPattern,
    GcType, LineError,
};
pub use reader::{GcEvents, UnifiedLogReader};
pub use metrics::ParseStats;
pub use diagnostics::{CollectingSink, TracingSink};
pub use types::BuiltinTypes;

// Constants
pub const MAX_LINE_SIZE: usize = 1_048_576; // 1MB
pub const MIN_VALID_UNIX_TIME_MILLIS: i64 = 1_000_000_000_000; // 2001-09-09T01:46:40Z
