// Unified jvm gc log reader.

pub mod parser;
pub mod conf;

pub use conf::ReaderConfig;
pub use parser::{
    CollectingSink, DiagnosticSink, GcEvent, GcEvents, LineError, ParseStats, TracingSink,
    UnifiedLogReader,
};
