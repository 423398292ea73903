//! JSON lines output.

use serde::Serialize;
use std::io::Write;

use reader::GcEvent;

#[derive(Serialize)]
struct EventLine<'a> {
    file: &'a str,
    #[serde(flatten)]
    event: &'a GcEvent,
}

/// Write `event` as one JSON object followed by a newline.
pub fn write_event<W: Write>(out: &mut W, file: &str, event: &GcEvent) -> anyhow::Result<()> {
    serde_json::to_writer(&mut *out, &EventLine { file, event })?;
    out.write_all(b"\n")?;
    Ok(())
}
