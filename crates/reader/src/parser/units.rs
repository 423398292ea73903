//! Memory unit normalization. Everything the reader reports is in kilobytes.

use super::model::LineError;

/// Convert `value` expressed in `unit` (B, K, M or G) to kilobytes.
///
/// Bytes are rounded to the nearest kilobyte, half to even.
pub fn memory_in_kb(value: u64, unit: char) -> Result<u64, LineError> {
    let kb = match unit.to_ascii_uppercase() {
        'B' => return Ok(((value as f64) / 1024.0).round_ties_even() as u64),
        'K' => Some(value),
        'M' => value.checked_mul(1024),
        'G' => value.checked_mul(1024 * 1024),
        other => return Err(LineError::Number(format!("unknown memory unit '{}'", other))),
    };
    kb.ok_or_else(|| LineError::Number(format!("{}{} overflows", value, unit)))
}

/// Parse the decimal digits in `digits` and convert them with `unit`.
pub fn parse_memory(digits: &str, unit: &str) -> Result<u64, LineError> {
    let value: u64 = digits.parse()?;
    let unit = unit
        .chars()
        .next()
        .ok_or_else(|| LineError::Number(format!("missing unit after {}", digits)))?;
    memory_in_kb(value, unit)
}

/// Parse a millisecond figure such as `28.115` or `28,115` into seconds.
pub fn millis_to_seconds(text: &str) -> Result<f64, LineError> {
    let millis: f64 = text.replace(',', ".").parse()?;
    Ok(millis / 1000.0)
}
