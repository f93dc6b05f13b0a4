//! Fragment decoding
//!
//! ## Overview
//!
//! Decoding is a pure, stateless mapping from one [`RawFragment`] to one
//! [`Reading`]. Everything numeric in a fragment lives in child-element text
//! content as `0x`-prefixed hexadecimal; no attributes are load-bearing. The
//! fragments are line-oriented — one leaf element per line — so a line
//! scanner is the whole parser, the same way the file stream formats are
//! hand-scanned rather than dragging in a markup crate for three fields.
//!
//! ## Scaling
//!
//! Both fragment kinds carry a `Multiplier` and `Divisor` pair; physical
//! values are `1000 × raw × Multiplier ÷ Divisor`.
//!
//! Demand needs one extra step: the register is a signed quantity transmitted
//! as unsigned 32-bit. When a house feeds power back (solar), the wire value
//! wraps to something enormous. Any scaled demand above 32768.0 W is taken as
//! wrapped and re-scaled from `raw − 2³²`.
//!
//! ## Partially-populated fragments
//!
//! The bridge occasionally emits a fragment with zeroed fields before its
//! registers settle. A zero `TimeStamp`, `Multiplier`, `Divisor`, or primary
//! quantity is never legitimate, so each is rejected as [`DecodeError::ZeroField`]
//! rather than scaled into a bogus reading. `SummationReceived` is exempt:
//! zero received energy is simply a house with no generation.
//!
//! Decode failures are non-fatal to the stream; the caller logs and moves on,
//! and no failure ever touches reconciliation state.

use crate::errors::DecodeError;
use crate::frame::{FragmentTag, RawFragment};
use crate::readings::Reading;
use crate::time::MeterTime;

/// Scaled demand above this is a wrapped negative, not a real draw.
const WRAP_THRESHOLD_WATTS: f64 = 32_768.0;

/// Decode one fragment into a typed reading.
pub fn decode(fragment: &RawFragment) -> Result<Reading, DecodeError> {
    let lines = fragment.lines();
    let tag = fragment.tag();

    match (lines.first(), lines.last()) {
        (Some(open), Some(close))
            if open.trim() == tag.open_tag() && close.trim() == tag.close_tag() => {}
        _ => return Err(DecodeError::MalformedFragment("open/close tags missing")),
    }

    let at = meter_time(lines)?;
    let multiplier = nonzero("Multiplier", hex_field(lines, "Multiplier")?)?;
    let divisor = nonzero("Divisor", hex_field(lines, "Divisor")?)?;

    match tag {
        FragmentTag::InstantaneousDemand => {
            let raw = nonzero("Demand", hex_field(lines, "Demand")?)?;
            let raw = u32::try_from(raw)
                .map_err(|_| DecodeError::MalformedFragment("Demand wider than 32 bits"))?;
            Ok(Reading::InstantaneousDemand {
                at,
                watts: scale_demand(raw, multiplier, divisor),
            })
        }
        FragmentTag::CurrentSummationDelivered => {
            let delivered = nonzero(
                "SummationDelivered",
                hex_field(lines, "SummationDelivered")?,
            )?;
            // Zero is legitimate here: no back-fed energy yet.
            let received = hex_field(lines, "SummationReceived")?;
            Ok(Reading::CumulativeSummation {
                at,
                delivered_wh: scale(delivered, multiplier, divisor),
                received_wh: scale(received, multiplier, divisor),
            })
        }
    }
}

fn meter_time(lines: &[String]) -> Result<MeterTime, DecodeError> {
    let secs = nonzero("TimeStamp", hex_field(lines, "TimeStamp")?)?;
    let secs = u32::try_from(secs)
        .map_err(|_| DecodeError::MalformedFragment("TimeStamp wider than 32 bits"))?;
    Ok(MeterTime::from_device_secs(secs))
}

fn scale(raw: u64, multiplier: u64, divisor: u64) -> f64 {
    1000.0 * raw as f64 * multiplier as f64 / divisor as f64
}

/// Two's-complement wraparound correction for the demand register.
fn scale_demand(raw: u32, multiplier: u64, divisor: u64) -> f64 {
    let scaled = scale(raw as u64, multiplier, divisor);
    if scaled > WRAP_THRESHOLD_WATTS {
        let signed = raw as i64 - 0x1_0000_0000;
        1000.0 * signed as f64 * multiplier as f64 / divisor as f64
    } else {
        scaled
    }
}

/// Text content of the named leaf element, if present on any line.
///
/// Matches `<Field>text</Field>` with optional surrounding whitespace; the
/// first occurrence wins.
fn leaf_text<'a>(lines: &'a [String], field: &str) -> Option<&'a str> {
    for line in lines {
        let trimmed = line.trim();
        let Some(rest) = trimmed.strip_prefix('<') else {
            continue;
        };
        let Some(rest) = rest.strip_prefix(field) else {
            continue;
        };
        let Some(rest) = rest.strip_prefix('>') else {
            continue;
        };
        let Some(rest) = rest.strip_suffix('>') else {
            continue;
        };
        let Some(rest) = rest.strip_suffix(field) else {
            continue;
        };
        let Some(text) = rest.strip_suffix("</") else {
            continue;
        };
        return Some(text);
    }
    None
}

/// Extract and hex-decode the named leaf element.
fn hex_field(lines: &[String], field: &'static str) -> Result<u64, DecodeError> {
    let text = leaf_text(lines, field).ok_or(DecodeError::MissingField(field))?;
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u64::from_str_radix(digits, 16).map_err(|_| DecodeError::NonHexField {
        field,
        text: text.to_string(),
    })
}

fn nonzero(field: &'static str, value: u64) -> Result<u64, DecodeError> {
    if value == 0 {
        Err(DecodeError::ZeroField(field))
    } else {
        Ok(value)
    }
}
