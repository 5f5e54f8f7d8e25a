//! Raw-reading decode helpers.
//!
//! The readout core hands its consumer a raw 16-bit value whose top 13
//! bits are the signed temperature at 0.0625 °C per count. Everything
//! here is downstream interpretation — the core itself never looks at
//! the bits.

/// First-decimal digit for each sixteenth of a degree, rounded half-up.
///
/// Entry 4 (0.25 °C → 2.5 tenths) deliberately rounds up to 3: the
/// table matches the encoding the shipped device used, not the
/// truncating value its commentary suggested.
pub const FRACTION_DIGIT: [u8; 16] = [0, 1, 1, 2, 3, 3, 4, 4, 5, 6, 6, 7, 8, 8, 9, 9];

/// Signed temperature counts from a raw reading (top 13 bits,
/// arithmetic shift).
#[must_use]
pub fn counts(raw: u16) -> i16 {
    (raw as i16) >> 3
}

/// Temperature in milli-degrees Celsius (0.0625 °C = 62.5 m°C per
/// count; the odd half rounds toward zero).
#[must_use]
pub fn millicelsius(raw: u16) -> i32 {
    i32::from(counts(raw)) * 125 / 2
}

/// Decompose a raw reading for a numeric display: sign, whole degrees,
/// and a single rounded decimal digit.
#[must_use]
pub fn display_parts(raw: u16) -> (bool, u16, u8) {
    let c = counts(raw);
    let negative = c < 0;
    let magnitude = c.unsigned_abs();
    (
        negative,
        magnitude / 16,
        FRACTION_DIGIT[(magnitude % 16) as usize],
    )
}

/// Format a raw reading as a human-readable temperature.
#[must_use]
pub fn format(raw: u16) -> String {
    let (negative, whole, tenths) = display_parts(raw);
    let sign = if negative { "-" } else { "" };
    format!("{sign}{whole}.{tenths} °C")
}
