//! Bit-pattern listing output.
//!
//! Renders each word as its 16 bits grouped by the fields of its format,
//! the shape the historical listing file used. Reserved selectors never
//! come out of the encoder, but the renderer still handles them so it is
//! total over `u16`.

use sisa_core::encoding::{selector, FormatClass};

/// Formats a word's bits grouped by its format's fields.
///
/// `R3`: `ssss aaa bbb ddd fff`; `N6`: `ssss aaa bbb iiiiii`;
/// `N8`: `ssss rrr f iiiiiiii`. Words with a reserved selector fall back
/// to `ssss` plus the remaining 12 bits ungrouped.
#[must_use]
pub fn render_bits(word: u16) -> String {
    let sel = word >> 12;
    match FormatClass::from_selector(selector(word)) {
        Some(FormatClass::R3Arith | FormatClass::R3Compare) => format!(
            "{sel:04b} {:03b} {:03b} {:03b} {:03b}",
            (word >> 9) & 0x07,
            (word >> 6) & 0x07,
            (word >> 3) & 0x07,
            word & 0x07,
        ),
        Some(FormatClass::N6) => format!(
            "{sel:04b} {:03b} {:03b} {:06b}",
            (word >> 9) & 0x07,
            (word >> 6) & 0x07,
            word & 0x3F,
        ),
        Some(FormatClass::N8) => format!(
            "{sel:04b} {:03b} {:01b} {:08b}",
            (word >> 9) & 0x07,
            (word >> 8) & 0x01,
            word & 0xFF,
        ),
        None => format!("{sel:04b} {:012b}", word & 0x0FFF),
    }
}
