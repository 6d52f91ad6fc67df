//! Value-level cleaning functions.
//!
//! Pure functions over single cell values; the executor maps them over
//! columns.

pub mod numeric;
pub mod text;

pub use numeric::{parse_percent, parse_thousands, ratio, round_half_even, strip_decimal, zero_pad};
pub use text::{remove_char, strip_suffix, title_case};
