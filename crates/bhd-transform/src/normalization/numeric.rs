//! Numeric cleanup: zero padding, decimal artifacts, percentages and ratios.

use bhd_common::{parse_f64, parse_i64};

/// Left-pad an integer-looking value with zeros.
///
/// Whole decimals count as integers, so a ZIP stored as `95249.0` becomes
/// `95249`. Returns `None` for values that are not non-negative integers.
///
/// ```
/// use bhd_transform::normalization::zero_pad;
///
/// assert_eq!(zero_pad("5", 2).as_deref(), Some("05"));
/// assert_eq!(zero_pad("95249.0", 5).as_deref(), Some("95249"));
/// assert_eq!(zero_pad("CA", 5), None);
/// ```
pub fn zero_pad(value: &str, width: usize) -> Option<String> {
    let n = parse_i64(value).filter(|n| *n >= 0)?;
    Some(format!("{n:0width$}"))
}

/// Drop a zero fractional part (`2095551234.0` -> `2095551234`).
pub fn strip_decimal(value: &str) -> Option<String> {
    parse_i64(value).map(|n| n.to_string())
}

/// Parse a number that may carry thousands separators.
pub fn parse_thousands(value: &str) -> Option<f64> {
    parse_f64(&value.replace(',', ""))
}

/// Parse percentage text as a fraction: `"5.2%"` -> `0.052`.
///
/// Text without a percent sign is taken to be a fraction already.
pub fn parse_percent(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    match trimmed.strip_suffix('%') {
        Some(number) => parse_f64(number).map(|v| v / 100.0),
        None => parse_f64(trimmed),
    }
}

/// Round to `decimals` places, ties to even.
pub fn round_half_even(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round_ties_even() / factor
}

/// Rounded quotient; null operands and zero denominators give null.
pub fn ratio(numerator: Option<f64>, denominator: Option<f64>, decimals: u32) -> Option<f64> {
    let (n, d) = (numerator?, denominator?);
    if d == 0.0 {
        return None;
    }
    let value = round_half_even(n / d, decimals);
    value.is_finite().then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_pad_handles_widths() {
        assert_eq!(zero_pad("123", 4).as_deref(), Some("0123"));
        assert_eq!(zero_pad("0123", 4).as_deref(), Some("0123"));
        assert_eq!(zero_pad("123456", 5).as_deref(), Some("123456"));
        assert_eq!(zero_pad("-5", 2), None);
        assert_eq!(zero_pad("95249-1234", 5), None);
    }

    #[test]
    fn strip_decimal_only_touches_whole_numbers() {
        assert_eq!(strip_decimal("2095551234.0").as_deref(), Some("2095551234"));
        assert_eq!(strip_decimal("2095551234").as_deref(), Some("2095551234"));
        assert_eq!(strip_decimal("(209) 555-1234"), None);
        assert_eq!(strip_decimal("12.5"), None);
    }

    fn close(actual: Option<f64>, expected: f64) -> bool {
        actual.is_some_and(|v| (v - expected).abs() < 1e-12)
    }

    #[test]
    fn parses_percentages() {
        assert!(close(parse_percent("5.2%"), 0.052));
        assert!(close(parse_percent("-3%"), -0.03));
        assert_eq!(parse_percent(" 0.25 "), Some(0.25));
        assert_eq!(parse_percent("n/a"), None);
        assert_eq!(parse_percent("%"), None);
    }

    #[test]
    fn parses_thousands_separators() {
        assert_eq!(parse_thousands("45,292"), Some(45292.0));
        assert_eq!(parse_thousands("(X)"), None);
    }

    #[test]
    fn ratio_guards_zero_and_null() {
        assert_eq!(ratio(Some(30.0), Some(0.0), 2), None);
        assert_eq!(ratio(Some(40.0), Some(50.0), 2), Some(0.8));
        assert_eq!(ratio(None, Some(50.0), 2), None);
        assert_eq!(ratio(Some(1.0), Some(3.0), 4), Some(0.3333));
    }

    #[test]
    fn rounds_ties_to_even() {
        assert_eq!(round_half_even(0.125, 2), 0.12);
        assert_eq!(round_half_even(2.5, 0), 2.0);
    }
}
