//! Number formatting for the report.
//!
//! Values are rounded to a number of significant digits, printed in fixed
//! point (never scientific notation) and then adapted to the document's
//! conventions: decimal comma, no narrow no-break-space digit grouping and
//! TeX-escaped percent signs.

use regex::Regex;
use std::sync::OnceLock;

/// Values closer than this to zero are treated as zero.
const TOLERANCE: f64 = 1e-7;
const TOLERANCE_DIGITS: i32 = 7;
/// More significant digits than an f64 carries are not printed.
pub const MAX_SIGNIFICANT_DIGITS: i32 = 17;

fn is_zero(x: f64) -> bool {
    x.abs() < TOLERANCE
}

/// Round `x` to `n` decimal places; negative `n` rounds to tens, hundreds, ...
fn round_n(x: f64, n: i32) -> f64 {
    let p = 10f64.powi(n.abs());
    if !p.is_finite() {
        return if n >= 0 { x } else { 0.0 };
    }
    if n >= 0 {
        (x * p).round() / p
    } else {
        (x / p).round() * p
    }
}

/// Decimal exponent of the leading digit of `x`, 0 for values near zero.
pub fn decimal_exponent(x: f64) -> i32 {
    if is_zero(x) || !x.is_finite() {
        return 0;
    }
    x.abs().log10().floor() as i32
}

/// Round `x` to `n` significant digits (at most [`MAX_SIGNIFICANT_DIGITS`]).
pub fn round_to_significant(x: f64, n: i32) -> f64 {
    let n = n.clamp(1, MAX_SIGNIFICANT_DIGITS);
    let e = decimal_exponent(x);
    round_n(round_n(x, n - 1 - e), TOLERANCE_DIGITS.max(n - 1 - e))
}

/// Fixed-point text with exactly `decimals` digits after the point.
///
/// `decimals <= 0` rounds to the matching power of ten and prints no point.
/// Anything that rounds to within the tolerance of zero prints as `"0"`.
pub fn format_fixed(x: f64, decimals: i32) -> String {
    if !x.is_finite() {
        return x.to_string();
    }
    let rounded = round_n(x.abs(), decimals);
    if is_zero(rounded) {
        return "0".to_string();
    }
    let body = if decimals <= 0 {
        format!("{:.0}", rounded)
    } else {
        format!("{:.*}", decimals as usize, rounded)
    };
    if x < 0.0 { format!("-{}", body) } else { body }
}

/// Fixed-point text of `x` rounded to `n` significant digits (at most
/// [`MAX_SIGNIFICANT_DIGITS`]).
pub fn format_significant(x: f64, n: i32) -> String {
    let n = n.clamp(1, MAX_SIGNIFICANT_DIGITS);
    format_fixed(x, n - 1 - decimal_exponent(x))
}

/// [`format_significant`] followed by [`display_number`].
pub fn round_digits_str(x: f64, n: i32) -> String {
    display_number(&format_significant(x, n))
}

fn decimal_point_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d)\.(\d)").expect("decimal point regex must compile"))
}

/// Adapt a plain number text for the document.
///
/// - narrow no-break spaces used as digit separators are removed
/// - the decimal point becomes a comma
/// - a trailing `%` gets a non-breaking space in front of it
/// - every unescaped `%` is escaped for TeX
pub fn display_number(text: &str) -> String {
    let text: String = text.chars().filter(|&c| c != '\u{202F}').collect();
    let text = decimal_point_re().replace_all(&text, "${1},${2}");

    let trimmed = text.trim_end();
    let text = match trimmed.strip_suffix('%') {
        Some(body) if !body.ends_with('\\') => format!("{}~%", body.trim_end()),
        _ => trimmed.to_string(),
    };
    escape_percent(&text)
}

/// Escape every `%` that is not already preceded by a backslash.
pub fn escape_percent(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 4);
    let mut prev = None;
    for ch in text.chars() {
        if ch == '%' && prev != Some('\\') {
            out.push('\\');
        }
        out.push(ch);
        prev = Some(ch);
    }
    out
}

/// Escape the TeX specials that show up in addresses and plain cell text.
pub fn escape_tex(text: &str) -> String {
    escape_percent(&text.replace('_', r"\_").replace('$', r"\$"))
}

/// Replace a decimal point between digits with a comma, leaving everything else.
pub fn fix_comma(text: &str) -> String {
    decimal_point_re().replace_all(text, "${1},${2}").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_digits_str_examples() {
        assert_eq!(round_digits_str(3.14159, 3), "3,14");
        assert_eq!(round_digits_str(0.0001234, 2), "0,00012");
        assert_eq!(round_digits_str(-0.00000001, 3), "0");
    }

    #[test]
    fn test_round_digits_str_large_values() {
        assert_eq!(round_digits_str(123456.0, 3), "123000");
        assert_eq!(round_digits_str(-987.6, 2), "-990");
        assert_eq!(round_digits_str(12.0, 3), "12,0");
    }

    #[test]
    fn test_huge_digit_counts_are_clamped() {
        assert_eq!(round_digits_str(2.5, 400), "2,5000000000000000");
        assert_eq!(round_to_significant(2.5, 400), 2.5);
        assert_eq!(format_fixed(2.5, 400).len(), 402);
        assert_eq!(format_fixed(1234.0, -400), "0");
    }

    #[test]
    fn test_format_fixed_pads_with_zeros() {
        assert_eq!(format_fixed(2.5, 3), "2.500");
        assert_eq!(format_fixed(-2.5, 1), "-2.5");
        assert_eq!(format_fixed(1234.5, -2), "1200");
        assert_eq!(format_fixed(0.04, 1), "0");
    }

    #[test]
    fn test_format_fixed_never_negative_zero() {
        assert_eq!(format_fixed(-0.0000000001, 5), "0");
        assert_eq!(format_fixed(-0.0, 2), "0");
    }

    #[test]
    fn test_round_to_significant() {
        assert!((round_to_significant(3.14159, 3) - 3.14).abs() < 1e-12);
        assert!((round_to_significant(-0.0001234, 2) + 0.00012).abs() < 1e-12);
        assert!((round_to_significant(98765.0, 2) - 99000.0).abs() < 1e-9);
        assert_eq!(round_to_significant(0.0, 3), 0.0);
    }

    #[test]
    fn test_decimal_exponent_near_zero() {
        assert_eq!(decimal_exponent(0.0), 0);
        assert_eq!(decimal_exponent(5e-9), 0);
        assert_eq!(decimal_exponent(5e-3), -3);
        assert_eq!(decimal_exponent(-450.0), 2);
    }

    #[test]
    fn test_display_number_percent_handling() {
        assert_eq!(display_number("15%"), r"15~\%");
        assert_eq!(display_number("12.5 %"), r"12,5~\%");
        assert_eq!(display_number(r"15\%"), r"15\%");
        assert_eq!(display_number("5% of 7"), r"5\% of 7");
    }

    #[test]
    fn test_display_number_strips_narrow_spaces() {
        assert_eq!(display_number("1\u{202F}234.5"), "1234,5");
    }

    #[test]
    fn test_escape_tex() {
        assert_eq!(escape_tex("Calc_1.A$2 50%"), r"Calc\_1.A\$2 50\%");
    }
}
