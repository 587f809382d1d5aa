//! Loosely formatted money strings.

/// Extract an amount of money from free text, e.g.
///
/// ```
/// use insiderforms::parse_money;
///
/// assert_eq!(parse_money("16000.69", None), Some(16000.69));
/// assert_eq!(parse_money("SGD16,000.69", None), Some(16000.69));
/// assert_eq!(parse_money("S$16000.69", None), Some(16000.69));
/// assert_eq!(parse_money("SGD$16.00069k", None), Some(16000.69));
/// assert_eq!(parse_money("SGD$16.9m", None), Some(16_900_000.0));
/// assert_eq!(parse_money("SGD16e3", None), Some(16000.0));
/// assert_eq!(parse_money("SGD16e2k", None), Some(1_600_000.0));
///
/// assert_eq!(parse_money("", Some(0.0)), Some(0.0));
/// assert_eq!(parse_money("16.9.0", None), None);
/// assert_eq!(parse_money("SGD16x10^9", None), None);
/// ```
///
/// The text between the first and last decimal digit is parsed as a float
/// (exponent notation allowed) and scaled by the magnitude suffix the text
/// *ends* with: `k`, `m`/`mm`, `b` or `t`. The suffix is not required to sit
/// next to the number, so `"5000 DKK"` reads as five million.
///
/// Returns the amount rounded to two decimal places, or `default` when the
/// text holds no digits or the digit span is not a number.
pub fn parse_money(text: &str, default: Option<f64>) -> Option<f64> {
    let text = text.to_lowercase().replace(',', "");

    let start = match text.find(|c: char| c.is_ascii_digit()) {
        Some(i) => i,
        None => return default,
    };
    // Digits are ASCII, so the byte after the last one ends the span.
    let end = match text.rfind(|c: char| c.is_ascii_digit()) {
        Some(i) => i + 1,
        None => return default,
    };

    let factor = magnitude(&text);
    let span = &text[start..end];
    log::trace!("{text} -> {span}");

    match span.parse::<f64>() {
        Ok(value) => Some(round_cents(value * factor)),
        Err(_) => default,
    }
}

/// Multiplier implied by the trailing character(s) of `text`.
fn magnitude(text: &str) -> f64 {
    if text.ends_with('k') {
        1e3
    } else if text.ends_with('m') {
        // also covers "mm"
        1e6
    } else if text.ends_with('b') {
        1e9
    } else if text.ends_with('t') {
        1e12
    } else {
        1.0
    }
}

/// Round to the nearest cent of the exact binary value, ties to even.
///
/// Float formatting expands the exact decimal value, so this does not
/// overflow for large amounts the way scaling by 100 would.
fn round_cents(value: f64) -> f64 {
    format!("{value:.2}").parse().unwrap_or(value)
}
