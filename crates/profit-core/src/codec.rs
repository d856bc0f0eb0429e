//! Amount parsing and display formatting
//!
//! Amounts reach us as free-form text with inconsistent separators
//! ("1.234,56", "5.400", "12345.123", "12,5"). Parsing never fails: anything
//! unreadable degrades to `0.0`. Display text groups thousands with `.` and
//! uses `,` as the decimal separator ("8.698,932").

use serde_json::Value;

/// Fractional digits an `f64` can carry meaningfully
const MAX_DECIMALS: u32 = 15;

/// Parse a free-form amount into a non-negative value.
///
/// Separator resolution:
/// - a comma anywhere makes it the decimal separator and every period a
///   thousands separator ("1.234,56" -> 1234.56, "12,5" -> 12.5)
/// - periods only, laid out as thousands groups ("5.400", "1.234.567"),
///   are grouping
/// - otherwise a trailing group of exactly three digits after the last
///   period is a fraction ("12345.123")
/// - any other period layout is grouping and the periods are dropped
///
/// "5.400" could also mean 5.4; the thousands reading wins. Known ambiguity.
pub fn parse_amount(text: &str) -> f64 {
    let s: String = text.chars().filter(|c| !c.is_whitespace()).collect();

    let canonical = if s.contains(',') {
        s.replace('.', "").replace(',', ".")
    } else if s.contains('.') {
        if is_thousands_grouped(&s) || !has_three_digit_tail(&s) {
            s.replace('.', "")
        } else {
            s
        }
    } else {
        s
    };

    non_negative(parse_leading_float(&canonical).unwrap_or(0.0))
}

/// Decode an amount field as delivered by the backend: JSON numbers are taken
/// as-is, strings go through [`parse_amount`], anything else is zero.
pub fn decode_value(value: &Value) -> f64 {
    match value {
        Value::Number(n) => non_negative(n.as_f64().unwrap_or(0.0)),
        Value::String(s) => parse_amount(s),
        _ => 0.0,
    }
}

/// Format with grouped thousands and whatever fraction the value carries:
/// `1234567.0` -> "1.234.567", `1234.5` -> "1.234,5".
pub fn format_grouped(value: f64) -> String {
    if value == 0.0 || !value.is_finite() {
        return "0".to_string();
    }
    let text = value.to_string();
    let (sign, unsigned) = split_sign(&text);
    match unsigned.split_once('.') {
        Some((int, frac)) => format!("{}{},{}", sign, group_thousands(int), frac),
        None => format!("{}{}", sign, group_thousands(unsigned)),
    }
}

/// Format rounded (half-up) to at most `max_decimals` fractional digits,
/// trailing zeros stripped: `1234.5678` -> "1.234,568", `2.50` -> "2,5".
/// Precision beyond `MAX_DECIMALS` is not representable and is capped.
pub fn format_limited(value: f64, max_decimals: u32) -> String {
    if value == 0.0 || !value.is_finite() {
        return "0".to_string();
    }

    let max_decimals = max_decimals.min(MAX_DECIMALS);
    let factor = 10f64.powi(max_decimals as i32);
    let scaled = (value * factor + 0.5).floor() / factor;
    let rounded = if scaled.is_finite() { scaled } else { value };
    if rounded == 0.0 {
        return "0".to_string();
    }

    let text = rounded.to_string();
    let (sign, unsigned) = split_sign(&text);
    let (int, frac) = unsigned.split_once('.').unwrap_or((unsigned, ""));

    let frac: String = frac.chars().take(max_decimals as usize).collect();
    let frac = frac.trim_end_matches('0');

    if frac.is_empty() {
        format!("{}{}", sign, group_thousands(int))
    } else {
        format!("{}{},{}", sign, group_thousands(int), frac)
    }
}

/// Insert `.` between every three digits, counting from the right
fn group_thousands(digits: &str) -> String {
    let mut result = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            result.push('.');
        }
        result.push(c);
    }
    result
}

fn split_sign(text: &str) -> (&str, &str) {
    match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text),
    }
}

/// "5.400", "1.234.567": a 1-3 digit lead (not starting with 0) followed by
/// 3-digit groups
fn is_thousands_grouped(s: &str) -> bool {
    let s = s.trim_start_matches(['+', '-']);
    let mut groups = s.split('.');
    let lead = groups.next().unwrap_or_default();

    let lead_ok = (1..=3).contains(&lead.len())
        && lead.bytes().all(|b| b.is_ascii_digit())
        && !lead.starts_with('0');

    let mut rest = groups.peekable();
    lead_ok
        && rest.peek().is_some()
        && rest.all(|g| g.len() == 3 && g.bytes().all(|b| b.is_ascii_digit()))
}

fn has_three_digit_tail(s: &str) -> bool {
    s.rsplit('.')
        .next()
        .is_some_and(|tail| tail.len() == 3 && tail.bytes().all(|b| b.is_ascii_digit()))
}

/// Parse the longest numeric prefix ("12.5abc" -> 12.5, "1.2.3" -> 1.2).
/// `None` when no digits lead the text.
fn parse_leading_float(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if frac_end > frac_start {
            digits += frac_end - frac_start;
            end = frac_end;
        }
    }

    if digits == 0 {
        return None;
    }

    // Exponent only counts when digits follow it
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok()
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}
