// Utility helpers for parsing and display formatting.
//
// This module centralizes the "dirty" text/number handling so the rest of
// the code can assume clean, typed values.
use num_format::{Locale, ToFormattedString};

/// Lowercase and trim a header or categorical cell for matching.
pub fn normalize_text(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Parse a year cell into `i32` while being forgiving about formatting
/// issues that are common in CSV exports.
///
/// - Trims whitespace.
/// - Rejects values that contain alphabetic characters.
/// - Accepts float renderings of whole years (e.g. `"2024.0"`), which some
///   exporters produce for numeric columns.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_year_safe(s: &str) -> Option<i32> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    if let Ok(y) = s.parse::<i32>() {
        return Some(y);
    }
    match s.parse::<f64>() {
        Ok(f) if f.fract() == 0.0 && (f as i64) >= i32::MIN as i64 && (f as i64) <= i32::MAX as i64 => {
            Some(f as i32)
        }
        _ => None,
    }
}

/// Uppercase the first character, e.g. `"janeiro"` → `"Janeiro"`.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Format a floating-point value with a fixed number of decimal places and
/// locale-aware thousands separators (e.g. `1,234,567.89`).
pub fn format_number(n: f64, decimals: usize) -> String {
    let neg = n.is_sign_negative();
    let abs_n = n.abs();
    let s = format!("{:.*}", decimals, abs_n);
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    } else if decimals > 0 {
        res.push('.');
        res.push_str(&"0".repeat(decimals));
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

/// Thin wrapper around `num-format` for integer-like values, used for counts
/// in console messages (e.g. `9,855 rows loaded`).
pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}
