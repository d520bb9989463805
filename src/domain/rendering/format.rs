//! Locale-aware formatting engine.
//!
//! Every function here is pure and fail-soft: a value that cannot be parsed
//! produces a sentinel string (the zero-formatted amount, an empty string, or
//! the input unchanged), never an error. A single malformed field must not
//! abort rendering an otherwise-valid document; structural validation is the
//! renderer's job, not the formatter's.

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

use crate::domain::sale::Language;

/// Thousands / decimal separator pair for a language.
fn separators(lang: Language) -> (char, char) {
  match lang {
    Language::It | Language::De => ('.', ','),
    Language::En | Language::Fr => (',', '.'),
  }
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
  Decimal::from_str(raw.trim()).ok()
}

fn group_thousands(digits: &str, sep: char) -> String {
  let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
  let len = digits.len();
  for (i, c) in digits.chars().enumerate() {
    if i > 0 && (len - i) % 3 == 0 {
      grouped.push(sep);
    }
    grouped.push(c);
  }
  grouped
}

/// Renders a decimal with exactly `scale` decimals and locale separators.
fn localize(value: Decimal, scale: u32, lang: Language) -> String {
  let (thousands, decimal) = separators(lang);
  let negative = value.is_sign_negative();
  let abs = value.abs();
  let plain = format!("{:.*}", scale as usize, abs);
  let (int_part, frac_part) = match plain.split_once('.') {
    Some((i, f)) => (i.to_string(), f.to_string()),
    None => (plain, String::new()),
  };
  let mut out = String::new();
  if negative {
    out.push('-');
  }
  out.push_str(&group_thousands(&int_part, thousands));
  if !frac_part.is_empty() {
    out.push(decimal);
    out.push_str(&frac_part);
  }
  out
}

/// Two fixed decimals, locale separators. Unparsable input yields the
/// zero-formatted string.
pub fn format_amount(raw: &str, lang: Language) -> String {
  let value = parse_decimal(raw).unwrap_or(Decimal::ZERO);
  format_amount_decimal(value, lang)
}

pub fn format_amount_decimal(value: Decimal, lang: Language) -> String {
  let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
  localize(rounded, 2, lang)
}

/// 2 to 8 decimals; trailing zeros beyond the second decimal are trimmed,
/// but never below two decimals.
pub fn format_flex_amount(raw: &str, lang: Language) -> String {
  let value = parse_decimal(raw).unwrap_or(Decimal::ZERO);
  let rounded = value.round_dp_with_strategy(8, RoundingStrategy::MidpointAwayFromZero);
  let scale = rounded.normalize().scale().clamp(2, 8);
  localize(rounded, scale, lang)
}

/// Percentage with trailing zeros trimmed entirely: 22.00 -> "22",
/// 22.50 -> "22.5".
pub fn format_percent(raw: &str, lang: Language) -> String {
  let value = parse_decimal(raw).unwrap_or(Decimal::ZERO);
  let normalized = value
    .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    .normalize();
  localize(normalized, normalized.scale(), lang)
}

/// Integer-only quantity with locale thousands separator. Fractional input
/// is floored.
pub fn format_quantity(raw: &str, lang: Language) -> String {
  let value = parse_decimal(raw).unwrap_or(Decimal::ZERO);
  localize(value.floor(), 0, lang)
}

fn parse_yyyymmdd(raw: &str) -> Option<(u32, u32, u32)> {
  let trimmed = raw.trim();
  if trimmed.len() != 8 || !trimmed.chars().all(|c| c.is_ascii_digit()) {
    return None;
  }
  let year: u32 = trimmed[0..4].parse().ok()?;
  let month: u32 = trimmed[4..6].parse().ok()?;
  let day: u32 = trimmed[6..8].parse().ok()?;
  if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
    return None;
  }
  Some((year, month, day))
}

/// Formats an 8-digit YYYYMMDD date per locale. Unparsable input is
/// returned unchanged; empty input yields an empty string.
pub fn format_date(raw: &str, lang: Language) -> String {
  if raw.trim().is_empty() {
    return String::new();
  }
  match parse_yyyymmdd(raw) {
    Some((year, month, day)) => match lang {
      Language::It | Language::Fr => format!("{:02}/{:02}/{:04}", day, month, year),
      Language::De => format!("{:02}.{:02}.{:04}", day, month, year),
      Language::En => format!("{:02}/{:02}/{:04}", month, day, year),
    },
    None => raw.to_string(),
  }
}

/// Strict less-than on YYYYMMDD dates; equal dates are not "before".
/// Unparsable input compares as not-before.
pub fn date_before(a: &str, b: &str) -> bool {
  match (parse_yyyymmdd(a), parse_yyyymmdd(b)) {
    (Some(left), Some(right)) => left < right,
    _ => false,
  }
}
