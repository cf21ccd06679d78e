use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Exclusive upper bound for any figure read off a receipt, in whole Rupiah.
///
/// Anything at or above it is treated as OCR noise (card numbers, phone
/// numbers, transaction ids) rather than money. Tune it here if the service
/// ever has to accept larger receipts.
pub const MAX_PLAUSIBLE_AMOUNT: i64 = 10_000_000;

/// Converts an Indonesian-formatted number (`12.500,50`) into a decimal.
///
/// A `.` is a thousands separator only when exactly three digits follow it
/// before a token boundary; every remaining `,` is the decimal point. Returns
/// `None` for anything that does not parse or falls outside
/// `(0, MAX_PLAUSIBLE_AMOUNT)`.
pub fn normalize_number(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim().trim_end_matches(&['.', ','][..]);
    if trimmed.is_empty() {
        return None;
    }

    let chars: Vec<char> = trimmed.chars().collect();
    let mut canonical = String::with_capacity(chars.len());
    for (i, &c) in chars.iter().enumerate() {
        match c {
            '.' if is_thousands_separator(&chars, i) => {}
            ',' => canonical.push('.'),
            _ => canonical.push(c),
        }
    }

    let value = Decimal::from_str(&canonical).ok()?;
    is_plausible(value).then_some(value)
}

/// Normalizes and rounds half away from zero to whole currency units.
pub fn normalize_amount(raw: &str) -> Option<i64> {
    normalize_number(raw).map(round_to_units)
}

pub fn round_to_units(value: Decimal) -> i64 {
    value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(0)
}

pub fn is_plausible(value: Decimal) -> bool {
    value > Decimal::ZERO && value < Decimal::from(MAX_PLAUSIBLE_AMOUNT)
}

fn is_thousands_separator(chars: &[char], dot: usize) -> bool {
    let rest = &chars[dot + 1..];
    rest.len() >= 3
        && rest[..3].iter().all(|c| c.is_ascii_digit())
        && rest.get(3).map_or(true, |c| !is_word_char(*c))
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn strips_grouping_dots_and_converts_decimal_comma() {
        assert_eq!(normalize_number("12.500,50"), Some(dec("12500.50")));
        assert_eq!(normalize_number("1.250.000"), Some(dec("1250000")));
        assert_eq!(normalize_number("45.000"), Some(dec("45000")));
    }

    #[test]
    fn plain_integers_pass_through() {
        assert_eq!(normalize_number("8500"), Some(dec("8500")));
        assert_eq!(normalize_number(" 17000 "), Some(dec("17000")));
    }

    #[test]
    fn dot_with_two_digits_is_a_decimal_point() {
        assert_eq!(normalize_number("12.50"), Some(dec("12.50")));
    }

    #[test]
    fn dot_followed_by_four_digits_is_not_grouping() {
        assert_eq!(normalize_number("1.2345"), Some(dec("1.2345")));
    }

    #[test]
    fn trailing_separator_is_ignored() {
        assert_eq!(normalize_number("17.000."), Some(dec("17000")));
        assert_eq!(normalize_number("17.000,"), Some(dec("17000")));
    }

    #[test]
    fn rejects_implausible_magnitudes() {
        assert_eq!(normalize_number("10.000.000"), None);
        assert_eq!(normalize_number("123456789"), None);
        assert_eq!(normalize_number("0"), None);
        assert_eq!(normalize_number("0,00"), None);
        assert!(normalize_number("9.999.999").is_some());
    }

    #[test]
    fn rejects_non_numbers() {
        assert_eq!(normalize_number(""), None);
        assert_eq!(normalize_number("."), None);
        assert_eq!(normalize_number("1,234,567"), None);
        assert_eq!(normalize_number("abc"), None);
    }

    #[test]
    fn amounts_round_half_away_from_zero() {
        assert_eq!(normalize_amount("12.500,50"), Some(12501));
        assert_eq!(normalize_amount("12.500,49"), Some(12500));
        assert_eq!(normalize_amount("99,5"), Some(100));
        assert_eq!(normalize_amount("garbage"), None);
    }
}
