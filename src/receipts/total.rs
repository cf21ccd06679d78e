use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

use super::number::{normalize_number, round_to_units};

/// Keyword-anchored total patterns, tried in priority order.
static TOTAL_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // TOTAL: Rp 17.000 / GRAND TOTAL 50.000 / Jumlah - 12.500, the figure
        // may sit on the line after the keyword
        r"(?i)(?:GRAND[ \t]*TOTAL|TOTAL|JUMLAH|BAYAR|TAGIHAN|AMOUNT|HARGA)[ \t]*[:\-]?[ \t]*(?:\r?\n[ \t]*)?(?:Rp\.?)?[ \t]*([\d.,]+)",
        // Rp 17.000 TOTAL
        r"(?i)Rp\.?[ \t]*([\d.,]+)[ \t]*(?:TOTAL|JUMLAH)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("total pattern is valid"))
    .collect()
});

static CURRENCY_AMOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Rp\.?[ \t]*([\d.,]+)").expect("currency pattern is valid"));

/// Finds the receipt total in whole currency units.
///
/// Every keyword-anchored figure is a candidate and the largest plausible one
/// wins, since receipts repeat amounts for subtotal, discount, cash and change
/// and the grand total is usually the biggest. When no keyword yields a
/// figure, the largest bare `Rp` amount is used. This is a heuristic: a cash
/// line bigger than the total will win. `None` means nothing was detected.
pub fn extract_total(text: &str) -> Option<i64> {
    largest_capture(TOTAL_PATTERNS.iter(), text)
        .or_else(|| largest_capture(std::iter::once(&*CURRENCY_AMOUNT), text))
        .map(round_to_units)
        .filter(|amount| *amount > 0)
}

fn largest_capture<'a>(
    patterns: impl Iterator<Item = &'a Regex>,
    text: &str,
) -> Option<Decimal> {
    patterns
        .flat_map(|re| re.captures_iter(text))
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| normalize_number(m.as_str()))
        .max()
}
