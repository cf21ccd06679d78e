use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::number::normalize_number;

const MAX_UNIT_PRICE: i64 = 1_000_000;

/// `ROTI SOBEK   1  8500`
static ITEM_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z][A-Za-z ]{2,29})\s+(\d+)\s+([\d.,]+)$").expect("item pattern is valid")
});

/// One purchased line on a receipt. Field names on the wire match the stored
/// expense documents (`qty`, `price`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    #[serde(rename = "qty")]
    pub quantity: u32,
    #[serde(rename = "price")]
    pub unit_price: Decimal,
}

impl LineItem {
    /// Bounds a user-supplied item the same way extracted items are bounded.
    pub fn is_plausible(&self) -> bool {
        !self.name.trim().is_empty()
            && self.unit_price > Decimal::ZERO
            && self.unit_price < Decimal::from(MAX_UNIT_PRICE)
    }
}

/// Best-effort scan for `<name> <qty> <price>` lines. Recall is expected to be
/// low; lines that do not fit the shape are skipped.
pub fn extract_items(text: &str) -> Vec<LineItem> {
    text.lines()
        .map(str::trim)
        .filter_map(parse_item_line)
        .collect()
}

fn parse_item_line(line: &str) -> Option<LineItem> {
    let caps = ITEM_LINE.captures(line)?;
    let item = LineItem {
        name: caps[1].trim().to_string(),
        quantity: caps[2].parse().ok()?,
        unit_price: normalize_number(&caps[3])?,
    };
    item.is_plausible().then_some(item)
}
