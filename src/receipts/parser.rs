use chrono::{Local, NaiveDate};
use serde::Serialize;

use super::category::{classify, Category};
use super::date::extract_date;
use super::items::{extract_items, LineItem};
use super::merchant::extract_merchant;
use super::total::extract_total;

/// The only currency receipts are read in.
pub const CURRENCY: &str = "IDR";

/// Structured fields read from one receipt's OCR text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedReceipt {
    pub merchant: String,
    /// `None` when no plausible total was found.
    pub amount: Option<i64>,
    pub date: NaiveDate,
    pub items: Vec<LineItem>,
    pub category: Category,
    pub currency: &'static str,
}

pub fn parse_receipt(text: &str) -> ParsedReceipt {
    parse_receipt_on(text, Local::now().date_naive())
}

/// Same as [`parse_receipt`] with an explicit fallback date.
pub fn parse_receipt_on(text: &str, today: NaiveDate) -> ParsedReceipt {
    let merchant = extract_merchant(text);
    let category = classify(&merchant);

    ParsedReceipt {
        amount: extract_total(text),
        date: extract_date(text, today),
        items: extract_items(text),
        merchant,
        category,
        currency: CURRENCY,
    }
}
