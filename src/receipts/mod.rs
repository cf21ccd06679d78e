//! Receipt OCR text to expense fields.
//!
//! Extractors are pure functions over the OCR text. `processor` ties them to
//! the OCR engine and decides what ends up in the stored expense.

pub mod category;
pub mod date;
pub mod items;
pub mod merchant;
pub mod number;
pub mod ocr;
pub mod parser;
pub mod processor;
pub mod total;

pub use category::Category;
pub use items::LineItem;
pub use ocr::{engine_from_settings, OcrEngine};
pub use parser::{parse_receipt, ParsedReceipt};
pub use processor::{
    resolve_draft, validate_amount, DraftStatus, ExpenseDraft, ExpenseOverrides, OcrOutcome,
    OcrStatus, ReceiptProcessor,
};
