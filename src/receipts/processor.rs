use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize, Serializer};
use std::path::Path;
use std::sync::Arc;

use super::category::{classify, Category};
use super::items::LineItem;
use super::merchant::truncate_merchant;
use super::number::MAX_PLAUSIBLE_AMOUNT;
use super::ocr::{OcrEngine, OcrError};
use super::parser::{parse_receipt_on, CURRENCY};

/// Merchant name the upload form sends when the user typed nothing.
pub const MERCHANT_PLACEHOLDER: &str = "Receipt";

/// Fields the user typed next to the upload. Anything present wins over what
/// the parser reads off the receipt.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExpenseOverrides {
    pub merchant: Option<String>,
    pub amount: Option<i64>,
    pub category: Option<Category>,
    pub date: Option<NaiveDate>,
}

/// What came back from the OCR step.
#[derive(Debug, Clone, PartialEq)]
pub enum OcrOutcome {
    /// No image was involved (manual entry).
    NotRequested,
    Recognized(String),
    Unavailable,
    Failed(String),
}

/// Stored in `expenses.ocr_status` and sent to clients under the same names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcrStatus {
    NotRequested,
    Recognized,
    Unavailable,
    Failed,
}

impl OcrStatus {
    pub const ALL: [OcrStatus; 4] = [
        OcrStatus::NotRequested,
        OcrStatus::Recognized,
        OcrStatus::Unavailable,
        OcrStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OcrStatus::NotRequested => "not_requested",
            OcrStatus::Recognized => "recognized",
            OcrStatus::Unavailable => "unavailable",
            OcrStatus::Failed => "failed",
        }
    }

    /// Unknown column values read as `NotRequested`.
    pub fn from_db(value: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .unwrap_or(OcrStatus::NotRequested)
    }
}

impl Serialize for OcrStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Whether the caller still has to fill in the amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftStatus {
    Processed,
    NeedsManualEntry,
}

impl DraftStatus {
    pub fn for_amount(amount: i64) -> Self {
        if amount > 0 {
            DraftStatus::Processed
        } else {
            DraftStatus::NeedsManualEntry
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            DraftStatus::Processed => "Receipt processed",
            DraftStatus::NeedsManualEntry => "Amount not detected, please enter the amount manually",
        }
    }
}

/// An expense ready to be stored. `amount == 0` is the stored "not detected"
/// value; [`ExpenseDraft::status`] tells the caller about it separately.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseDraft {
    pub merchant: String,
    pub amount: i64,
    pub date: NaiveDate,
    pub items: Vec<LineItem>,
    pub category: Category,
    pub currency: &'static str,
    pub raw_ocr_text: Option<String>,
    pub ocr_status: OcrStatus,
    pub ocr_error: Option<String>,
}

impl ExpenseDraft {
    pub fn status(&self) -> DraftStatus {
        DraftStatus::for_amount(self.amount)
    }
}

/// Checks a user-entered amount. Zero is allowed and means "fill in later".
pub fn validate_amount(amount: i64) -> Result<i64, String> {
    if (0..MAX_PLAUSIBLE_AMOUNT).contains(&amount) {
        Ok(amount)
    } else {
        Err(format!(
            "amount must be between 0 and {}",
            MAX_PLAUSIBLE_AMOUNT - 1
        ))
    }
}

fn is_placeholder(merchant: &str) -> bool {
    let merchant = merchant.trim();
    merchant.is_empty() || merchant.eq_ignore_ascii_case(MERCHANT_PLACEHOLDER)
}

/// Merges user input with whatever the OCR text yields.
///
/// User values always win. The parser fills the amount only when none (or 0)
/// was given, the merchant only when it is blank or the placeholder, and the
/// category is classified from the final merchant when the user left it out.
/// Never fails: every missing piece has a default.
pub fn resolve_draft(outcome: OcrOutcome, overrides: ExpenseOverrides, today: NaiveDate) -> ExpenseDraft {
    let (raw_ocr_text, ocr_status, ocr_error) = match outcome {
        OcrOutcome::NotRequested => (None, OcrStatus::NotRequested, None),
        OcrOutcome::Recognized(text) => (Some(text), OcrStatus::Recognized, None),
        OcrOutcome::Unavailable => (None, OcrStatus::Unavailable, None),
        OcrOutcome::Failed(reason) => (None, OcrStatus::Failed, Some(reason)),
    };
    let parsed = raw_ocr_text
        .as_deref()
        .map(|text| parse_receipt_on(text, today));

    let amount = overrides
        .amount
        .filter(|amount| *amount > 0 && *amount < MAX_PLAUSIBLE_AMOUNT)
        .or_else(|| parsed.as_ref().and_then(|p| p.amount))
        .unwrap_or(0);

    let merchant = overrides
        .merchant
        .filter(|m| !is_placeholder(m))
        .map(|m| truncate_merchant(&m))
        .or_else(|| parsed.as_ref().map(|p| p.merchant.clone()))
        .unwrap_or_default();

    let category = overrides
        .category
        .unwrap_or_else(|| classify(&merchant));

    let date = overrides
        .date
        .or_else(|| parsed.as_ref().map(|p| p.date))
        .unwrap_or(today);

    let items = parsed.map(|p| p.items).unwrap_or_default();

    ExpenseDraft {
        merchant,
        amount,
        date,
        items,
        category,
        currency: CURRENCY,
        raw_ocr_text,
        ocr_status,
        ocr_error,
    }
}

/// Runs an uploaded receipt through OCR and the parser.
#[derive(Clone)]
pub struct ReceiptProcessor {
    ocr: Arc<dyn OcrEngine>,
}

impl ReceiptProcessor {
    pub fn new(ocr: Arc<dyn OcrEngine>) -> Self {
        Self { ocr }
    }

    pub fn engine(&self) -> &dyn OcrEngine {
        self.ocr.as_ref()
    }

    /// OCR problems are folded into the outcome; nothing here is retried.
    pub async fn recognize(&self, image: &Path) -> OcrOutcome {
        if !self.ocr.is_available() {
            return OcrOutcome::Unavailable;
        }

        match self.ocr.recognize(image).await {
            Ok(text) => OcrOutcome::Recognized(text),
            Err(OcrError::Unavailable) => OcrOutcome::Unavailable,
            Err(e) => {
                log::warn!("OCR failed for {}: {}", image.display(), e);
                OcrOutcome::Failed(e.to_string())
            }
        }
    }

    pub async fn process(&self, image: &Path, overrides: ExpenseOverrides) -> ExpenseDraft {
        let outcome = self.recognize(image).await;
        let draft = resolve_draft(outcome, overrides, Local::now().date_naive());

        log::info!(
            "Processed receipt {}: amount={} category={} ocr={} status={:?}",
            image.display(),
            draft.amount,
            draft.category,
            draft.ocr_status.as_str(),
            draft.status()
        );
        draft
    }
}
