use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use uuid::Uuid;
use chrono::{DateTime, NaiveDate, Utc};

use crate::receipts::{Category, DraftStatus, LineItem, OcrStatus};

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Expense {
    pub id: Uuid,
    pub user_id: Uuid,
    pub merchant: String,
    pub amount: i64,
    pub currency: String,
    pub expense_date: NaiveDate,
    pub category: String,
    pub items: Json<Vec<LineItem>>,
    pub receipt_url: Option<String>,
    pub raw_ocr_text: Option<String>,
    pub ocr_status: String,
    pub ocr_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Expense {
    /// Rows written before the category set was fixed may hold other text.
    pub fn category(&self) -> Category {
        self.category.parse().unwrap_or(Category::Others)
    }
}

/// What the API returns for one expense.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub merchant: String,
    pub amount: i64,
    pub currency: String,
    pub date: NaiveDate,
    pub category: Category,
    pub items: Vec<LineItem>,
    pub receipt_url: Option<String>,
    pub ocr_status: OcrStatus,
    pub status: DraftStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Expense> for ExpenseResponse {
    fn from(expense: Expense) -> Self {
        Self {
            category: expense.category(),
            ocr_status: OcrStatus::from_db(&expense.ocr_status),
            status: DraftStatus::for_amount(expense.amount),
            id: expense.id,
            user_id: expense.user_id,
            merchant: expense.merchant,
            amount: expense.amount,
            currency: expense.currency,
            date: expense.expense_date,
            items: expense.items.0,
            receipt_url: expense.receipt_url,
            created_at: expense.created_at,
            updated_at: expense.updated_at,
        }
    }
}

/// Body of a manual create or an edit. Absent fields stay untouched on edit.
#[derive(Debug, Default, Deserialize)]
pub struct ExpenseInput {
    pub merchant: Option<String>,
    pub amount: Option<i64>,
    pub category: Option<Category>,
    pub date: Option<NaiveDate>,
    pub items: Option<Vec<LineItem>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MonthFilter {
    pub month: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CategoryTotal {
    pub category: Category,
    pub total: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseSummary {
    pub month: Option<String>,
    pub total: i64,
    pub count: i64,
    pub by_category: Vec<CategoryTotal>,
}

impl ExpenseSummary {
    /// Builds the summary from `(category, sum, count)` rows. Every category is
    /// listed, in the frontend's order, even when it has no spending.
    pub fn from_rows(month: Option<String>, rows: &[(String, i64, i64)]) -> Self {
        let mut by_category: Vec<CategoryTotal> = Category::ALL
            .into_iter()
            .map(|category| CategoryTotal { category, total: 0 })
            .collect();
        let mut count = 0;

        for (name, total, rows_in_category) in rows {
            let category = name.parse().unwrap_or(Category::Others);
            if let Some(entry) = by_category.iter_mut().find(|e| e.category == category) {
                entry.total += total;
            }
            count += rows_in_category;
        }

        Self {
            month,
            total: by_category.iter().map(|e| e.total).sum(),
            count,
            by_category,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expense(category: &str, amount: i64) -> Expense {
        Expense {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            merchant: "INDOMARET".into(),
            amount,
            currency: "IDR".into(),
            expense_date: NaiveDate::from_ymd_opt(2024, 12, 25).unwrap(),
            category: category.into(),
            items: Json(vec![]),
            receipt_url: Some("/uploads/receipts/a.png".into()),
            raw_ocr_text: Some("INDOMARET".into()),
            ocr_status: "recognized".into(),
            ocr_error: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn response_uses_frontend_field_names() {
        let json = serde_json::to_value(ExpenseResponse::from(expense("Lifestyle", 17000))).unwrap();
        assert_eq!(json["merchant"], "INDOMARET");
        assert_eq!(json["amount"], 17000);
        assert_eq!(json["date"], "2024-12-25");
        assert_eq!(json["category"], "Lifestyle");
        assert_eq!(json["receiptUrl"], "/uploads/receipts/a.png");
        assert_eq!(json["ocrStatus"], "recognized");
        assert_eq!(json["status"], "processed");
        assert!(json.get("rawOcrText").is_none());
    }

    #[test]
    fn legacy_categories_read_as_others() {
        assert_eq!(expense("draft", 0).category(), Category::Others);
        let json = serde_json::to_value(ExpenseResponse::from(expense("draft", 0))).unwrap();
        assert_eq!(json["status"], "needs_manual_entry");
    }

    #[test]
    fn summary_lists_every_category() {
        let rows = vec![
            ("Food".to_string(), 45000, 3),
            ("Lifestyle".to_string(), 17000, 1),
            ("draft".to_string(), 5000, 1),
        ];
        let summary = ExpenseSummary::from_rows(Some("2024-12".into()), &rows);

        assert_eq!(summary.total, 67000);
        assert_eq!(summary.count, 5);
        assert_eq!(summary.by_category.len(), 7);
        let total_for = |c: Category| {
            summary
                .by_category
                .iter()
                .find(|e| e.category == c)
                .map(|e| e.total)
                .unwrap()
        };
        assert_eq!(total_for(Category::Food), 45000);
        assert_eq!(total_for(Category::Others), 5000);
        assert_eq!(total_for(Category::Health), 0);
    }
}
