use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::Multipart;
use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::types::Json as DbJson;
use uuid::Uuid;

use super::AppState;
use crate::{
    database::Database,
    error::ApiError,
    middleware::CurrentUser,
    models::{Expense, ExpenseInput, ExpenseResponse, ExpenseSummary, MonthFilter},
    receipts::{
        merchant::truncate_merchant, number::normalize_amount, parse_receipt, resolve_draft,
        validate_amount, Category, DraftStatus, ExpenseDraft, ExpenseOverrides, LineItem,
        OcrOutcome, OcrStatus, ParsedReceipt,
    },
    utils::uploads::{remove_receipt, save_receipt, ReceiptGuard},
};

/// Multipart fields that carry the receipt file, in order of preference.
const FILE_FIELDS: [&str; 3] = ["receipt", "file", "image"];

#[derive(Debug, Serialize)]
pub struct OcrReport {
    pub status: OcrStatus,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub expense: ExpenseResponse,
    pub status: DraftStatus,
    pub message: &'static str,
    pub ocr: OcrReport,
    pub ocr_raw: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ParseRequest {
    pub text: String,
}

pub async fn upload_receipt(
    user: CurrentUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let (overrides, receipt) = parse_upload_multipart(multipart).await?;
    let receipt = receipt.ok_or_else(|| ApiError::BadRequest("No receipt file was uploaded".to_string()))?;

    let stored = save_receipt(&state.config.upload_dir, &receipt.file_name, &receipt.data).await?;
    // Removes the file on any early return, including a request timeout.
    let guard = ReceiptGuard::new(&stored.path);

    let draft = state.receipts.process(&stored.path, overrides).await;
    let expense = insert_expense(&state.db, user.id, &draft, Some(&stored.url)).await?;
    guard.keep();

    let status = draft.status();
    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            expense: expense.into(),
            status,
            message: status.message(),
            ocr: OcrReport {
                status: draft.ocr_status,
                error: draft.ocr_error,
            },
            ocr_raw: draft.raw_ocr_text,
        }),
    ))
}

pub async fn create_expense(
    user: CurrentUser,
    State(state): State<AppState>,
    Json(input): Json<ExpenseInput>,
) -> Result<(StatusCode, Json<ExpenseResponse>), ApiError> {
    let amount = input.amount.map(validate_amount).transpose().map_err(ApiError::BadRequest)?;
    let items = input.items.map(validate_items).transpose()?;

    let overrides = ExpenseOverrides {
        merchant: input.merchant,
        amount,
        category: input.category,
        date: input.date,
    };
    let mut draft = resolve_draft(OcrOutcome::NotRequested, overrides, Local::now().date_naive());
    if let Some(items) = items {
        draft.items = items;
    }

    let expense = insert_expense(&state.db, user.id, &draft, None).await?;
    Ok((StatusCode::CREATED, Json(expense.into())))
}

pub async fn list_expenses(
    user: CurrentUser,
    State(state): State<AppState>,
    Query(filter): Query<MonthFilter>,
) -> Result<Json<Vec<ExpenseResponse>>, ApiError> {
    let (start, end) = month_bounds(filter.month.as_deref())?;

    let expenses = sqlx::query_as::<_, Expense>(
        r#"
        SELECT * FROM expenses
        WHERE user_id = $1
          AND ($2::date IS NULL OR expense_date >= $2)
          AND ($3::date IS NULL OR expense_date < $3)
        ORDER BY expense_date DESC, created_at DESC
        "#,
    )
    .bind(user.id)
    .bind(start)
    .bind(end)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(expenses.into_iter().map(ExpenseResponse::from).collect()))
}

pub async fn expense_summary(
    user: CurrentUser,
    State(state): State<AppState>,
    Query(filter): Query<MonthFilter>,
) -> Result<Json<ExpenseSummary>, ApiError> {
    let (start, end) = month_bounds(filter.month.as_deref())?;

    let rows = sqlx::query_as::<_, (String, i64, i64)>(
        r#"
        SELECT category, COALESCE(SUM(amount), 0)::BIGINT, COUNT(*)
        FROM expenses
        WHERE user_id = $1
          AND ($2::date IS NULL OR expense_date >= $2)
          AND ($3::date IS NULL OR expense_date < $3)
        GROUP BY category
        "#,
    )
    .bind(user.id)
    .bind(start)
    .bind(end)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(ExpenseSummary::from_rows(filter.month, &rows)))
}

pub async fn get_expense(
    user: CurrentUser,
    State(state): State<AppState>,
    Path(expense_id): Path<Uuid>,
) -> Result<Json<ExpenseResponse>, ApiError> {
    let expense = find_owned(&state.db, user.id, expense_id).await?;
    Ok(Json(expense.into()))
}

pub async fn update_expense(
    user: CurrentUser,
    State(state): State<AppState>,
    Path(expense_id): Path<Uuid>,
    Json(input): Json<ExpenseInput>,
) -> Result<Json<ExpenseResponse>, ApiError> {
    let existing = find_owned(&state.db, user.id, expense_id).await?;
    let category = input.category.unwrap_or_else(|| existing.category());

    let merchant = match input.merchant {
        Some(m) if m.trim().is_empty() => {
            return Err(ApiError::BadRequest("Merchant cannot be empty".to_string()));
        }
        Some(m) => truncate_merchant(&m),
        None => existing.merchant,
    };
    let amount = match input.amount {
        Some(a) => validate_amount(a).map_err(ApiError::BadRequest)?,
        None => existing.amount,
    };
    let expense_date = input.date.unwrap_or(existing.expense_date);
    let items = match input.items {
        Some(items) => validate_items(items)?,
        None => existing.items.0,
    };

    let expense = sqlx::query_as::<_, Expense>(
        r#"
        UPDATE expenses
        SET merchant = $1, amount = $2, category = $3, expense_date = $4, items = $5, updated_at = NOW()
        WHERE id = $6 AND user_id = $7
        RETURNING *
        "#,
    )
    .bind(merchant)
    .bind(amount)
    .bind(category.as_str())
    .bind(expense_date)
    .bind(DbJson(items))
    .bind(expense_id)
    .bind(user.id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(expense_not_found)?;

    Ok(Json(expense.into()))
}

pub async fn delete_expense(
    user: CurrentUser,
    State(state): State<AppState>,
    Path(expense_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let receipt_url = sqlx::query_scalar::<_, Option<String>>(
        "DELETE FROM expenses WHERE id = $1 AND user_id = $2 RETURNING receipt_url",
    )
    .bind(expense_id)
    .bind(user.id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(expense_not_found)?;

    if let Some(url) = receipt_url {
        remove_receipt(&state.config.upload_dir, &url).await;
    }

    Ok(Json(json!({ "message": "Expense deleted" })))
}

/// Runs the parser again over the stored OCR text and rewrites what it derives.
pub async fn reparse_expense(
    user: CurrentUser,
    State(state): State<AppState>,
    Path(expense_id): Path<Uuid>,
) -> Result<Json<ExpenseResponse>, ApiError> {
    let existing = find_owned(&state.db, user.id, expense_id).await?;
    let text = existing
        .raw_ocr_text
        .ok_or_else(|| ApiError::BadRequest("Expense has no OCR text to parse".to_string()))?;

    // Undated receipts keep the day they were uploaded.
    let draft = resolve_draft(
        OcrOutcome::Recognized(text),
        ExpenseOverrides::default(),
        existing.created_at.date_naive(),
    );

    let expense = sqlx::query_as::<_, Expense>(
        r#"
        UPDATE expenses
        SET merchant = $1, amount = $2, category = $3, expense_date = $4, items = $5,
            ocr_status = $6, ocr_error = NULL, updated_at = NOW()
        WHERE id = $7 AND user_id = $8
        RETURNING *
        "#,
    )
    .bind(&draft.merchant)
    .bind(draft.amount)
    .bind(draft.category.as_str())
    .bind(draft.date)
    .bind(DbJson(&draft.items))
    .bind(draft.ocr_status.as_str())
    .bind(expense_id)
    .bind(user.id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(expense_not_found)?;

    log::info!("Re-parsed expense {}: amount={}", expense.id, expense.amount);
    Ok(Json(expense.into()))
}

/// Parses pasted OCR text without storing anything.
pub async fn parse_text(_user: CurrentUser, Json(request): Json<ParseRequest>) -> Json<ParsedReceipt> {
    Json(parse_receipt(&request.text))
}

fn expense_not_found() -> ApiError {
    ApiError::NotFound("Expense not found".to_string())
}

async fn find_owned(db: &Database, user_id: Uuid, expense_id: Uuid) -> Result<Expense, ApiError> {
    sqlx::query_as::<_, Expense>("SELECT * FROM expenses WHERE id = $1 AND user_id = $2")
        .bind(expense_id)
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(expense_not_found)
}

async fn insert_expense(
    db: &Database,
    user_id: Uuid,
    draft: &ExpenseDraft,
    receipt_url: Option<&str>,
) -> Result<Expense, sqlx::Error> {
    sqlx::query_as::<_, Expense>(
        r#"
        INSERT INTO expenses
            (id, user_id, merchant, amount, currency, expense_date, category, items,
             receipt_url, raw_ocr_text, ocr_status, ocr_error)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(&draft.merchant)
    .bind(draft.amount)
    .bind(draft.currency)
    .bind(draft.date)
    .bind(draft.category.as_str())
    .bind(DbJson(&draft.items))
    .bind(receipt_url)
    .bind(draft.raw_ocr_text.as_deref())
    .bind(draft.ocr_status.as_str())
    .bind(draft.ocr_error.as_deref())
    .fetch_one(db)
    .await
}

fn validate_items(items: Vec<LineItem>) -> Result<Vec<LineItem>, ApiError> {
    match items.iter().find(|item| !item.is_plausible()) {
        Some(item) => Err(ApiError::BadRequest(format!("Invalid item '{}'", item.name))),
        None => Ok(items),
    }
}

/// `YYYY-MM` to `[first day, first day of next month)`.
pub fn month_range(month: &str) -> Option<(NaiveDate, NaiveDate)> {
    let (year, month) = month.trim().split_once('-')?;
    if year.len() != 4 || month.len() != 2 {
        return None;
    }
    let start = NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1)?;
    let end = if start.month() == 12 {
        NaiveDate::from_ymd_opt(start.year() + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(start.year(), start.month() + 1, 1)?
    };
    Some((start, end))
}

fn month_bounds(month: Option<&str>) -> Result<(Option<NaiveDate>, Option<NaiveDate>), ApiError> {
    match month.filter(|m| !m.trim().is_empty()) {
        None => Ok((None, None)),
        Some(m) => month_range(m)
            .map(|(start, end)| (Some(start), Some(end)))
            .ok_or_else(|| ApiError::BadRequest("month must be YYYY-MM".to_string())),
    }
}

struct ReceiptFile {
    file_name: String,
    data: axum::body::Bytes,
}

/// Splits the upload form into user overrides and the receipt file. A part
/// named `receipt`, `file` or `image` wins; otherwise the first file part is used.
async fn parse_upload_multipart(
    mut multipart: Multipart,
) -> Result<(ExpenseOverrides, Option<ReceiptFile>), ApiError> {
    let mut overrides = ExpenseOverrides::default();
    let mut preferred = None;
    let mut first_file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid upload: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();

        let file_name = field.file_name().map(|s| s.to_string());
        if let Some(file_name) = file_name {
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Invalid upload: {}", e)))?;
            if data.is_empty() {
                continue;
            }
            let file = ReceiptFile { file_name, data };
            if preferred.is_none() && FILE_FIELDS.contains(&name.as_str()) {
                preferred = Some(file);
            } else if first_file.is_none() {
                first_file = Some(file);
            }
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Invalid upload: {}", e)))?;
        let value = value.trim();
        if value.is_empty() {
            continue;
        }

        match name.as_str() {
            "merchant" => overrides.merchant = Some(value.to_string()),
            "amount" => overrides.amount = normalize_amount(value),
            "category" => overrides.category = value.parse::<Category>().ok(),
            "date" => overrides.date = NaiveDate::parse_from_str(value, "%Y-%m-%d").ok(),
            _ => (),
        }
    }

    Ok((overrides, preferred.or(first_file)))
}
