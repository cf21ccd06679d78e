use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use tower_cookies::{Cookie, Cookies};

use super::AppState;
use crate::{
    database::Database,
    error::ApiError,
    middleware::{CurrentUser, AUTH_COOKIE},
    models::{CreateUser, LoginRequest, User, UserResponse},
    utils::auth::{create_token, hash_password, verify_password, TOKEN_TTL_HOURS},
};

const MIN_PASSWORD_LEN: usize = 6;

pub async fn register(
    State(state): State<AppState>,
    Json(form): Json<CreateUser>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let form = validate_registration(form)?;

    let password_hash = hash_password(&form.password)
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {}", e)))?;

    let user = match create_user_in_db(&state.db, &form, &password_hash).await {
        Ok(user) => user,
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            return Err(ApiError::Conflict("Email already registered".to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    log::info!("Registered user {}", user.id);
    Ok((StatusCode::CREATED, Json(user.into())))
}

pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(form): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let user = authenticate_user(&state.db, &normalize_email(&form.email), &form.password).await?;

    let token = create_token(user.id, user.email.clone(), &state.config.jwt_secret)
        .map_err(|e| ApiError::Internal(format!("token creation failed: {}", e)))?;

    let cookie = Cookie::build((AUTH_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .max_age(time::Duration::hours(TOKEN_TTL_HOURS))
        .build();
    cookies.add(cookie);

    Ok(Json(json!({
        "token": token,
        "user": UserResponse::from(user),
    })))
}

/// The signed-in user's profile.
pub async fn me(
    user: CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user.id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user.into()))
}

pub async fn logout(cookies: Cookies) -> Json<Value> {
    cookies.remove(Cookie::build(AUTH_COOKIE).path("/").build());
    Json(json!({ "message": "Logged out" }))
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_registration(form: CreateUser) -> Result<CreateUser, ApiError> {
    let name = form.name.trim().to_string();
    let email = normalize_email(&form.email);

    if name.is_empty() {
        return Err(ApiError::BadRequest("Name is required".to_string()));
    }
    if !email.contains('@') {
        return Err(ApiError::BadRequest("A valid email is required".to_string()));
    }
    if form.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    Ok(CreateUser {
        name,
        email,
        password: form.password,
    })
}

async fn authenticate_user(db: &Database, email: &str, password: &str) -> Result<User, ApiError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(db)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    if verify_password(password, &user.password_hash).unwrap_or(false) {
        Ok(user)
    } else {
        Err(ApiError::InvalidCredentials)
    }
}

async fn create_user_in_db(
    db: &Database,
    user_data: &CreateUser,
    password_hash: &str,
) -> Result<User, sqlx::Error> {
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, name, email, password_hash)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(uuid::Uuid::new_v4())
    .bind(&user_data.name)
    .bind(&user_data.email)
    .bind(password_hash)
    .fetch_one(db)
    .await?;

    Ok(user)
}
