use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use serde::Serialize;
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::{error::ApiError, handlers::AppState, utils::auth::verify_token};

pub const AUTH_COOKIE: &str = "auth_token";

/// The caller, as stated by a valid token. Not looked up in the database.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Reads the bearer header first, then the `auth_token` cookie.
pub fn get_current_user(headers: &HeaderMap, cookies: &Cookies, secret: &str) -> Option<CurrentUser> {
    let token = match bearer_token(headers) {
        Some(token) => token.to_string(),
        None => cookies.get(AUTH_COOKIE)?.value().to_string(),
    };

    let claims = verify_token(&token, secret).ok()?;
    Some(CurrentUser {
        id: claims.user_id()?,
        email: claims.email,
    })
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let cookies = Cookies::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| ApiError::Internal(msg.to_string()))?;

        get_current_user(&parts.headers, &cookies, &state.config.jwt_secret).ok_or(ApiError::Unauthorized)
    }
}
