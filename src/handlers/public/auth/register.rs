// handlers/public/auth/register.rs - POST /api/auth/register handler

use axum::extract::State;
use serde::Deserialize;

use super::AuthResponse;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub name: Option<String>,
    pub password: String,
}

/// POST /api/auth/register - create an account and sign it in
///
/// 201 with `{id, email, name, token}`; 400 `EMAIL_TAKEN` when the
/// normalized email already exists.
pub async fn register_post(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> ApiResult<AuthResponse> {
    let (user, token) = state
        .users
        .register(&payload.email, payload.name, payload.password)
        .await?;

    Ok(ApiResponse::created(AuthResponse::new(user, token)))
}
