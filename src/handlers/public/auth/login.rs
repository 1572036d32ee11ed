// handlers/public/auth/login.rs - POST /api/auth/login handler

use axum::extract::State;
use serde::Deserialize;

use super::AuthResponse;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /api/auth/login - exchange credentials for a bearer token
///
/// Unknown email and wrong password produce the same 401 body.
pub async fn login_post(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> ApiResult<AuthResponse> {
    let (user, token) = state
        .users
        .authenticate(&payload.email, payload.password)
        .await?;

    Ok(ApiResponse::success(AuthResponse::new(user, token)))
}
