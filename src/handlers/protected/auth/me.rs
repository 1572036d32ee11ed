// handlers/protected/auth/me.rs - GET /api/auth/me handler

use axum::Extension;
use serde::Serialize;
use uuid::Uuid;

use crate::middleware::{ApiResponse, ApiResult, CurrentUser};

#[derive(Debug, Serialize)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
}

/// GET /api/auth/me - the account behind the bearer token
pub async fn me_get(Extension(CurrentUser(user)): Extension<CurrentUser>) -> ApiResult<Profile> {
    Ok(ApiResponse::success(Profile {
        id: user.id,
        email: user.email,
        name: user.name,
    }))
}
