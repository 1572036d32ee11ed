// handlers/protected/resource/collection.rs - GET and POST /api/{kind}

use axum::{extract::State, Extension};

use crate::database::models::Resource;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, CurrentUser};
use crate::state::AppState;

/// GET /api/{kind} - every record the caller owns, newest first
pub async fn list<R: Resource>(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Vec<R>> {
    let records = state.repository::<R>(user.id).list().await?;
    Ok(ApiResponse::success(records))
}

/// POST /api/{kind} - create a record owned by the caller
pub async fn create<R: Resource>(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ApiJson(input): ApiJson<R::Create>,
) -> ApiResult<R> {
    let record = state.repository::<R>(user.id).create(input).await?;
    Ok(ApiResponse::created(record))
}
