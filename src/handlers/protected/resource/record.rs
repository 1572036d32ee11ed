// handlers/protected/resource/record.rs - GET, PUT and DELETE /api/{kind}/:id

use axum::{
    extract::{Path, State},
    Extension,
};
use serde_json::{json, Value};

use super::parse_id;
use crate::database::models::Resource;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, CurrentUser};
use crate::state::AppState;

/// GET /api/{kind}/:id
pub async fn get<R: Resource>(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<R> {
    let id = parse_id::<R>(&id)?;
    let record = state.repository::<R>(user.id).get(id).await?;
    Ok(ApiResponse::success(record))
}

/// PUT /api/{kind}/:id - apply the fields present in the body
pub async fn put<R: Resource>(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<R::Patch>,
) -> ApiResult<R> {
    let id = parse_id::<R>(&id)?;
    let record = state.repository::<R>(user.id).update(id, patch).await?;
    Ok(ApiResponse::success(record))
}

/// DELETE /api/{kind}/:id
pub async fn delete<R: Resource>(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_id::<R>(&id)?;
    state.repository::<R>(user.id).delete(id).await?;
    Ok(ApiResponse::success(
        json!({ "message": format!("{} deleted successfully", R::LABEL) }),
    ))
}
