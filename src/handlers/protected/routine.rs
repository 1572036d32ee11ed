// handlers/protected/routine.rs - POST /api/routines/:id/toggle/:date

use axum::{
    extract::{Path, State},
    Extension,
};

use super::resource::parse_id;
use crate::database::models::Routine;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::state::AppState;

/// Flip the routine's completion flag for one `YYYY-MM-DD` day.
pub async fn toggle_post(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path((id, date)): Path<(String, String)>,
) -> ApiResult<Routine> {
    let id = parse_id::<Routine>(&id)?;
    let routine = state
        .repository::<Routine>(user.id)
        .toggle_completion(id, &date)
        .await?;
    Ok(ApiResponse::success(routine))
}
