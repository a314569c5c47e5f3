use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::activity::{is_valid_user_id, ActivityEntry, NewActivity};
use crate::errors::AppError;
use crate::state::AppState;

/// POST /api/v1/activity/log
pub async fn handle_log_activity(
    State(state): State<AppState>,
    Json(activity): Json<NewActivity>,
) -> Result<(StatusCode, Json<ActivityEntry>), AppError> {
    if !is_valid_user_id(activity.user_id) {
        return Err(AppError::Validation("userId must be positive".to_string()));
    }
    let entry = state.activity.record(activity).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// GET /api/v1/activity/user/:user_id
pub async fn handle_user_activity(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<ActivityEntry>>, AppError> {
    Ok(Json(state.activity.for_user(user_id).await?))
}
