use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::auth::require_user_id;
use crate::db::operations::{tasks, users};
use crate::response::AppError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct TodayTasksResponse {
    due: Vec<tasks::TaskItem>,
    new: Vec<tasks::TaskItem>,
}

/// GET /api/tasks/today
///
/// Today's work: records whose timer has expired plus newly acquired words.
/// The two lists are selected independently and either may be empty.
pub async fn today(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TodayTasksResponse>, AppError> {
    let user_id = require_user_id(&headers)?;
    let db = state.require_db()?;

    if !users::user_exists(db.pool(), &user_id).await? {
        return Err(AppError::not_found("User not found"));
    }

    let now = Utc::now();
    let due = tasks::due_tasks(db.pool(), &user_id, now).await?;
    let new = tasks::new_tasks(db.pool(), &user_id).await?;

    Ok(Json(TodayTasksResponse { due, new }))
}
