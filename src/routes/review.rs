use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use crate::auth::require_user_id;
use crate::db::operations::review::{self, ReviewError, ReviewSubmission};
use crate::response::AppError;
use crate::srs::SrsError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReviewSubmitRequest {
    user_word_id: String,
    correct: bool,
}

/// POST /api/review/submit
///
/// Apply one answer to a learning record: the scheduler computes the new
/// stage and due time, the record is updated and the answer event appended in
/// one transaction.
pub async fn submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ReviewSubmission>, AppError> {
    let user_id = require_user_id(&headers)?;

    let payload: ReviewSubmitRequest = serde_json::from_slice(&body)
        .map_err(|_| AppError::validation("Invalid request body"))?;

    if payload.user_word_id.trim().is_empty() {
        return Err(AppError::validation("userWordId is required"));
    }

    let db = state.require_db()?;

    let submission = review::submit_review(
        &db,
        &user_id,
        payload.user_word_id.trim(),
        payload.correct,
        Utc::now(),
    )
    .await
    .map_err(map_review_error)?;

    tracing::debug!(
        user_id = %user_id,
        user_word_id = %submission.user_word_id,
        stage = submission.stage,
        correct = submission.correct,
        "review submitted"
    );

    Ok(Json(submission))
}

fn map_review_error(err: ReviewError) -> AppError {
    match err {
        ReviewError::UserNotFound | ReviewError::UserWordNotFound => {
            AppError::not_found(err.to_string())
        }
        ReviewError::NotOwner => AppError::forbidden(err.to_string()),
        ReviewError::Srs(SrsError::InvalidStage(_)) => AppError::validation(err.to_string()),
        ReviewError::Sqlx(err) => err.into(),
    }
}
