use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::require_user_id;
use crate::db::operations::market::{self, DictionaryJoinStats, MarketError};
use crate::response::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JoinRequest {
    dictionary_ids: Vec<String>,
}

#[derive(Serialize)]
pub struct JoinResponse {
    dictionaries: Vec<DictionaryJoinStats>,
}

/// POST /api/market/join
///
/// Subscribe to dictionaries and seed learning records for their words.
pub async fn join(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<JoinResponse>, AppError> {
    let user_id = require_user_id(&headers)?;

    let payload: JoinRequest = serde_json::from_slice(&body)
        .map_err(|_| AppError::validation("Invalid request body"))?;

    if payload.dictionary_ids.is_empty() {
        return Err(AppError::validation("At least one dictionary ID required"));
    }
    if payload
        .dictionary_ids
        .iter()
        .any(|id| id.trim().is_empty())
    {
        return Err(AppError::validation("dictionaryIds must be non-empty strings"));
    }

    let db = state.require_db()?;

    let stats = market::join_dictionaries(&db, &user_id, &payload.dictionary_ids)
        .await
        .map_err(map_market_error)?;

    tracing::info!(
        user_id = %user_id,
        dictionaries = stats.len(),
        "market join completed"
    );

    Ok(Json(JoinResponse {
        dictionaries: stats,
    }))
}

fn map_market_error(err: MarketError) -> AppError {
    match err {
        MarketError::UserNotFound | MarketError::DictionaryNotFound => {
            AppError::not_found(err.to_string())
        }
        MarketError::Sqlx(err) => err.into(),
    }
}
