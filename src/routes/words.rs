use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::require_user_id;
use crate::db::operations::users;
use crate::db::operations::words::{
    self, AddManualOutcome, WordDetail, WordItem, WordListQuery, WordSort, WordsError,
};
use crate::response::AppError;
use crate::services::word_text::normalize_word_text;
use crate::state::AppState;

const MAX_CONTEXT_LEN: usize = 500;
const MAX_PAGE_SIZE: i64 = 100;
const DEFAULT_PAGE_SIZE: i64 = 20;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddManualRequest {
    text: String,
    url: Option<String>,
    context: Option<String>,
}

/// POST /api/words/add-manual
pub async fn add_manual(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<AddManualOutcome>, AppError> {
    let user_id = require_user_id(&headers)?;

    let payload: AddManualRequest = serde_json::from_slice(&body)
        .map_err(|_| AppError::validation("Invalid request body"))?;

    let lemma = normalize_word_text(&payload.text)
        .map_err(|err| AppError::validation(err.to_string()))?;

    if let Some(url) = payload.url.as_deref() {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(AppError::validation("url must be a valid http(s) URL"));
        }
    }
    if let Some(context) = payload.context.as_deref() {
        if context.chars().count() > MAX_CONTEXT_LEN {
            return Err(AppError::validation(format!(
                "context must be at most {MAX_CONTEXT_LEN} characters"
            )));
        }
    }

    let db = state.require_db()?;

    let outcome = words::add_manual_word(
        &db,
        &user_id,
        &lemma,
        payload.url.as_deref(),
        payload.context.as_deref(),
        Utc::now(),
    )
    .await
    .map_err(map_words_error)?;

    tracing::debug!(
        user_id = %user_id,
        lemma = %outcome.lemma,
        is_new_word = outcome.is_new_word,
        "manual word added"
    );

    Ok(Json(outcome))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    status: Option<String>,
    dictionary_id: Option<String>,
    tag_id: Option<String>,
    sort: Option<String>,
    page: Option<i64>,
    page_size: Option<i64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Pagination {
    page: i64,
    page_size: i64,
    total: i64,
    total_pages: i64,
}

#[derive(Serialize)]
pub struct ListResponse {
    items: Vec<WordItem>,
    pagination: Pagination,
}

/// GET /api/words
pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResponse>, AppError> {
    let user_id = require_user_id(&headers)?;

    let page = params.page.unwrap_or(1);
    if page < 1 {
        return Err(AppError::validation("page must be a positive integer"));
    }
    let page_size = params.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
    if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
        return Err(AppError::validation(format!(
            "pageSize must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }

    let sort = match params.sort.as_deref() {
        None => WordSort::NextDue,
        Some(value) => WordSort::parse(value)
            .ok_or_else(|| AppError::validation("sort must be one of next_due, recent, added, wrong_most"))?,
    };

    let statuses = params
        .status
        .as_deref()
        .map(|value| {
            value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    let db = state.require_db()?;

    if !users::user_exists(db.pool(), &user_id).await? {
        return Err(AppError::not_found("User not found"));
    }

    let query = WordListQuery {
        statuses,
        dictionary_id: params.dictionary_id,
        tag_id: params.tag_id,
        sort,
        page,
        page_size,
    };

    let (items, total) = words::list_words(db.pool(), &user_id, &query, Utc::now()).await?;

    Ok(Json(ListResponse {
        items,
        pagination: Pagination {
            page,
            page_size,
            total,
            total_pages: (total + page_size - 1) / page_size,
        },
    }))
}

/// GET /api/words/:word_id
pub async fn detail(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(word_id): Path<String>,
) -> Result<Json<WordDetail>, AppError> {
    let user_id = require_user_id(&headers)?;
    let db = state.require_db()?;

    if !users::user_exists(db.pool(), &user_id).await? {
        return Err(AppError::not_found("User not found"));
    }

    let detail = words::word_detail(db.pool(), &user_id, &word_id)
        .await?
        .ok_or_else(|| AppError::not_found("Word not found"))?;

    Ok(Json(detail))
}

fn map_words_error(err: WordsError) -> AppError {
    match err {
        WordsError::UserNotFound => AppError::not_found(err.to_string()),
        WordsError::Sqlx(err) => err.into(),
    }
}
