mod dashboard;
mod health;
mod market;
mod review;
mod tasks;
mod words;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;

use crate::response::json_error;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/health", health::router())
        .route("/api/review/submit", post(review::submit))
        .route("/api/tasks/today", get(tasks::today))
        .route("/api/dashboard/overview", get(dashboard::overview))
        .route("/api/words", get(words::list))
        .route("/api/words/add-manual", post(words::add_manual))
        .route("/api/words/:word_id", get(words::detail))
        .route("/api/market/join", post(market::join))
        .fallback(fallback_handler)
        .with_state(state)
}

async fn fallback_handler() -> Response {
    json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "Route not found").into_response()
}
