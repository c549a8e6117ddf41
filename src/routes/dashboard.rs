use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::{Duration, Utc};

use crate::auth::require_user_id;
use crate::db::operations::{dashboard, users};
use crate::response::AppError;
use crate::services::overview::{
    self, Activity, DashboardOverview, ACTIVITY_WINDOW_DAYS,
};
use crate::state::AppState;

/// GET /api/dashboard/overview
///
/// Status totals, due/overdue counts and the trailing 7-day activity series
/// for the calling user. Read-only; all bucketing happens in
/// [`crate::services::overview`].
pub async fn overview(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<DashboardOverview>, AppError> {
    let user_id = require_user_id(&headers)?;
    let db = state.require_db()?;

    if !users::user_exists(db.pool(), &user_id).await? {
        return Err(AppError::not_found("User not found"));
    }

    let now = Utc::now();
    let since = now - Duration::days(ACTIVITY_WINDOW_DAYS);

    let status_counts = dashboard::status_counts(db.pool(), &user_id).await?;
    let candidates = dashboard::due_candidates(db.pool(), &user_id).await?;
    let day_counts = dashboard::daily_event_counts(db.pool(), &user_id, since).await?;

    Ok(Json(DashboardOverview {
        totals: overview::build_totals(&status_counts),
        due: overview::split_due_buckets(now, &candidates),
        activity: Activity {
            last7_days: overview::build_activity(now, &day_counts),
        },
    }))
}
