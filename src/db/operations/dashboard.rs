use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

/// Learning-record counts grouped by status.
pub async fn status_counts(pool: &PgPool, user_id: &str) -> Result<Vec<(String, i64)>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT "status", COUNT(*) AS "count"
        FROM "user_words"
        WHERE "userId" = $1
        GROUP BY "status"
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

#[derive(Debug, Clone)]
pub struct DueCandidate {
    pub status: String,
    pub next_due_at: Option<DateTime<Utc>>,
}

/// Every record with its timer and status; the overview service buckets them
/// into overdue / due-today.
pub async fn due_candidates(pool: &PgPool, user_id: &str) -> Result<Vec<DueCandidate>, sqlx::Error> {
    let rows = sqlx::query(
        r#"SELECT "status", "nextDueAt" FROM "user_words" WHERE "userId" = $1"#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(map_due_candidate).collect()
}

fn map_due_candidate(row: &PgRow) -> Result<DueCandidate, sqlx::Error> {
    Ok(DueCandidate {
        status: row.try_get("status")?,
        next_due_at: row.try_get("nextDueAt")?,
    })
}

/// Event counts per UTC calendar day since `since`, all event types included.
pub async fn daily_event_counts(
    pool: &PgPool,
    user_id: &str,
    since: DateTime<Utc>,
) -> Result<Vec<(NaiveDate, i64)>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT ("createdAt" AT TIME ZONE 'UTC')::date AS "day", COUNT(*) AS "count"
        FROM "user_word_events"
        WHERE "userId" = $1 AND "createdAt" >= $2
        GROUP BY 1
        ORDER BY 1
        "#,
    )
    .bind(user_id)
    .bind(since)
    .fetch_all(pool)
    .await
}
