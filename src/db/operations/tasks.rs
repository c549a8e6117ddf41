use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskItem {
    pub user_word_id: String,
    pub word_id: String,
    pub lemma: String,
    pub stage: i32,
    pub status: String,
    pub next_due_at: Option<DateTime<Utc>>,
}

/// Records whose review timer has expired, most overdue first. Mastered and
/// ignored records never show up; records with no timer are not schedulable.
pub async fn due_tasks(
    pool: &PgPool,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<Vec<TaskItem>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT uw."id", uw."wordId", uw."stage", uw."status", uw."nextDueAt", w."lemma"
        FROM "user_words" uw
        JOIN "words" w ON w."id" = uw."wordId"
        WHERE uw."userId" = $1
          AND uw."nextDueAt" IS NOT NULL
          AND uw."nextDueAt" <= $2
          AND uw."status" NOT IN ('mastered', 'ignored')
        ORDER BY uw."nextDueAt" ASC
        "#,
    )
    .bind(user_id)
    .bind(now)
    .fetch_all(pool)
    .await?;

    rows.iter().map(map_task_item).collect()
}

/// Newly acquired records, oldest first. Selection is independent of the due
/// timer: new words surface regardless of `nextDueAt`.
pub async fn new_tasks(pool: &PgPool, user_id: &str) -> Result<Vec<TaskItem>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT uw."id", uw."wordId", uw."stage", uw."status", uw."nextDueAt", w."lemma"
        FROM "user_words" uw
        JOIN "words" w ON w."id" = uw."wordId"
        WHERE uw."userId" = $1 AND uw."status" = 'new'
        ORDER BY uw."createdAt" ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(map_task_item).collect()
}

fn map_task_item(row: &PgRow) -> Result<TaskItem, sqlx::Error> {
    Ok(TaskItem {
        user_word_id: row.try_get("id")?,
        word_id: row.try_get("wordId")?,
        lemma: row.try_get("lemma")?,
        stage: row.try_get("stage")?,
        status: row.try_get("status")?,
        next_due_at: row.try_get("nextDueAt")?,
    })
}
