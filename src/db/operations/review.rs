use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use sqlx::Row;
use thiserror::Error;
use uuid::Uuid;

use crate::db::operations::users;
use crate::db::Database;
use crate::srs::{self, SrsError};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSubmission {
    pub user_word_id: String,
    pub word_id: String,
    pub lemma: String,
    pub stage: i32,
    pub status: String,
    pub next_due_at: DateTime<Utc>,
    pub correct: bool,
}

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("User not found")]
    UserNotFound,
    #[error("User word not found")]
    UserWordNotFound,
    #[error("User word does not belong to this user")]
    NotOwner,
    #[error(transparent)]
    Srs(#[from] SrsError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Apply one review answer: run the scheduler against the record's current
/// stage, promote status where the rules say so, then persist the update and
/// append the answer event in a single transaction. Either both land or
/// neither does.
pub async fn submit_review(
    db: &Database,
    user_id: &str,
    user_word_id: &str,
    correct: bool,
    now: DateTime<Utc>,
) -> Result<ReviewSubmission, ReviewError> {
    let mut tx = db.pool().begin().await?;

    if !users::user_exists_tx(&mut tx, user_id).await? {
        return Err(ReviewError::UserNotFound);
    }

    let row = sqlx::query(
        r#"
        SELECT uw."id", uw."userId", uw."wordId", uw."status", uw."stage", w."lemma"
        FROM "user_words" uw
        JOIN "words" w ON w."id" = uw."wordId"
        WHERE uw."id" = $1
        FOR UPDATE OF uw
        "#,
    )
    .bind(user_word_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(row) = row else {
        return Err(ReviewError::UserWordNotFound);
    };

    let owner_id: String = row.try_get("userId")?;
    if owner_id != user_id {
        return Err(ReviewError::NotOwner);
    }

    let word_id: String = row.try_get("wordId")?;
    let lemma: String = row.try_get("lemma")?;
    let old_status: String = row.try_get("status")?;
    let old_stage: i32 = row.try_get("stage")?;

    let outcome = srs::compute_next(old_stage, correct, now)?;
    let new_status = srs::promote_status(&old_status, outcome.new_stage, correct)
        .map(str::to_string)
        .unwrap_or_else(|| old_status.clone());

    sqlx::query(
        r#"
        UPDATE "user_words"
        SET "stage" = $1, "status" = $2, "nextDueAt" = $3, "updatedAt" = NOW()
        WHERE "id" = $4
        "#,
    )
    .bind(outcome.new_stage)
    .bind(&new_status)
    .bind(outcome.next_due_at)
    .bind(user_word_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO "user_word_events" ("id", "userId", "wordId", "userWordId", "type", "payload")
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(user_id)
    .bind(&word_id)
    .bind(user_word_id)
    .bind(if correct {
        "answer_correct"
    } else {
        "answer_wrong"
    })
    .bind(json!({
        "oldStage": old_stage,
        "newStage": outcome.new_stage,
        "correct": correct,
    }))
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(ReviewSubmission {
        user_word_id: user_word_id.to_string(),
        word_id,
        lemma,
        stage: outcome.new_stage,
        status: new_status,
        next_due_at: outcome.next_due_at,
        correct,
    })
}
