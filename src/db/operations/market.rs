use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::db::operations::users;
use crate::db::Database;

#[derive(Debug, Error)]
pub enum MarketError {
    #[error("User not found")]
    UserNotFound,
    #[error("One or more dictionaries not found")]
    DictionaryNotFound,
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DictionaryJoinStats {
    pub dictionary_id: String,
    pub added_count: i64,
    pub already_had_count: i64,
}

/// Subscribe a user to a set of dictionaries and seed learning records for
/// every word the user does not have yet. One transaction covers all
/// dictionaries: the subscription upserts, the record creation and the event
/// appends land together or not at all.
pub async fn join_dictionaries(
    db: &Database,
    user_id: &str,
    dictionary_ids: &[String],
) -> Result<Vec<DictionaryJoinStats>, MarketError> {
    let mut tx = db.pool().begin().await?;

    if !users::user_exists_tx(&mut tx, user_id).await? {
        return Err(MarketError::UserNotFound);
    }

    let found: Vec<(String,)> =
        sqlx::query_as(r#"SELECT "id" FROM "dictionaries" WHERE "id" = ANY($1)"#)
            .bind(dictionary_ids)
            .fetch_all(&mut *tx)
            .await?;
    if found.len() != dictionary_ids.len() {
        return Err(MarketError::DictionaryNotFound);
    }

    let mut stats = Vec::with_capacity(dictionary_ids.len());

    for dictionary_id in dictionary_ids {
        sqlx::query(
            r#"
            INSERT INTO "user_dictionaries" ("userId", "dictionaryId")
            VALUES ($1, $2)
            ON CONFLICT ("userId", "dictionaryId") DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(dictionary_id)
        .execute(&mut *tx)
        .await?;

        let word_ids: Vec<(String,)> = sqlx::query_as(
            r#"SELECT "wordId" FROM "dictionary_words" WHERE "dictionaryId" = $1"#,
        )
        .bind(dictionary_id)
        .fetch_all(&mut *tx)
        .await?;
        let total_words = word_ids.len() as i64;

        let mut added_count: i64 = 0;
        for (word_id,) in &word_ids {
            let created: Option<(String,)> = sqlx::query_as(
                r#"
                INSERT INTO "user_words" ("id", "userId", "wordId", "status", "stage", "nextDueAt")
                VALUES ($1, $2, $3, 'new', 0, NOW())
                ON CONFLICT ("userId", "wordId") DO NOTHING
                RETURNING "id"
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(user_id)
            .bind(word_id)
            .fetch_optional(&mut *tx)
            .await?;

            if let Some((user_word_id,)) = created {
                added_count += 1;
                sqlx::query(
                    r#"
                    INSERT INTO "user_word_events"
                        ("id", "userId", "wordId", "userWordId", "type", "payload")
                    VALUES ($1, $2, $3, $4, 'added_by_dictionary', $5)
                    "#,
                )
                .bind(Uuid::new_v4().to_string())
                .bind(user_id)
                .bind(word_id)
                .bind(&user_word_id)
                .bind(json!({ "dictionaryId": dictionary_id }))
                .execute(&mut *tx)
                .await?;
            }
        }

        // One subscription event per dictionary, keyed to its first word for
        // lack of a better anchor (events require a word reference).
        if let Some((first_word_id,)) = word_ids.first() {
            sqlx::query(
                r#"
                INSERT INTO "user_word_events" ("id", "userId", "wordId", "type", "payload")
                VALUES ($1, $2, $3, 'dictionary_added', $4)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(user_id)
            .bind(first_word_id)
            .bind(json!({
                "dictionaryId": dictionary_id,
                "totalWords": total_words,
            }))
            .execute(&mut *tx)
            .await?;
        }

        stats.push(DictionaryJoinStats {
            dictionary_id: dictionary_id.clone(),
            added_count,
            already_had_count: total_words - added_count,
        });
    }

    tx.commit().await?;

    Ok(stats)
}
