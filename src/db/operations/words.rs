use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use thiserror::Error;
use uuid::Uuid;

use crate::db::operations::users;
use crate::db::Database;

#[derive(Debug, Error)]
pub enum WordsError {
    #[error("User not found")]
    UserNotFound,
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddManualOutcome {
    pub word_id: String,
    pub lemma: String,
    pub is_new_word: bool,
    pub is_new_user_word: bool,
}

/// Manually add a word for a user. Idempotent for state (word and learning
/// record are upserted, existing rows untouched) but not for history: an
/// `added_manual` event is appended on every call.
pub async fn add_manual_word(
    db: &Database,
    user_id: &str,
    lemma: &str,
    url: Option<&str>,
    context: Option<&str>,
    now: DateTime<Utc>,
) -> Result<AddManualOutcome, WordsError> {
    let mut tx = db.pool().begin().await?;

    if !users::user_exists_tx(&mut tx, user_id).await? {
        return Err(WordsError::UserNotFound);
    }

    let inserted_word: Option<(String,)> = sqlx::query_as(
        r#"
        INSERT INTO "words" ("id", "lemma", "language", "source")
        VALUES ($1, $2, 'en', 'custom')
        ON CONFLICT ("lemma", "language") DO NOTHING
        RETURNING "id"
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(lemma)
    .fetch_optional(&mut *tx)
    .await?;

    let is_new_word = inserted_word.is_some();
    let word_id = match inserted_word {
        Some((id,)) => id,
        None => {
            let (id,): (String,) = sqlx::query_as(
                r#"SELECT "id" FROM "words" WHERE "lemma" = $1 AND "language" = 'en'"#,
            )
            .bind(lemma)
            .fetch_one(&mut *tx)
            .await?;
            id
        }
    };

    let inserted_user_word: Option<(String,)> = sqlx::query_as(
        r#"
        INSERT INTO "user_words" ("id", "userId", "wordId", "status", "stage", "nextDueAt")
        VALUES ($1, $2, $3, 'new', 0, $4)
        ON CONFLICT ("userId", "wordId") DO NOTHING
        RETURNING "id"
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(user_id)
    .bind(&word_id)
    .bind(now)
    .fetch_optional(&mut *tx)
    .await?;

    let is_new_user_word = inserted_user_word.is_some();
    let user_word_id = match inserted_user_word {
        Some((id,)) => id,
        None => {
            let (id,): (String,) = sqlx::query_as(
                r#"SELECT "id" FROM "user_words" WHERE "userId" = $1 AND "wordId" = $2"#,
            )
            .bind(user_id)
            .bind(&word_id)
            .fetch_one(&mut *tx)
            .await?;
            id
        }
    };

    let mut payload = Map::new();
    payload.insert("lemma".to_string(), Value::String(lemma.to_string()));
    if let Some(url) = url {
        payload.insert("url".to_string(), Value::String(url.to_string()));
    }
    if let Some(context) = context {
        payload.insert("context".to_string(), Value::String(context.to_string()));
    }

    sqlx::query(
        r#"
        INSERT INTO "user_word_events" ("id", "userId", "wordId", "userWordId", "type", "payload")
        VALUES ($1, $2, $3, $4, 'added_manual', $5)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(user_id)
    .bind(&word_id)
    .bind(&user_word_id)
    .bind(Value::Object(payload))
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(AddManualOutcome {
        word_id,
        lemma: lemma.to_string(),
        is_new_word,
        is_new_user_word,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordSort {
    NextDue,
    Recent,
    Added,
    WrongMost,
}

impl WordSort {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "next_due" => Some(Self::NextDue),
            "recent" => Some(Self::Recent),
            "added" => Some(Self::Added),
            "wrong_most" => Some(Self::WrongMost),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WordListQuery {
    pub statuses: Vec<String>,
    pub dictionary_id: Option<String>,
    pub tag_id: Option<String>,
    pub sort: WordSort,
    pub page: i64,
    pub page_size: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DictionaryRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagRef {
    pub id: String,
    pub name: String,
    pub r#type: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordItem {
    pub word_id: String,
    pub lemma: String,
    pub status: String,
    pub stage: i32,
    pub next_due_at: Option<DateTime<Utc>>,
    pub last_event_at: Option<DateTime<Utc>>,
    pub dictionaries: Vec<DictionaryRef>,
    pub tags: Vec<TagRef>,
}

/// Window of wrong-answer history considered by the `wrong_most` sort.
const WRONG_MOST_WINDOW_DAYS: i64 = 30;

fn push_word_filters<'a>(
    builder: &mut QueryBuilder<'a, Postgres>,
    user_id: &'a str,
    query: &'a WordListQuery,
) {
    builder.push(r#" WHERE uw."userId" = "#);
    builder.push_bind(user_id);

    if !query.statuses.is_empty() {
        builder.push(r#" AND uw."status" IN ("#);
        let mut separated = builder.separated(", ");
        for status in &query.statuses {
            separated.push_bind(status);
        }
        builder.push(")");
    }

    if let Some(dictionary_id) = &query.dictionary_id {
        builder.push(
            r#" AND EXISTS (
                SELECT 1 FROM "dictionary_words" dw
                WHERE dw."wordId" = uw."wordId" AND dw."dictionaryId" = "#,
        );
        builder.push_bind(dictionary_id);
        builder.push(")");
    }

    if let Some(tag_id) = &query.tag_id {
        builder.push(
            r#" AND EXISTS (
                SELECT 1 FROM "word_tags" wt
                WHERE wt."wordId" = uw."wordId" AND wt."tagId" = "#,
        );
        builder.push_bind(tag_id);
        builder.push(")");
    }
}

/// The user's word catalog with filters, sorting and pagination. Returns the
/// page of items plus the total row count for the filter.
pub async fn list_words(
    pool: &PgPool,
    user_id: &str,
    query: &WordListQuery,
    now: DateTime<Utc>,
) -> Result<(Vec<WordItem>, i64), sqlx::Error> {
    let mut count_builder: QueryBuilder<Postgres> = QueryBuilder::new(
        r#"SELECT COUNT(*) FROM "user_words" uw JOIN "words" w ON w."id" = uw."wordId""#,
    );
    push_word_filters(&mut count_builder, user_id, query);
    let (total,): (i64,) = count_builder.build_query_as().fetch_one(pool).await?;

    let wrong_window_start = now - Duration::days(WRONG_MOST_WINDOW_DAYS);

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
        r#"
        SELECT uw."id", uw."wordId", uw."status", uw."stage", uw."nextDueAt", w."lemma"
        FROM "user_words" uw
        JOIN "words" w ON w."id" = uw."wordId"
        "#,
    );
    push_word_filters(&mut builder, user_id, query);

    match query.sort {
        WordSort::NextDue => {
            builder.push(r#" ORDER BY uw."nextDueAt" ASC NULLS LAST"#);
        }
        WordSort::Recent => {
            builder.push(r#" ORDER BY uw."updatedAt" DESC"#);
        }
        WordSort::Added => {
            builder.push(r#" ORDER BY uw."createdAt" DESC"#);
        }
        WordSort::WrongMost => {
            builder.push(
                r#" ORDER BY (
                    SELECT COUNT(*) FROM "user_word_events" e
                    WHERE e."userWordId" = uw."id"
                      AND e."type" = 'answer_wrong'
                      AND e."createdAt" >= "#,
            );
            builder.push_bind(wrong_window_start);
            builder.push(r#") DESC, uw."nextDueAt" ASC NULLS LAST"#);
        }
    }

    builder.push(" LIMIT ");
    builder.push_bind(query.page_size);
    builder.push(" OFFSET ");
    builder.push_bind((query.page - 1) * query.page_size);

    let rows = builder.build().fetch_all(pool).await?;

    let mut user_word_ids = Vec::with_capacity(rows.len());
    let mut word_ids = Vec::with_capacity(rows.len());
    for row in &rows {
        user_word_ids.push(row.try_get::<String, _>("id")?);
        word_ids.push(row.try_get::<String, _>("wordId")?);
    }

    let last_events = last_event_times(pool, &user_word_ids).await?;
    let dictionaries = dictionaries_by_word(pool, &word_ids).await?;
    let tags = tags_by_word(pool, &word_ids).await?;

    let mut items = Vec::with_capacity(rows.len());
    for row in &rows {
        let user_word_id: String = row.try_get("id")?;
        let word_id: String = row.try_get("wordId")?;
        items.push(WordItem {
            lemma: row.try_get("lemma")?,
            status: row.try_get("status")?,
            stage: row.try_get("stage")?,
            next_due_at: row.try_get("nextDueAt")?,
            last_event_at: last_events.get(&user_word_id).copied(),
            dictionaries: dictionaries.get(&word_id).cloned().unwrap_or_default(),
            tags: tags.get(&word_id).cloned().unwrap_or_default(),
            word_id,
        });
    }

    Ok((items, total))
}

async fn last_event_times(
    pool: &PgPool,
    user_word_ids: &[String],
) -> Result<HashMap<String, DateTime<Utc>>, sqlx::Error> {
    if user_word_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<(String, DateTime<Utc>)> = sqlx::query_as(
        r#"
        SELECT "userWordId", MAX("createdAt")
        FROM "user_word_events"
        WHERE "userWordId" = ANY($1)
        GROUP BY "userWordId"
        "#,
    )
    .bind(user_word_ids)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().collect())
}

async fn dictionaries_by_word(
    pool: &PgPool,
    word_ids: &[String],
) -> Result<HashMap<String, Vec<DictionaryRef>>, sqlx::Error> {
    if word_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<(String, String, String)> = sqlx::query_as(
        r#"
        SELECT dw."wordId", d."id", d."name"
        FROM "dictionary_words" dw
        JOIN "dictionaries" d ON d."id" = dw."dictionaryId"
        WHERE dw."wordId" = ANY($1)
        ORDER BY d."name"
        "#,
    )
    .bind(word_ids)
    .fetch_all(pool)
    .await?;

    let mut map: HashMap<String, Vec<DictionaryRef>> = HashMap::new();
    for (word_id, id, name) in rows {
        map.entry(word_id)
            .or_default()
            .push(DictionaryRef { id, name });
    }
    Ok(map)
}

async fn tags_by_word(
    pool: &PgPool,
    word_ids: &[String],
) -> Result<HashMap<String, Vec<TagRef>>, sqlx::Error> {
    if word_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<(String, String, String, String)> = sqlx::query_as(
        r#"
        SELECT wt."wordId", t."id", t."name", t."type"
        FROM "word_tags" wt
        JOIN "tags" t ON t."id" = wt."tagId"
        WHERE wt."wordId" = ANY($1)
        ORDER BY t."name"
        "#,
    )
    .bind(word_ids)
    .fetch_all(pool)
    .await?;

    let mut map: HashMap<String, Vec<TagRef>> = HashMap::new();
    for (word_id, id, name, r#type) in rows {
        map.entry(word_id)
            .or_default()
            .push(TagRef { id, name, r#type });
    }
    Ok(map)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordSense {
    pub id: String,
    pub pos: Option<String>,
    pub definition: String,
    pub examples: Option<Value>,
    pub order: i32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DictionaryDetailRef {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordDetailWord {
    pub word_id: String,
    pub lemma: String,
    pub senses: Vec<WordSense>,
    pub tags: Vec<TagRef>,
    pub dictionaries: Vec<DictionaryDetailRef>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserWordState {
    pub user_word_id: String,
    pub status: String,
    pub stage: i32,
    pub next_due_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordEvent {
    pub id: String,
    pub r#type: String,
    pub created_at: DateTime<Utc>,
    pub payload: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WordDetail {
    pub word: WordDetailWord,
    pub user: Option<UserWordState>,
    pub events: Vec<WordEvent>,
}

/// Full catalog entry for one word: senses, tags, dictionaries, plus the
/// caller's learning state and event history when they have the word.
pub async fn word_detail(
    pool: &PgPool,
    user_id: &str,
    word_id: &str,
) -> Result<Option<WordDetail>, sqlx::Error> {
    let word_row: Option<(String, String)> =
        sqlx::query_as(r#"SELECT "id", "lemma" FROM "words" WHERE "id" = $1"#)
            .bind(word_id)
            .fetch_optional(pool)
            .await?;

    let Some((word_id, lemma)) = word_row else {
        return Ok(None);
    };

    let sense_rows = sqlx::query(
        r#"
        SELECT "id", "pos", "definition", "examples", "order"
        FROM "word_senses"
        WHERE "wordId" = $1
        ORDER BY "order" ASC
        "#,
    )
    .bind(&word_id)
    .fetch_all(pool)
    .await?;
    let senses = sense_rows
        .iter()
        .map(map_word_sense)
        .collect::<Result<Vec<_>, _>>()?;

    let single = std::slice::from_ref(&word_id);
    let tags = tags_by_word(pool, single)
        .await?
        .remove(&word_id)
        .unwrap_or_default();

    let dictionaries: Vec<DictionaryDetailRef> = sqlx::query(
        r#"
        SELECT d."id", d."name", d."description"
        FROM "dictionary_words" dw
        JOIN "dictionaries" d ON d."id" = dw."dictionaryId"
        WHERE dw."wordId" = $1
        ORDER BY d."name"
        "#,
    )
    .bind(&word_id)
    .fetch_all(pool)
    .await?
    .iter()
    .map(|row| {
        Ok::<_, sqlx::Error>(DictionaryDetailRef {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
        })
    })
    .collect::<Result<Vec<_>, _>>()?;

    let user = sqlx::query(
        r#"
        SELECT "id", "status", "stage", "nextDueAt"
        FROM "user_words"
        WHERE "userId" = $1 AND "wordId" = $2
        "#,
    )
    .bind(user_id)
    .bind(&word_id)
    .fetch_optional(pool)
    .await?
    .map(|row| {
        Ok::<_, sqlx::Error>(UserWordState {
            user_word_id: row.try_get("id")?,
            status: row.try_get("status")?,
            stage: row.try_get("stage")?,
            next_due_at: row.try_get("nextDueAt")?,
        })
    })
    .transpose()?;

    let events = sqlx::query(
        r#"
        SELECT "id", "type", "payload", "createdAt"
        FROM "user_word_events"
        WHERE "userId" = $1 AND "wordId" = $2
        ORDER BY "createdAt" DESC
        "#,
    )
    .bind(user_id)
    .bind(&word_id)
    .fetch_all(pool)
    .await?
    .iter()
    .map(|row| {
        Ok::<_, sqlx::Error>(WordEvent {
            id: row.try_get("id")?,
            r#type: row.try_get("type")?,
            created_at: row.try_get("createdAt")?,
            payload: row.try_get("payload")?,
        })
    })
    .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(WordDetail {
        word: WordDetailWord {
            word_id,
            lemma,
            senses,
            tags,
            dictionaries,
        },
        user,
        events,
    }))
}

fn map_word_sense(row: &PgRow) -> Result<WordSense, sqlx::Error> {
    Ok(WordSense {
        id: row.try_get("id")?,
        pos: row.try_get("pos")?,
        definition: row.try_get("definition")?,
        examples: row.try_get("examples")?,
        order: row.try_get("order")?,
    })
}
