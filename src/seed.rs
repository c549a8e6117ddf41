//! Demo data for local development, gated behind `SEED_DEMO_DATA`. Seeds one
//! demo user plus a small starter dictionary so the task and dashboard
//! endpoints have something to show on a fresh database.

use uuid::Uuid;

use crate::db::Database;

pub const DEMO_USER_EMAIL: &str = "seed@blinkvocab.local";
pub const DEMO_DICTIONARY_NAME: &str = "English Essentials";

pub fn seed_enabled() -> bool {
    std::env::var("SEED_DEMO_DATA")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false)
}

const SEED_WORDS: &[(&str, &str, &str)] = &[
    ("abundant", "adj", "existing or available in large quantities"),
    ("accommodate", "v", "to provide lodging or sufficient space for"),
    ("achieve", "v", "to successfully bring about or reach a goal"),
    ("acknowledge", "v", "to accept or admit the existence or truth of"),
    ("acquire", "v", "to buy or obtain for oneself"),
    ("adapt", "v", "to make suitable for a new use or purpose"),
    ("adequate", "adj", "satisfactory or acceptable in quality or quantity"),
    ("adjacent", "adj", "next to or adjoining something else"),
    ("advance", "v", "to move forward in a purposeful way"),
    ("advocate", "v", "to publicly recommend or support"),
];

/// Idempotent: a second run against the same database is a no-op.
pub async fn seed_demo_data(db: &Database) {
    if let Err(err) = try_seed(db).await {
        tracing::warn!(error = %err, "failed to seed demo data");
    }
}

async fn try_seed(db: &Database) -> Result<(), sqlx::Error> {
    let pool = db.pool();

    let existing: Option<(String,)> =
        sqlx::query_as(r#"SELECT "id" FROM "users" WHERE "email" = $1"#)
            .bind(DEMO_USER_EMAIL)
            .fetch_optional(pool)
            .await?;

    if existing.is_some() {
        tracing::debug!("demo data already present, skipping seed");
        return Ok(());
    }

    let mut tx = pool.begin().await?;

    let user_id = Uuid::new_v4().to_string();
    sqlx::query(r#"INSERT INTO "users" ("id", "email") VALUES ($1, $2)"#)
        .bind(&user_id)
        .bind(DEMO_USER_EMAIL)
        .execute(&mut *tx)
        .await?;

    let dictionary_id = Uuid::new_v4().to_string();
    sqlx::query(
        r#"
        INSERT INTO "dictionaries" ("id", "name", "description", "language")
        VALUES ($1, $2, $3, 'en')
        "#,
    )
    .bind(&dictionary_id)
    .bind(DEMO_DICTIONARY_NAME)
    .bind("Starter vocabulary for trying out the app")
    .execute(&mut *tx)
    .await?;

    for (lemma, pos, definition) in SEED_WORDS {
        sqlx::query(
            r#"
            INSERT INTO "words" ("id", "lemma", "language", "source")
            VALUES ($1, $2, 'en', 'seed')
            ON CONFLICT ("lemma", "language") DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(lemma)
        .execute(&mut *tx)
        .await?;

        let (word_id,): (String,) =
            sqlx::query_as(r#"SELECT "id" FROM "words" WHERE "lemma" = $1 AND "language" = 'en'"#)
                .bind(lemma)
                .fetch_one(&mut *tx)
                .await?;

        sqlx::query(
            r#"
            INSERT INTO "word_senses" ("id", "wordId", "pos", "definition", "order")
            VALUES ($1, $2, $3, $4, 0)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&word_id)
        .bind(pos)
        .bind(definition)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO "dictionary_words" ("dictionaryId", "wordId")
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(&dictionary_id)
        .bind(&word_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    tracing::info!(
        email = DEMO_USER_EMAIL,
        dictionary = DEMO_DICTIONARY_NAME,
        words = SEED_WORDS.len(),
        "seeded demo data"
    );

    Ok(())
}
