//! Storage-backed tests. They need a reachable PostgreSQL instance and skip
//! themselves when `DATABASE_URL` is not set, so the default suite still runs
//! without infrastructure.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{DateTime, Duration, Utc};
use http_body_util::BodyExt;
use tower::ServiceExt;
use uuid::Uuid;

use blinkvocab_backend::db::operations::{tasks, words};
use blinkvocab_backend::db::Database;
use blinkvocab_backend::routes;
use blinkvocab_backend::state::AppState;

async fn test_db() -> Option<Arc<Database>> {
    let configured = std::env::var("DATABASE_URL")
        .map(|v| !v.trim().is_empty())
        .unwrap_or(false);
    if !configured {
        eprintln!("DATABASE_URL not set, skipping storage-backed test");
        return None;
    }
    Some(Database::from_env().await.expect("database connection"))
}

async fn create_user(db: &Database) -> String {
    let id = Uuid::new_v4().to_string();
    sqlx::query(r#"INSERT INTO "users" ("id", "email") VALUES ($1, $2)"#)
        .bind(&id)
        .bind(format!("{id}@test.local"))
        .execute(db.pool())
        .await
        .expect("insert user");
    id
}

fn random_lemma() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("wd-{}", &suffix[..8])
}

/// Add a word for the user and force its record into the given state.
async fn seed_record(
    db: &Database,
    user_id: &str,
    status: &str,
    next_due_at: Option<DateTime<Utc>>,
) -> String {
    let outcome = words::add_manual_word(db, user_id, &random_lemma(), None, None, Utc::now())
        .await
        .expect("add word");

    let (user_word_id,): (String,) =
        sqlx::query_as(r#"SELECT "id" FROM "user_words" WHERE "userId" = $1 AND "wordId" = $2"#)
            .bind(user_id)
            .bind(&outcome.word_id)
            .fetch_one(db.pool())
            .await
            .expect("lookup record");

    sqlx::query(r#"UPDATE "user_words" SET "status" = $1, "nextDueAt" = $2 WHERE "id" = $3"#)
        .bind(status)
        .bind(next_due_at)
        .bind(&user_word_id)
        .execute(db.pool())
        .await
        .expect("update record");

    user_word_id
}

#[tokio::test]
async fn readding_a_word_keeps_one_record_but_logs_every_add() {
    let Some(db) = test_db().await else { return };
    let user_id = create_user(&db).await;
    let lemma = random_lemma();

    let first = words::add_manual_word(&db, &user_id, &lemma, None, None, Utc::now())
        .await
        .expect("first add");
    let second = words::add_manual_word(&db, &user_id, &lemma, None, None, Utc::now())
        .await
        .expect("second add");

    assert!(first.is_new_user_word);
    assert!(!second.is_new_user_word);
    assert_eq!(first.word_id, second.word_id);

    let (records,): (i64,) = sqlx::query_as(
        r#"SELECT COUNT(*) FROM "user_words" WHERE "userId" = $1 AND "wordId" = $2"#,
    )
    .bind(&user_id)
    .bind(&first.word_id)
    .fetch_one(db.pool())
    .await
    .expect("count records");
    assert_eq!(records, 1);

    let (events,): (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*) FROM "user_word_events"
        WHERE "userId" = $1 AND "wordId" = $2 AND "type" = 'added_manual'
        "#,
    )
    .bind(&user_id)
    .bind(&first.word_id)
    .fetch_one(db.pool())
    .await
    .expect("count events");
    assert_eq!(events, 2);
}

#[tokio::test]
async fn due_and_new_selection_follow_their_predicates() {
    let Some(db) = test_db().await else { return };
    let user_id = create_user(&db).await;
    let now = Utc::now();

    let overdue = seed_record(&db, &user_id, "learning", Some(now - Duration::hours(1))).await;
    let fresh = seed_record(&db, &user_id, "new", Some(now + Duration::days(1))).await;
    seed_record(&db, &user_id, "mastered", Some(now - Duration::hours(1))).await;
    seed_record(&db, &user_id, "ignored", Some(now - Duration::hours(1))).await;
    seed_record(&db, &user_id, "learning", None).await;
    // A new record past its timer shows up in both lists.
    let overdue_new = seed_record(&db, &user_id, "new", Some(now - Duration::minutes(30))).await;

    let due = tasks::due_tasks(db.pool(), &user_id, now)
        .await
        .expect("due tasks");
    let due_ids: Vec<&str> = due.iter().map(|t| t.user_word_id.as_str()).collect();
    assert_eq!(due_ids, vec![overdue.as_str(), overdue_new.as_str()]);
    for item in &due {
        assert!(item.next_due_at.expect("due item has a timer") <= now);
        assert!(item.status != "mastered" && item.status != "ignored");
    }

    let new = tasks::new_tasks(db.pool(), &user_id).await.expect("new tasks");
    let new_ids: Vec<&str> = new.iter().map(|t| t.user_word_id.as_str()).collect();
    assert_eq!(new_ids.len(), 2);
    assert!(new_ids.contains(&fresh.as_str()));
    assert!(new_ids.contains(&overdue_new.as_str()));
    assert!(new.iter().all(|t| t.status == "new"));
}

#[tokio::test]
async fn health_reports_connected_database() {
    let Some(db) = test_db().await else { return };
    let app = routes::router(AppState::new(Some(db)));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["database"], "connected");
}
