use sqlx::PgPool;
use thiserror::Error;

/// Apply pending SQL migrations in order, tracked through a `_migrations`
/// bookkeeping table so reruns are no-ops.
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrationError> {
    tracing::info!("Running database migrations...");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS "_migrations" (
            "id" SERIAL PRIMARY KEY,
            "name" TEXT NOT NULL UNIQUE,
            "applied_at" TIMESTAMP NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(MigrationError::Sqlx)?;

    let applied: Vec<String> =
        sqlx::query_scalar(r#"SELECT "name" FROM "_migrations" ORDER BY "id""#)
            .fetch_all(pool)
            .await
            .map_err(MigrationError::Sqlx)?;

    let migrations = [(
        "001_init_schema",
        include_str!("../../sql/001_init_schema.sql"),
    )];

    for (name, sql) in migrations {
        if applied.iter().any(|m| m == name) {
            continue;
        }

        tracing::info!(migration = name, "applying migration");

        let mut tx = pool.begin().await.map_err(MigrationError::Sqlx)?;
        sqlx::raw_sql(sql)
            .execute(&mut *tx)
            .await
            .map_err(|err| MigrationError::Failed {
                name: name.to_string(),
                source: err,
            })?;
        sqlx::query(r#"INSERT INTO "_migrations" ("name") VALUES ($1)"#)
            .bind(name)
            .execute(&mut *tx)
            .await
            .map_err(MigrationError::Sqlx)?;
        tx.commit().await.map_err(MigrationError::Sqlx)?;
    }

    tracing::info!("Database migrations complete");
    Ok(())
}

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Sqlx(sqlx::Error),
    #[error("migration {name} failed: {source}")]
    Failed { name: String, source: sqlx::Error },
}
