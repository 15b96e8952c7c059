use sqlx::PgPool;

#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("migration '{name}' failed: {source}")]
    Migration {
        name: String,
        #[source]
        source: sqlx::Error,
    },
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Applies any pending schema migrations, tracked in the `_migrations` table.
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrationError> {
    tracing::info!("running database migrations");

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

    // Migration files embedded at compile time, applied in order.
    let migrations = [(
        "001_init_schema",
        include_str!("../../sql/001_init_schema.sql"),
    )];

    let mut applied_count = 0;

    for (name, sql) in migrations {
        if applied.contains(&name.to_string()) {
            tracing::debug!(migration = name, "already applied, skipping");
            continue;
        }

        tracing::info!(migration = name, "applying migration");

        sqlx::raw_sql(sql)
            .execute(pool)
            .await
            .map_err(|e| MigrationError::Migration {
                name: name.to_string(),
                source: e,
            })?;

        sqlx::query(r#"INSERT INTO "_migrations" ("name") VALUES ($1)"#)
            .bind(name)
            .execute(pool)
            .await
            .map_err(MigrationError::Sqlx)?;

        applied_count += 1;
        tracing::info!(migration = name, "migration applied");
    }

    if applied_count > 0 {
        tracing::info!(count = applied_count, "database migrations completed");
    } else {
        tracing::info!("database is up to date, no migrations needed");
    }

    Ok(())
}
