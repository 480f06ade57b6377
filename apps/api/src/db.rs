use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS contracts (
        id TEXT PRIMARY KEY,
        position BIGSERIAL,
        client TEXT NOT NULL,
        freelancer TEXT NOT NULL,
        record JSONB NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS contracts_client_idx ON contracts (client)",
    "CREATE INDEX IF NOT EXISTS contracts_freelancer_idx ON contracts (freelancer)",
    r#"
    CREATE TABLE IF NOT EXISTS jobs (
        id UUID PRIMARY KEY,
        title TEXT NOT NULL,
        company TEXT NOT NULL,
        description TEXT NOT NULL,
        requirements TEXT[] NOT NULL DEFAULT '{}',
        location TEXT NOT NULL,
        salary TEXT,
        job_type TEXT NOT NULL,
        employer_id TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS job_applications (
        id UUID PRIMARY KEY,
        job_id UUID NOT NULL REFERENCES jobs (id),
        user_id TEXT NOT NULL,
        cover_letter TEXT,
        status TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        UNIQUE (job_id, user_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS profiles (
        user_id TEXT PRIMARY KEY,
        full_name TEXT,
        headline TEXT,
        location TEXT,
        skills TEXT[] NOT NULL DEFAULT '{}',
        experience_years INTEGER,
        resume_text TEXT,
        resume_file_name TEXT,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
];

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Creates missing tables. Safe to run on every start.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .with_context(|| format!("Schema statement failed: {}", statement.trim()))?;
    }
    info!("Database schema verified");
    Ok(())
}
