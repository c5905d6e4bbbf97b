use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established (max_connections={max_connections})");
    Ok(pool)
}

const SCHEMA: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS interview_sessions (
        session_id              TEXT PRIMARY KEY,
        resume_id               UUID,
        total_questions         INTEGER NOT NULL,
        current_question_index  INTEGER NOT NULL DEFAULT 0,
        status                  TEXT NOT NULL,
        questions               JSONB NOT NULL,
        overall_score           DOUBLE PRECISION,
        overall_feedback        TEXT,
        strengths               JSONB,
        improvements            JSONB,
        reference_answers       JSONB,
        category_scores         JSONB,
        created_at              TIMESTAMPTZ NOT NULL DEFAULT now(),
        completed_at            TIMESTAMPTZ
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS interview_answers (
        id              BIGSERIAL PRIMARY KEY,
        session_id      TEXT NOT NULL REFERENCES interview_sessions (session_id) ON DELETE CASCADE,
        question_index  INTEGER NOT NULL,
        question        TEXT NOT NULL,
        category        TEXT NOT NULL,
        user_answer     TEXT NOT NULL,
        score           SMALLINT,
        feedback        TEXT,
        answered_at     TIMESTAMPTZ NOT NULL DEFAULT now(),
        UNIQUE (session_id, question_index)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_interview_sessions_resume_id ON interview_sessions (resume_id)",
];

/// Creates the interview tables if they do not exist yet.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .context("apply interview schema")?;
    }
    info!("Interview schema ready");
    Ok(())
}
