use sqlx::{Pool, Postgres};
use tracing::{debug, info};

const SCHEMA_STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS long_short_ratios (
        id          BIGSERIAL PRIMARY KEY,
        exchange    TEXT NOT NULL,
        symbol      TEXT NOT NULL,
        ratio       DOUBLE PRECISION NOT NULL,
        observed_at TIMESTAMPTZ NOT NULL,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        CONSTRAINT long_short_ratios_natural_key UNIQUE (exchange, symbol, observed_at)
    )",
    "CREATE INDEX IF NOT EXISTS idx_long_short_ratios_observed_at
        ON long_short_ratios (observed_at)",
    "CREATE TABLE IF NOT EXISTS api_logs (
        id               BIGSERIAL PRIMARY KEY,
        created_at       TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        exchange         TEXT NOT NULL,
        symbol           TEXT NOT NULL,
        period           TEXT NOT NULL,
        request_limit    INTEGER NOT NULL,
        url              TEXT NOT NULL,
        status_code      INTEGER NOT NULL,
        response_time_ms BIGINT NOT NULL,
        data_count       INTEGER NOT NULL,
        error_msg        TEXT NOT NULL DEFAULT '',
        success          BOOLEAN NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_api_logs_created_at ON api_logs (created_at)",
    "CREATE INDEX IF NOT EXISTS idx_api_logs_exchange_created_at
        ON api_logs (exchange, created_at)",
];

/// Creates tables and indexes that do not exist yet. Safe to run on every start.
pub async fn ensure_schema(pool: &Pool<Postgres>) -> Result<(), sqlx::Error> {
    info!("Ensuring PostgreSQL schema");

    for statement in SCHEMA_STATEMENTS {
        debug!("Executing schema statement: {}", first_line(statement));
        sqlx::query(statement).execute(pool).await?;
    }

    info!("PostgreSQL schema is up to date");
    Ok(())
}

fn first_line(statement: &str) -> &str {
    statement.lines().next().unwrap_or(statement)
}
