use std::{str::FromStr, time::Duration};

use anyhow::Context;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    PgPool,
};

pub const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);
/// Server-side cap on a single statement.
pub const STATEMENT_TIMEOUT: &str = "45s";

fn pool_options() -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(ACQUIRE_TIMEOUT)
}

fn connect_options(database_url: &str) -> anyhow::Result<PgConnectOptions> {
    Ok(PgConnectOptions::from_str(database_url)
        .context("parse DATABASE_URL")?
        .options([("statement_timeout", STATEMENT_TIMEOUT)]))
}

pub async fn connect(database_url: &str) -> anyhow::Result<PgPool> {
    pool_options()
        .connect_with(connect_options(database_url)?)
        .await
        .context("connect to database")
}

/// Pool that only dials on first use; lets a development server come up
/// while the database is still unreachable.
pub fn connect_lazy(database_url: &str) -> anyhow::Result<PgPool> {
    Ok(pool_options().connect_lazy_with(connect_options(database_url)?))
}

pub async fn migrate(db: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(db)
        .await
        .context("run migrations")
}
