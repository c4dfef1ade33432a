use std::{borrow::Cow, str::FromStr, time::Duration};

use anyhow::Result;
use sqlx::{
    ConnectOptions, SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
};
use tracing::log::LevelFilter;

/// Pragmas without a dedicated connect option, run on every new connection.
const EXTRA_PRAGMAS: [(&str, &str); 2] = [("cache_size", "-20000"), ("temp_store", "memory")];

fn connect_options(database_url: &str) -> Result<SqliteConnectOptions> {
    let mut options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5))
        .synchronous(SqliteSynchronous::Normal)
        .log_statements(LevelFilter::Debug);

    // in-memory databases keep their own journal
    if !database_url.contains(":memory:") {
        options = options.journal_mode(SqliteJournalMode::Wal);
    }

    for (key, value) in EXTRA_PRAGMAS {
        options = options.pragma(key, Cow::Borrowed(value));
    }

    Ok(options)
}

/// Opens the pool every request handler and CLI command shares.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(connect_options(database_url)?)
        .await?;

    tracing::info!(max_connections, "Database pool ready");

    Ok(pool)
}

/// Apply the embedded schema migrations.
#[tracing::instrument(skip(pool))]
pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    unicorn_sport_db::MIGRATOR.run(pool).await?;

    Ok(())
}
