pub mod table;

/// Schema migrations, embedded at build time.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn migrations_apply_on_empty_database() -> anyhow::Result<()> {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        MIGRATOR.run(&pool).await?;

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
        )
        .fetch_all(&pool)
        .await?;

        let names: Vec<&str> = tables.iter().map(|(name,)| name.as_str()).collect();
        for expected in [
            "players",
            "subscriptions",
            "match_videos",
            "player_highlights",
            "email_verification_codes",
        ] {
            assert!(names.contains(&expected), "missing {expected}: {names:?}");
        }

        Ok(())
    }
}
