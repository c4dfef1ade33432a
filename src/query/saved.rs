use serde::Serialize;
use sqlx::{SqlitePool, prelude::FromRow};

use super::new_id;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SavedPlayerRow {
    pub player_id: String,
    pub first_name: String,
    pub last_name: String,
    pub position: String,
    pub country: String,
    pub thumbnail_url: Option<String>,
    pub notes: Option<String>,
    pub saved_at: i64,
}

pub async fn list(
    pool: &SqlitePool,
    user_id: &str,
    limit: u64,
    offset: u64,
) -> anyhow::Result<(Vec<SavedPlayerRow>, i64)> {
    let total = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM saved_players s
        JOIN players p ON p.id = s.player_id
        WHERE s.user_id = ? AND p.deleted_at IS NULL
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    let rows = sqlx::query_as::<_, SavedPlayerRow>(
        r#"
        SELECT p.id AS player_id, p.first_name, p.last_name, p.position, p.country,
               p.thumbnail_url, s.notes, s.created_at AS saved_at
        FROM saved_players s
        JOIN players p ON p.id = s.player_id
        WHERE s.user_id = ? AND p.deleted_at IS NULL
        ORDER BY s.created_at DESC, s.id
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(user_id)
    .bind(limit as i64)
    .bind(offset as i64)
    .fetch_all(pool)
    .await?;

    Ok((rows, total))
}

pub async fn is_saved(pool: &SqlitePool, user_id: &str, player_id: &str) -> anyhow::Result<bool> {
    Ok(sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM saved_players WHERE user_id = ? AND player_id = ?",
    )
    .bind(user_id)
    .bind(player_id)
    .fetch_one(pool)
    .await?
        > 0)
}

/// Returns `false` when the player was already saved.
pub async fn save(
    pool: &SqlitePool,
    user_id: &str,
    player_id: &str,
    notes: Option<&str>,
    now: i64,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO saved_players (id, user_id, player_id, notes, created_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT (user_id, player_id) DO NOTHING
        "#,
    )
    .bind(new_id())
    .bind(user_id)
    .bind(player_id)
    .bind(notes)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn unsave(pool: &SqlitePool, user_id: &str, player_id: &str) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM saved_players WHERE user_id = ? AND player_id = ?")
        .bind(user_id)
        .bind(player_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
