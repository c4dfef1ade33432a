use serde::{Deserialize, Serialize};
use sqlx::{SqlitePool, prelude::FromRow};
use unicorn_sport_access::{HighlightStatus, HighlightType};

use super::new_id;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct HighlightRow {
    pub id: String,
    pub player_id: String,
    pub match_id: Option<String>,
    pub highlight_type: String,
    #[serde(skip)]
    pub video_key: String,
    pub thumbnail_url: Option<String>,
    pub duration_seconds: Option<i64>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub timestamp_in_match: Option<i64>,
    pub status: String,
    pub view_count: i64,
    pub created_at: i64,
}

impl HighlightRow {
    /// Unrecognised values are treated as not yet moderated.
    pub fn status(&self) -> HighlightStatus {
        self.status.parse().unwrap_or(HighlightStatus::Pending)
    }
}

const COLUMNS: &str = "id, player_id, match_id, highlight_type, video_key, thumbnail_url, duration_seconds, title, description, timestamp_in_match, status, view_count, created_at";

pub async fn find(pool: &SqlitePool, id: &str) -> anyhow::Result<Option<HighlightRow>> {
    Ok(sqlx::query_as::<_, HighlightRow>(&format!(
        "SELECT {COLUMNS} FROM player_highlights WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?)
}

/// Every clip of a player regardless of moderation status, newest first.
pub async fn list_by_player(
    pool: &SqlitePool,
    player_id: &str,
    highlight_type: Option<HighlightType>,
    limit: Option<u32>,
) -> anyhow::Result<Vec<HighlightRow>> {
    Ok(sqlx::query_as::<_, HighlightRow>(&format!(
        r#"
        SELECT {COLUMNS} FROM player_highlights
        WHERE player_id = ? AND (? IS NULL OR LOWER(highlight_type) = ?)
        ORDER BY created_at DESC, id
        LIMIT ?
        "#
    ))
    .bind(player_id)
    .bind(highlight_type.map(|t| t.to_string()))
    .bind(highlight_type.map(|t| t.to_string()))
    // sqlite reads a negative limit as unbounded
    .bind(limit.map_or(-1, i64::from))
    .fetch_all(pool)
    .await?)
}

/// A clip together with the player it belongs to.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PlayerHighlightRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub highlight: HighlightRow,
    pub player_first_name: String,
    pub player_last_name: String,
    pub player_photo_url: Option<String>,
}

const JOINED_COLUMNS: &str = r#"
    h.id, h.player_id, h.match_id, h.highlight_type, h.video_key, h.thumbnail_url,
    h.duration_seconds, h.title, h.description, h.timestamp_in_match, h.status,
    h.view_count, h.created_at,
    p.first_name AS player_first_name, p.last_name AS player_last_name,
    p.profile_photo_url AS player_photo_url
"#;

#[derive(Debug, Default)]
pub struct FeedFilter {
    pub highlight_type: Option<HighlightType>,
    pub player_id: Option<String>,
    pub tournament_id: Option<String>,
}

/// Approved clips of verified, listed players, newest first.
///
/// The tournament filter matches either the clip's match or the player's
/// own tournament.
pub async fn list_public(
    pool: &SqlitePool,
    filter: &FeedFilter,
    limit: u64,
    offset: u64,
) -> anyhow::Result<(Vec<PlayerHighlightRow>, i64)> {
    const FROM: &str = r#"
        FROM player_highlights h
        JOIN players p ON p.id = h.player_id
        LEFT JOIN matches m ON m.id = h.match_id
        WHERE h.status = 'approved'
          AND p.verification_status = 'verified' AND p.deleted_at IS NULL
          AND (?1 IS NULL OR LOWER(h.highlight_type) = ?1)
          AND (?2 IS NULL OR h.player_id = ?2)
          AND (?3 IS NULL OR m.tournament_id = ?3 OR p.tournament_id = ?3)
    "#;

    let highlight_type = filter.highlight_type.map(|t| t.to_string());

    let total = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) {FROM}"))
        .bind(&highlight_type)
        .bind(&filter.player_id)
        .bind(&filter.tournament_id)
        .fetch_one(pool)
        .await?;

    let rows = sqlx::query_as::<_, PlayerHighlightRow>(&format!(
        "SELECT {JOINED_COLUMNS} {FROM} ORDER BY h.created_at DESC, h.id LIMIT ?4 OFFSET ?5"
    ))
    .bind(&highlight_type)
    .bind(&filter.player_id)
    .bind(&filter.tournament_id)
    .bind(limit as i64)
    .bind(offset as i64)
    .fetch_all(pool)
    .await?;

    Ok((rows, total))
}

/// Every clip cut from a match in any moderation state, in match order.
pub async fn list_by_match(
    pool: &SqlitePool,
    match_id: &str,
    player_id: Option<&str>,
) -> anyhow::Result<Vec<PlayerHighlightRow>> {
    Ok(sqlx::query_as::<_, PlayerHighlightRow>(&format!(
        r#"
        SELECT {JOINED_COLUMNS}
        FROM player_highlights h
        JOIN players p ON p.id = h.player_id
        WHERE h.match_id = ?1 AND (?2 IS NULL OR h.player_id = ?2)
        ORDER BY h.timestamp_in_match IS NULL, h.timestamp_in_match, h.created_at DESC, h.id
        "#
    ))
    .bind(match_id)
    .bind(player_id)
    .fetch_all(pool)
    .await?)
}

pub struct NewHighlight<'a> {
    pub player_id: &'a str,
    pub match_id: Option<&'a str>,
    pub highlight_type: HighlightType,
    pub video_key: &'a str,
    pub thumbnail_url: Option<&'a str>,
    pub duration_seconds: Option<i64>,
    pub title: Option<&'a str>,
    pub description: Option<&'a str>,
    pub timestamp_in_match: Option<i64>,
}

/// Admin uploads go live immediately.
pub async fn create(pool: &SqlitePool, new: NewHighlight<'_>, now: i64) -> anyhow::Result<String> {
    let id = new_id();

    sqlx::query(
        r#"
        INSERT INTO player_highlights (
            id, player_id, match_id, highlight_type, video_key, thumbnail_url, duration_seconds,
            title, description, timestamp_in_match, status, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(new.player_id)
    .bind(new.match_id)
    .bind(new.highlight_type.to_string())
    .bind(new.video_key)
    .bind(new.thumbnail_url)
    .bind(new.duration_seconds)
    .bind(new.title)
    .bind(new.description)
    .bind(new.timestamp_in_match)
    .bind(HighlightStatus::Approved.to_string())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(id)
}

#[derive(Debug, Default, Deserialize)]
pub struct HighlightChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub highlight_type: Option<HighlightType>,
    pub status: Option<HighlightStatus>,
}

pub async fn update(
    pool: &SqlitePool,
    id: &str,
    changes: &HighlightChanges,
    now: i64,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE player_highlights SET
            title = COALESCE(?, title),
            description = COALESCE(?, description),
            highlight_type = COALESCE(?, highlight_type),
            status = COALESCE(?, status),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&changes.title)
    .bind(&changes.description)
    .bind(changes.highlight_type.map(|t| t.to_string()))
    .bind(changes.status.map(|s| s.to_string()))
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete(pool: &SqlitePool, id: &str) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM player_highlights WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn set_thumbnail(
    pool: &SqlitePool,
    id: &str,
    thumbnail_url: &str,
    now: i64,
) -> anyhow::Result<bool> {
    let result =
        sqlx::query("UPDATE player_highlights SET thumbnail_url = ?, updated_at = ? WHERE id = ?")
            .bind(thumbnail_url)
            .bind(now)
            .bind(id)
            .execute(pool)
            .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn increment_views(pool: &SqlitePool, id: &str) -> anyhow::Result<()> {
    sqlx::query("UPDATE player_highlights SET view_count = view_count + 1 WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn count_approved(pool: &SqlitePool) -> anyhow::Result<i64> {
    Ok(
        sqlx::query_scalar("SELECT COUNT(*) FROM player_highlights WHERE status = 'approved'")
            .fetch_one(pool)
            .await?,
    )
}

pub async fn count_since(pool: &SqlitePool, since: Option<i64>) -> anyhow::Result<i64> {
    Ok(sqlx::query_scalar(
        "SELECT COUNT(*) FROM player_highlights WHERE (? IS NULL OR created_at >= ?)",
    )
    .bind(since)
    .bind(since)
    .fetch_one(pool)
    .await?)
}

#[derive(Debug, Clone, Default, Serialize, FromRow)]
pub struct HighlightCounts {
    pub total: i64,
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
    pub views: i64,
}

pub async fn counts(pool: &SqlitePool) -> anyhow::Result<HighlightCounts> {
    Ok(sqlx::query_as::<_, HighlightCounts>(
        r#"
        SELECT COUNT(*) AS total,
               COALESCE(SUM(status = 'pending'), 0) AS pending,
               COALESCE(SUM(status = 'approved'), 0) AS approved,
               COALESCE(SUM(status = 'rejected'), 0) AS rejected,
               COALESCE(SUM(view_count), 0) AS views
        FROM player_highlights
        "#,
    )
    .fetch_one(pool)
    .await?)
}
