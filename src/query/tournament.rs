use serde::{Deserialize, Serialize};
use sqlx::{SqlitePool, prelude::FromRow};

use super::new_id;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TournamentRow {
    pub id: String,
    pub name: String,
    pub year: i64,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub status: String,
    pub created_at: i64,
}

const COLUMNS: &str =
    "id, name, year, description, location, start_date, end_date, status, created_at";

pub async fn list(pool: &SqlitePool) -> anyhow::Result<Vec<TournamentRow>> {
    Ok(sqlx::query_as::<_, TournamentRow>(&format!(
        "SELECT {COLUMNS} FROM tournaments ORDER BY year DESC, name"
    ))
    .fetch_all(pool)
    .await?)
}

pub async fn find(pool: &SqlitePool, id: &str) -> anyhow::Result<Option<TournamentRow>> {
    Ok(sqlx::query_as::<_, TournamentRow>(&format!(
        "SELECT {COLUMNS} FROM tournaments WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TournamentFields {
    pub name: Option<String>,
    pub year: Option<i64>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub status: Option<String>,
}

pub async fn create(
    pool: &SqlitePool,
    name: &str,
    year: i64,
    fields: &TournamentFields,
    now: i64,
) -> anyhow::Result<String> {
    let id = new_id();

    sqlx::query(
        r#"
        INSERT INTO tournaments
            (id, name, year, description, location, start_date, end_date, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, COALESCE(?, 'upcoming'), ?, ?)
        "#,
    )
    .bind(&id)
    .bind(name.trim())
    .bind(year)
    .bind(&fields.description)
    .bind(&fields.location)
    .bind(&fields.start_date)
    .bind(&fields.end_date)
    .bind(&fields.status)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(id)
}

pub async fn update(
    pool: &SqlitePool,
    id: &str,
    fields: &TournamentFields,
    now: i64,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE tournaments SET
            name = COALESCE(?, name),
            year = COALESCE(?, year),
            description = COALESCE(?, description),
            location = COALESCE(?, location),
            start_date = COALESCE(?, start_date),
            end_date = COALESCE(?, end_date),
            status = COALESCE(?, status),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&fields.name)
    .bind(fields.year)
    .bind(&fields.description)
    .bind(&fields.location)
    .bind(&fields.start_date)
    .bind(&fields.end_date)
    .bind(&fields.status)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn count(pool: &SqlitePool) -> anyhow::Result<i64> {
    Ok(sqlx::query_scalar("SELECT COUNT(*) FROM tournaments")
        .fetch_one(pool)
        .await?)
}

/// One match a player took part in, with the tournament it belongs to.
#[derive(Debug, Clone, FromRow)]
pub struct AppearanceRow {
    pub tournament_id: Option<String>,
    pub tournament_name: Option<String>,
    pub tournament_year: Option<i64>,
    pub match_id: String,
    pub title: String,
    pub match_date: String,
    pub home_team: String,
    pub away_team: String,
    pub home_score: Option<i64>,
    pub away_score: Option<i64>,
    pub goals: i64,
    pub assists: i64,
    pub minutes_played: Option<i64>,
    pub highlight_count: i64,
    pub has_full_match: bool,
}

pub async fn player_appearances(
    pool: &SqlitePool,
    player_id: &str,
) -> anyhow::Result<Vec<AppearanceRow>> {
    Ok(sqlx::query_as::<_, AppearanceRow>(
        r#"
        SELECT t.id AS tournament_id, t.name AS tournament_name, t.year AS tournament_year,
               m.id AS match_id, m.title, m.match_date, m.home_team, m.away_team,
               m.home_score, m.away_score, mp.goals, mp.assists, mp.minutes_played,
               (SELECT COUNT(*) FROM player_highlights h
                WHERE h.match_id = m.id AND h.player_id = mp.player_id AND h.status = 'approved')
                   AS highlight_count,
               EXISTS (SELECT 1 FROM match_videos v WHERE v.match_id = m.id AND v.status = 'ready')
                   AS has_full_match
        FROM match_players mp
        JOIN matches m ON m.id = mp.match_id
        LEFT JOIN tournaments t ON t.id = m.tournament_id
        WHERE mp.player_id = ?
        ORDER BY t.year DESC, t.name, m.match_date DESC, m.id
        "#,
    )
    .bind(player_id)
    .fetch_all(pool)
    .await?)
}
