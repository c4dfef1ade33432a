use sea_query::{Alias, Expr, ExprTrait, Func, JoinType, Order, Query, SqliteQueryBuilder};
use sea_query_sqlx::SqlxBinder;
use serde::{Deserialize, Serialize};
use sqlx::{SqlitePool, prelude::FromRow};
use unicorn_sport_db::table::{MatchPlayers, MatchVideos, Matches, Tournaments};

use super::new_id;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MatchRow {
    pub id: String,
    pub tournament_id: Option<String>,
    pub academy_id: Option<String>,
    pub title: String,
    pub match_date: String,
    pub location: Option<String>,
    pub stage: Option<String>,
    pub home_team: String,
    pub away_team: String,
    pub home_score: Option<i64>,
    pub away_score: Option<i64>,
    pub match_number: Option<i64>,
    pub status: String,
    pub created_at: i64,
}

const MATCH_COLUMNS: &str = "id, tournament_id, academy_id, title, match_date, location, stage, home_team, away_team, home_score, away_score, match_number, status, created_at";

pub async fn find(pool: &SqlitePool, id: &str) -> anyhow::Result<Option<MatchRow>> {
    Ok(sqlx::query_as::<_, MatchRow>(&format!(
        "SELECT {MATCH_COLUMNS} FROM matches WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?)
}

pub async fn list_by_tournament(
    pool: &SqlitePool,
    tournament_id: Option<&str>,
) -> anyhow::Result<Vec<MatchRow>> {
    Ok(sqlx::query_as::<_, MatchRow>(&format!(
        r#"
        SELECT {MATCH_COLUMNS} FROM matches
        WHERE (? IS NULL OR tournament_id = ?)
        ORDER BY match_date, match_number, id
        "#
    ))
    .bind(tournament_id)
    .bind(tournament_id)
    .fetch_all(pool)
    .await?)
}

/// Writable match columns; `None` keeps the stored value on update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchFields {
    pub tournament_id: Option<String>,
    pub academy_id: Option<String>,
    pub title: Option<String>,
    pub match_date: Option<String>,
    pub location: Option<String>,
    pub stage: Option<String>,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    pub home_score: Option<i64>,
    pub away_score: Option<i64>,
    pub match_number: Option<i64>,
    pub status: Option<String>,
}

pub async fn create(
    pool: &SqlitePool,
    title: &str,
    match_date: &str,
    home_team: &str,
    away_team: &str,
    fields: &MatchFields,
    now: i64,
) -> anyhow::Result<String> {
    let id = new_id();

    sqlx::query(
        r#"
        INSERT INTO matches (
            id, tournament_id, academy_id, title, match_date, location, stage, home_team,
            away_team, home_score, away_score, match_number, status, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, COALESCE(?, 'scheduled'), ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&fields.tournament_id)
    .bind(&fields.academy_id)
    .bind(title.trim())
    .bind(match_date)
    .bind(&fields.location)
    .bind(&fields.stage)
    .bind(home_team.trim())
    .bind(away_team.trim())
    .bind(fields.home_score)
    .bind(fields.away_score)
    .bind(fields.match_number)
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
    fields: &MatchFields,
    now: i64,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE matches SET
            tournament_id = COALESCE(?, tournament_id),
            academy_id = COALESCE(?, academy_id),
            title = COALESCE(?, title),
            match_date = COALESCE(?, match_date),
            location = COALESCE(?, location),
            stage = COALESCE(?, stage),
            home_team = COALESCE(?, home_team),
            away_team = COALESCE(?, away_team),
            home_score = COALESCE(?, home_score),
            away_score = COALESCE(?, away_score),
            match_number = COALESCE(?, match_number),
            status = COALESCE(?, status),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&fields.tournament_id)
    .bind(&fields.academy_id)
    .bind(&fields.title)
    .bind(&fields.match_date)
    .bind(&fields.location)
    .bind(&fields.stage)
    .bind(&fields.home_team)
    .bind(&fields.away_team)
    .bind(fields.home_score)
    .bind(fields.away_score)
    .bind(fields.match_number)
    .bind(&fields.status)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Lineup and video go with the match; highlights only lose the link.
pub async fn delete(pool: &SqlitePool, id: &str) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM matches WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MatchVideoRow {
    pub id: String,
    pub match_id: String,
    #[serde(skip)]
    pub video_key: String,
    pub thumbnail_url: Option<String>,
    pub duration_seconds: Option<i64>,
    pub file_size_bytes: Option<i64>,
    pub status: String,
    pub price_cents: i64,
    pub currency: String,
    pub view_count: i64,
    pub created_at: i64,
}

impl MatchVideoRow {
    pub fn is_ready(&self) -> bool {
        self.status == "ready"
    }
}

const VIDEO_COLUMNS: &str = "id, match_id, video_key, thumbnail_url, duration_seconds, file_size_bytes, status, price_cents, currency, view_count, created_at";

pub async fn find_video(pool: &SqlitePool, match_id: &str) -> anyhow::Result<Option<MatchVideoRow>> {
    Ok(sqlx::query_as::<_, MatchVideoRow>(&format!(
        "SELECT {VIDEO_COLUMNS} FROM match_videos WHERE match_id = ?"
    ))
    .bind(match_id)
    .fetch_optional(pool)
    .await?)
}

pub async fn find_ready_video(
    pool: &SqlitePool,
    match_id: &str,
) -> anyhow::Result<Option<MatchVideoRow>> {
    Ok(find_video(pool, match_id)
        .await?
        .filter(MatchVideoRow::is_ready))
}

pub struct NewVideo<'a> {
    pub match_id: &'a str,
    pub video_key: &'a str,
    pub thumbnail_url: Option<&'a str>,
    pub duration_seconds: Option<i64>,
    pub file_size_bytes: Option<i64>,
    pub price_cents: i64,
    pub currency: &'a str,
}

pub async fn create_video(pool: &SqlitePool, new: NewVideo<'_>, now: i64) -> anyhow::Result<String> {
    let id = new_id();

    sqlx::query(
        r#"
        INSERT INTO match_videos (
            id, match_id, video_key, thumbnail_url, duration_seconds, file_size_bytes, status,
            price_cents, currency, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, 'ready', ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(new.match_id)
    .bind(new.video_key)
    .bind(new.thumbnail_url)
    .bind(new.duration_seconds)
    .bind(new.file_size_bytes)
    .bind(new.price_cents)
    .bind(new.currency)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(id)
}

pub async fn delete_video(pool: &SqlitePool, match_id: &str) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM match_videos WHERE match_id = ?")
        .bind(match_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn set_video_thumbnail(
    pool: &SqlitePool,
    match_id: &str,
    thumbnail_url: &str,
    now: i64,
) -> anyhow::Result<bool> {
    let result =
        sqlx::query("UPDATE match_videos SET thumbnail_url = ?, updated_at = ? WHERE match_id = ?")
            .bind(thumbnail_url)
            .bind(now)
            .bind(match_id)
            .execute(pool)
            .await?;

    Ok(result.rows_affected() > 0)
}

#[derive(Debug, Clone, Default, Serialize, FromRow)]
pub struct VideoCounts {
    pub total: i64,
    pub ready: i64,
    pub views: i64,
}

pub async fn video_counts(pool: &SqlitePool) -> anyhow::Result<VideoCounts> {
    Ok(sqlx::query_as::<_, VideoCounts>(
        r#"
        SELECT COUNT(*) AS total,
               COALESCE(SUM(status = 'ready'), 0) AS ready,
               COALESCE(SUM(view_count), 0) AS views
        FROM match_videos
        "#,
    )
    .fetch_one(pool)
    .await?)
}

pub async fn increment_views(pool: &SqlitePool, video_id: &str) -> anyhow::Result<()> {
    sqlx::query("UPDATE match_videos SET view_count = view_count + 1 WHERE id = ?")
        .bind(video_id)
        .execute(pool)
        .await?;

    Ok(())
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FullMatchRow {
    pub match_id: String,
    pub title: String,
    pub match_date: String,
    pub home_team: String,
    pub away_team: String,
    pub home_score: Option<i64>,
    pub away_score: Option<i64>,
    pub tournament_id: Option<String>,
    pub tournament_name: Option<String>,
    pub thumbnail_url: Option<String>,
    pub duration_seconds: Option<i64>,
    pub price_cents: i64,
    pub currency: String,
    pub view_count: i64,
}

#[derive(Debug, Default)]
pub struct FullMatchFilter {
    pub tournament_id: Option<String>,
    pub player_id: Option<String>,
}

/// Matches whose video is ready to stream, newest first.
pub async fn list_full_matches(
    pool: &SqlitePool,
    filter: &FullMatchFilter,
    limit: u64,
    offset: u64,
) -> anyhow::Result<(Vec<FullMatchRow>, i64)> {
    let mut base = Query::select()
        .from(MatchVideos::Table)
        .inner_join(
            Matches::Table,
            Expr::col((Matches::Table, Matches::Id)).equals((MatchVideos::Table, MatchVideos::MatchId)),
        )
        .join(
            JoinType::LeftJoin,
            Tournaments::Table,
            Expr::col((Tournaments::Table, Tournaments::Id))
                .equals((Matches::Table, Matches::TournamentId)),
        )
        .and_where(Expr::col((MatchVideos::Table, MatchVideos::Status)).eq("ready"))
        .to_owned();

    if let Some(tournament_id) = &filter.tournament_id {
        base.and_where(Expr::col((Matches::Table, Matches::TournamentId)).eq(tournament_id.as_str()));
    }

    if let Some(player_id) = &filter.player_id {
        let played = Query::select()
            .column(MatchPlayers::MatchId)
            .from(MatchPlayers::Table)
            .and_where(Expr::col(MatchPlayers::PlayerId).eq(player_id.as_str()))
            .to_owned();

        base.and_where(Expr::col((Matches::Table, Matches::Id)).in_subquery(played));
    }

    let (sql, values) = base
        .clone()
        .expr(Func::count(Expr::col((MatchVideos::Table, MatchVideos::Id))))
        .build_sqlx(SqliteQueryBuilder);
    let (total,) = sqlx::query_as_with::<_, (i64,), _>(&sql, values)
        .fetch_one(pool)
        .await?;

    let (sql, values) = base
        .expr_as(Expr::col((Matches::Table, Matches::Id)), Alias::new("match_id"))
        .columns([
            (Matches::Table, Matches::Title),
            (Matches::Table, Matches::MatchDate),
            (Matches::Table, Matches::HomeTeam),
            (Matches::Table, Matches::AwayTeam),
            (Matches::Table, Matches::HomeScore),
            (Matches::Table, Matches::AwayScore),
            (Matches::Table, Matches::TournamentId),
        ])
        .expr_as(
            Expr::col((Tournaments::Table, Tournaments::Name)),
            Alias::new("tournament_name"),
        )
        .columns([
            (MatchVideos::Table, MatchVideos::ThumbnailUrl),
            (MatchVideos::Table, MatchVideos::DurationSeconds),
            (MatchVideos::Table, MatchVideos::PriceCents),
            (MatchVideos::Table, MatchVideos::Currency),
            (MatchVideos::Table, MatchVideos::ViewCount),
        ])
        .order_by((Matches::Table, Matches::MatchDate), Order::Desc)
        .order_by((Matches::Table, Matches::Id), Order::Asc)
        .limit(limit)
        .offset(offset)
        .build_sqlx(SqliteQueryBuilder);

    let rows = sqlx::query_as_with::<_, FullMatchRow, _>(&sql, values)
        .fetch_all(pool)
        .await?;

    Ok((rows, total))
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LineupRow {
    pub player_id: String,
    pub first_name: String,
    pub last_name: String,
    pub team: Option<String>,
    pub jersey_number: Option<i64>,
    pub position: Option<String>,
    pub is_starter: bool,
    pub minutes_played: Option<i64>,
    pub goals: i64,
    pub assists: i64,
    pub yellow_cards: i64,
    pub red_cards: i64,
}

pub async fn lineup(pool: &SqlitePool, match_id: &str) -> anyhow::Result<Vec<LineupRow>> {
    Ok(sqlx::query_as::<_, LineupRow>(
        r#"
        SELECT mp.player_id, p.first_name, p.last_name, mp.team, mp.jersey_number, mp.position,
               mp.is_starter, mp.minutes_played, mp.goals, mp.assists, mp.yellow_cards, mp.red_cards
        FROM match_players mp
        JOIN players p ON p.id = mp.player_id
        WHERE mp.match_id = ? AND p.deleted_at IS NULL
        ORDER BY mp.team, mp.is_starter DESC, mp.jersey_number
        "#,
    )
    .bind(match_id)
    .fetch_all(pool)
    .await?)
}

pub async fn is_in_match(pool: &SqlitePool, match_id: &str, player_id: &str) -> anyhow::Result<bool> {
    Ok(sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM match_players WHERE match_id = ? AND player_id = ?",
    )
    .bind(match_id)
    .bind(player_id)
    .fetch_one(pool)
    .await?
        > 0)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppearanceFields {
    pub team: Option<String>,
    pub jersey_number: Option<i64>,
    pub position: Option<String>,
    pub is_starter: Option<bool>,
    pub minutes_played: Option<i64>,
    pub goals: Option<i64>,
    pub assists: Option<i64>,
    pub yellow_cards: Option<i64>,
    pub red_cards: Option<i64>,
}

/// Starts as a starter in the player's registered position unless told otherwise.
pub async fn add_player(
    pool: &SqlitePool,
    match_id: &str,
    player_id: &str,
    fields: &AppearanceFields,
    now: i64,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO match_players (
            id, match_id, player_id, team, jersey_number, position, is_starter, minutes_played,
            goals, assists, yellow_cards, red_cards, created_at, updated_at
        )
        SELECT ?, ?, p.id, ?, ?, COALESCE(?, p.position), ?, ?, ?, ?, ?, ?, ?, ?
        FROM players p WHERE p.id = ?
        "#,
    )
    .bind(new_id())
    .bind(match_id)
    .bind(&fields.team)
    .bind(fields.jersey_number)
    .bind(&fields.position)
    .bind(fields.is_starter.unwrap_or(true))
    .bind(fields.minutes_played)
    .bind(fields.goals.unwrap_or(0))
    .bind(fields.assists.unwrap_or(0))
    .bind(fields.yellow_cards.unwrap_or(0))
    .bind(fields.red_cards.unwrap_or(0))
    .bind(now)
    .bind(now)
    .bind(player_id)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn update_stats(
    pool: &SqlitePool,
    match_id: &str,
    player_id: &str,
    fields: &AppearanceFields,
    now: i64,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE match_players SET
            team = COALESCE(?, team),
            jersey_number = COALESCE(?, jersey_number),
            position = COALESCE(?, position),
            is_starter = COALESCE(?, is_starter),
            minutes_played = COALESCE(?, minutes_played),
            goals = COALESCE(?, goals),
            assists = COALESCE(?, assists),
            yellow_cards = COALESCE(?, yellow_cards),
            red_cards = COALESCE(?, red_cards),
            updated_at = ?
        WHERE match_id = ? AND player_id = ?
        "#,
    )
    .bind(&fields.team)
    .bind(fields.jersey_number)
    .bind(&fields.position)
    .bind(fields.is_starter)
    .bind(fields.minutes_played)
    .bind(fields.goals)
    .bind(fields.assists)
    .bind(fields.yellow_cards)
    .bind(fields.red_cards)
    .bind(now)
    .bind(match_id)
    .bind(player_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn remove_player(pool: &SqlitePool, match_id: &str, player_id: &str) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM match_players WHERE match_id = ? AND player_id = ?")
        .bind(match_id)
        .bind(player_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn count_since(pool: &SqlitePool, since: Option<i64>) -> anyhow::Result<i64> {
    Ok(
        sqlx::query_scalar("SELECT COUNT(*) FROM matches WHERE (? IS NULL OR created_at >= ?)")
            .bind(since)
            .bind(since)
            .fetch_one(pool)
            .await?,
    )
}
