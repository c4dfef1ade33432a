//! Public player profiles and highlight clips

use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::VariantArray;
use unicorn_sport_access::{
    HighlightType, PlayerStats, compute_stats, full_match_locked, visible_highlights,
};

use super::AppState;
use crate::{
    auth::MaybeAuthUser,
    error::AppError,
    query::{
        self, AccessStore,
        highlight::HighlightRow,
        player::{FeaturedPlayer, PlayerRow},
    },
    response::{Page, PageParams, QueryParams, ok, parse_id},
};

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// What anyone may see of a verified player.
#[derive(Debug, Serialize)]
pub struct PlayerCard {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub last_name_initial: String,
    pub age: Option<i32>,
    pub position: String,
    pub country: String,
    pub state: Option<String>,
    pub city: Option<String>,
    pub school: Option<String>,
    pub profile_photo_url: Option<String>,
    pub thumbnail_url: Option<String>,
}

impl PlayerCard {
    pub fn new(row: &PlayerRow, today: NaiveDate) -> Self {
        Self {
            id: row.id.clone(),
            first_name: row.first_name.clone(),
            last_name: row.last_name.clone(),
            last_name_initial: row.last_name_initial(),
            age: row.age(today),
            position: row.position.clone(),
            country: row.country.clone(),
            state: row.state.clone(),
            city: row.city.clone(),
            school: row.school.clone(),
            profile_photo_url: row.profile_photo_url.clone(),
            thumbnail_url: row.thumbnail_url.clone(),
        }
    }
}

/// GET /players
pub async fn list(
    State(state): State<AppState>,
    QueryParams(page): QueryParams<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let (rows, total) =
        query::player::list_public(&state.pool, u64::from(page.limit()), page.offset()).await?;

    let today = today();
    let items = rows.iter().map(|row| PlayerCard::new(row, today)).collect();

    Ok(ok(Page::new(items, page, total)))
}

#[derive(Debug, Deserialize)]
pub struct FeaturedParams {
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct FeaturedCard {
    #[serde(flatten)]
    pub player: PlayerCard,
    pub highlight_count: i64,
}

/// GET /players/featured
pub async fn featured(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<FeaturedParams>,
) -> Result<impl IntoResponse, AppError> {
    let limit = params.limit.unwrap_or(6).clamp(1, 20);
    let rows = query::player::featured(&state.pool, limit).await?;

    let today = today();
    let items: Vec<FeaturedCard> = rows
        .iter()
        .map(|FeaturedPlayer { player, highlight_count }| FeaturedCard {
            player: PlayerCard::new(player, today),
            highlight_count: *highlight_count,
        })
        .collect();

    Ok(ok(items))
}

#[derive(Debug, Serialize)]
pub struct PlayerDetail {
    #[serde(flatten)]
    pub card: PlayerCard,
    pub date_of_birth: String,
    pub preferred_foot: Option<String>,
    pub height_cm: Option<i64>,
    pub weight_kg: Option<i64>,
    pub bio: Option<String>,
    pub tournament_id: Option<String>,
    pub academy_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<PlayerStats>,
    pub is_saved: bool,
}

async fn find_public(state: &AppState, raw_id: &str) -> Result<PlayerRow, AppError> {
    let id = parse_id(raw_id)?;

    query::player::find_public(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound("Player"))
}

/// GET /players/{id}
pub async fn detail(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let player = find_public(&state, &id).await?;
    let today = today();

    let stats = compute_stats(&AccessStore(state.pool.clone()), &player.id, today).await?;

    let is_saved = match viewer.user_id() {
        Some(user_id) => query::saved::is_saved(&state.pool, user_id, &player.id).await?,
        None => false,
    };

    Ok(ok(PlayerDetail {
        card: PlayerCard::new(&player, today),
        date_of_birth: player.date_of_birth.clone(),
        preferred_foot: player.preferred_foot.clone(),
        height_cm: player.height_cm,
        weight_kg: player.weight_kg,
        bio: player.bio.clone(),
        tournament_id: player.tournament_id.clone(),
        academy_id: player.academy_id.clone(),
        stats,
        is_saved,
    }))
}

/// A highlight as served to clients: no storage key, a playable URL instead.
#[derive(Debug, Serialize)]
pub struct HighlightView {
    #[serde(flatten)]
    pub highlight: HighlightRow,
    pub stream_url: Option<String>,
}

impl HighlightView {
    pub fn new(state: &AppState, highlight: HighlightRow) -> Self {
        let stream_url = match state.storage.stream_url(&highlight.video_key) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::debug!(highlight_id = %highlight.id, "No stream URL: {e}");
                None
            }
        };

        Self {
            highlight,
            stream_url,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HighlightParams {
    #[serde(rename = "type")]
    pub highlight_type: Option<String>,
    pub limit: Option<u32>,
}

pub(crate) fn parse_highlight_type(raw: Option<&str>) -> Result<Option<HighlightType>, AppError> {
    raw.filter(|raw| !raw.trim().is_empty())
        .map(|raw| {
            raw.trim()
                .parse::<HighlightType>()
                .map_err(|_| AppError::validation(format!("Unknown highlight type: {raw}")))
        })
        .transpose()
}

/// GET /players/{id}/highlights
pub async fn highlights(
    State(state): State<AppState>,
    Path(id): Path<String>,
    QueryParams(params): QueryParams<HighlightParams>,
) -> Result<impl IntoResponse, AppError> {
    let highlight_type = parse_highlight_type(params.highlight_type.as_deref())?;
    let limit = params.limit.unwrap_or(20).clamp(1, 100) as usize;
    let player = find_public(&state, &id).await?;

    let rows =
        query::highlight::list_by_player(&state.pool, &player.id, highlight_type, None).await?;

    let items: Vec<HighlightView> = visible_highlights(rows, HighlightRow::status)
        .into_iter()
        .take(limit)
        .map(|row| HighlightView::new(&state, row))
        .collect();

    Ok(ok(items))
}

/// GET /highlights/{id}
pub async fn highlight(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;

    let highlight = query::highlight::find(&state.pool, &id)
        .await?
        .filter(|row| row.status().is_public())
        .ok_or(AppError::NotFound("Highlight"))?;

    query::highlight::increment_views(&state.pool, &highlight.id).await?;

    Ok(ok(HighlightView::new(&state, highlight)))
}

#[derive(Debug, Serialize)]
pub struct HighlightTypeInfo {
    pub value: HighlightType,
    pub label: &'static str,
    pub suggested_positions: &'static [&'static str],
}

/// GET /highlight-types
pub async fn highlight_types() -> impl IntoResponse {
    let types: Vec<HighlightTypeInfo> = HighlightType::VARIANTS
        .iter()
        .map(|value| HighlightTypeInfo {
            value: *value,
            label: value.label(),
            suggested_positions: value.suggested_positions(),
        })
        .collect();

    ok(types)
}

#[derive(Debug, Serialize)]
pub struct MatchAppearance {
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
    pub full_match_locked: bool,
}

#[derive(Debug, Serialize)]
pub struct TournamentAppearances {
    pub tournament_id: Option<String>,
    pub name: Option<String>,
    pub year: Option<i64>,
    pub matches: Vec<MatchAppearance>,
}

/// GET /players/{id}/tournaments
pub async fn tournaments(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let player = find_public(&state, &id).await?;
    let context = state.access(viewer.user_id()).await?;
    let locked = full_match_locked(&context);

    let rows = query::tournament::player_appearances(&state.pool, &player.id).await?;

    let mut groups: Vec<TournamentAppearances> = Vec::new();
    for row in rows {
        let appearance = MatchAppearance {
            match_id: row.match_id,
            title: row.title,
            match_date: row.match_date,
            home_team: row.home_team,
            away_team: row.away_team,
            home_score: row.home_score,
            away_score: row.away_score,
            goals: row.goals,
            assists: row.assists,
            minutes_played: row.minutes_played,
            highlight_count: row.highlight_count,
            has_full_match: row.has_full_match,
            full_match_locked: locked,
        };

        match groups.last_mut() {
            Some(group) if group.tournament_id == row.tournament_id => {
                group.matches.push(appearance)
            }
            _ => groups.push(TournamentAppearances {
                tournament_id: row.tournament_id,
                name: row.tournament_name,
                year: row.tournament_year,
                matches: vec![appearance],
            }),
        }
    }

    Ok(ok(groups))
}
