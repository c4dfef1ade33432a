use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use super::check_date;
use crate::{
    auth::AuthUser,
    error::AppError,
    query::{
        self,
        matches::{AppearanceFields, LineupRow, MatchFields, MatchRow, MatchVideoRow},
    },
    response::{JsonBody, QueryParams, created, message, ok, parse_id},
    routes::AppState,
};

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub tournament_id: Option<String>,
}

/// GET /admin/matches
pub async fn list(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let tournament_id = params
        .tournament_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .map(parse_id)
        .transpose()?;

    Ok(ok(
        query::matches::list_by_tournament(&state.pool, tournament_id.as_deref()).await?,
    ))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateMatchInput {
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,
    pub match_date: String,
    #[validate(length(min = 1, max = 100, message = "Home team is required"))]
    pub home_team: String,
    #[validate(length(min = 1, max = 100, message = "Away team is required"))]
    pub away_team: String,
    #[serde(flatten)]
    pub fields: MatchFields,
}

async fn check_references(state: &AppState, fields: &MatchFields) -> Result<(), AppError> {
    if let Some(date) = fields.match_date.as_deref() {
        check_date(date)?;
    }

    if let Some(tournament_id) = fields.tournament_id.as_deref() {
        query::tournament::find(&state.pool, tournament_id)
            .await?
            .ok_or(AppError::NotFound("Tournament"))?;
    }

    if let Some(academy_id) = fields.academy_id.as_deref() {
        query::academy::find(&state.pool, academy_id)
            .await?
            .ok_or(AppError::NotFound("Academy"))?;
    }

    Ok(())
}

/// POST /admin/matches
pub async fn create(
    State(state): State<AppState>,
    admin: AuthUser,
    JsonBody(input): JsonBody<CreateMatchInput>,
) -> Result<impl IntoResponse, AppError> {
    input.validate()?;
    check_date(&input.match_date)?;
    check_references(&state, &input.fields).await?;

    let id = query::matches::create(
        &state.pool,
        input.title.trim(),
        &input.match_date,
        input.home_team.trim(),
        input.away_team.trim(),
        &input.fields,
        query::now(),
    )
    .await?;

    info!(admin_id = %admin.id, match_id = %id, "Match created");

    let game = query::matches::find(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound("Match"))?;

    Ok(created(game))
}

#[derive(Debug, Serialize)]
pub struct AdminMatchDetail {
    #[serde(flatten)]
    pub game: MatchRow,
    pub players: Vec<LineupRow>,
    pub video: Option<MatchVideoRow>,
}

/// GET /admin/matches/{id}
pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;

    let game = query::matches::find(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound("Match"))?;

    Ok(ok(AdminMatchDetail {
        players: query::matches::lineup(&state.pool, &game.id).await?,
        video: query::matches::find_video(&state.pool, &game.id).await?,
        game,
    }))
}

/// PUT /admin/matches/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(fields): JsonBody<MatchFields>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    check_references(&state, &fields).await?;

    if !query::matches::update(&state.pool, &id, &fields, query::now()).await? {
        return Err(AppError::NotFound("Match"));
    }

    let game = query::matches::find(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound("Match"))?;

    Ok(ok(game))
}

/// DELETE /admin/matches/{id}
///
/// The lineup and video rows go with the match.
pub async fn remove(
    State(state): State<AppState>,
    admin: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;

    if !query::matches::delete(&state.pool, &id).await? {
        return Err(AppError::NotFound("Match"));
    }

    info!(admin_id = %admin.id, match_id = %id, "Match deleted");

    Ok(message("Match deleted"))
}

#[derive(Debug, Deserialize)]
pub struct AddPlayerInput {
    pub player_id: String,
    #[serde(flatten)]
    pub fields: AppearanceFields,
}

/// POST /admin/matches/{id}/players
pub async fn add_player(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<AddPlayerInput>,
) -> Result<impl IntoResponse, AppError> {
    let match_id = parse_id(&id)?;
    let player_id = parse_id(&input.player_id)?;

    query::matches::find(&state.pool, &match_id)
        .await?
        .ok_or(AppError::NotFound("Match"))?;
    query::player::find(&state.pool, &player_id)
        .await?
        .ok_or(AppError::NotFound("Player"))?;

    if query::matches::is_in_match(&state.pool, &match_id, &player_id).await? {
        return Err(AppError::conflict(
            "ALREADY_IN_MATCH",
            "Player is already part of this match",
        ));
    }

    query::matches::add_player(&state.pool, &match_id, &player_id, &input.fields, query::now())
        .await?;

    Ok(created(query::matches::lineup(&state.pool, &match_id).await?))
}

/// PUT /admin/matches/{id}/players/{player_id}
pub async fn update_player(
    State(state): State<AppState>,
    Path((id, player_id)): Path<(String, String)>,
    JsonBody(fields): JsonBody<AppearanceFields>,
) -> Result<impl IntoResponse, AppError> {
    let match_id = parse_id(&id)?;
    let player_id = parse_id(&player_id)?;

    if !query::matches::update_stats(&state.pool, &match_id, &player_id, &fields, query::now())
        .await?
    {
        return Err(AppError::NotFound("Match player"));
    }

    Ok(ok(query::matches::lineup(&state.pool, &match_id).await?))
}

/// DELETE /admin/matches/{id}/players/{player_id}
pub async fn remove_player(
    State(state): State<AppState>,
    Path((id, player_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let match_id = parse_id(&id)?;
    let player_id = parse_id(&player_id)?;

    if !query::matches::remove_player(&state.pool, &match_id, &player_id).await? {
        return Err(AppError::NotFound("Match player"));
    }

    Ok(message("Player removed from match"))
}
