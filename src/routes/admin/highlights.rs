use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::{
    auth::AuthUser,
    error::AppError,
    query::{
        self,
        highlight::{HighlightChanges, NewHighlight},
    },
    response::{JsonBody, QueryParams, created, message, ok, parse_id},
    routes::{
        AppState,
        players::{HighlightView, parse_highlight_type},
    },
};

/// GET /admin/players/{id}/highlights
///
/// Includes pending and rejected clips.
pub async fn list_by_player(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;

    let player = query::player::find(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound("Player"))?;

    let highlights: Vec<HighlightView> =
        query::highlight::list_by_player(&state.pool, &player.id, None, None)
            .await?
            .into_iter()
            .map(|row| HighlightView::new(&state, row))
            .collect();

    Ok(ok(highlights))
}

#[derive(Debug, Deserialize)]
pub struct MatchHighlightParams {
    pub player_id: Option<String>,
}

/// One player's clips from a match.
#[derive(Debug, Serialize)]
pub struct PlayerClips {
    pub player_id: String,
    pub player_name: String,
    pub profile_photo_url: Option<String>,
    pub highlights: Vec<HighlightView>,
}

/// GET /admin/matches/{id}/highlights
///
/// Grouped by player in order of each player's first clip.
pub async fn list_by_match(
    State(state): State<AppState>,
    Path(id): Path<String>,
    QueryParams(params): QueryParams<MatchHighlightParams>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let player_id = params.player_id.as_deref().map(parse_id).transpose()?;

    let game = query::matches::find(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound("Match"))?;

    let rows = query::highlight::list_by_match(&state.pool, &game.id, player_id.as_deref()).await?;

    let mut groups: Vec<PlayerClips> = Vec::new();
    for row in rows {
        let view = HighlightView::new(&state, row.highlight);

        match groups.iter_mut().find(|group| group.player_id == view.highlight.player_id) {
            Some(group) => group.highlights.push(view),
            None => groups.push(PlayerClips {
                player_id: view.highlight.player_id.clone(),
                player_name: format!("{} {}", row.player_first_name, row.player_last_name),
                profile_photo_url: row.player_photo_url,
                highlights: vec![view],
            }),
        }
    }

    Ok(ok(groups))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateHighlightInput {
    pub player_id: String,
    pub match_id: Option<String>,
    pub highlight_type: String,
    #[validate(length(min = 1, message = "Video key is required"))]
    pub video_key: String,
    pub thumbnail_url: Option<String>,
    #[validate(range(min = 0))]
    pub duration_seconds: Option<i64>,
    #[validate(length(max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub timestamp_in_match: Option<i64>,
}

/// POST /admin/highlights
pub async fn create(
    State(state): State<AppState>,
    admin: AuthUser,
    JsonBody(input): JsonBody<CreateHighlightInput>,
) -> Result<impl IntoResponse, AppError> {
    input.validate()?;

    let highlight_type = parse_highlight_type(Some(&input.highlight_type))?
        .ok_or_else(|| AppError::validation("Highlight type is required"))?;

    let player_id = parse_id(&input.player_id)?;
    let player = query::player::find(&state.pool, &player_id)
        .await?
        .ok_or(AppError::NotFound("Player"))?;

    let match_id = input.match_id.as_deref().map(parse_id).transpose()?;
    if let Some(match_id) = match_id.as_deref() {
        query::matches::find(&state.pool, match_id)
            .await?
            .ok_or(AppError::NotFound("Match"))?;
    }

    let id = query::highlight::create(
        &state.pool,
        NewHighlight {
            player_id: &player.id,
            match_id: match_id.as_deref(),
            highlight_type,
            video_key: &input.video_key,
            thumbnail_url: input.thumbnail_url.as_deref(),
            duration_seconds: input.duration_seconds,
            title: input.title.as_deref(),
            description: input.description.as_deref(),
            timestamp_in_match: input.timestamp_in_match,
        },
        query::now(),
    )
    .await?;

    info!(admin_id = %admin.id, highlight_id = %id, player_id = %player.id, "Highlight created");

    let highlight = query::highlight::find(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound("Highlight"))?;

    Ok(created(HighlightView::new(&state, highlight)))
}

/// PUT /admin/highlights/{id}
pub async fn update(
    State(state): State<AppState>,
    admin: AuthUser,
    Path(id): Path<String>,
    JsonBody(changes): JsonBody<HighlightChanges>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;

    if !query::highlight::update(&state.pool, &id, &changes, query::now()).await? {
        return Err(AppError::NotFound("Highlight"));
    }

    info!(admin_id = %admin.id, highlight_id = %id, status = ?changes.status, "Highlight updated");

    let highlight = query::highlight::find(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound("Highlight"))?;

    Ok(ok(HighlightView::new(&state, highlight)))
}

/// DELETE /admin/highlights/{id}
///
/// Only the database row goes; the stored clip is left in the bucket.
pub async fn remove(
    State(state): State<AppState>,
    admin: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;

    if !query::highlight::delete(&state.pool, &id).await? {
        return Err(AppError::NotFound("Highlight"));
    }

    info!(admin_id = %admin.id, highlight_id = %id, "Highlight deleted");

    Ok(message("Highlight deleted"))
}
