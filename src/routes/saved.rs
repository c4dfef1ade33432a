use axum::{
    body::Bytes,
    extract::{Path, State},
    response::IntoResponse,
};
use serde::Deserialize;
use unicorn_sport_access::Capability;
use validator::Validate;

use super::{AppState, require};
use crate::{
    auth::{AuthUser, MaybeAuthUser},
    error::AppError,
    query,
    response::{Page, PageParams, QueryParams, created, message, ok, parse_id},
};

/// GET /saved-players
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    QueryParams(page): QueryParams<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let context = state.access(Some(&user.id)).await?;
    require(&context, Capability::SavePlayer)?;

    let (rows, total) =
        query::saved::list(&state.pool, &user.id, u64::from(page.limit()), page.offset()).await?;

    Ok(ok(Page::new(rows, page, total)))
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct SaveInput {
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

/// POST /players/{id}/save
///
/// Like contact requests, the player lookup comes before the gate.
pub async fn save(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;

    // the body is optional
    let input: SaveInput = if body.is_empty() {
        SaveInput::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| AppError::validation(e.to_string()))?
    };
    input.validate()?;

    let player = query::player::find_public(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound("Player"))?;

    let context = state.access(viewer.user_id()).await?;
    require(&context, Capability::SavePlayer)?;
    let user = viewer.0.ok_or_else(AppError::auth_required)?;

    let inserted = query::saved::save(
        &state.pool,
        &user.id,
        &player.id,
        input.notes.as_deref(),
        query::now(),
    )
    .await?;

    if !inserted {
        return Err(AppError::conflict(
            "ALREADY_SAVED",
            "Player is already in your saved list",
        ));
    }

    tracing::info!(user_id = %user.id, player_id = %player.id, "Player saved");

    Ok(created(serde_json::json!({ "player_id": player.id })))
}

/// DELETE /players/{id}/save
pub async fn unsave(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;

    if !query::saved::unsave(&state.pool, &user.id, &id).await? {
        return Err(AppError::NotFound("Saved player"));
    }

    Ok(message("Player removed from saved list"))
}
