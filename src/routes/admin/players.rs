use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use strum::{Display, EnumString};
use tracing::info;
use validator::Validate;

use super::check_date;
use crate::{
    auth::AuthUser,
    error::AppError,
    query::{
        self,
        player::{AdminPlayerFilter, NewPlayer, PlayerFields, VerificationStatus},
    },
    response::{JsonBody, Page, PageParams, QueryParams, created, message, ok, parse_id},
    routes::AppState,
};

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub status: Option<VerificationStatus>,
}

/// GET /admin/players
///
/// Every player that is not deleted, whatever their verification state.
pub async fn list(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = PageParams {
        page: params.page,
        limit: params.limit,
    };
    let filter = AdminPlayerFilter {
        search: params.search,
        status: params.status,
    };

    let (rows, total) = query::player::list_admin(
        &state.pool,
        &filter,
        u64::from(page.limit()),
        page.offset(),
    )
    .await?;

    Ok(ok(Page::new(rows, page, total)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePlayerInput {
    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    pub last_name: String,
    pub date_of_birth: String,
    #[validate(length(min = 1, max = 50, message = "Position is required"))]
    pub position: String,
    #[validate(length(min = 1, max = 100, message = "Country is required"))]
    pub country: String,
    #[serde(flatten)]
    pub fields: PlayerFields,
}

async fn check_academy(state: &AppState, academy_id: Option<&str>) -> Result<(), AppError> {
    let Some(academy_id) = academy_id else {
        return Ok(());
    };

    if !query::academy::exists(&state.pool, academy_id).await? {
        return Err(AppError::NotFound("Academy"));
    }

    Ok(())
}

/// POST /admin/players
pub async fn create(
    State(state): State<AppState>,
    admin: AuthUser,
    JsonBody(input): JsonBody<CreatePlayerInput>,
) -> Result<impl IntoResponse, AppError> {
    input.validate()?;
    check_date(&input.date_of_birth)?;
    check_academy(&state, input.fields.academy_id.as_deref()).await?;

    let id = query::player::create(
        &state.pool,
        NewPlayer {
            first_name: input.first_name.trim(),
            last_name: input.last_name.trim(),
            date_of_birth: &input.date_of_birth,
            position: input.position.trim(),
            country: input.country.trim(),
            fields: &input.fields,
            created_by: &admin.id,
        },
        query::now(),
    )
    .await?;

    info!(admin_id = %admin.id, player_id = %id, "Player created");

    let player = query::player::find(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound("Player"))?;

    Ok(created(player))
}

/// GET /admin/players/{id}
pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;

    let player = query::player::find(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound("Player"))?;
    let highlights = query::highlight::list_by_player(&state.pool, &player.id, None, None).await?;

    Ok(ok(json!({
        "player": player,
        "highlights": highlights,
    })))
}

/// PUT /admin/players/{id}
pub async fn update(
    State(state): State<AppState>,
    admin: AuthUser,
    Path(id): Path<String>,
    JsonBody(fields): JsonBody<PlayerFields>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;

    if let Some(date_of_birth) = fields.date_of_birth.as_deref() {
        check_date(date_of_birth)?;
    }
    check_academy(&state, fields.academy_id.as_deref()).await?;

    if !query::player::update(&state.pool, &id, &fields, query::now()).await? {
        return Err(AppError::NotFound("Player"));
    }

    info!(admin_id = %admin.id, player_id = %id, "Player updated");

    let player = query::player::find(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound("Player"))?;

    Ok(ok(player))
}

/// DELETE /admin/players/{id}
pub async fn remove(
    State(state): State<AppState>,
    admin: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;

    if query::player::soft_delete(&state.pool, std::slice::from_ref(&id), query::now()).await? == 0 {
        return Err(AppError::NotFound("Player"));
    }

    info!(admin_id = %admin.id, player_id = %id, "Player deleted");

    Ok(message("Player deleted"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BulkAction {
    Verify,
    Unverify,
    Delete,
}

#[derive(Debug, Deserialize, Validate)]
pub struct BulkInput {
    #[validate(length(min = 1, max = 500, message = "Select between 1 and 500 players"))]
    pub player_ids: Vec<String>,
    pub action: BulkAction,
}

/// POST /admin/players/bulk
pub async fn bulk(
    State(state): State<AppState>,
    admin: AuthUser,
    JsonBody(input): JsonBody<BulkInput>,
) -> Result<impl IntoResponse, AppError> {
    input.validate()?;

    let ids = input
        .player_ids
        .iter()
        .map(|id| parse_id(id))
        .collect::<Result<Vec<_>, _>>()?;
    let now = query::now();

    let affected = match input.action {
        BulkAction::Verify => {
            query::player::set_verification(&state.pool, &ids, VerificationStatus::Verified, now)
                .await?
        }
        BulkAction::Unverify => {
            query::player::set_verification(&state.pool, &ids, VerificationStatus::Pending, now)
                .await?
        }
        BulkAction::Delete => query::player::soft_delete(&state.pool, &ids, now).await?,
    };

    info!(admin_id = %admin.id, action = %input.action, affected, "Bulk player update");

    Ok(ok(json!({
        "action": input.action.to_string(),
        "affected": affected,
    })))
}
