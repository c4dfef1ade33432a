use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use super::check_date;
use crate::{
    auth::AuthUser,
    error::AppError,
    query::{self, tournament::TournamentFields},
    response::{JsonBody, created, ok, parse_id},
    routes::AppState,
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTournamentInput {
    #[validate(length(min = 1, max = 200, message = "Name is required"))]
    pub name: String,
    #[validate(range(min = 1900, max = 2100, message = "Year is out of range"))]
    pub year: i64,
    #[serde(flatten)]
    pub fields: TournamentFields,
}

fn check_dates(fields: &TournamentFields) -> Result<(), AppError> {
    for date in [&fields.start_date, &fields.end_date].into_iter().flatten() {
        check_date(date)?;
    }

    Ok(())
}

/// GET /admin/tournaments
pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(ok(query::tournament::list(&state.pool).await?))
}

/// POST /admin/tournaments
pub async fn create(
    State(state): State<AppState>,
    admin: AuthUser,
    JsonBody(input): JsonBody<CreateTournamentInput>,
) -> Result<impl IntoResponse, AppError> {
    input.validate()?;
    check_dates(&input.fields)?;

    let id = query::tournament::create(
        &state.pool,
        input.name.trim(),
        input.year,
        &input.fields,
        query::now(),
    )
    .await?;

    info!(admin_id = %admin.id, tournament_id = %id, "Tournament created");

    let tournament = query::tournament::find(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound("Tournament"))?;

    Ok(created(tournament))
}

/// PUT /admin/tournaments/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(fields): JsonBody<TournamentFields>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    check_dates(&fields)?;

    if !query::tournament::update(&state.pool, &id, &fields, query::now()).await? {
        return Err(AppError::NotFound("Tournament"));
    }

    let tournament = query::tournament::find(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound("Tournament"))?;

    Ok(ok(tournament))
}
