use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use crate::{
    auth::AuthUser,
    error::AppError,
    query::{self, academy::AcademyFields},
    response::{JsonBody, created, message, ok, parse_id},
    routes::AppState,
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAcademyInput {
    #[validate(length(min = 1, max = 200, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 100, message = "Country is required"))]
    pub country: String,
    #[serde(flatten)]
    pub fields: AcademyFields,
}

/// GET /admin/academies
pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(ok(query::academy::list(&state.pool).await?))
}

/// POST /admin/academies
pub async fn create(
    State(state): State<AppState>,
    admin: AuthUser,
    JsonBody(input): JsonBody<CreateAcademyInput>,
) -> Result<impl IntoResponse, AppError> {
    input.validate()?;

    let id = query::academy::create(
        &state.pool,
        input.name.trim(),
        input.country.trim(),
        &input.fields,
        query::now(),
    )
    .await?;

    info!(admin_id = %admin.id, academy_id = %id, "Academy created");

    let academy = query::academy::find(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound("Academy"))?;

    Ok(created(academy))
}

/// GET /admin/academies/{id}
pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;

    let academy = query::academy::find(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound("Academy"))?;

    Ok(ok(academy))
}

/// PUT /admin/academies/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(fields): JsonBody<AcademyFields>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;

    if !query::academy::update(&state.pool, &id, &fields, query::now()).await? {
        return Err(AppError::NotFound("Academy"));
    }

    let academy = query::academy::find(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound("Academy"))?;

    Ok(ok(academy))
}

/// DELETE /admin/academies/{id}
pub async fn remove(
    State(state): State<AppState>,
    admin: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;

    if !query::academy::delete(&state.pool, &id).await? {
        return Err(AppError::NotFound("Academy"));
    }

    info!(admin_id = %admin.id, academy_id = %id, "Academy deleted");

    Ok(message("Academy deleted"))
}
