use axum::{extract::State, response::IntoResponse};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use super::{AppState, start_session};
use crate::{
    auth::{Role, password},
    error::AppError,
    query::{self, user::NewUser},
    response::{JsonBody, created},
};

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
}

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<RegisterInput>,
) -> Result<impl IntoResponse, AppError> {
    input.validate()?;

    if query::user::find_by_email(&state.pool, &input.email)
        .await?
        .is_some()
    {
        return Err(AppError::conflict(
            "EMAIL_EXISTS",
            "An account with this email already exists",
        ));
    }

    let password_hash = password::hash_password(&input.password)?;
    let user = query::user::create(
        &state.pool,
        NewUser {
            email: &input.email,
            password_hash: &password_hash,
            first_name: &input.first_name,
            last_name: &input.last_name,
            role: Role::Scout,
        },
        query::now(),
    )
    .await?;

    info!(user_id = %user.id, "User registered");

    Ok(created(start_session(&state, &user).await?))
}
