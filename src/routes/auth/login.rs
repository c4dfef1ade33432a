use axum::{extract::State, response::IntoResponse};
use serde::Deserialize;
use tracing::{info, warn};

use super::{AppState, start_session};
use crate::{
    auth::{AuthUser, password, token},
    error::AppError,
    query,
    response::{JsonBody, message, ok},
};

#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

fn invalid_credentials() -> AppError {
    AppError::unauthorized("INVALID_CREDENTIALS", "Invalid email or password")
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<LoginInput>,
) -> Result<impl IntoResponse, AppError> {
    let Some(user) = query::user::find_by_email(&state.pool, &input.email).await? else {
        info!("Login attempt for unknown email");
        return Err(invalid_credentials());
    };

    if !password::verify_password(&input.password, &user.password_hash) {
        warn!(user_id = %user.id, "Login failed: wrong password");
        return Err(invalid_credentials());
    }

    if !user.is_active {
        warn!(user_id = %user.id, "Login refused: account disabled");
        return Err(AppError::forbidden(
            "ACCOUNT_DISABLED",
            "Your account has been disabled",
        ));
    }

    query::user::record_login(&state.pool, &user.id, query::now()).await?;

    info!(user_id = %user.id, "User logged in");

    Ok(ok(start_session(&state, &user).await?))
}

#[derive(Debug, Deserialize)]
pub struct RefreshInput {
    pub refresh_token: String,
}

/// POST /auth/refresh - rotates the refresh token
pub async fn refresh(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<RefreshInput>,
) -> Result<impl IntoResponse, AppError> {
    let invalid = || AppError::unauthorized("INVALID_TOKEN", "Invalid or expired refresh token");

    let Some(user_id) = query::user::take_refresh_token(
        &state.pool,
        &token::hash_token(&input.refresh_token),
        query::now(),
    )
    .await?
    else {
        return Err(invalid());
    };

    let user = query::user::find_by_id(&state.pool, &user_id)
        .await?
        .filter(|user| user.is_active)
        .ok_or_else(invalid)?;

    Ok(ok(start_session(&state, &user).await?))
}

/// POST /auth/logout - revokes every refresh token of the user
pub async fn logout(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    query::user::revoke_refresh_tokens(&state.pool, &user.id).await?;

    info!(user_id = %user.id, "User logged out");

    Ok(message("Logged out"))
}
