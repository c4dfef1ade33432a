use axum::{extract::State, response::IntoResponse};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use super::AppState;
use crate::{
    auth::{password, token},
    error::AppError,
    query,
    response::{JsonBody, message},
};

/// Reset links stay valid for one hour.
const RESET_TTL_SECS: i64 = 60 * 60;

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordInput {
    pub email: String,
}

/// POST /auth/forgot-password
///
/// Answers the same way whether or not the account exists.
pub async fn forgot_password(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<ForgotPasswordInput>,
) -> Result<impl IntoResponse, AppError> {
    let user = query::user::find_by_email(&state.pool, &input.email)
        .await?
        .filter(|user| user.is_active);

    if let Some(user) = user {
        let raw = token::new_reset_token();
        let now = query::now();

        query::user::store_reset_token(
            &state.pool,
            &user.id,
            &token::hash_token(&raw),
            now + RESET_TTL_SECS,
            now,
        )
        .await?;

        state.mailer.send_password_reset(&user.email, &raw);
        info!(user_id = %user.id, "Password reset requested");
    }

    Ok(message(
        "If an account exists for this email, a reset link has been sent",
    ))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordInput {
    pub token: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

/// POST /auth/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<ResetPasswordInput>,
) -> Result<impl IntoResponse, AppError> {
    input.validate()?;

    let now = query::now();
    let Some(user_id) =
        query::user::consume_reset_token(&state.pool, &token::hash_token(&input.token), now)
            .await?
    else {
        return Err(AppError::bad_request(
            "INVALID_TOKEN",
            "Reset link is invalid or has expired",
        ));
    };

    let hash = password::hash_password(&input.new_password)?;
    query::user::update_password(&state.pool, &user_id, &hash, now).await?;
    query::user::revoke_refresh_tokens(&state.pool, &user_id).await?;

    info!(user_id = %user_id, "Password reset completed");

    Ok(message("Password has been reset"))
}
