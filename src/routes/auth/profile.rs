use axum::{extract::State, response::IntoResponse};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use super::{AppState, SubscriptionSummary};
use crate::{
    auth::{AuthUser, password},
    error::AppError,
    query::{self, user::UserView},
    response::{JsonBody, message, ok},
};

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: UserView,
    pub subscription: SubscriptionSummary,
}

/// GET /auth/me
pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let user = query::user::find_by_id(&state.pool, &auth.id)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    let subscription = query::subscription::find_by_user(&state.pool, &auth.id).await?;

    Ok(ok(MeResponse {
        user: UserView::from(&user),
        subscription: SubscriptionSummary::from_row(subscription.as_ref()),
    }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordInput {
    pub current_password: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

/// POST /auth/change-password
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(input): JsonBody<ChangePasswordInput>,
) -> Result<impl IntoResponse, AppError> {
    input.validate()?;

    let user = query::user::find_by_id(&state.pool, &auth.id)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    if !password::verify_password(&input.current_password, &user.password_hash) {
        return Err(AppError::unauthorized(
            "INVALID_PASSWORD",
            "Current password is incorrect",
        ));
    }

    if input.current_password == input.new_password {
        return Err(AppError::bad_request(
            "SAME_PASSWORD",
            "New password must differ from the current one",
        ));
    }

    let hash = password::hash_password(&input.new_password)?;
    query::user::update_password(&state.pool, &user.id, &hash, query::now()).await?;

    info!(user_id = %user.id, "Password changed");

    Ok(message("Password updated"))
}
