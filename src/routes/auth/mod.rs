//! Account routes: registration, sessions, passwords and email verification

mod login;
mod password;
mod profile;
mod register;
mod verify;

use axum::{
    Router,
    routing::{get, post},
};
use serde::Serialize;

use super::AppState;
use crate::{
    auth::{jwt, token},
    error::AppError,
    query::{
        self,
        subscription::SubscriptionRow,
        user::{UserRow, UserView},
    },
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register::register))
        .route("/login", post(login::login))
        .route("/refresh", post(login::refresh))
        .route("/logout", post(login::logout))
        .route("/me", get(profile::me))
        .route("/change-password", post(profile::change_password))
        .route("/forgot-password", post(password::forgot_password))
        .route("/reset-password", post(password::reset_password))
        .route("/send-verification", post(verify::send_verification))
        .route("/verify-email", post(verify::verify_email))
}

#[derive(Debug, Serialize)]
pub struct SubscriptionSummary {
    pub tier: String,
    pub status: String,
    pub current_period_end: Option<i64>,
    pub cancel_at_period_end: bool,
}

impl SubscriptionSummary {
    fn from_row(row: Option<&SubscriptionRow>) -> Self {
        match row {
            Some(row) => Self {
                tier: row.tier.clone(),
                status: row.status.clone(),
                current_period_end: row.current_period_end,
                cancel_at_period_end: row.cancel_at_period_end,
            },
            None => Self {
                tier: "free".to_owned(),
                status: "active".to_owned(),
                current_period_end: None,
                cancel_at_period_end: false,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Session {
    pub user: UserView,
    pub subscription: SubscriptionSummary,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

/// Issues an access token and a fresh refresh token for `user`.
async fn start_session(state: &AppState, user: &UserRow) -> Result<Session, AppError> {
    let access_token = jwt::generate_token(&state.config.jwt, &user.id, &user.email, user.role())?;

    let refresh_token = token::new_refresh_token();
    let now = query::now();
    let expires_at = now + state.config.jwt.refresh_ttl_days * 24 * 60 * 60;
    query::user::store_refresh_token(
        &state.pool,
        &user.id,
        &token::hash_token(&refresh_token),
        expires_at,
        now,
    )
    .await?;

    let subscription = query::subscription::find_by_user(&state.pool, &user.id).await?;

    Ok(Session {
        user: UserView::from(user),
        subscription: SubscriptionSummary::from_row(subscription.as_ref()),
        access_token,
        refresh_token,
        expires_in: jwt::expires_in(&state.config.jwt),
    })
}
