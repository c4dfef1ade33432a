//! Bearer-token authentication for the JSON API

pub mod jwt;
pub mod password;
pub mod token;

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, VariantArray};

use crate::{error::AppError, query, routes::AppState};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    EnumString,
    Display,
    AsRefStr,
    VariantArray,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    #[default]
    Scout,
    Player,
}

impl Role {
    pub fn parse(raw: &str) -> Self {
        raw.parse().unwrap_or_else(|_| {
            tracing::warn!(role = raw, "Unknown role, treating as scout");
            Role::Scout
        })
    }

    pub fn is_admin(self) -> bool {
        self == Role::Admin
    }
}

/// The signed-in user behind a request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::auth_required())?;

        let claims = jwt::validate_token(bearer.token(), &state.config.jwt.secret).map_err(|e| {
            tracing::debug!(error = %e, "Invalid or expired token");
            AppError::unauthorized("INVALID_TOKEN", "Invalid or expired token")
        })?;

        let Some(user) = query::user::find_by_id(&state.pool, &claims.sub).await? else {
            return Err(AppError::unauthorized("INVALID_TOKEN", "User no longer exists"));
        };

        if !user.is_active {
            tracing::warn!(user_id = %user.id, "Disabled user attempted to use a token");
            return Err(AppError::forbidden(
                "ACCOUNT_DISABLED",
                "Your account has been disabled",
            ));
        }

        let user = AuthUser {
            role: user.role(),
            id: user.id,
            email: user.email,
        };

        parts.extensions.insert(user.clone());

        Ok(user)
    }
}

/// Like [`AuthUser`] but lets anonymous requests through.
///
/// A request that does send a token must send a valid one.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl MaybeAuthUser {
    pub fn user_id(&self) -> Option<&str> {
        self.0.as_ref().map(|user| user.id.as_str())
    }
}

impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if !parts
            .headers
            .contains_key(axum::http::header::AUTHORIZATION)
        {
            return Ok(MaybeAuthUser(None));
        }

        AuthUser::from_request_parts(parts, state)
            .await
            .map(|user| MaybeAuthUser(Some(user)))
    }
}
