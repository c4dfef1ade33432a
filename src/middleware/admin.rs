//! Admin authorization middleware for Axum

use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::{auth::AuthUser, error::AppError, routes::AppState};

/// Verifies the bearer token belongs to an active admin
pub async fn admin_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    let (mut parts, body) = request.into_parts();

    let auth_user = AuthUser::from_request_parts(&mut parts, &state)
        .await
        .map_err(IntoResponse::into_response)?;

    if !auth_user.is_admin() {
        warn!(
            user_id = %auth_user.id,
            "Non-admin user attempted to access admin route"
        );
        return Err(
            AppError::forbidden("FORBIDDEN", "Admin privileges required").into_response(),
        );
    }

    Ok(next.run(Request::from_parts(parts, body)).await)
}
