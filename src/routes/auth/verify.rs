use axum::{extract::State, response::IntoResponse};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use super::AppState;
use crate::{
    auth::{AuthUser, token},
    error::AppError,
    query::{self, user::UserRow},
    response::{JsonBody, message, ok},
};

/// Codes expire after fifteen minutes.
const CODE_TTL_SECS: i64 = 15 * 60;

fn already_verified() -> AppError {
    AppError::bad_request("ALREADY_VERIFIED", "Email is already verified")
}

async fn unverified_user(state: &AppState, auth: &AuthUser) -> Result<UserRow, AppError> {
    let user = query::user::find_by_id(&state.pool, &auth.id)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    if user.email_verified {
        return Err(already_verified());
    }

    Ok(user)
}

/// POST /auth/send-verification
pub async fn send_verification(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let user = unverified_user(&state, &auth).await?;

    let code = token::new_verification_code();
    let now = query::now();
    query::user::store_verification_code(
        &state.pool,
        &user.id,
        &token::hash_token(&code),
        now + CODE_TTL_SECS,
        now,
    )
    .await?;

    state.mailer.send_verification_code(&user.email, &code);
    info!(user_id = %user.id, "Verification code issued");

    Ok(ok(serde_json::json!({
        "message": "Verification code sent to your email",
        "expires_in": CODE_TTL_SECS,
    })))
}

fn validate_code(code: &str) -> Result<(), validator::ValidationError> {
    if code.len() == 6 && code.chars().all(|c| c.is_ascii_digit()) {
        return Ok(());
    }

    let mut error = validator::ValidationError::new("invalid_code");
    error.message = Some(std::borrow::Cow::from("Code must be exactly 6 digits"));
    Err(error)
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyEmailInput {
    #[validate(custom(function = "validate_code"))]
    pub code: String,
}

/// POST /auth/verify-email
pub async fn verify_email(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(input): JsonBody<VerifyEmailInput>,
) -> Result<impl IntoResponse, AppError> {
    input.validate()?;
    let user = unverified_user(&state, &auth).await?;

    let verified = query::user::verify_email(
        &state.pool,
        &user.id,
        &token::hash_token(&input.code),
        query::now(),
    )
    .await?;

    if !verified {
        return Err(AppError::bad_request(
            "INVALID_CODE",
            "Invalid or expired verification code. Please request a new one.",
        ));
    }

    info!(user_id = %user.id, "Email verified");

    Ok(message("Email verified successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_shape() {
        assert!(validate_code("042917").is_ok());
        assert!(validate_code("42917").is_err());
        assert!(validate_code("04291a").is_err());
        assert!(validate_code("٠١٢٣٤٥").is_err());
    }
}
