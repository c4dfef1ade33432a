//! Scout-to-player contact requests and the public contact form

use std::sync::LazyLock;

use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use regex::Regex;
use serde::Deserialize;
use unicorn_sport_access::Capability;
use validator::Validate;

use super::{AppState, require};
use crate::{
    auth::{AuthUser, MaybeAuthUser},
    error::AppError,
    query::{self, contact::InquiryType},
    response::{JsonBody, created, message, ok, parse_id},
};

#[derive(Debug, Deserialize, Validate)]
pub struct ContactPlayerInput {
    #[validate(length(
        min = 10,
        max = 2000,
        message = "Message must be between 10 and 2000 characters"
    ))]
    pub message: String,
}

/// POST /players/{id}/contact
///
/// A missing player is a 404 for every caller, so the gate runs after the
/// lookup.
pub async fn request_contact(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<ContactPlayerInput>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;

    let player = query::player::find_public(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound("Player"))?;

    let context = state.access(viewer.user_id()).await?;
    require(&context, Capability::ContactPlayer)?;
    let user = viewer.0.ok_or_else(AppError::auth_required)?;

    input.validate()?;

    let request_id = query::contact::create(
        &state.pool,
        &user.id,
        &player.id,
        &input.message,
        query::now(),
    )
    .await?
    .ok_or_else(|| {
        AppError::conflict(
            "ALREADY_REQUESTED",
            "You already have a pending request for this player",
        )
    })?;

    state
        .mailer
        .send_contact_request_notice(&user.email, &player.full_name());
    tracing::info!(user_id = %user.id, player_id = %player.id, "Contact request created");

    let request = query::contact::find(&state.pool, &request_id)
        .await?
        .ok_or(AppError::NotFound("Contact request"))?;

    Ok(created(request))
}

/// GET /contact-requests
pub async fn my_requests(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    Ok(ok(query::contact::list_for_user(&state.pool, &user.id).await?))
}

/// Submissions allowed per email address within an hour.
const HOURLY_LIMIT: i64 = 3;

const SPAM_PHRASES: [&str; 12] = [
    "click here",
    "buy now",
    "limited offer",
    "act now",
    "free money",
    "bitcoin",
    "crypto invest",
    "work from home",
    "make money fast",
    "casino",
    "viagra",
    "lottery winner",
];

static RE_URL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"https?://").unwrap());

fn looks_like_spam(message: &str) -> bool {
    let lower = message.to_lowercase();

    SPAM_PHRASES.iter().any(|phrase| lower.contains(phrase)) || RE_URL.find_iter(message).count() > 3
}

#[derive(Debug, Deserialize, Validate)]
pub struct ContactFormInput {
    #[validate(length(min = 2, max = 100))]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 10, max = 5000))]
    pub message: String,
    #[serde(rename = "type")]
    pub request_type: Option<String>,
}

const THANKS: &str = "Thank you for your message. We'll get back to you soon!";

/// POST /contact
pub async fn submit_form(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<ContactFormInput>,
) -> Result<impl IntoResponse, AppError> {
    input.validate()?;

    let email = input.email.trim().to_lowercase();

    // spam gets the normal answer and is dropped
    if looks_like_spam(&input.message) {
        tracing::warn!(email = %email, "Contact form message looks like spam");
        return Ok(message(THANKS));
    }

    let inquiry_type = input
        .request_type
        .as_deref()
        .and_then(|raw| raw.parse::<InquiryType>().ok())
        .unwrap_or_default();

    let now = query::now();
    if query::contact::count_recent_inquiries(&state.pool, &email, now - 3600).await? >= HOURLY_LIMIT {
        tracing::info!(email = %email, "Contact form rate limit reached");
        return Err(AppError::RateLimited);
    }

    query::contact::create_inquiry(
        &state.pool,
        &input.name,
        &email,
        &input.message,
        inquiry_type,
        now,
    )
    .await?;

    state
        .mailer
        .send_contact_notification(input.name.trim(), &email, &inquiry_type.to_string());

    Ok(message(THANKS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spam_phrases() {
        assert!(looks_like_spam("CLICK HERE to claim your prize"));
        assert!(!looks_like_spam("I would like to partner with your academy."));
    }

    #[test]
    fn test_too_many_links() {
        let three = "see http://a.com https://b.com http://c.com";
        assert!(!looks_like_spam(three));
        assert!(looks_like_spam(&format!("{three} https://d.com")));
    }
}
