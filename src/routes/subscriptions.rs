//! Plans, checkout and payment provider webhooks

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use unicorn_sport_access::{Capability, ResolvedSubscription, Tier};

use super::AppState;
use crate::{
    auth::AuthUser,
    billing::{BillingError, CheckoutRequest, Plan, plans, webhook},
    error::AppError,
    query,
    response::{JsonBody, message, ok},
};

#[derive(Debug, Serialize)]
pub struct TierInfo {
    #[serde(flatten)]
    pub plan: Plan,
    pub capabilities: Vec<Capability>,
}

/// GET /subscriptions/tiers
pub async fn tiers() -> impl IntoResponse {
    let tiers: Vec<TierInfo> = plans()
        .into_iter()
        .map(|plan| TierInfo {
            capabilities: plan.tier.capabilities(),
            plan,
        })
        .collect();

    ok(tiers)
}

#[derive(Debug, Serialize)]
pub struct CurrentSubscription {
    #[serde(flatten)]
    pub subscription: ResolvedSubscription,
    pub current_period_end: Option<i64>,
    pub cancel_at_period_end: bool,
    pub capabilities: Vec<Capability>,
}

/// GET /subscriptions/current
pub async fn current(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let context = state.access(Some(&user.id)).await?;
    let row = query::subscription::find_by_user(&state.pool, &user.id).await?;

    Ok(ok(CurrentSubscription {
        capabilities: context.granted(),
        subscription: context.subscription,
        current_period_end: row.as_ref().and_then(|row| row.current_period_end),
        cancel_at_period_end: row.is_some_and(|row| row.cancel_at_period_end),
    }))
}

#[derive(Debug, Deserialize)]
pub struct CheckoutInput {
    pub tier: String,
}

/// POST /subscriptions/checkout
pub async fn checkout(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(input): JsonBody<CheckoutInput>,
) -> Result<impl IntoResponse, AppError> {
    let tier = input
        .tier
        .parse::<Tier>()
        .ok()
        .filter(|tier| tier.is_paid())
        .ok_or_else(|| AppError::validation("Tier must be one of scout, pro or club"))?;

    let price_id = state
        .config
        .stripe
        .price_for(tier)
        .filter(|_| state.payments.is_configured())
        .ok_or(BillingError::NotConfigured)?;

    let existing = query::subscription::find_by_user(&state.pool, &user.id)
        .await?
        .and_then(|row| row.stripe_customer_id);

    let customer_id = match existing {
        Some(customer_id) => customer_id,
        None => {
            let customer_id = state.payments.create_customer(&user.email, &user.id).await?;
            query::subscription::set_customer_id(&state.pool, &user.id, &customer_id, query::now())
                .await?;
            customer_id
        }
    };

    let session = state
        .payments
        .create_checkout_session(CheckoutRequest {
            customer_id: &customer_id,
            price_id,
            user_id: &user.id,
            tier,
            success_url: &state.config.stripe.success_url,
            cancel_url: &state.config.stripe.cancel_url,
        })
        .await?;

    info!(user_id = %user.id, %tier, session_id = %session.session_id, "Checkout session created");

    Ok(ok(session))
}

/// POST /subscriptions/portal
pub async fn portal(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    if !state.payments.is_configured() {
        return Err(BillingError::NotConfigured.into());
    }

    let customer_id = query::subscription::find_by_user(&state.pool, &user.id)
        .await?
        .and_then(|row| row.stripe_customer_id)
        .ok_or(AppError::NotFound("Billing account"))?;

    let portal_url = state
        .payments
        .create_portal_session(&customer_id, &state.config.stripe.portal_return_url)
        .await?;

    Ok(ok(json!({ "portal_url": portal_url })))
}

/// POST /subscriptions/cancel
///
/// The plan stays in force until the provider reports the period has ended.
pub async fn cancel(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    if !query::subscription::request_cancel(&state.pool, &user.id, query::now()).await? {
        return Err(AppError::NotFound("Paid subscription"));
    }

    info!(user_id = %user.id, "Subscription set to cancel at period end");

    Ok(message(
        "Your subscription will be cancelled at the end of the billing period",
    ))
}

/// POST /webhooks/stripe
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let secret = &state.config.stripe.webhook_secret;
    if secret.is_empty() {
        return Err(BillingError::NotConfigured.into());
    }

    let signature = headers
        .get("stripe-signature")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    let payload = std::str::from_utf8(&payload)
        .map_err(|_| AppError::validation("Webhook payload must be UTF-8"))?;

    let event = webhook::construct_event(payload, signature, secret).map_err(|e| match e {
        BillingError::InvalidPayload(reason) => AppError::validation(reason),
        _ => AppError::bad_request("INVALID_SIGNATURE", "Invalid webhook signature"),
    })?;

    let change = webhook::subscription_change(event, &state.config.stripe);

    match query::subscription::apply_change(&state.pool, &change, query::now()).await? {
        Some(user_id) => info!(user_id = %user_id, ?change, "Subscription updated from webhook"),
        None => info!(?change, "Webhook event not applied"),
    }

    Ok(ok(json!({ "received": true })))
}
