//! Checkout, cancellation and payment provider webhooks

mod helpers;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use helpers::{TestApp, TestResponse, WEBHOOK_SECRET, setup, stripe_events};
use serde_json::{Value, json};
use stripe_webhook::Webhook;
use unicorn_sport::{auth::Role, query};
use unicorn_sport_access::{SubscriptionStatus, Tier};

async fn deliver(app: &TestApp, event: Value, secret: &str) -> anyhow::Result<TestResponse> {
    let payload = event.to_string();
    let signature = Webhook::generate_test_header(&payload, secret, None);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/webhooks/stripe")
        .header(header::CONTENT_TYPE, "application/json")
        .header("stripe-signature", signature)
        .body(Body::from(payload))?;

    app.send(request).await
}

fn checkout_completed(user_id: &str, tier: &str) -> Value {
    stripe_events::event(
        "checkout.session.completed",
        stripe_events::checkout_session(user_id, tier),
    )
}

fn subscription_event(kind: &str, price_id: &str, status: &str) -> Value {
    stripe_events::event(kind, stripe_events::subscription(price_id, status, 1_762_592_000))
}

#[tokio::test]
async fn test_tiers_are_public() -> anyhow::Result<()> {
    let app = setup().await?;

    let res = app.get("/api/v1/subscriptions/tiers", None).await?;

    assert_eq!(res.status, StatusCode::OK);
    let tiers = res.body["data"].as_array().cloned().unwrap_or_default();
    assert_eq!(tiers.len(), 4);
    assert_eq!(tiers[0]["tier"], "free");
    assert!(
        tiers[3]["capabilities"]
            .as_array()
            .is_some_and(|caps| caps.contains(&json!("bulk_access")))
    );

    Ok(())
}

#[tokio::test]
async fn test_webhook_rejects_bad_signature() -> anyhow::Result<()> {
    let app = setup().await?;
    let (user, _) = app.user("scout@unicorn.test", Role::Scout).await?;

    let res = deliver(&app, checkout_completed(&user.id, "pro"), "whsec_wrong").await?;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.error_code(), "INVALID_SIGNATURE");

    let row = query::subscription::find_by_user(&app.pool, &user.id).await?;
    assert_eq!(row.map(|row| row.tier).as_deref(), Some("free"));

    Ok(())
}

#[tokio::test]
async fn test_checkout_completed_upgrades_user() -> anyhow::Result<()> {
    let app = setup().await?;
    let (user, token) = app.user("scout@unicorn.test", Role::Scout).await?;

    let res = deliver(&app, checkout_completed(&user.id, "scout"), WEBHOOK_SECRET).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["received"], true);

    let current = app.get("/api/v1/subscriptions/current", Some(&token)).await?;
    assert_eq!(current.status, StatusCode::OK);
    assert_eq!(current.body["data"]["tier"], "scout");
    assert_eq!(current.body["data"]["status"], "active");
    let capabilities = current.body["data"]["capabilities"]
        .as_array()
        .cloned()
        .unwrap_or_default();
    assert!(capabilities.contains(&json!("view_full_match")));
    assert!(!capabilities.contains(&json!("contact_player")));

    Ok(())
}

#[tokio::test]
async fn test_subscription_deleted_downgrades_to_free() -> anyhow::Result<()> {
    let app = setup().await?;
    let (user, token) = app.user("scout@unicorn.test", Role::Scout).await?;
    deliver(&app, checkout_completed(&user.id, "pro"), WEBHOOK_SECRET).await?;

    let deleted = subscription_event("customer.subscription.deleted", "price_pro", "canceled");
    let res = deliver(&app, deleted, WEBHOOK_SECRET).await?;
    assert_eq!(res.status, StatusCode::OK);

    let current = app.get("/api/v1/subscriptions/current", Some(&token)).await?;
    assert_eq!(current.body["data"]["tier"], "free");
    assert_eq!(current.body["data"]["status"], "cancelled");

    Ok(())
}

#[tokio::test]
async fn test_payment_failure_suspends_access() -> anyhow::Result<()> {
    let app = setup().await?;
    let (user, token) = app.user("scout@unicorn.test", Role::Scout).await?;
    deliver(&app, checkout_completed(&user.id, "scout"), WEBHOOK_SECRET).await?;

    let failed = stripe_events::event("invoice.payment_failed", stripe_events::failed_invoice());
    let res = deliver(&app, failed, WEBHOOK_SECRET).await?;
    assert_eq!(res.status, StatusCode::OK);

    let res = app.get("/api/v1/saved-players", Some(&token)).await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.error_code(), "SUBSCRIPTION_INACTIVE");

    Ok(())
}

#[tokio::test]
async fn test_unknown_event_is_acknowledged() -> anyhow::Result<()> {
    let app = setup().await?;

    let res = deliver(
        &app,
        stripe_events::event("customer.created", stripe_events::customer()),
        WEBHOOK_SECRET,
    )
    .await?;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["received"], true);

    Ok(())
}

#[tokio::test]
async fn test_malformed_event_is_rejected() -> anyhow::Result<()> {
    let app = setup().await?;

    let res = deliver(
        &app,
        stripe_events::event("customer.subscription.updated", json!({ "id": "sub_42" })),
        WEBHOOK_SECRET,
    )
    .await?;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.error_code(), "VALIDATION_ERROR");

    Ok(())
}

#[tokio::test]
async fn test_plan_change_in_portal_reaches_the_gate() -> anyhow::Result<()> {
    let app = setup().await?;
    let (user, token) = app.user("scout@unicorn.test", Role::Scout).await?;
    deliver(&app, checkout_completed(&user.id, "scout"), WEBHOOK_SECRET).await?;

    let player_id = app
        .player(&user.id, "Tunde", query::player::VerificationStatus::Verified)
        .await?;
    let contact_uri = format!("/api/v1/players/{player_id}/contact");
    let message = json!({ "message": "We would like to invite Tunde to a trial." });

    let denied = app.post(&contact_uri, Some(&token), message.clone()).await?;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);
    assert_eq!(denied.error_code(), "UPGRADE_REQUIRED");

    let upgraded = subscription_event("customer.subscription.updated", "price_pro", "active");
    let res = deliver(&app, upgraded, WEBHOOK_SECRET).await?;
    assert_eq!(res.status, StatusCode::OK);

    let row = query::subscription::find_by_user(&app.pool, &user.id).await?;
    assert_eq!(row.as_ref().map(|row| row.tier.as_str()), Some("pro"));
    assert_eq!(row.and_then(|row| row.current_period_end), Some(1_762_592_000));

    let allowed = app.post(&contact_uri, Some(&token), message).await?;
    assert_eq!(allowed.status, StatusCode::CREATED);

    Ok(())
}

#[tokio::test]
async fn test_cancel_keeps_tier_until_period_end() -> anyhow::Result<()> {
    let app = setup().await?;
    let (_, token) = app
        .subscriber("pro@unicorn.test", Tier::Pro, SubscriptionStatus::Active)
        .await?;

    let res = app
        .request(Method::POST, "/api/v1/subscriptions/cancel", Some(&token), None)
        .await?;
    assert_eq!(res.status, StatusCode::OK);

    let current = app.get("/api/v1/subscriptions/current", Some(&token)).await?;
    assert_eq!(current.body["data"]["tier"], "pro");
    assert_eq!(current.body["data"]["cancel_at_period_end"], true);

    Ok(())
}

#[tokio::test]
async fn test_cancel_on_free_tier_is_not_found() -> anyhow::Result<()> {
    let app = setup().await?;
    let (_, token) = app.user("free@unicorn.test", Role::Scout).await?;

    let res = app
        .request(Method::POST, "/api/v1/subscriptions/cancel", Some(&token), None)
        .await?;

    assert_eq!(res.status, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_checkout_rejects_free_tier() -> anyhow::Result<()> {
    let app = setup().await?;
    let (_, token) = app.user("free@unicorn.test", Role::Scout).await?;

    let res = app
        .post(
            "/api/v1/subscriptions/checkout",
            Some(&token),
            json!({ "tier": "free" }),
        )
        .await?;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.error_code(), "VALIDATION_ERROR");

    Ok(())
}

#[tokio::test]
async fn test_checkout_creates_customer_once() -> anyhow::Result<()> {
    let app = setup().await?;
    let (user, token) = app.user("free@unicorn.test", Role::Scout).await?;

    for _ in 0..2 {
        let res = app
            .post(
                "/api/v1/subscriptions/checkout",
                Some(&token),
                json!({ "tier": "scout" }),
            )
            .await?;

        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.body["data"]["checkout_url"], "https://checkout.test/cs_test_1");
    }

    let customer = format!("cus_{}", user.id);
    let checkouts = app
        .gateway
        .checkouts
        .lock()
        .map(|checkouts| checkouts.clone())
        .unwrap_or_default();
    assert_eq!(checkouts.len(), 2);
    assert!(
        checkouts
            .iter()
            .all(|(customer_id, price, tier)| customer_id == &customer
                && price == "price_scout"
                && *tier == Tier::Scout)
    );

    let portal = app
        .request(Method::POST, "/api/v1/subscriptions/portal", Some(&token), None)
        .await?;
    assert_eq!(portal.status, StatusCode::OK);
    assert_eq!(
        portal.body["data"]["portal_url"],
        format!("https://billing.test/{customer}")
    );

    Ok(())
}
