//! Registration, login and token rotation through the HTTP API

mod helpers;

use axum::http::StatusCode;
use helpers::{PASSWORD, setup};
use serde_json::json;
use unicorn_sport::{
    auth::{self, Role},
    query,
};

#[tokio::test]
async fn test_register_starts_on_free_tier() -> anyhow::Result<()> {
    let app = setup().await?;

    let res = app
        .post(
            "/api/v1/auth/register",
            None,
            json!({
                "email": "New.Scout@Unicorn.test",
                "password": "long-enough-password",
                "first_name": "Ada",
                "last_name": "Eze",
            }),
        )
        .await?;

    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["data"]["user"]["email"], "new.scout@unicorn.test");
    assert_eq!(res.body["data"]["user"]["role"], "scout");
    assert_eq!(res.body["data"]["subscription"]["tier"], "free");
    assert!(res.body["data"]["access_token"].is_string());
    assert!(res.body["data"]["refresh_token"].is_string());

    let token = res.body["data"]["access_token"].as_str().unwrap_or_default();
    let me = app.get("/api/v1/auth/me", Some(token)).await?;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["data"]["user"]["first_name"], "Ada");

    Ok(())
}

#[tokio::test]
async fn test_register_rejects_duplicate_email() -> anyhow::Result<()> {
    let app = setup().await?;
    app.user("taken@unicorn.test", Role::Scout).await?;

    let res = app
        .post(
            "/api/v1/auth/register",
            None,
            json!({
                "email": "taken@unicorn.test",
                "password": "long-enough-password",
                "first_name": "Ada",
                "last_name": "Eze",
            }),
        )
        .await?;

    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(res.error_code(), "EMAIL_EXISTS");

    Ok(())
}

#[tokio::test]
async fn test_register_validates_input() -> anyhow::Result<()> {
    let app = setup().await?;

    let res = app
        .post(
            "/api/v1/auth/register",
            None,
            json!({
                "email": "not-an-email",
                "password": "short",
                "first_name": "Ada",
                "last_name": "Eze",
            }),
        )
        .await?;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.error_code(), "VALIDATION_ERROR");

    Ok(())
}

#[tokio::test]
async fn test_login_with_wrong_password() -> anyhow::Result<()> {
    let app = setup().await?;
    app.user("scout@unicorn.test", Role::Scout).await?;

    let res = app
        .post(
            "/api/v1/auth/login",
            None,
            json!({ "email": "scout@unicorn.test", "password": "wrong-password" }),
        )
        .await?;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.error_code(), "INVALID_CREDENTIALS");

    Ok(())
}

#[tokio::test]
async fn test_refresh_token_is_single_use() -> anyhow::Result<()> {
    let app = setup().await?;
    app.user("scout@unicorn.test", Role::Scout).await?;

    let login = app
        .post(
            "/api/v1/auth/login",
            None,
            json!({ "email": "scout@unicorn.test", "password": PASSWORD }),
        )
        .await?;
    assert_eq!(login.status, StatusCode::OK);
    let refresh_token = login.body["data"]["refresh_token"]
        .as_str()
        .unwrap_or_default()
        .to_owned();

    let rotated = app
        .post(
            "/api/v1/auth/refresh",
            None,
            json!({ "refresh_token": refresh_token }),
        )
        .await?;
    assert_eq!(rotated.status, StatusCode::OK);
    assert_ne!(rotated.body["data"]["refresh_token"], refresh_token.as_str());

    let replayed = app
        .post(
            "/api/v1/auth/refresh",
            None,
            json!({ "refresh_token": refresh_token }),
        )
        .await?;
    assert_eq!(replayed.status, StatusCode::UNAUTHORIZED);
    assert_eq!(replayed.error_code(), "INVALID_TOKEN");

    Ok(())
}

#[tokio::test]
async fn test_me_requires_token() -> anyhow::Result<()> {
    let app = setup().await?;

    let missing = app.get("/api/v1/auth/me", None).await?;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
    assert_eq!(missing.error_code(), "AUTH_REQUIRED");

    let garbage = app.get("/api/v1/auth/me", Some("not.a.jwt")).await?;
    assert_eq!(garbage.status, StatusCode::UNAUTHORIZED);
    assert_eq!(garbage.error_code(), "INVALID_TOKEN");

    Ok(())
}

#[tokio::test]
async fn test_disabled_account_cannot_use_token() -> anyhow::Result<()> {
    let app = setup().await?;
    let (user, token) = app.user("scout@unicorn.test", Role::Scout).await?;

    sqlx::query("UPDATE users SET is_active = 0 WHERE id = ?")
        .bind(&user.id)
        .execute(&app.pool)
        .await?;

    let res = app.get("/api/v1/auth/me", Some(&token)).await?;

    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.error_code(), "ACCOUNT_DISABLED");

    Ok(())
}

#[tokio::test]
async fn test_forgot_password_does_not_reveal_accounts() -> anyhow::Result<()> {
    let app = setup().await?;
    app.user("scout@unicorn.test", Role::Scout).await?;

    let known = app
        .post(
            "/api/v1/auth/forgot-password",
            None,
            json!({ "email": "scout@unicorn.test" }),
        )
        .await?;
    let unknown = app
        .post(
            "/api/v1/auth/forgot-password",
            None,
            json!({ "email": "nobody@unicorn.test" }),
        )
        .await?;

    assert_eq!(known.status, StatusCode::OK);
    assert_eq!(unknown.status, StatusCode::OK);
    assert_eq!(known.body, unknown.body);

    Ok(())
}

#[tokio::test]
async fn test_change_password_checks_current() -> anyhow::Result<()> {
    let app = setup().await?;
    let (_, token) = app.user("scout@unicorn.test", Role::Scout).await?;

    let wrong = app
        .post(
            "/api/v1/auth/change-password",
            Some(&token),
            json!({ "current_password": "nope-nope-nope", "new_password": "another-password" }),
        )
        .await?;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.error_code(), "INVALID_PASSWORD");

    let changed = app
        .post(
            "/api/v1/auth/change-password",
            Some(&token),
            json!({ "current_password": PASSWORD, "new_password": "another-password" }),
        )
        .await?;
    assert_eq!(changed.status, StatusCode::OK);

    let login = app
        .post(
            "/api/v1/auth/login",
            None,
            json!({ "email": "scout@unicorn.test", "password": "another-password" }),
        )
        .await?;
    assert_eq!(login.status, StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn test_health_and_ready() -> anyhow::Result<()> {
    let app = setup().await?;

    let health = app.get("/api/v1/health", None).await?;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.body["status"], "ok");

    let ready = app.get("/api/v1/ready", None).await?;
    assert_eq!(ready.status, StatusCode::OK);
    assert_eq!(ready.body["status"], "ready");

    Ok(())
}

#[tokio::test]
async fn test_email_verification() -> anyhow::Result<()> {
    let app = setup().await?;
    let (user, token) = app.user("scout@unicorn.test", Role::Scout).await?;

    let anonymous = app.post("/api/v1/auth/send-verification", None, json!({})).await?;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let sent = app
        .post("/api/v1/auth/send-verification", Some(&token), json!({}))
        .await?;
    assert_eq!(sent.status, StatusCode::OK);
    assert_eq!(sent.body["data"]["expires_in"], 900);

    let malformed = app
        .post("/api/v1/auth/verify-email", Some(&token), json!({ "code": "12ab56" }))
        .await?;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
    assert_eq!(malformed.error_code(), "VALIDATION_ERROR");

    // replaces the code sent above with one the test knows
    let now = query::now();
    query::user::store_verification_code(
        &app.pool,
        &user.id,
        &auth::token::hash_token("482913"),
        now + 900,
        now,
    )
    .await?;

    let wrong = app
        .post("/api/v1/auth/verify-email", Some(&token), json!({ "code": "111111" }))
        .await?;
    assert_eq!(wrong.status, StatusCode::BAD_REQUEST);
    assert_eq!(wrong.error_code(), "INVALID_CODE");

    let verified = app
        .post("/api/v1/auth/verify-email", Some(&token), json!({ "code": "482913" }))
        .await?;
    assert_eq!(verified.status, StatusCode::OK);

    let me = app.get("/api/v1/auth/me", Some(&token)).await?;
    assert_eq!(me.body["data"]["user"]["email_verified"], true);

    let again = app
        .post("/api/v1/auth/send-verification", Some(&token), json!({}))
        .await?;
    assert_eq!(again.status, StatusCode::BAD_REQUEST);
    assert_eq!(again.error_code(), "ALREADY_VERIFIED");

    Ok(())
}

#[tokio::test]
async fn test_verification_code_dies_after_repeated_misses() -> anyhow::Result<()> {
    let app = setup().await?;
    let (user, token) = app.user("scout@unicorn.test", Role::Scout).await?;
    let now = query::now();
    query::user::store_verification_code(
        &app.pool,
        &user.id,
        &auth::token::hash_token("482913"),
        now + 900,
        now,
    )
    .await?;

    for _ in 0..query::user::MAX_CODE_ATTEMPTS {
        let miss = app
            .post("/api/v1/auth/verify-email", Some(&token), json!({ "code": "000000" }))
            .await?;
        assert_eq!(miss.error_code(), "INVALID_CODE");
    }

    let late = app
        .post("/api/v1/auth/verify-email", Some(&token), json!({ "code": "482913" }))
        .await?;
    assert_eq!(late.status, StatusCode::BAD_REQUEST);
    assert_eq!(late.error_code(), "INVALID_CODE");

    Ok(())
}
