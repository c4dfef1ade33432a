//! Access tier tests
//!
//! Each request goes through the full router, so the assertions cover the
//! gate decision and the HTTP shape of its denials together.

mod helpers;

use axum::http::{Method, StatusCode};
use helpers::setup;
use unicorn_sport::{
    auth::Role,
    query::{self, matches::AppearanceFields, player::VerificationStatus},
};
use unicorn_sport_access::{HighlightStatus, HighlightType, SubscriptionStatus, Tier};

#[tokio::test]
async fn test_anonymous_full_match_listing_requires_login() -> anyhow::Result<()> {
    let app = setup().await?;
    app.match_with_video().await?;

    let res = app.get("/api/v1/videos/full-matches", None).await?;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.error_code(), "AUTH_REQUIRED");
    assert_eq!(res.body["success"], false);

    Ok(())
}

#[tokio::test]
async fn test_free_user_hits_paywall_on_full_match_listing() -> anyhow::Result<()> {
    let app = setup().await?;
    app.match_with_video().await?;
    let (_, token) = app.user("free@unicorn.test", Role::Scout).await?;

    let res = app.get("/api/v1/videos/full-matches", Some(&token)).await?;

    assert_eq!(res.status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(res.error_code(), "SUBSCRIPTION_REQUIRED");
    assert_eq!(res.body["error"]["current_tier"], "free");
    assert_eq!(res.body["error"]["required_tier"], "scout");
    assert_eq!(res.body["error"]["upgrade_url"], "/pricing");

    Ok(())
}

#[tokio::test]
async fn test_past_due_subscription_is_inactive() -> anyhow::Result<()> {
    let app = setup().await?;
    app.match_with_video().await?;
    let (_, token) = app
        .subscriber("late@unicorn.test", Tier::Pro, SubscriptionStatus::PastDue)
        .await?;

    let res = app.get("/api/v1/videos/full-matches", Some(&token)).await?;

    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.error_code(), "SUBSCRIPTION_INACTIVE");
    assert_eq!(res.body["error"]["current_tier"], "pro");
    assert_eq!(res.body["error"]["status"], "past_due");

    Ok(())
}

#[tokio::test]
async fn test_scout_lists_full_matches_without_storage_keys() -> anyhow::Result<()> {
    let app = setup().await?;
    let (match_id, _) = app.match_with_video().await?;
    let (_, token) = app
        .subscriber("scout@unicorn.test", Tier::Scout, SubscriptionStatus::Active)
        .await?;

    let res = app.get("/api/v1/videos/full-matches", Some(&token)).await?;

    assert_eq!(res.status, StatusCode::OK);
    let items = res.body["data"]["items"].as_array().cloned().unwrap_or_default();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["match_id"], match_id.as_str());
    assert_eq!(items[0]["price_cents"], 999);
    assert!(items[0].get("video_key").is_none());
    assert_eq!(res.body["data"]["pagination"]["total"], 1);

    Ok(())
}

#[tokio::test]
async fn test_stream_of_missing_match_is_not_found_before_gate() -> anyhow::Result<()> {
    let app = setup().await?;

    let res = app
        .get(
            "/api/v1/matches/8c1f4a34-6f0e-4b8e-9a55-1d2f3c4b5a69/stream",
            None,
        )
        .await?;

    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.error_code(), "NOT_FOUND");

    Ok(())
}

#[tokio::test]
async fn test_stream_rejects_malformed_id() -> anyhow::Result<()> {
    let app = setup().await?;

    let res = app.get("/api/v1/matches/not-a-uuid/stream", None).await?;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.error_code(), "INVALID_UUID");

    Ok(())
}

#[tokio::test]
async fn test_stream_gated_by_tier() -> anyhow::Result<()> {
    let app = setup().await?;
    let (match_id, _) = app.match_with_video().await?;
    let uri = format!("/api/v1/matches/{match_id}/stream");

    let anonymous = app.get(&uri, None).await?;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let (_, free_token) = app.user("free@unicorn.test", Role::Scout).await?;
    let free = app.get(&uri, Some(&free_token)).await?;
    assert_eq!(free.status, StatusCode::FORBIDDEN);
    assert_eq!(free.error_code(), "UPGRADE_REQUIRED");
    assert_eq!(free.body["error"]["required_tier"], "scout");

    let (_, scout_token) = app
        .subscriber("scout@unicorn.test", Tier::Scout, SubscriptionStatus::Active)
        .await?;
    let scout = app.get(&uri, Some(&scout_token)).await?;
    assert_eq!(scout.status, StatusCode::OK);
    let url = scout.body["data"]["stream_url"].as_str().unwrap_or_default();
    assert!(url.starts_with("https://bucket.test/matches/"));
    assert_eq!(scout.body["data"]["expires_in"], 3600);

    Ok(())
}

#[tokio::test]
async fn test_match_detail_reports_lock_without_gating() -> anyhow::Result<()> {
    let app = setup().await?;
    let (match_id, _) = app.match_with_video().await?;
    let uri = format!("/api/v1/matches/{match_id}");

    let anonymous = app.get(&uri, None).await?;
    assert_eq!(anonymous.status, StatusCode::OK);
    assert_eq!(anonymous.body["data"]["has_full_match"], true);
    assert_eq!(anonymous.body["data"]["full_match_locked"], true);

    let (_, token) = app
        .subscriber("club@unicorn.test", Tier::Club, SubscriptionStatus::Active)
        .await?;
    let club = app.get(&uri, Some(&token)).await?;
    assert_eq!(club.body["data"]["full_match_locked"], false);

    Ok(())
}

#[tokio::test]
async fn test_contact_requires_pro() -> anyhow::Result<()> {
    let app = setup().await?;
    let (admin, _) = app.admin().await?;
    let player_id = app
        .player(&admin.id, "Chidi", VerificationStatus::Verified)
        .await?;
    let (_, token) = app
        .subscriber("scout@unicorn.test", Tier::Scout, SubscriptionStatus::Active)
        .await?;

    let res = app
        .post(
            &format!("/api/v1/players/{player_id}/contact"),
            Some(&token),
            serde_json::json!({ "message": "We would like to invite Chidi to a trial." }),
        )
        .await?;

    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.error_code(), "UPGRADE_REQUIRED");
    assert_eq!(res.body["error"]["current_tier"], "scout");
    assert_eq!(res.body["error"]["required_tier"], "pro");

    Ok(())
}

#[tokio::test]
async fn test_unrecognized_stored_tier_is_denied() -> anyhow::Result<()> {
    let app = setup().await?;
    let (admin, _) = app.admin().await?;
    let player_id = app
        .player(&admin.id, "Chidi", VerificationStatus::Verified)
        .await?;
    let (user, token) = app.user("legacy@unicorn.test", Role::Scout).await?;

    sqlx::query("UPDATE subscriptions SET tier = 'enterprise' WHERE user_id = ?")
        .bind(&user.id)
        .execute(&app.pool)
        .await?;

    let res = app
        .post(
            &format!("/api/v1/players/{player_id}/save"),
            Some(&token),
            serde_json::json!({}),
        )
        .await?;

    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.error_code(), "UPGRADE_REQUIRED");
    assert_eq!(res.body["error"]["current_tier"], "enterprise");

    Ok(())
}

#[tokio::test]
async fn test_public_highlights_only_show_approved() -> anyhow::Result<()> {
    let app = setup().await?;
    let (admin, _) = app.admin().await?;
    let player_id = app
        .player(&admin.id, "Chidi", VerificationStatus::Verified)
        .await?;

    let approved = app.highlight(&player_id, HighlightType::Goal).await?;
    let pending = app.highlight(&player_id, HighlightType::Assist).await?;
    sqlx::query("UPDATE player_highlights SET status = ? WHERE id = ?")
        .bind(HighlightStatus::Pending.to_string())
        .bind(&pending)
        .execute(&app.pool)
        .await?;

    let res = app
        .get(&format!("/api/v1/players/{player_id}/highlights"), None)
        .await?;

    assert_eq!(res.status, StatusCode::OK);
    let items = res.body["data"].as_array().cloned().unwrap_or_default();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], approved.as_str());
    assert!(items[0]["stream_url"].is_string());

    let hidden = app.get(&format!("/api/v1/highlights/{pending}"), None).await?;
    assert_eq!(hidden.status, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_unverified_players_are_hidden() -> anyhow::Result<()> {
    let app = setup().await?;
    let (admin, _) = app.admin().await?;
    app.player(&admin.id, "Visible", VerificationStatus::Verified)
        .await?;
    let pending = app
        .player(&admin.id, "Hidden", VerificationStatus::Pending)
        .await?;

    let list = app.get("/api/v1/players", None).await?;
    assert_eq!(list.status, StatusCode::OK);
    assert_eq!(list.body["data"]["pagination"]["total"], 1);
    assert_eq!(list.body["data"]["items"][0]["first_name"], "Visible");

    let detail = app.get(&format!("/api/v1/players/{pending}"), None).await?;
    assert_eq!(detail.status, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_tournament_appearances_flag_locked_matches() -> anyhow::Result<()> {
    let app = setup().await?;
    let (admin, _) = app.admin().await?;
    let player_id = app
        .player(&admin.id, "Chidi", VerificationStatus::Verified)
        .await?;
    let (match_id, _) = app.match_with_video().await?;

    let appearance = AppearanceFields {
        goals: Some(2),
        assists: Some(1),
        ..AppearanceFields::default()
    };
    query::matches::add_player(&app.pool, &match_id, &player_id, &appearance, query::now())
        .await?;

    let uri = format!("/api/v1/players/{player_id}/tournaments");
    let anonymous = app.get(&uri, None).await?;
    assert_eq!(anonymous.status, StatusCode::OK);
    let game = &anonymous.body["data"][0]["matches"][0];
    assert_eq!(game["match_id"], match_id.as_str());
    assert_eq!(game["goals"], 2);
    assert_eq!(game["has_full_match"], true);
    assert_eq!(game["full_match_locked"], true);

    let (_, token) = app
        .subscriber("scout@unicorn.test", Tier::Scout, SubscriptionStatus::Active)
        .await?;
    let scout = app.get(&uri, Some(&token)).await?;
    assert_eq!(scout.body["data"][0]["matches"][0]["full_match_locked"], false);

    Ok(())
}

#[tokio::test]
async fn test_player_detail_stats_follow_highlights() -> anyhow::Result<()> {
    let app = setup().await?;
    let (admin, _) = app.admin().await?;
    let player_id = app
        .player(&admin.id, "Chidi", VerificationStatus::Verified)
        .await?;
    let uri = format!("/api/v1/players/{player_id}");

    let empty = app.get(&uri, None).await?;
    assert_eq!(empty.status, StatusCode::OK);
    assert!(empty.body["data"].get("stats").is_none());
    assert_eq!(empty.body["data"]["is_saved"], false);

    app.highlight(&player_id, HighlightType::Goal).await?;

    let res = app.get(&uri, None).await?;
    assert_eq!(res.body["data"]["stats"]["goals"], 1);
    assert_eq!(res.body["data"]["stats"]["total_highlights"], 1);
    assert_eq!(res.body["data"]["stats"]["matches_played"], 0);

    Ok(())
}

#[tokio::test]
async fn test_saved_players_flow() -> anyhow::Result<()> {
    let app = setup().await?;
    let (admin, _) = app.admin().await?;
    let player_id = app
        .player(&admin.id, "Chidi", VerificationStatus::Verified)
        .await?;
    let (_, token) = app
        .subscriber("scout@unicorn.test", Tier::Scout, SubscriptionStatus::Active)
        .await?;
    let uri = format!("/api/v1/players/{player_id}/save");

    let saved = app
        .post(&uri, Some(&token), serde_json::json!({ "notes": "Quick left foot" }))
        .await?;
    assert_eq!(saved.status, StatusCode::CREATED);
    assert_eq!(saved.body["data"]["player_id"], player_id.as_str());

    let duplicate = app.post(&uri, Some(&token), serde_json::json!({})).await?;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);
    assert_eq!(duplicate.error_code(), "ALREADY_SAVED");

    let list = app.get("/api/v1/saved-players", Some(&token)).await?;
    assert_eq!(list.status, StatusCode::OK);
    assert_eq!(list.body["data"]["pagination"]["total"], 1);
    assert_eq!(list.body["data"]["items"][0]["player_id"], player_id.as_str());
    assert_eq!(list.body["data"]["items"][0]["notes"], "Quick left foot");

    let detail = app
        .get(&format!("/api/v1/players/{player_id}"), Some(&token))
        .await?;
    assert_eq!(detail.body["data"]["is_saved"], true);

    let removed = app.request(Method::DELETE, &uri, Some(&token), None).await?;
    assert_eq!(removed.status, StatusCode::OK);

    let again = app.request(Method::DELETE, &uri, Some(&token), None).await?;
    assert_eq!(again.status, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_missing_player_is_not_found_before_save_and_contact_gates() -> anyhow::Result<()> {
    let app = setup().await?;
    let (_, free_token) = app.user("free@unicorn.test", Role::Scout).await?;
    let missing = "8c1f4a34-6f0e-4b8e-9a55-1d2f3c4b5a69";
    let body = serde_json::json!({ "message": "We would like to invite him to a trial." });

    for token in [None, Some(free_token.as_str())] {
        let save = app
            .post(&format!("/api/v1/players/{missing}/save"), token, serde_json::json!({}))
            .await?;
        assert_eq!(save.status, StatusCode::NOT_FOUND);

        let contact = app
            .post(&format!("/api/v1/players/{missing}/contact"), token, body.clone())
            .await?;
        assert_eq!(contact.status, StatusCode::NOT_FOUND);
    }

    Ok(())
}

#[tokio::test]
async fn test_anonymous_save_and_contact_require_login() -> anyhow::Result<()> {
    let app = setup().await?;
    let (admin, _) = app.admin().await?;
    let player_id = app
        .player(&admin.id, "Chidi", VerificationStatus::Verified)
        .await?;

    let save = app
        .post(&format!("/api/v1/players/{player_id}/save"), None, serde_json::json!({}))
        .await?;
    assert_eq!(save.status, StatusCode::UNAUTHORIZED);
    assert_eq!(save.error_code(), "AUTH_REQUIRED");

    let contact = app
        .post(
            &format!("/api/v1/players/{player_id}/contact"),
            None,
            serde_json::json!({ "message": "We would like to invite Chidi to a trial." }),
        )
        .await?;
    assert_eq!(contact.status, StatusCode::UNAUTHORIZED);
    assert_eq!(contact.error_code(), "AUTH_REQUIRED");

    Ok(())
}

#[tokio::test]
async fn test_highlight_feed_spans_verified_players() -> anyhow::Result<()> {
    let app = setup().await?;
    let (admin, _) = app.admin().await?;
    let chidi = app
        .player(&admin.id, "Chidi", VerificationStatus::Verified)
        .await?;
    let amaka = app
        .player(&admin.id, "Amaka", VerificationStatus::Verified)
        .await?;
    let hidden = app
        .player(&admin.id, "Hidden", VerificationStatus::Pending)
        .await?;

    app.highlight(&chidi, HighlightType::Goal).await?;
    app.highlight(&amaka, HighlightType::Assist).await?;
    app.highlight(&hidden, HighlightType::Goal).await?;
    let rejected = app.highlight(&amaka, HighlightType::Goal).await?;
    sqlx::query("UPDATE player_highlights SET status = ? WHERE id = ?")
        .bind(HighlightStatus::Rejected.to_string())
        .bind(&rejected)
        .execute(&app.pool)
        .await?;

    let feed = app.get("/api/v1/videos/highlights", None).await?;
    assert_eq!(feed.status, StatusCode::OK);
    assert_eq!(feed.body["data"]["pagination"]["total"], 2);
    let items = feed.body["data"]["items"].as_array().cloned().unwrap_or_default();
    assert!(items.iter().all(|item| item.get("video_key").is_none()));
    assert!(items.iter().all(|item| item["stream_url"].is_string()));

    let assists = app.get("/api/v1/videos/highlights?type=assist", None).await?;
    assert_eq!(assists.body["data"]["pagination"]["total"], 1);
    assert_eq!(assists.body["data"]["items"][0]["player_first_name"], "Amaka");

    let one_player = app
        .get(&format!("/api/v1/videos/highlights?player_id={chidi}"), None)
        .await?;
    assert_eq!(one_player.body["data"]["pagination"]["total"], 1);
    assert_eq!(one_player.body["data"]["items"][0]["player_id"], chidi.as_str());

    let unknown = app.get("/api/v1/videos/highlights?type=nutmeg", None).await?;
    assert_eq!(unknown.status, StatusCode::BAD_REQUEST);

    Ok(())
}
