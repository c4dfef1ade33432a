use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use unicorn_sport_access::{
    AccessContext, AccessError, Capability, HighlightTally, MatchParticipation, StatsSource,
    SubscriptionRecord, SubscriptionSource, Tier, authorize_full_match_listing, compute_stats,
};

#[derive(Default)]
struct Store {
    subscriptions: HashMap<&'static str, SubscriptionRecord>,
    lineups: HashMap<&'static str, Vec<MatchParticipation>>,
    highlights: HashMap<&'static str, Vec<HighlightTally>>,
}

#[async_trait]
impl SubscriptionSource for Store {
    async fn find_subscription_by_user(
        &self,
        user_id: &str,
    ) -> anyhow::Result<Option<SubscriptionRecord>> {
        Ok(self.subscriptions.get(user_id).cloned())
    }
}

#[async_trait]
impl StatsSource for Store {
    async fn find_match_participation_by_player(
        &self,
        player_id: &str,
    ) -> anyhow::Result<Vec<MatchParticipation>> {
        Ok(self.lineups.get(player_id).cloned().unwrap_or_default())
    }

    async fn find_approved_highlights_by_player(
        &self,
        player_id: &str,
    ) -> anyhow::Result<Vec<HighlightTally>> {
        Ok(self.highlights.get(player_id).cloned().unwrap_or_default())
    }
}

fn record(tier: &str, status: &str) -> SubscriptionRecord {
    SubscriptionRecord {
        tier: tier.to_owned(),
        status: status.to_owned(),
    }
}

fn store() -> Store {
    let mut store = Store::default();
    store.subscriptions.insert("scout", record("scout", "active"));
    store.subscriptions.insert("lapsed", record("pro", "past_due"));
    store.subscriptions.insert("club", record("club", "active"));
    store.highlights.insert(
        "striker",
        vec![HighlightTally {
            highlight_type: "Goal".to_owned(),
            count: 1,
        }],
    );
    store
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
}

#[tokio::test]
async fn scout_upgrade_prompt_names_both_tiers() -> anyhow::Result<()> {
    let context = AccessContext::load(&store(), Some("scout")).await?;

    let Err(AccessError::InsufficientTier {
        current_tier,
        required_tier,
    }) = context.check(Capability::ContactPlayer)
    else {
        panic!("scout should not contact players");
    };

    assert_eq!(current_tier.as_str(), "scout");
    assert_eq!(required_tier, Tier::Pro);
    assert!(context.allows(Capability::SavePlayer));

    Ok(())
}

#[tokio::test]
async fn lapsed_pro_is_told_to_reactivate() -> anyhow::Result<()> {
    let context = AccessContext::load(&store(), Some("lapsed")).await?;

    assert!(matches!(
        context.check(Capability::ViewFullMatch),
        Err(AccessError::SubscriptionInactive { .. })
    ));

    Ok(())
}

#[tokio::test]
async fn user_without_row_is_free() -> anyhow::Result<()> {
    let context = AccessContext::load(&store(), Some("new-user")).await?;

    assert_eq!(context.subscription.tier.tier(), Some(Tier::Free));
    assert!(context.subscription.status.is_active());
    assert!(matches!(
        authorize_full_match_listing(&context),
        Err(AccessError::InsufficientTier { .. })
    ));

    Ok(())
}

#[tokio::test]
async fn anonymous_listing_needs_login() -> anyhow::Result<()> {
    let context = AccessContext::load(&store(), None).await?;

    assert!(matches!(
        authorize_full_match_listing(&context),
        Err(AccessError::AuthenticationRequired)
    ));
    assert!(context.allows(Capability::ViewHighlights));

    Ok(())
}

#[tokio::test]
async fn stats_for_player_with_one_goal() -> anyhow::Result<()> {
    let stats = compute_stats(&store(), "striker", today())
        .await?
        .expect("stats for a player with a highlight");

    assert_eq!(stats.goals, 1);
    assert_eq!(stats.total_highlights, 1);
    assert_eq!(stats.assists, 0);
    assert_eq!(stats.matches_played, 0);

    let json = serde_json::to_value(&stats)?;
    assert_eq!(json["season"], "2025-26");

    Ok(())
}

#[tokio::test]
async fn stats_absent_for_unknown_player() -> anyhow::Result<()> {
    assert!(compute_stats(&store(), "nobody", today()).await?.is_none());
    Ok(())
}
