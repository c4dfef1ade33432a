use async_trait::async_trait;
use sqlx::SqlitePool;
use unicorn_sport_access::{
    HighlightTally, MatchParticipation, StatsSource, SubscriptionRecord, SubscriptionSource,
};

/// The access engine's view of the database.
#[derive(Clone)]
pub struct AccessStore(pub SqlitePool);

#[async_trait]
impl SubscriptionSource for AccessStore {
    async fn find_subscription_by_user(
        &self,
        user_id: &str,
    ) -> anyhow::Result<Option<SubscriptionRecord>> {
        let row = sqlx::query_as::<_, (String, String)>(
            "SELECT tier, status FROM subscriptions WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.0)
        .await?;

        Ok(row.map(|(tier, status)| SubscriptionRecord { tier, status }))
    }
}

#[async_trait]
impl StatsSource for AccessStore {
    async fn find_match_participation_by_player(
        &self,
        player_id: &str,
    ) -> anyhow::Result<Vec<MatchParticipation>> {
        let rows = sqlx::query_as::<_, (bool, Option<i64>)>(
            "SELECT is_starter, minutes_played FROM match_players WHERE player_id = ?",
        )
        .bind(player_id)
        .fetch_all(&self.0)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(is_starter, minutes_played)| MatchParticipation {
                is_starter,
                minutes_played,
            })
            .collect())
    }

    async fn find_approved_highlights_by_player(
        &self,
        player_id: &str,
    ) -> anyhow::Result<Vec<HighlightTally>> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT LOWER(highlight_type), COUNT(*)
            FROM player_highlights
            WHERE player_id = ? AND status = 'approved'
            GROUP BY LOWER(highlight_type)
            "#,
        )
        .bind(player_id)
        .fetch_all(&self.0)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(highlight_type, count)| HighlightTally {
                highlight_type,
                count,
            })
            .collect())
    }
}
