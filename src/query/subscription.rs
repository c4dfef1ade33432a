use serde::Serialize;
use sqlx::{SqlitePool, prelude::FromRow};
use unicorn_sport_access::{SubscriptionStatus, Tier};

use super::new_id;
use crate::billing::webhook::SubscriptionChange;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SubscriptionRow {
    pub id: String,
    pub user_id: String,
    pub tier: String,
    pub status: String,
    #[serde(skip)]
    pub stripe_customer_id: Option<String>,
    #[serde(skip)]
    pub stripe_subscription_id: Option<String>,
    pub current_period_start: Option<i64>,
    pub current_period_end: Option<i64>,
    pub cancel_at_period_end: bool,
    pub cancelled_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

const COLUMNS: &str = "id, user_id, tier, status, stripe_customer_id, stripe_subscription_id, current_period_start, current_period_end, cancel_at_period_end, cancelled_at, created_at, updated_at";

pub async fn find_by_user(
    pool: &SqlitePool,
    user_id: &str,
) -> anyhow::Result<Option<SubscriptionRow>> {
    Ok(sqlx::query_as::<_, SubscriptionRow>(&format!(
        "SELECT {COLUMNS} FROM subscriptions WHERE user_id = ?"
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await?)
}

/// Sets tier and status, creating the row when the user has none.
pub async fn upsert_tier(
    pool: &SqlitePool,
    user_id: &str,
    tier: Tier,
    status: SubscriptionStatus,
    now: i64,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO subscriptions (id, user_id, tier, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT (user_id) DO UPDATE SET
            tier = excluded.tier,
            status = excluded.status,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(new_id())
    .bind(user_id)
    .bind(tier.to_string())
    .bind(status.to_string())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn set_customer_id(
    pool: &SqlitePool,
    user_id: &str,
    customer_id: &str,
    now: i64,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO subscriptions (id, user_id, stripe_customer_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT (user_id) DO UPDATE SET
            stripe_customer_id = excluded.stripe_customer_id,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(new_id())
    .bind(user_id)
    .bind(customer_id)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

/// Flags the subscription to end with the paid period. Tier and status
/// are left for the provider's webhooks to change.
pub async fn request_cancel(pool: &SqlitePool, user_id: &str, now: i64) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE subscriptions
        SET cancel_at_period_end = 1, cancelled_at = ?, updated_at = ?
        WHERE user_id = ? AND tier != 'free'
        "#,
    )
    .bind(now)
    .bind(now)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

async fn locate_user(
    pool: &SqlitePool,
    subscription_id: Option<&str>,
    customer_id: Option<&str>,
) -> anyhow::Result<Option<String>> {
    if let Some(subscription_id) = subscription_id {
        let found = sqlx::query_scalar::<_, String>(
            "SELECT user_id FROM subscriptions WHERE stripe_subscription_id = ?",
        )
        .bind(subscription_id)
        .fetch_optional(pool)
        .await?;

        if found.is_some() {
            return Ok(found);
        }
    }

    let Some(customer_id) = customer_id else {
        return Ok(None);
    };

    Ok(sqlx::query_scalar::<_, String>(
        "SELECT user_id FROM subscriptions WHERE stripe_customer_id = ?",
    )
    .bind(customer_id)
    .fetch_optional(pool)
    .await?)
}

/// Writes a payment provider event to the local row.
///
/// Returns the affected user, or `None` when no row matches the event.
pub async fn apply_change(
    pool: &SqlitePool,
    change: &SubscriptionChange,
    now: i64,
) -> anyhow::Result<Option<String>> {
    match change {
        SubscriptionChange::CheckoutCompleted {
            user_id,
            tier,
            customer_id,
            subscription_id,
        } => {
            sqlx::query(
                r#"
                INSERT INTO subscriptions
                    (id, user_id, tier, status, stripe_customer_id, stripe_subscription_id, created_at, updated_at)
                VALUES (?, ?, ?, 'active', ?, ?, ?, ?)
                ON CONFLICT (user_id) DO UPDATE SET
                    tier = excluded.tier,
                    status = 'active',
                    stripe_customer_id = COALESCE(excluded.stripe_customer_id, stripe_customer_id),
                    stripe_subscription_id = COALESCE(excluded.stripe_subscription_id, stripe_subscription_id),
                    cancel_at_period_end = 0,
                    cancelled_at = NULL,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(new_id())
            .bind(user_id)
            .bind(tier.to_string())
            .bind(customer_id)
            .bind(subscription_id)
            .bind(now)
            .bind(now)
            .execute(pool)
            .await?;

            Ok(Some(user_id.clone()))
        }
        SubscriptionChange::Updated {
            subscription_id,
            customer_id,
            status,
            tier,
            period_start,
            period_end,
            cancel_at_period_end,
        } => {
            let Some(user_id) =
                locate_user(pool, subscription_id.as_deref(), customer_id.as_deref()).await?
            else {
                return Ok(None);
            };

            sqlx::query(
                r#"
                UPDATE subscriptions SET
                    status = ?,
                    tier = COALESCE(?, tier),
                    stripe_subscription_id = COALESCE(?, stripe_subscription_id),
                    current_period_start = COALESCE(?, current_period_start),
                    current_period_end = COALESCE(?, current_period_end),
                    cancel_at_period_end = ?,
                    updated_at = ?
                WHERE user_id = ?
                "#,
            )
            .bind(status.to_string())
            .bind(tier.map(|tier| tier.to_string()))
            .bind(subscription_id)
            .bind(period_start)
            .bind(period_end)
            .bind(cancel_at_period_end)
            .bind(now)
            .bind(&user_id)
            .execute(pool)
            .await?;

            Ok(Some(user_id))
        }
        SubscriptionChange::Deleted {
            subscription_id,
            customer_id,
        } => {
            let Some(user_id) =
                locate_user(pool, subscription_id.as_deref(), customer_id.as_deref()).await?
            else {
                return Ok(None);
            };

            sqlx::query(
                r#"
                UPDATE subscriptions SET
                    tier = 'free',
                    status = 'cancelled',
                    stripe_subscription_id = NULL,
                    cancel_at_period_end = 0,
                    cancelled_at = COALESCE(cancelled_at, ?),
                    updated_at = ?
                WHERE user_id = ?
                "#,
            )
            .bind(now)
            .bind(now)
            .bind(&user_id)
            .execute(pool)
            .await?;

            Ok(Some(user_id))
        }
        SubscriptionChange::PaymentFailed {
            subscription_id,
            customer_id,
        } => {
            let Some(user_id) =
                locate_user(pool, subscription_id.as_deref(), customer_id.as_deref()).await?
            else {
                return Ok(None);
            };

            sqlx::query("UPDATE subscriptions SET status = 'past_due', updated_at = ? WHERE user_id = ?")
                .bind(now)
                .bind(&user_id)
                .execute(pool)
                .await?;

            Ok(Some(user_id))
        }
        SubscriptionChange::Ignored(_) => Ok(None),
    }
}

/// Paid subscriptions per tier, for the admin dashboard.
pub async fn count_by_tier(pool: &SqlitePool) -> anyhow::Result<Vec<(String, i64)>> {
    Ok(sqlx::query_as::<_, (String, i64)>(
        "SELECT tier, COUNT(*) FROM subscriptions WHERE status = 'active' GROUP BY tier ORDER BY tier",
    )
    .fetch_all(pool)
    .await?)
}
