use std::collections::BTreeMap;

use serde::Serialize;
use sqlx::SqlitePool;

use super::{contact, highlight, matches, player, subscription, tournament, user};

const THIRTY_DAYS_SECS: i64 = 30 * 24 * 60 * 60;

#[derive(Debug, Clone, Serialize)]
pub struct PlatformStats {
    pub players: i64,
    pub tournaments: i64,
    pub highlights: i64,
    pub countries: i64,
}

pub async fn platform(pool: &SqlitePool) -> anyhow::Result<PlatformStats> {
    Ok(PlatformStats {
        players: player::count_public(pool).await?,
        tournaments: tournament::count(pool).await?,
        highlights: highlight::count_approved(pool).await?,
        countries: player::count_countries(pool).await?,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct Growth {
    pub total: i64,
    pub last_30_days: i64,
    pub previous_30_days: i64,
    pub growth_percent: f64,
}

impl Growth {
    fn new(total: i64, since_60: i64, since_30: i64) -> Self {
        let previous = since_60 - since_30;

        Self {
            total,
            last_30_days: since_30,
            previous_30_days: previous,
            growth_percent: growth_percent(since_30, previous),
        }
    }
}

/// Change against the previous window, rounded to one decimal.
fn growth_percent(current: i64, previous: i64) -> f64 {
    if previous == 0 {
        return if current > 0 { 100.0 } else { 0.0 };
    }

    let pct = (current - previous) as f64 / previous as f64 * 100.0;

    (pct * 10.0).round() / 10.0
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminStats {
    pub users: Growth,
    pub players: Growth,
    pub highlights: Growth,
    pub matches: Growth,
    pub pending_contact_requests: i64,
    pub active_subscriptions: BTreeMap<String, i64>,
}

pub async fn admin(pool: &SqlitePool, now: i64) -> anyhow::Result<AdminStats> {
    let since_30 = Some(now - THIRTY_DAYS_SECS);
    let since_60 = Some(now - 2 * THIRTY_DAYS_SECS);

    Ok(AdminStats {
        users: Growth::new(
            user::count_since(pool, None).await?,
            user::count_since(pool, since_60).await?,
            user::count_since(pool, since_30).await?,
        ),
        players: Growth::new(
            player::count_since(pool, None).await?,
            player::count_since(pool, since_60).await?,
            player::count_since(pool, since_30).await?,
        ),
        highlights: Growth::new(
            highlight::count_since(pool, None).await?,
            highlight::count_since(pool, since_60).await?,
            highlight::count_since(pool, since_30).await?,
        ),
        matches: Growth::new(
            matches::count_since(pool, None).await?,
            matches::count_since(pool, since_60).await?,
            matches::count_since(pool, since_30).await?,
        ),
        pending_contact_requests: contact::count_pending(pool).await?,
        active_subscriptions: subscription::count_by_tier(pool).await?.into_iter().collect(),
    })
}
