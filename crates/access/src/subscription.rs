use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, VariantArray};

use crate::{AccessError, StoredTier, Tier};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    EnumString,
    Display,
    AsRefStr,
    VariantArray,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    #[default]
    Active,
    PastDue,
    #[strum(to_string = "cancelled", serialize = "canceled")]
    Cancelled,
    Inactive,
}

impl SubscriptionStatus {
    /// Unknown values fail closed.
    pub fn parse(raw: &str) -> Self {
        raw.parse().unwrap_or_else(|_| {
            tracing::warn!(status = raw, "Unrecognized subscription status");
            SubscriptionStatus::Inactive
        })
    }

    pub fn is_active(self) -> bool {
        self == SubscriptionStatus::Active
    }
}

/// Subscription row as the store returns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionRecord {
    pub tier: String,
    pub status: String,
}

/// Effective tier and status of a user at the time of the check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedSubscription {
    pub tier: StoredTier,
    pub status: SubscriptionStatus,
}

impl ResolvedSubscription {
    pub fn new(tier: impl Into<StoredTier>, status: SubscriptionStatus) -> Self {
        Self {
            tier: tier.into(),
            status,
        }
    }

    /// Users without a subscription row.
    pub fn free() -> Self {
        Self::new(Tier::Free, SubscriptionStatus::Active)
    }
}

impl Default for ResolvedSubscription {
    fn default() -> Self {
        Self::free()
    }
}

impl From<SubscriptionRecord> for ResolvedSubscription {
    fn from(record: SubscriptionRecord) -> Self {
        Self {
            tier: StoredTier::parse(&record.tier),
            status: SubscriptionStatus::parse(&record.status),
        }
    }
}

/// Read side of the subscription table.
#[async_trait]
pub trait SubscriptionSource: Send + Sync {
    async fn find_subscription_by_user(
        &self,
        user_id: &str,
    ) -> anyhow::Result<Option<SubscriptionRecord>>;
}

/// Loads the current subscription of a user, re-reading the row every time.
pub async fn resolve_subscription<S>(
    source: &S,
    user_id: &str,
) -> Result<ResolvedSubscription, AccessError>
where
    S: SubscriptionSource + ?Sized,
{
    let record = source
        .find_subscription_by_user(user_id)
        .await
        .map_err(AccessError::TransientStore)?;

    Ok(record.map(Into::into).unwrap_or_default())
}
