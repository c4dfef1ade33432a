use thiserror::Error;

use crate::{StoredTier, SubscriptionStatus, Tier};

/// Reasons an access check can fail.
///
/// Denials carry what the caller lacks so the client can render an upgrade
/// or reactivation prompt.
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("authentication required")]
    AuthenticationRequired,

    #[error("subscription is {status}")]
    SubscriptionInactive {
        current_tier: StoredTier,
        status: SubscriptionStatus,
    },

    #[error("{required_tier} tier required, current tier is {current_tier}")]
    InsufficientTier {
        current_tier: StoredTier,
        required_tier: Tier,
    },

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("subscription lookup failed: {0}")]
    TransientStore(#[source] anyhow::Error),
}

impl AccessError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, AccessError::TransientStore(_))
    }
}
