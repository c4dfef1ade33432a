//! Subscription payments

mod stripe;
pub mod webhook;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use unicorn_sport_access::Tier;

pub use stripe::StripeGateway;

#[derive(Debug, Error)]
pub enum BillingError {
    #[error("payments are not configured")]
    NotConfigured,

    #[error("payment provider error: {0}")]
    Provider(String),

    #[error("invalid webhook signature")]
    InvalidSignature,

    #[error("invalid webhook payload: {0}")]
    InvalidPayload(String),
}

pub struct CheckoutRequest<'a> {
    pub customer_id: &'a str,
    pub price_id: &'a str,
    pub user_id: &'a str,
    pub tier: Tier,
    pub success_url: &'a str,
    pub cancel_url: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutSession {
    pub session_id: String,
    pub checkout_url: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    fn is_configured(&self) -> bool;

    /// Returns the provider's customer id.
    async fn create_customer(&self, email: &str, user_id: &str) -> Result<String, BillingError>;

    async fn create_checkout_session(
        &self,
        request: CheckoutRequest<'_>,
    ) -> Result<CheckoutSession, BillingError>;

    /// Returns the billing portal URL.
    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<String, BillingError>;
}

/// Monthly plan shown on the pricing page.
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub tier: Tier,
    pub name: &'static str,
    pub price_cents: i64,
    pub currency: &'static str,
    pub interval: &'static str,
    pub recommended: bool,
    pub features: &'static [&'static str],
}

pub fn plans() -> [Plan; 4] {
    [
        Plan {
            tier: Tier::Free,
            name: "Free",
            price_cents: 0,
            currency: "usd",
            interval: "month",
            recommended: false,
            features: &[
                "Browse verified players",
                "Watch highlight clips",
                "Basic search filters",
            ],
        },
        Plan {
            tier: Tier::Scout,
            name: "Scout",
            price_cents: 9900,
            currency: "usd",
            interval: "month",
            recommended: true,
            features: &[
                "Everything in Free",
                "Full match videos",
                "Save players to your list",
                "Advanced search filters",
            ],
        },
        Plan {
            tier: Tier::Pro,
            name: "Pro",
            price_cents: 29900,
            currency: "usd",
            interval: "month",
            recommended: false,
            features: &["Everything in Scout", "Contact players and academies"],
        },
        Plan {
            tier: Tier::Club,
            name: "Club",
            price_cents: 99900,
            currency: "usd",
            interval: "month",
            recommended: false,
            features: &["Everything in Pro", "Bulk data access"],
        },
    ]
}
