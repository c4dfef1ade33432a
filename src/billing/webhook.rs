//! Incoming payment provider events

use std::collections::HashMap;

use stripe_shared::{CheckoutSession, Invoice, Subscription, SubscriptionStatus as StripeStatus};
use stripe_webhook::{Event, EventObject, Webhook, WebhookError};
use unicorn_sport_access::{SubscriptionStatus, Tier};

use super::BillingError;
use crate::config::StripeConfig;

/// Verifies the `Stripe-Signature` header and decodes the event.
pub fn construct_event(payload: &str, signature: &str, secret: &str) -> Result<Event, BillingError> {
    Webhook::construct_event(payload, signature, secret).map_err(|e| match e {
        WebhookError::BadParse(reason) => BillingError::InvalidPayload(reason),
        other => {
            tracing::warn!(error = %other, "Webhook signature check failed");
            BillingError::InvalidSignature
        }
    })
}

/// What an event means for a local subscription row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionChange {
    CheckoutCompleted {
        user_id: String,
        tier: Tier,
        customer_id: Option<String>,
        subscription_id: Option<String>,
    },
    Updated {
        subscription_id: Option<String>,
        customer_id: Option<String>,
        status: SubscriptionStatus,
        tier: Option<Tier>,
        period_start: Option<i64>,
        period_end: Option<i64>,
        cancel_at_period_end: bool,
    },
    Deleted {
        subscription_id: Option<String>,
        customer_id: Option<String>,
    },
    PaymentFailed {
        subscription_id: Option<String>,
        customer_id: Option<String>,
    },
    Ignored(String),
}

/// Provider status to the local status vocabulary.
pub fn map_status(status: &StripeStatus) -> SubscriptionStatus {
    match status {
        StripeStatus::Active | StripeStatus::Trialing => SubscriptionStatus::Active,
        StripeStatus::PastDue | StripeStatus::Unpaid => SubscriptionStatus::PastDue,
        StripeStatus::Canceled => SubscriptionStatus::Cancelled,
        _ => SubscriptionStatus::Inactive,
    }
}

fn metadata_tier(metadata: Option<&HashMap<String, String>>) -> Option<Tier> {
    metadata?.get("tier")?.parse().ok()
}

fn checkout_completed(session: &CheckoutSession) -> Option<SubscriptionChange> {
    let metadata = session.metadata.as_ref();
    let user_id = metadata
        .and_then(|metadata| metadata.get("user_id").cloned())
        .or_else(|| session.client_reference_id.clone())?;

    Some(SubscriptionChange::CheckoutCompleted {
        user_id,
        tier: metadata_tier(metadata)?,
        customer_id: session
            .customer
            .as_ref()
            .map(|customer| customer.id().as_str().to_owned()),
        subscription_id: session
            .subscription
            .as_ref()
            .map(|subscription| subscription.id().as_str().to_owned()),
    })
}

/// The plan comes from the first item's price, so portal plan switches are
/// picked up; the checkout metadata is the fallback.
fn subscription_updated(subscription: &Subscription, prices: &StripeConfig) -> SubscriptionChange {
    let item = subscription.items.data.first();
    let tier = item
        .and_then(|item| prices.tier_for_price(item.price.id.as_str()))
        .or_else(|| metadata_tier(Some(&subscription.metadata)));

    SubscriptionChange::Updated {
        subscription_id: Some(subscription.id.as_str().to_owned()),
        customer_id: Some(subscription.customer.id().as_str().to_owned()),
        status: map_status(&subscription.status),
        tier,
        period_start: item.map(|item| item.current_period_start),
        period_end: item.map(|item| item.current_period_end),
        cancel_at_period_end: subscription.cancel_at_period_end,
    }
}

fn payment_failed(invoice: &Invoice) -> SubscriptionChange {
    let subscription_id = invoice
        .subscription
        .as_ref()
        .map(|subscription| subscription.id().as_str().to_owned())
        .or_else(|| {
            invoice
                .parent
                .as_ref()?
                .subscription_details
                .as_ref()
                .map(|details| details.subscription.id().as_str().to_owned())
        });

    SubscriptionChange::PaymentFailed {
        subscription_id,
        customer_id: invoice
            .customer
            .as_ref()
            .map(|customer| customer.id().as_str().to_owned()),
    }
}

pub fn subscription_change(event: Event, prices: &StripeConfig) -> SubscriptionChange {
    let kind = event.type_.as_str().to_owned();

    match event.data.object {
        EventObject::CheckoutSessionCompleted(session) => checkout_completed(&session)
            .unwrap_or_else(|| {
                tracing::warn!(session_id = %session.id.as_str(), "Checkout completed without user or tier metadata");
                SubscriptionChange::Ignored(kind)
            }),
        EventObject::CustomerSubscriptionUpdated(subscription) => {
            subscription_updated(&subscription, prices)
        }
        EventObject::CustomerSubscriptionDeleted(subscription) => SubscriptionChange::Deleted {
            subscription_id: Some(subscription.id.as_str().to_owned()),
            customer_id: Some(subscription.customer.id().as_str().to_owned()),
        },
        EventObject::InvoicePaymentFailed(invoice) => payment_failed(&invoice),
        _ => SubscriptionChange::Ignored(kind),
    }
}
