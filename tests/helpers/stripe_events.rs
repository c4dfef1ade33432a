//! Provider event bodies shaped like the ones Stripe sends.
//!
//! The typed decoder needs every non-optional field, so these carry the
//! full required set rather than just the ids the handlers read.

use serde_json::{Value, json};

const CREATED: i64 = 1_760_000_000;

pub fn event(kind: &str, object: Value) -> Value {
    json!({
        "id": format!("evt_{}", kind.replace('.', "_")),
        "object": "event",
        "api_version": "2025-09-30.clover",
        "created": CREATED,
        "livemode": false,
        "pending_webhooks": 1,
        "type": kind,
        "data": { "object": object },
    })
}

pub fn checkout_session(user_id: &str, tier: &str) -> Value {
    json!({
        "id": "cs_test_1",
        "object": "checkout.session",
        "automatic_tax": { "enabled": false },
        "client_reference_id": user_id,
        "created": CREATED,
        "custom_fields": [],
        "custom_text": {},
        "customer": "cus_42",
        "expires_at": CREATED + 86_400,
        "livemode": false,
        "metadata": { "user_id": user_id, "tier": tier },
        "mode": "subscription",
        "payment_method_types": ["card"],
        "payment_status": "paid",
        "shipping_options": [],
        "status": "complete",
        "subscription": "sub_42",
    })
}

fn price(price_id: &str) -> Value {
    json!({
        "id": price_id,
        "object": "price",
        "active": true,
        "billing_scheme": "per_unit",
        "created": CREATED,
        "currency": "usd",
        "livemode": false,
        "metadata": {},
        "product": "prod_unicorn",
        "type": "recurring",
    })
}

fn plan(price_id: &str) -> Value {
    json!({
        "id": price_id,
        "object": "plan",
        "active": true,
        "billing_scheme": "per_unit",
        "created": CREATED,
        "currency": "usd",
        "interval": "month",
        "interval_count": 1,
        "livemode": false,
        "usage_type": "licensed",
    })
}

/// A subscription on `price_id`; tier metadata is deliberately absent.
pub fn subscription(price_id: &str, status: &str, period_end: i64) -> Value {
    json!({
        "id": "sub_42",
        "object": "subscription",
        "automatic_tax": { "enabled": false },
        "billing_cycle_anchor": CREATED,
        "billing_mode": { "type": "classic" },
        "cancel_at_period_end": false,
        "collection_method": "charge_automatically",
        "created": CREATED,
        "currency": "usd",
        "customer": "cus_42",
        "discounts": [],
        "invoice_settings": { "issuer": { "type": "self" } },
        "items": {
            "object": "list",
            "data": [{
                "id": "si_42",
                "object": "subscription_item",
                "created": CREATED,
                "current_period_start": CREATED,
                "current_period_end": period_end,
                "discounts": [],
                "metadata": {},
                "plan": plan(price_id),
                "price": price(price_id),
                "quantity": 1,
                "subscription": "sub_42",
            }],
            "has_more": false,
            "url": "/v1/subscription_items?subscription=sub_42",
        },
        "livemode": false,
        "metadata": {},
        "start_date": CREATED,
        "status": status,
    })
}

pub fn failed_invoice() -> Value {
    json!({
        "id": "in_42",
        "object": "invoice",
        "amount_due": 9900,
        "amount_overpaid": 0,
        "amount_paid": 0,
        "amount_remaining": 9900,
        "amount_shipping": 0,
        "attempt_count": 1,
        "attempted": true,
        "automatic_tax": { "enabled": false },
        "collection_method": "charge_automatically",
        "created": CREATED,
        "currency": "usd",
        "customer": "cus_42",
        "default_tax_rates": [],
        "discounts": [],
        "issuer": { "type": "self" },
        "lines": {
            "object": "list",
            "data": [],
            "has_more": false,
            "url": "/v1/invoices/in_42/lines",
        },
        "livemode": false,
        "parent": {
            "type": "subscription_details",
            "subscription_details": { "subscription": "sub_42" },
        },
        "payment_settings": {},
        "period_end": CREATED,
        "period_start": CREATED,
        "post_payment_credit_notes_amount": 0,
        "pre_payment_credit_notes_amount": 0,
        "starting_balance": 0,
        "status": "open",
        "status_transitions": {},
        "subtotal": 9900,
        "total": 9900,
    })
}

pub fn customer() -> Value {
    json!({
        "id": "cus_42",
        "object": "customer",
        "created": CREATED,
        "livemode": false,
    })
}
