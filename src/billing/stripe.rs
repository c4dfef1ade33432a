use std::collections::HashMap;

use async_trait::async_trait;
use stripe_billing::billing_portal_session::CreateBillingPortalSession;
use stripe_checkout::checkout_session::{
    CreateCheckoutSession, CreateCheckoutSessionLineItems,
    CreateCheckoutSessionSubscriptionData,
};
use stripe_core::customer::CreateCustomer;
use stripe_shared::CheckoutSessionMode;

use super::{BillingError, CheckoutRequest, CheckoutSession, PaymentGateway};

pub struct StripeGateway {
    client: Option<stripe::Client>,
}

impl StripeGateway {
    pub fn new(secret_key: &str) -> Self {
        Self {
            client: (!secret_key.is_empty()).then(|| stripe::Client::new(secret_key)),
        }
    }

    fn client(&self) -> Result<&stripe::Client, BillingError> {
        self.client.as_ref().ok_or(BillingError::NotConfigured)
    }
}

fn provider_error(err: impl std::fmt::Display) -> BillingError {
    BillingError::Provider(err.to_string())
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    async fn create_customer(&self, email: &str, user_id: &str) -> Result<String, BillingError> {
        let metadata = HashMap::from([("user_id".to_owned(), user_id.to_owned())]);

        let customer = CreateCustomer::new()
            .email(email)
            .metadata(metadata)
            .send(self.client()?)
            .await
            .map_err(provider_error)?;

        Ok(customer.id.as_str().to_owned())
    }

    async fn create_checkout_session(
        &self,
        request: CheckoutRequest<'_>,
    ) -> Result<CheckoutSession, BillingError> {
        let metadata = HashMap::from([
            ("user_id".to_owned(), request.user_id.to_owned()),
            ("tier".to_owned(), request.tier.to_string()),
        ]);

        let mut line_item = CreateCheckoutSessionLineItems::new();
        line_item.price = Some(request.price_id.to_owned());
        line_item.quantity = Some(1);

        // copied onto the subscription so later updates still carry the plan
        let mut subscription_data = CreateCheckoutSessionSubscriptionData::new();
        subscription_data.metadata = Some(metadata.clone());

        let session = CreateCheckoutSession::new()
            .customer(request.customer_id)
            .client_reference_id(request.user_id)
            .mode(CheckoutSessionMode::Subscription)
            .line_items(vec![line_item])
            .success_url(request.success_url)
            .cancel_url(request.cancel_url)
            .subscription_data(subscription_data)
            .metadata(metadata)
            .send(self.client()?)
            .await
            .map_err(provider_error)?;

        let checkout_url = session
            .url
            .ok_or_else(|| BillingError::Provider("checkout session has no url".to_owned()))?;

        Ok(CheckoutSession {
            session_id: session.id.as_str().to_owned(),
            checkout_url,
        })
    }

    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<String, BillingError> {
        let session = CreateBillingPortalSession::new()
            .customer(customer_id)
            .return_url(return_url)
            .send(self.client()?)
            .await
            .map_err(provider_error)?;

        Ok(session.url)
    }
}
