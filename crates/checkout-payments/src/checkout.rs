//! Stripe Checkout Integration
//!
//! Implements the hosted Stripe Checkout flow behind `PaymentSessionProvider`.

use std::collections::HashMap;

use async_trait::async_trait;
use checkout_core::{
    CourseId, LineItem, PaymentSession, PaymentSessionProvider, SessionMode, SessionRequest,
};
use stripe::{
    CheckoutSession as StripeCheckoutSession, CheckoutSessionMode, Client, CreateCheckoutSession,
    CreateCheckoutSessionLineItems, CreateCheckoutSessionLineItemsPriceData,
    CreateCheckoutSessionLineItemsPriceDataProductData, CreateCheckoutSessionPaymentMethodTypes,
    Currency,
};

use crate::error::{PaymentError, Result};

/// Metadata key carrying the buyer's user id
pub const METADATA_USER_ID: &str = "user_id";

/// Metadata key carrying the purchased course ids as a JSON array
pub const METADATA_COURSE_IDS: &str = "course_ids";

/// Stripe rejects metadata values longer than this
pub const METADATA_VALUE_MAX_LEN: usize = 500;

/// Stripe client wrapper
pub struct StripeClient {
    client: Client,
    webhook_secret: Option<String>,
    currency: Currency,
}

impl StripeClient {
    /// Create a new Stripe client charging in USD
    pub fn new(secret_key: &str) -> Self {
        Self {
            client: Client::new(secret_key),
            webhook_secret: None,
            currency: Currency::USD,
        }
    }

    #[must_use]
    pub fn with_webhook_secret(mut self, secret: impl Into<String>) -> Self {
        self.webhook_secret = Some(secret.into());
        self
    }

    #[must_use]
    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        let secret_key = std::env::var("STRIPE_SECRET_KEY")
            .map_err(|_| PaymentError::Config("STRIPE_SECRET_KEY not set".into()))?;

        let mut client = Self::new(&secret_key);
        if let Ok(secret) = std::env::var("STRIPE_WEBHOOK_SECRET") {
            client = client.with_webhook_secret(secret);
        }
        if let Ok(code) = std::env::var("STRIPE_CURRENCY") {
            client = client.with_currency(parse_currency(&code)?);
        }
        Ok(client)
    }

    /// Get the webhook secret, if webhooks are enabled
    pub fn webhook_secret(&self) -> Option<&str> {
        self.webhook_secret.as_deref()
    }

    pub const fn currency(&self) -> Currency {
        self.currency
    }

    /// Create a Stripe Checkout session (Hosted approach)
    ///
    /// Returns the session id and the URL of Stripe's hosted checkout page.
    pub async fn create_checkout_session(
        &self,
        request: &SessionRequest,
    ) -> Result<PaymentSession> {
        let mut params = CreateCheckoutSession::new();
        params.success_url = Some(&request.success_url);
        params.cancel_url = Some(&request.cancel_url);
        params.client_reference_id = Some(request.user_id.as_str());
        params.payment_method_types = Some(vec![CreateCheckoutSessionPaymentMethodTypes::Card]);
        params.mode = Some(match request.mode {
            SessionMode::Payment => CheckoutSessionMode::Payment,
        });
        params.metadata = Some(session_metadata(request)?);
        params.line_items = Some(stripe_line_items(&request.line_items, self.currency));

        let session = StripeCheckoutSession::create(&self.client, params).await?;

        let url = session
            .url
            .ok_or_else(|| PaymentError::Stripe("No checkout URL returned".into()))?;

        Ok(PaymentSession {
            id: session.id.to_string(),
            url,
        })
    }
}

#[async_trait]
impl PaymentSessionProvider for StripeClient {
    async fn create_session(
        &self,
        request: &SessionRequest,
    ) -> checkout_core::Result<PaymentSession> {
        self.create_checkout_session(request).await.map_err(|e| {
            tracing::error!(user_id = %request.user_id, error = %e, "Stripe checkout failed");
            e.into()
        })
    }

    fn name(&self) -> &str {
        "stripe"
    }
}

/// Parse an ISO currency code such as `usd` or `EUR`
pub fn parse_currency(code: &str) -> Result<Currency> {
    serde_json::from_value(serde_json::Value::String(code.trim().to_lowercase()))
        .map_err(|_| PaymentError::Config(format!("unsupported currency: {code}")))
}

/// Map catalog-priced line items onto Stripe ad-hoc prices
pub fn stripe_line_items(
    items: &[LineItem],
    currency: Currency,
) -> Vec<CreateCheckoutSessionLineItems> {
    items
        .iter()
        .map(|item| CreateCheckoutSessionLineItems {
            quantity: Some(item.quantity),
            price_data: Some(CreateCheckoutSessionLineItemsPriceData {
                currency,
                unit_amount: Some(item.price_in_cents),
                product_data: Some(CreateCheckoutSessionLineItemsPriceDataProductData {
                    name: item.name.clone(),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        })
        .collect()
}

/// Metadata that lets the webhook fulfil the order.
///
/// Fails before any API call when a value would exceed Stripe's metadata limit.
pub fn session_metadata(request: &SessionRequest) -> Result<HashMap<String, String>> {
    let user_id = request.user_id.to_string();
    let course_ids = format_course_ids(&request.course_ids);

    for (key, value) in [(METADATA_USER_ID, &user_id), (METADATA_COURSE_IDS, &course_ids)] {
        if value.len() > METADATA_VALUE_MAX_LEN {
            return Err(PaymentError::InvalidRequest(format!(
                "metadata `{key}` is {} characters, Stripe allows {METADATA_VALUE_MAX_LEN}",
                value.len()
            )));
        }
    }

    let mut metadata = HashMap::new();
    metadata.insert(METADATA_USER_ID.to_string(), user_id);
    metadata.insert(METADATA_COURSE_IDS.to_string(), course_ids);
    Ok(metadata)
}

fn format_course_ids(ids: &[CourseId]) -> String {
    let ids = ids.iter().map(ToString::to_string).collect::<Vec<_>>();
    format!("[{}]", ids.join(","))
}
