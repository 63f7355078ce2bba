//! # checkout-payments
//!
//! Stripe Checkout sessions and purchase fulfilment for course-checkout.
//!
//! ## Flow
//!
//! ```text
//! ┌─────────────┐     ┌─────────────────┐     ┌─────────────┐
//! │  Your Site  │────▶│  Stripe Hosted  │────▶│  Your Site  │
//! │   (cart)    │     │  Checkout Page  │     │  (success)  │
//! └─────────────┘     └────────┬────────┘     └─────────────┘
//!                              │ checkout.session.completed
//!                              ▼
//!                     ┌─────────────────┐
//!                     │ WebhookHandler  │──▶ record_purchases
//!                     └─────────────────┘
//! ```
//!
//! The session carries the buyer and the paid course ids as metadata, so the
//! webhook can record purchases without any server-side session state.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use checkout_payments::StripeClient;
//!
//! let client = StripeClient::new("sk_test_xxx").with_webhook_secret("whsec_xxx");
//!
//! // Hand it to the checkout handler as its PaymentSessionProvider
//! let handler = CheckoutHandler::new(store, Arc::new(client), catalog, urls);
//! ```

mod checkout;
mod error;
mod webhook;

pub use checkout::{
    METADATA_COURSE_IDS, METADATA_USER_ID, METADATA_VALUE_MAX_LEN, StripeClient, parse_currency,
    session_metadata, stripe_line_items,
};
pub use error::{PaymentError, Result};
pub use webhook::{
    WebhookEvent, WebhookHandler, checkout_outcome, is_fulfilment_event, purchase_from_metadata,
};
