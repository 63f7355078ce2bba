//! Application State

use std::sync::Arc;

use checkout_core::{CheckoutHandler, PurchaseRecordStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Checkout orchestration (store, catalog and payment provider)
    pub checkout: Arc<CheckoutHandler>,

    /// Purchase records, written by webhook fulfilment
    pub store: Arc<dyn PurchaseRecordStore>,

    /// Stripe webhook signing secret (None - webhooks disabled)
    pub webhook_secret: Option<Arc<str>>,

    /// Accept the `x-user-id` header as the caller's identity
    pub trust_user_id_header: bool,
}
