//! Stripe Webhook Handling
//!
//! Records course purchases once Stripe confirms a checkout was paid.

use std::collections::HashMap;
use std::sync::Arc;

use checkout_core::{CourseId, PurchaseRecordStore, UserId};
use stripe::{CheckoutSessionPaymentStatus, Event, EventObject, EventType, Webhook};

use crate::checkout::{METADATA_COURSE_IDS, METADATA_USER_ID};
use crate::error::{PaymentError, Result};

/// Parsed webhook event
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WebhookEvent {
    /// Checkout paid - record purchases
    PurchaseCompleted {
        session_id: String,
        user_id: UserId,
        course_ids: Vec<CourseId>,
    },

    /// Checkout finished but funds not yet captured (async payment methods)
    PaymentPending { session_id: String },

    /// Unhandled event type
    Other { event_type: String },
}

/// Webhook handler
pub struct WebhookHandler<S: PurchaseRecordStore + ?Sized> {
    store: Arc<S>,
}

impl<S: PurchaseRecordStore + ?Sized> WebhookHandler<S> {
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Verify webhook signature and parse event
    pub fn parse_event(&self, payload: &str, signature: &str, secret: &str) -> Result<Event> {
        Webhook::construct_event(payload, signature, secret)
            .map_err(|e| PaymentError::WebhookSignature(e.to_string()))
    }

    /// Process a webhook event
    pub async fn handle(&self, event: Event) -> Result<WebhookEvent> {
        tracing::info!(event_type = ?event.type_, "Processing Stripe webhook");

        let parsed = parse_webhook_event(&event)?;
        self.apply(parsed).await
    }

    /// Act on a parsed event: record purchases for a paid checkout
    pub async fn apply(&self, parsed: WebhookEvent) -> Result<WebhookEvent> {
        match &parsed {
            WebhookEvent::PurchaseCompleted {
                session_id,
                user_id,
                course_ids,
            } => {
                self.store
                    .record_purchases(user_id, course_ids)
                    .await
                    .map_err(|e| PaymentError::Storage(e.to_string()))?;

                tracing::info!(
                    session_id = %session_id,
                    user_id = %user_id,
                    course_ids = ?course_ids,
                    "Fulfilled checkout"
                );
            }

            WebhookEvent::PaymentPending { session_id } => {
                tracing::info!(session_id = %session_id, "Checkout awaiting payment");
            }

            WebhookEvent::Other { event_type } => {
                tracing::debug!(event_type = %event_type, "Unhandled webhook event");
            }
        }

        Ok(parsed)
    }
}

/// Parse Stripe event into our event type
fn parse_webhook_event(event: &Event) -> Result<WebhookEvent> {
    if !is_fulfilment_event(&event.type_) {
        return Ok(WebhookEvent::Other {
            event_type: format!("{:?}", event.type_),
        });
    }

    let EventObject::CheckoutSession(session) = &event.data.object else {
        return Err(PaymentError::WebhookParse("Invalid checkout session data".into()));
    };

    checkout_outcome(
        session.id.to_string(),
        &session.payment_status,
        session.metadata.as_ref(),
        session.client_reference_id.as_deref(),
    )
}

/// Events whose checkout session may carry a completed purchase
pub const fn is_fulfilment_event(event_type: &EventType) -> bool {
    matches!(
        event_type,
        EventType::CheckoutSessionCompleted | EventType::CheckoutSessionAsyncPaymentSucceeded
    )
}

/// Classify a finished checkout session.
///
/// Only settled sessions become purchases; anything else is still pending.
pub fn checkout_outcome(
    session_id: String,
    payment_status: &CheckoutSessionPaymentStatus,
    metadata: Option<&HashMap<String, String>>,
    client_reference_id: Option<&str>,
) -> Result<WebhookEvent> {
    let settled = matches!(
        payment_status,
        CheckoutSessionPaymentStatus::Paid | CheckoutSessionPaymentStatus::NoPaymentRequired
    );
    if !settled {
        return Ok(WebhookEvent::PaymentPending { session_id });
    }

    let (user_id, course_ids) = purchase_from_metadata(metadata, client_reference_id)?;

    Ok(WebhookEvent::PurchaseCompleted {
        session_id,
        user_id,
        course_ids,
    })
}

/// Recover buyer and courses from session metadata.
///
/// The user id falls back to `client_reference_id` when the metadata key is
/// missing.
pub fn purchase_from_metadata(
    metadata: Option<&HashMap<String, String>>,
    client_reference_id: Option<&str>,
) -> Result<(UserId, Vec<CourseId>)> {
    let raw_user = metadata
        .and_then(|m| m.get(METADATA_USER_ID))
        .map(String::as_str)
        .or(client_reference_id)
        .ok_or_else(|| PaymentError::WebhookParse("session has no user id".into()))?;
    let user_id = UserId::parse(raw_user)
        .map_err(|_| PaymentError::WebhookParse("session user id is empty".into()))?;

    let raw_courses = metadata
        .and_then(|m| m.get(METADATA_COURSE_IDS))
        .ok_or_else(|| PaymentError::WebhookParse("session has no course ids".into()))?;
    let course_ids: Vec<CourseId> = serde_json::from_str(raw_courses)
        .map_err(|e| PaymentError::WebhookParse(format!("malformed course ids: {e}")))?;

    Ok((user_id, course_ids))
}
