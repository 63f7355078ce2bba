//! Payment Session Provider Strategy Pattern
//!
//! Defines a common interface for hosted-checkout backends so the checkout
//! handler can run against Stripe, a test double, or anything else.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use checkout_core::provider::{PaymentSessionProvider, SessionRequest};
//!
//! let session = provider.create_session(&request).await?;
//! // Redirect user to: session.url
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{CourseId, LineItem, UserId};

/// Placeholder the provider substitutes with the real session id
pub const SESSION_ID_PLACEHOLDER: &str = "{CHECKOUT_SESSION_ID}";

/// Kind of checkout session
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    /// One-off payment
    #[default]
    Payment,
}

/// Everything the provider needs to render a checkout page
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionRequest {
    pub line_items: Vec<LineItem>,

    pub mode: SessionMode,

    /// Redirect after payment, may contain [`SESSION_ID_PLACEHOLDER`]
    pub success_url: String,

    pub cancel_url: String,

    /// Buyer, echoed back in provider metadata
    pub user_id: UserId,

    /// Catalog courses being paid for, echoed back in provider metadata
    pub course_ids: Vec<CourseId>,
}

/// A created checkout session
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSession {
    /// Provider session ID
    pub id: String,

    /// URL to redirect user to
    pub url: String,
}

/// Payment session provider trait
#[async_trait]
pub trait PaymentSessionProvider: Send + Sync {
    /// Create a hosted checkout session
    async fn create_session(&self, request: &SessionRequest) -> Result<PaymentSession>;

    /// Provider name
    fn name(&self) -> &str;
}
