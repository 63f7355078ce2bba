//! Payment Error Types

use checkout_core::CheckoutError;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Payment-related errors
#[derive(Error, Debug)]
pub enum PaymentError {
    /// Stripe API error
    #[error("Stripe error: {0}")]
    Stripe(String),

    /// Webhook signature verification failed
    #[error("Webhook signature invalid: {0}")]
    WebhookSignature(String),

    /// Webhook payload parsing failed
    #[error("Webhook parse error: {0}")]
    WebhookParse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Session request Stripe would refuse
    #[error("Invalid checkout request: {0}")]
    InvalidRequest(String),

    /// Recording a purchase failed
    #[error("Storage error: {0}")]
    Storage(String),
}

impl PaymentError {
    /// Stripe retries webhooks that fail with these
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Stripe(_) | Self::Storage(_))
    }

    /// Get user-friendly message
    pub const fn user_message(&self) -> &str {
        match self {
            Self::Stripe(_) => "Payment processing failed. Please try again.",
            Self::WebhookSignature(_) => "Invalid signature.",
            Self::Config(_) => "Service configuration error.",
            _ => "An error occurred processing your request.",
        }
    }
}

impl From<stripe::StripeError> for PaymentError {
    fn from(err: stripe::StripeError) -> Self {
        Self::Stripe(err.to_string())
    }
}

impl From<PaymentError> for CheckoutError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::Config(msg) => Self::Config(msg),
            PaymentError::Storage(msg) => Self::Store(msg),
            other => Self::Provider(other.to_string()),
        }
    }
}
