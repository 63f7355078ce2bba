//! Error Types

use thiserror::Error;

use crate::model::CourseId;

/// Result type alias for checkout operations
pub type Result<T> = std::result::Result<T, CheckoutError>;

/// Checkout error types
///
/// Every variant is terminal for the request; nothing here is retried.
#[derive(Error, Debug)]
pub enum CheckoutError {
    /// No authenticated user identity was supplied
    #[error("User ID is not defined. Ensure the user is authenticated.")]
    Unauthenticated,

    /// One or more requested courses are already owned by the user
    #[error("You have already purchased courses with IDs: {}", join_ids(.course_ids))]
    AlreadyPurchased { course_ids: Vec<CourseId> },

    /// None of the cart items resolved to a catalog entry
    #[error("No valid items found for checkout.")]
    NoValidItems,

    /// Purchase record store failed
    #[error("Error checking purchased courses: {0}")]
    Store(String),

    /// Payment session provider failed
    #[error("Payment provider error: {0}")]
    Provider(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON error (catalog files)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CheckoutError {
    /// Failures of an external collaborator rather than of the request itself
    pub const fn is_upstream(&self) -> bool {
        matches!(self, Self::Store(_) | Self::Provider(_))
    }

    /// Message that is safe to return to the caller
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthenticated | Self::AlreadyPurchased { .. } | Self::NoValidItems => {
                self.to_string()
            }
            Self::Store(_) => "Unable to verify your previous purchases. Please try again.".into(),
            Self::Provider(_) => "Payment processing failed. Please try again.".into(),
            Self::Config(_) | Self::Json(_) => "Service configuration error.".into(),
        }
    }
}

#[cfg(feature = "mysql")]
impl From<sqlx::Error> for CheckoutError {
    fn from(err: sqlx::Error) -> Self {
        Self::Store(err.to_string())
    }
}

fn join_ids(ids: &[CourseId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_purchased_message_lists_ids() {
        let err = CheckoutError::AlreadyPurchased {
            course_ids: vec![CourseId(2), CourseId(5)],
        };
        assert_eq!(
            err.to_string(),
            "You have already purchased courses with IDs: 2, 5"
        );
    }

    #[test]
    fn test_upstream_detail_not_leaked() {
        let err = CheckoutError::Store("connection refused to 10.0.0.3".into());
        assert!(err.is_upstream());
        assert!(!err.user_message().contains("10.0.0.3"));
        assert!(!CheckoutError::NoValidItems.is_upstream());
    }
}
