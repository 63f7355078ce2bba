//! HTTP Handlers

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use checkout_core::{CartItem, CheckoutError, CourseId};
use checkout_payments::WebhookHandler;

use crate::auth::CurrentUser;
use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub catalog_size: usize,
    pub payment_provider: String,
    pub webhooks_enabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateCheckoutRequest {
    #[serde(default)]
    pub items: Vec<CartItem>,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlreadyPurchasedResponse {
    pub message: String,
    pub purchased_course_ids: Vec<CourseId>,
}

fn error_response(status: StatusCode, error: impl Into<String>, code: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.into(),
        }),
    )
        .into_response()
}

/// Map a checkout failure onto its HTTP response
pub fn checkout_error_response(err: CheckoutError) -> Response {
    match err {
        CheckoutError::Unauthenticated => {
            error_response(StatusCode::UNAUTHORIZED, err.user_message(), "UNAUTHENTICATED")
        }
        CheckoutError::AlreadyPurchased { ref course_ids } => (
            StatusCode::BAD_REQUEST,
            Json(AlreadyPurchasedResponse {
                message: err.to_string(),
                purchased_course_ids: course_ids.clone(),
            }),
        )
            .into_response(),
        CheckoutError::NoValidItems => {
            error_response(StatusCode::BAD_REQUEST, err.user_message(), "NO_VALID_ITEMS")
        }
        CheckoutError::Store(_) | CheckoutError::Provider(_) => {
            tracing::error!("Error creating checkout session: {}", err);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                err.user_message(),
                "CHECKOUT_ERROR",
            )
        }
        CheckoutError::Config(_) | CheckoutError::Json(_) => {
            tracing::error!("Checkout misconfigured: {}", err);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                err.user_message(),
                "CONFIG_ERROR",
            )
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        catalog_size: state.checkout.catalog().len(),
        payment_provider: state.checkout.provider_name().to_string(),
        webhooks_enabled: state.webhook_secret.is_some(),
    })
}

/// Create a checkout session for the caller's cart
pub async fn create_checkout_session(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateCheckoutRequest>,
) -> Result<Json<CheckoutResponse>, Response> {
    let session = state
        .checkout
        .checkout(user.as_ref(), &payload.items)
        .await
        .map_err(checkout_error_response)?;

    Ok(Json(CheckoutResponse { url: session.url }))
}

/// Stripe webhook handler
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<StatusCode, Response> {
    let secret = state.webhook_secret.as_deref().ok_or_else(|| {
        error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "Webhooks not configured",
            "WEBHOOKS_DISABLED",
        )
    })?;

    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            error_response(
                StatusCode::BAD_REQUEST,
                "Missing Stripe signature",
                "MISSING_SIGNATURE",
            )
        })?;

    let handler = WebhookHandler::new(state.store.clone());

    let event = handler.parse_event(&body, signature, secret).map_err(|e| {
        tracing::warn!("Webhook signature failed: {}", e);
        error_response(StatusCode::BAD_REQUEST, "Invalid signature", "INVALID_SIGNATURE")
    })?;

    handler.handle(event).await.map_err(|e| {
        tracing::error!("Webhook processing error: {}", e);
        let status = if e.is_retryable() {
            StatusCode::INTERNAL_SERVER_ERROR
        } else {
            StatusCode::BAD_REQUEST
        };
        error_response(status, "Webhook processing failed", "WEBHOOK_ERROR")
    })?;

    Ok(StatusCode::OK)
}
