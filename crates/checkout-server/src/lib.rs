//! # checkout-server
//!
//! axum HTTP surface for course checkout.

pub mod auth;
pub mod config;
pub mod handlers;
pub mod state;

use axum::{Router, routing::{get, post}};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{create_checkout_session, health_check, stripe_webhook};
pub use crate::state::AppState;

/// Build the application router
pub fn router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/create-checkout-session", post(create_checkout_session))
        .route("/webhook/stripe", post(stripe_webhook))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
