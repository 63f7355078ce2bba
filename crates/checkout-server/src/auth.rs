//! Caller Identity
//!
//! Authentication happens upstream. The auth layer hands the user id over as
//! a `UserId` request extension. Deployments behind a gateway that
//! authenticates callers and strips client-supplied headers can opt into
//! reading the `x-user-id` header instead (`TRUST_USER_ID_HEADER`).

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use checkout_core::UserId;

use crate::state::AppState;

/// Header a trusted gateway sets after authenticating the caller
pub const USER_ID_HEADER: &str = "x-user-id";

/// Extractor that optionally gets the current user.
///
/// Never rejects; the checkout handler decides what a missing identity means.
pub struct CurrentUser(pub Option<UserId>);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<UserId>() {
            return Ok(Self(Some(user.clone())));
        }

        if !state.trust_user_id_header {
            if parts.headers.contains_key(USER_ID_HEADER) {
                tracing::debug!("Ignoring {} header, not trusted", USER_ID_HEADER);
            }
            return Ok(Self(None));
        }

        let user = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| UserId::parse(v).ok());

        Ok(Self(user))
    }
}
