//! Domain Types
//!
//! Identifiers, cart input and the line items derived from it.

use serde::{Deserialize, Serialize};

use crate::error::{CheckoutError, Result};

/// Course identifier (serialized as a bare number)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseId(pub i64);

impl std::fmt::Display for CourseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for CourseId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Authenticated user identifier, never empty
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Parse a user id, rejecting empty or blank values
    pub fn parse(s: impl Into<String>) -> Result<Self> {
        let s = s.into();
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(CheckoutError::Unauthenticated);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for UserId {
    type Error = CheckoutError;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

/// One entry of the shopping cart as sent by the client
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Requested course
    #[serde(rename = "id")]
    pub course_id: CourseId,

    /// Number of seats
    #[serde(default = "default_quantity")]
    pub quantity: u64,
}

const fn default_quantity() -> u64 {
    1
}

impl CartItem {
    pub fn new(course_id: impl Into<CourseId>, quantity: u64) -> Self {
        Self {
            course_id: course_id.into(),
            quantity,
        }
    }
}

/// A priced line handed to the payment provider
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub name: String,
    pub price_in_cents: i64,
    pub quantity: u64,
}
