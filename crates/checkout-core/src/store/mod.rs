//! Purchase Records
//!
//! Answers "which of these courses does this user already own?"

mod memory;
#[cfg(feature = "mysql")]
mod mysql;

pub use memory::MemoryPurchaseStore;
#[cfg(feature = "mysql")]
pub use mysql::MySqlPurchaseStore;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{CourseId, UserId};

/// Purchase record store trait
///
/// Implement this for each backend holding `(user_id, course_id)` rows.
#[async_trait]
pub trait PurchaseRecordStore: Send + Sync {
    /// Subset of `course_ids` already purchased by `user`, in request order
    /// and without duplicates
    async fn purchased_among(
        &self,
        user: &UserId,
        course_ids: &[CourseId],
    ) -> Result<Vec<CourseId>>;

    /// Record purchases (idempotent). Only payment fulfilment writes here.
    async fn record_purchases(&self, user: &UserId, course_ids: &[CourseId]) -> Result<()>;
}

/// Keep the ids of `requested` that `owned` reports, in request order, once each
pub(crate) fn in_request_order(
    requested: &[CourseId],
    mut owned: impl FnMut(CourseId) -> bool,
) -> Vec<CourseId> {
    let mut seen = std::collections::HashSet::new();
    requested
        .iter()
        .copied()
        .filter(|id| seen.insert(*id) && owned(*id))
        .collect()
}
