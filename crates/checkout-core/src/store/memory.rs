//! In-memory purchase store (for development and tests)

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{PurchaseRecordStore, in_request_order};
use crate::error::Result;
use crate::model::{CourseId, UserId};

#[derive(Default)]
pub struct MemoryPurchaseStore {
    purchases: RwLock<HashMap<UserId, HashSet<CourseId>>>,
}

impl MemoryPurchaseStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with existing purchases
    pub fn with_purchases(records: impl IntoIterator<Item = (UserId, CourseId)>) -> Self {
        let mut purchases: HashMap<UserId, HashSet<CourseId>> = HashMap::new();
        for (user, course) in records {
            purchases.entry(user).or_default().insert(course);
        }
        Self {
            purchases: RwLock::new(purchases),
        }
    }
}

#[async_trait]
impl PurchaseRecordStore for MemoryPurchaseStore {
    async fn purchased_among(
        &self,
        user: &UserId,
        course_ids: &[CourseId],
    ) -> Result<Vec<CourseId>> {
        let purchases = self.purchases.read().await;
        let Some(owned) = purchases.get(user) else {
            return Ok(Vec::new());
        };
        Ok(in_request_order(course_ids, |id| owned.contains(&id)))
    }

    async fn record_purchases(&self, user: &UserId, course_ids: &[CourseId]) -> Result<()> {
        if course_ids.is_empty() {
            return Ok(());
        }
        let mut purchases = self.purchases.write().await;
        purchases
            .entry(user.clone())
            .or_default()
            .extend(course_ids.iter().copied());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> UserId {
        UserId::parse(id).unwrap()
    }

    #[tokio::test]
    async fn test_reports_owned_subset_in_request_order() {
        let store = MemoryPurchaseStore::with_purchases([
            (user("7"), CourseId(4)),
            (user("7"), CourseId(2)),
            (user("8"), CourseId(3)),
        ]);

        let owned = store
            .purchased_among(&user("7"), &[CourseId(3), CourseId(4), CourseId(2), CourseId(4)])
            .await
            .unwrap();
        assert_eq!(owned, vec![CourseId(4), CourseId(2)]);
    }

    #[tokio::test]
    async fn test_unknown_user_owns_nothing() {
        let store = MemoryPurchaseStore::new();
        let owned = store.purchased_among(&user("1"), &[CourseId(1)]).await.unwrap();
        assert!(owned.is_empty());
    }

    #[tokio::test]
    async fn test_record_is_idempotent() {
        let store = MemoryPurchaseStore::new();
        store.record_purchases(&user("1"), &[CourseId(2)]).await.unwrap();
        store.record_purchases(&user("1"), &[CourseId(2), CourseId(3)]).await.unwrap();

        let owned = store
            .purchased_among(&user("1"), &[CourseId(2), CourseId(3), CourseId(5)])
            .await
            .unwrap();
        assert_eq!(owned, vec![CourseId(2), CourseId(3)]);
    }
}
