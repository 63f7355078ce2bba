//! Checkout Request Handler
//!
//! Validates a cart against the buyer's purchase history, prices it from the
//! catalog and opens a hosted payment session.
//!
//! ```text
//! user? ──▶ purchased_among ──▶ catalog lookup ──▶ create_session ──▶ url
//!   │             │                   │
//!   ▼             ▼                   ▼
//! Unauthenticated AlreadyPurchased  NoValidItems
//! ```

use std::sync::Arc;

use crate::catalog::CatalogPriceTable;
use crate::error::{CheckoutError, Result};
use crate::model::{CartItem, CourseId, LineItem, UserId};
use crate::provider::{
    PaymentSession, PaymentSessionProvider, SESSION_ID_PLACEHOLDER, SessionMode, SessionRequest,
};
use crate::store::PurchaseRecordStore;

/// Redirect targets on the client application
#[derive(Clone, Debug)]
pub struct RedirectUrls {
    client_url: String,
}

impl RedirectUrls {
    pub fn new(client_url: impl Into<String>) -> Result<Self> {
        let client_url = client_url.into().trim().trim_end_matches('/').to_string();
        if client_url.is_empty() {
            return Err(CheckoutError::Config("client URL is empty".into()));
        }
        Ok(Self { client_url })
    }

    /// `{client}/success?session_id={CHECKOUT_SESSION_ID}&course_id=[1,2]`
    pub fn success_url(&self, course_ids: &[CourseId]) -> String {
        let ids = course_ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        format!(
            "{}/success?session_id={SESSION_ID_PLACEHOLDER}&course_id=[{ids}]",
            self.client_url
        )
    }

    pub fn cancel_url(&self) -> String {
        format!("{}/cancel", self.client_url)
    }
}

/// Orchestrates purchase validation, pricing and session creation
#[derive(Clone)]
pub struct CheckoutHandler {
    store: Arc<dyn PurchaseRecordStore>,
    provider: Arc<dyn PaymentSessionProvider>,
    catalog: Arc<CatalogPriceTable>,
    urls: RedirectUrls,
}

impl CheckoutHandler {
    pub fn new(
        store: Arc<dyn PurchaseRecordStore>,
        provider: Arc<dyn PaymentSessionProvider>,
        catalog: Arc<CatalogPriceTable>,
        urls: RedirectUrls,
    ) -> Self {
        Self {
            store,
            provider,
            catalog,
            urls,
        }
    }

    pub fn catalog(&self) -> &CatalogPriceTable {
        &self.catalog
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Run a checkout for `user` over `items`.
    ///
    /// No session is created unless every check passes, and nothing is
    /// written: purchases are recorded only once payment is confirmed.
    pub async fn checkout(
        &self,
        user: Option<&UserId>,
        items: &[CartItem],
    ) -> Result<PaymentSession> {
        let user = user.ok_or(CheckoutError::Unauthenticated)?;

        let course_ids: Vec<CourseId> = items.iter().map(|item| item.course_id).collect();

        let already_purchased = self.store.purchased_among(user, &course_ids).await?;
        if !already_purchased.is_empty() {
            tracing::info!(
                user_id = %user,
                course_ids = ?already_purchased,
                "Checkout refused, courses already purchased"
            );
            return Err(CheckoutError::AlreadyPurchased {
                course_ids: already_purchased,
            });
        }

        let priced = self.priced_items(items);
        if priced.is_empty() {
            return Err(CheckoutError::NoValidItems);
        }

        let mut paid_course_ids: Vec<CourseId> = Vec::with_capacity(priced.len());
        for (id, _) in &priced {
            if !paid_course_ids.contains(id) {
                paid_course_ids.push(*id);
            }
        }

        let request = SessionRequest {
            line_items: priced.into_iter().map(|(_, item)| item).collect(),
            mode: SessionMode::Payment,
            success_url: self.urls.success_url(&course_ids),
            cancel_url: self.urls.cancel_url(),
            user_id: user.clone(),
            course_ids: paid_course_ids,
        };

        let session = self.provider.create_session(&request).await?;

        tracing::info!(
            user_id = %user,
            session_id = %session.id,
            provider = self.provider.name(),
            items = request.line_items.len(),
            "Created checkout session"
        );

        Ok(session)
    }

    /// Price cart items from the catalog, dropping anything it cannot sell
    fn priced_items(&self, items: &[CartItem]) -> Vec<(CourseId, LineItem)> {
        items
            .iter()
            .filter_map(|item| {
                let Some(entry) = self.catalog.get(item.course_id) else {
                    tracing::warn!(
                        course_id = %item.course_id,
                        "Item not found in catalog, skipping"
                    );
                    return None;
                };
                if item.quantity == 0 {
                    tracing::warn!(course_id = %item.course_id, "Item has zero quantity, skipping");
                    return None;
                }
                let line = LineItem {
                    name: entry.name.clone(),
                    price_in_cents: i64::from(entry.price_in_cents),
                    quantity: item.quantity,
                };
                Some((entry.course_id, line))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryPurchaseStore;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Provider that records every request it sees
    #[derive(Default)]
    struct RecordingProvider {
        requests: Mutex<Vec<SessionRequest>>,
        fail: bool,
    }

    impl RecordingProvider {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        fn last(&self) -> SessionRequest {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl PaymentSessionProvider for RecordingProvider {
        async fn create_session(&self, request: &SessionRequest) -> Result<PaymentSession> {
            self.requests.lock().unwrap().push(request.clone());
            if self.fail {
                return Err(CheckoutError::Provider("card network down".into()));
            }
            Ok(PaymentSession {
                id: "cs_test_123".into(),
                url: "https://checkout.stripe.com/c/pay/cs_test_123".into(),
            })
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    /// Store that counts lookups and optionally fails them
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryPurchaseStore,
        lookups: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl PurchaseRecordStore for CountingStore {
        async fn purchased_among(
            &self,
            user: &UserId,
            course_ids: &[CourseId],
        ) -> Result<Vec<CourseId>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(CheckoutError::Store("connection reset".into()));
            }
            self.inner.purchased_among(user, course_ids).await
        }

        async fn record_purchases(&self, user: &UserId, course_ids: &[CourseId]) -> Result<()> {
            self.inner.record_purchases(user, course_ids).await
        }
    }

    fn user() -> UserId {
        UserId::parse("42").unwrap()
    }

    fn handler(store: Arc<CountingStore>, provider: Arc<RecordingProvider>) -> CheckoutHandler {
        CheckoutHandler::new(
            store,
            provider,
            Arc::new(CatalogPriceTable::builtin()),
            RedirectUrls::new("https://courses.example.com/").unwrap(),
        )
    }

    #[tokio::test]
    async fn test_checkout_prices_from_catalog() {
        let store = Arc::new(CountingStore::default());
        let provider = Arc::new(RecordingProvider::default());
        let handler = handler(store, provider.clone());

        let session = handler
            .checkout(Some(&user()), &[CartItem::new(4, 1), CartItem::new(5, 2)])
            .await
            .unwrap();
        assert_eq!(session.url, "https://checkout.stripe.com/c/pay/cs_test_123");

        let request = provider.last();
        assert_eq!(request.mode, SessionMode::Payment);
        assert_eq!(
            request.line_items,
            vec![
                LineItem {
                    name: "SAT Prep: Math and Reading".into(),
                    price_in_cents: 3000,
                    quantity: 1,
                },
                LineItem {
                    name: "Introduction to Public Speaking".into(),
                    price_in_cents: 4000,
                    quantity: 2,
                },
            ]
        );
        assert_eq!(request.user_id, user());
    }

    #[tokio::test]
    async fn test_unknown_course_dropped() {
        let store = Arc::new(CountingStore::default());
        let provider = Arc::new(RecordingProvider::default());
        let handler = handler(store, provider.clone());

        handler
            .checkout(Some(&user()), &[CartItem::new(2, 1), CartItem::new(99, 1)])
            .await
            .unwrap();

        let request = provider.last();
        assert_eq!(
            request.line_items,
            vec![LineItem {
                name: "Introduction to Creative Writing".into(),
                price_in_cents: 2000,
                quantity: 1,
            }]
        );
        // Only charged courses are fulfilled; the redirect echoes the whole cart
        assert_eq!(request.course_ids, vec![CourseId(2)]);
        assert_eq!(
            request.success_url,
            "https://courses.example.com/success?session_id={CHECKOUT_SESSION_ID}&course_id=[2,99]"
        );
        assert_eq!(request.cancel_url, "https://courses.example.com/cancel");
    }

    #[tokio::test]
    async fn test_already_purchased_blocks_session() {
        let store = Arc::new(CountingStore {
            inner: MemoryPurchaseStore::with_purchases([
                (user(), CourseId(3)),
                (user(), CourseId(5)),
            ]),
            ..CountingStore::default()
        });
        let provider = Arc::new(RecordingProvider::default());
        let handler = handler(store, provider.clone());

        let err = handler
            .checkout(
                Some(&user()),
                &[CartItem::new(5, 1), CartItem::new(2, 1), CartItem::new(3, 1)],
            )
            .await
            .unwrap_err();

        match err {
            CheckoutError::AlreadyPurchased { course_ids } => {
                assert_eq!(course_ids, vec![CourseId(5), CourseId(3)]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_all_unknown_is_no_valid_items() {
        let store = Arc::new(CountingStore::default());
        let provider = Arc::new(RecordingProvider::default());
        let handler = handler(store, provider.clone());

        let err = handler
            .checkout(Some(&user()), &[CartItem::new(98, 1), CartItem::new(99, 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::NoValidItems));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_cart_is_no_valid_items() {
        let store = Arc::new(CountingStore::default());
        let provider = Arc::new(RecordingProvider::default());
        let handler = handler(store, provider.clone());

        let err = handler.checkout(Some(&user()), &[]).await.unwrap_err();
        assert!(matches!(err, CheckoutError::NoValidItems));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_user_short_circuits() {
        let store = Arc::new(CountingStore::default());
        let provider = Arc::new(RecordingProvider::default());
        let handler = handler(store.clone(), provider.clone());

        let err = handler.checkout(None, &[CartItem::new(2, 1)]).await.unwrap_err();
        assert!(matches!(err, CheckoutError::Unauthenticated));
        assert_eq!(store.lookups.load(Ordering::SeqCst), 0);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_store_failure_surfaces_without_session() {
        let store = Arc::new(CountingStore {
            fail: true,
            ..CountingStore::default()
        });
        let provider = Arc::new(RecordingProvider::default());
        let handler = handler(store, provider.clone());

        let err = handler.checkout(Some(&user()), &[CartItem::new(2, 1)]).await.unwrap_err();
        assert!(matches!(err, CheckoutError::Store(_)));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_provider_failure_surfaces() {
        let store = Arc::new(CountingStore::default());
        let provider = Arc::new(RecordingProvider::failing());
        let handler = handler(store, provider.clone());

        let err = handler.checkout(Some(&user()), &[CartItem::new(2, 1)]).await.unwrap_err();
        assert!(matches!(err, CheckoutError::Provider(_)));
        assert_eq!(provider.calls(), 1);
    }

    #[test]
    fn test_zero_quantity_dropped_and_duplicates_kept() {
        let handler = handler(
            Arc::new(CountingStore::default()),
            Arc::new(RecordingProvider::default()),
        );
        let priced = handler.priced_items(&[
            CartItem::new(2, 0),
            CartItem::new(3, 1),
            CartItem::new(3, 1),
        ]);
        assert_eq!(priced.len(), 2);
        assert!(priced.iter().all(|(id, _)| *id == CourseId(3)));
        assert!(priced.iter().all(|(_, i)| i.name == "Exploring Physics for Beginners"));
    }

    #[test]
    fn test_blank_client_url_rejected() {
        assert!(RedirectUrls::new("  ").is_err());
    }
}
