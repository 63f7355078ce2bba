//! # checkout-core
//!
//! Course checkout: purchase validation and line-item construction with the
//! purchase database and payment provider injected as collaborators.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         CheckoutHandler                          │
//! │  ┌─────────────────────┐  ┌────────────┐  ┌────────────────────┐ │
//! │  │ PurchaseRecordStore │  │  Catalog   │  │   PaymentSession   │ │
//! │  │     (Strategy)      │──│ PriceTable │──│ Provider (Strategy)│ │
//! │  └─────────────────────┘  └────────────┘  └────────────────────┘ │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The store and provider traits let the handler run against MySQL and
//! Stripe in production, and against in-memory doubles in tests.

pub mod catalog;
pub mod error;
pub mod handler;
pub mod model;
pub mod provider;
pub mod store;

pub use catalog::{CatalogEntry, CatalogPriceTable};
pub use error::{CheckoutError, Result};
pub use handler::{CheckoutHandler, RedirectUrls};
pub use model::{CartItem, CourseId, LineItem, UserId};
pub use provider::{PaymentSession, PaymentSessionProvider, SessionMode, SessionRequest};
pub use store::{MemoryPurchaseStore, PurchaseRecordStore};
