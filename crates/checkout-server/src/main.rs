//! course-checkout HTTP Server
//!
//! Axum-based server exposing the course checkout endpoint and the Stripe
//! webhook that records purchases.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use checkout_core::{
    CatalogPriceTable, CheckoutHandler, MemoryPurchaseStore, PurchaseRecordStore, RedirectUrls,
};
use checkout_payments::StripeClient;
use checkout_server::{AppState, config::ServerConfig, router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;

    // Catalog
    let catalog = match &config.catalog_path {
        Some(path) => CatalogPriceTable::from_path(path)
            .with_context(|| format!("loading catalog from {}", path.display()))?,
        None => CatalogPriceTable::builtin(),
    };
    tracing::info!("Loaded {} catalog entries:", catalog.len());
    for entry in catalog.entries() {
        tracing::info!("  • {} {} ({} cents)", entry.course_id, entry.name, entry.price_in_cents);
    }

    // Purchase records
    let store = open_store(&config).await?;

    // Payments
    let stripe = StripeClient::from_env()?;
    let webhook_secret = stripe.webhook_secret().map(Arc::from);
    if webhook_secret.is_none() {
        tracing::warn!("⚠ STRIPE_WEBHOOK_SECRET not set - purchases will not be recorded");
    }

    if config.trust_user_id_header {
        tracing::warn!("⚠ Trusting x-user-id header - serve only behind an auth gateway");
    }

    let checkout = CheckoutHandler::new(
        store.clone(),
        Arc::new(stripe),
        Arc::new(catalog),
        RedirectUrls::new(config.client_url.clone())?,
    );

    let state = AppState {
        checkout: Arc::new(checkout),
        store,
        webhook_secret,
        trust_user_id_header: config.trust_user_id_header,
    };

    let app = router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("course-checkout server running on http://{}", config.bind_addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                       - Health check");
    tracing::info!("  POST /api/create-checkout-session  - Create Stripe checkout");
    tracing::info!("  POST /webhook/stripe               - Stripe webhook");

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(feature = "mysql")]
async fn open_store(config: &ServerConfig) -> anyhow::Result<Arc<dyn PurchaseRecordStore>> {
    if let Some(url) = &config.database_url {
        let store = checkout_core::store::MySqlPurchaseStore::connect(url)
            .await
            .context("connecting to purchase database")?;
        tracing::info!("✓ Connected to MySQL purchase records");
        return Ok(Arc::new(store));
    }
    Ok(memory_store())
}

#[cfg(not(feature = "mysql"))]
#[allow(clippy::unused_async)]
async fn open_store(_config: &ServerConfig) -> anyhow::Result<Arc<dyn PurchaseRecordStore>> {
    Ok(memory_store())
}

fn memory_store() -> Arc<dyn PurchaseRecordStore> {
    tracing::warn!("⚠ DATABASE_URL not set - using in-memory purchase records");
    Arc::new(MemoryPurchaseStore::new())
}
