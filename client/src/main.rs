//! Demo: browse the catalogue against a running marketplace API
//!
//! Reads configuration from the environment (and `.env`), loads categories
//! and the first page of products, logs what came back, then shuts down.
//!
//! ```text
//! MARKETPLACE_API_URL=http://localhost:8080/api cargo run --bin marketplace
//! ```

use marketplace_client::types::ProductQuery;
use marketplace_client::{ClientConfig, Marketplace, derived};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let config = ClientConfig::from_env()?;
    marketplace_client::telemetry::init(&config.log_level)?;

    let marketplace = Marketplace::from_config(&config)?;

    match marketplace.auth().restore_session().await {
        Ok(Some(user)) => tracing::info!(name = ?user.name, role = ?user.role(), "Restored session"),
        Ok(None) => tracing::info!("No saved session"),
        Err(failure) => tracing::warn!(%failure, "Could not restore session"),
    }

    match marketplace.categories().fetch_categories().await {
        Ok(categories) => {
            for category in &categories {
                tracing::info!(id = ?category.id, name = ?category.name, "Category");
            }
        },
        Err(failure) => tracing::error!(%failure, "Failed to fetch categories"),
    }

    let query = ProductQuery {
        page: Some(1),
        limit: Some(10),
        ..ProductQuery::default()
    };
    match marketplace.products().fetch_products(query).await {
        Ok(products) => {
            for product in &products {
                tracing::info!(id = ?product.id, name = ?product.name, price = ?product.price, "Product");
            }
        },
        Err(failure) => tracing::error!(%failure, "Failed to fetch products"),
    }

    let (products, banner) = marketplace
        .state(|s| (derived::dedupe_by_id(&s.product.products).len(), s.product.status.message.clone()))
        .await;
    tracing::info!(products, banner = %banner, "Catalogue loaded");

    marketplace.shutdown(config.request_timeout()).await?;
    Ok(())
}
