//! # Marketplace Client
//!
//! Async state layer of a two-sided (buyer/seller) marketplace client.
//!
//! All business logic lives behind a remote HTTP API. This crate owns the
//! presentation state: eight resource slices (auth, cart, category, order,
//! payment, product, review, user) combined into one store, the
//! reqwest-backed HTTP wrapper that performs their requests, session
//! persistence, and a typed facade views call into.
//!
//! ## Example
//!
//! ```ignore
//! use marketplace_client::{ClientConfig, Marketplace};
//! use marketplace_client::types::Credentials;
//!
//! let config = ClientConfig::from_env()?;
//! let marketplace = Marketplace::from_config(&config)?;
//!
//! let user = marketplace
//!     .auth()
//!     .sign_in(Credentials { email: "ada@example.com".into(), password: "secret".into() })
//!     .await?;
//!
//! marketplace.cart().fetch_cart().await?;
//! let total = marketplace.state(|s| derived::cart_total(&s.cart.cart)).await;
//! ```

pub mod config;
pub mod derived;
pub mod environment;
pub mod error;
pub mod facade;
pub mod guard;
pub mod http;
pub mod root;
pub mod session;
pub mod slices;
pub mod telemetry;
pub mod types;

pub use config::ClientConfig;
pub use environment::MarketplaceEnvironment;
pub use error::MarketplaceError;
pub use facade::{Marketplace, MarketplaceStore};
pub use http::HttpClient;
pub use marketplace_core::http::Failure;
pub use root::{MarketplaceAction, MarketplaceReducer, MarketplaceState};
pub use session::FileSessionStorage;
