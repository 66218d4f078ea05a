//! Errors raised while assembling a [`Marketplace`](crate::Marketplace)
//!
//! Request outcomes never surface here; they settle into
//! [`Failure`](marketplace_core::http::Failure) values instead.

use crate::config::ConfigError;
use marketplace_core::environment::SessionError;
use marketplace_core::http::ApiError;
use thiserror::Error;

/// Setup errors
#[derive(Error, Debug)]
pub enum MarketplaceError {
    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The session file could not be opened
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// The HTTP client could not be built
    #[error("API client error: {0}")]
    Api(#[from] ApiError),
}

/// Result alias for setup operations
pub type Result<T> = std::result::Result<T, MarketplaceError>;
