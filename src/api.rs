//! Ostrom API integration: token lifecycle and spot-price retrieval
//!
//! This module is split across smaller files: wire types, the HTTP client
//! behind the [`client::PricingApi`] seam, and the token manager.

pub mod client;
pub mod token;
pub mod types;

// Re-exports for the public API surface
pub use client::{OstromApiClient, PricingApi, parse_spot_prices_response, parse_token_response};
pub use token::{TOKEN_EXPIRY_MARGIN_SECS, Token, TokenManager};
pub use types::{RawPriceRecord, TokenGrant};
