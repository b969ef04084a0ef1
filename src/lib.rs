//! # Elektra - Ostrom dynamic electricity pricing integration
//!
//! A Rust integration that polls the Ostrom electricity-pricing REST API,
//! manages the OAuth2 client-credentials token lifecycle, and exposes derived
//! price and fee metrics to a home automation host. The host owns scheduling,
//! storage and display; this crate owns the refresh cycle and the failure
//! taxonomy it reports.
//!
//! ## Architecture
//!
//! The crate follows a modular architecture with clear separation of concerns:
//!
//! - `config`: Configuration management and validation
//! - `logging`: Structured logging and tracing
//! - `error`: Error taxonomy and the coordinator's failure boundary
//! - `api`: Ostrom API client, wire types and token lifecycle
//! - `normalize`: Timezone normalization of raw price records
//! - `coordinator`: The refresh cycle producing immutable snapshots
//! - `metrics`: Metric catalog and device identity for the host
//! - `host`: Instance registry, lifecycle operations and the price service

pub mod api;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod host;
pub mod logging;
pub mod metrics;
pub mod normalize;

// Re-export commonly used types
pub use config::Config;
pub use coordinator::{PriceCoordinator, Snapshot};
pub use error::{ElektraError, FailureKind, RefreshFailed, Result};
pub use host::HostRegistry;
