//! Host adapter: instance registry, lifecycle and the price-lookup service
//!
//! The host platform owns scheduling, storage and display. This layer owns
//! the explicit mapping from instance identifier (zip code) to coordinator,
//! the degraded-state bookkeeping the host reads instead of catching panics,
//! and the callable `get_prices_for_date` service.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use chrono_tz::Tz;

use crate::api::{OstromApiClient, PricingApi};
use crate::config::Config;
use crate::coordinator::{PriceCoordinator, Snapshot};
use crate::error::{ElektraError, FailureKind, RefreshFailed, Result};
use crate::logging::{StructuredLogger, get_logger};
use crate::metrics::DeviceInfo;
use crate::normalize::PriceEntry;

/// One configured credentials+zip instance
pub struct Integration {
    coordinator: PriceCoordinator,
    device: DeviceInfo,
    last_failure: Option<RefreshFailed>,
}

impl Integration {
    fn new(coordinator: PriceCoordinator) -> Self {
        let device = DeviceInfo::for_zip(coordinator.zip_code());
        Self {
            coordinator,
            device,
            last_failure: None,
        }
    }

    /// Whether the host should display this instance as live
    pub fn available(&self) -> bool {
        self.last_failure.is_none() && self.coordinator.latest().is_some()
    }

    /// Failure behind the current degraded state, if any
    pub fn last_failure(&self) -> Option<&RefreshFailed> {
        self.last_failure.as_ref()
    }

    /// Host-facing device identity
    pub fn device(&self) -> &DeviceInfo {
        &self.device
    }

    /// Latest complete snapshot; stale data stays readable while degraded
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.coordinator.latest()
    }

    /// Run one refresh cycle, updating the degraded-state bookkeeping
    pub async fn refresh(&mut self) -> std::result::Result<Arc<Snapshot>, RefreshFailed> {
        match self.coordinator.refresh().await {
            Ok(snapshot) => {
                self.last_failure = None;
                Ok(snapshot)
            }
            Err(failure) => {
                self.last_failure = Some(failure.clone());
                Err(failure)
            }
        }
    }
}

/// Outcome of a credential check, for host configuration forms
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupCheck {
    Ok,
    InvalidAuth(String),
    CannotConnect(String),
}

/// Explicit registry of integration instances, keyed by zip code
///
/// Replaces ambient host state: hosts hold the registry and pass it where
/// needed. Key order doubles as the "first instance" order for service calls
/// that omit the zip.
pub struct HostRegistry {
    instances: BTreeMap<String, Integration>,
    logger: StructuredLogger,
}

impl HostRegistry {
    pub fn new() -> Self {
        Self {
            instances: BTreeMap::new(),
            logger: get_logger("host"),
        }
    }

    /// Set up an instance from validated configuration
    ///
    /// Builds the long-lived HTTP client and runs the eager first refresh;
    /// a failed first refresh fails setup and registers nothing.
    pub async fn setup(&mut self, config: &Config) -> Result<String> {
        config.validate()?;
        let api = OstromApiClient::new(
            config.credentials.client_id.clone(),
            config.credentials.client_secret.clone(),
            &config.api,
        )?;
        self.setup_with_api(config.zip_code.clone(), config.tz()?, Arc::new(api))
            .await
    }

    /// Transport-explicit variant of [`Self::setup`]
    pub async fn setup_with_api(
        &mut self,
        zip_code: String,
        tz: Tz,
        api: Arc<dyn PricingApi>,
    ) -> Result<String> {
        if self.instances.contains_key(&zip_code) {
            return Err(ElektraError::config(format!(
                "Instance for zip {} already set up",
                zip_code
            )));
        }

        let mut integration = Integration::new(PriceCoordinator::new(zip_code.clone(), tz, api));
        integration.refresh().await.map_err(ElektraError::from)?;

        self.logger
            .info(&format!("Instance for zip {} set up", zip_code));
        self.instances.insert(zip_code.clone(), integration);
        Ok(zip_code)
    }

    /// Run one refresh cycle for the given instance
    pub async fn refresh(
        &mut self,
        zip_code: &str,
    ) -> std::result::Result<Arc<Snapshot>, RefreshFailed> {
        let instance = self.instances.get_mut(zip_code).ok_or_else(|| RefreshFailed {
            kind: FailureKind::Other,
            message: format!("No instance for zip {}", zip_code),
        })?;
        instance.refresh().await
    }

    /// Remove an instance, dropping its handle (and HTTP client) exactly once
    pub fn teardown(&mut self, zip_code: &str) -> Result<()> {
        match self.instances.remove(zip_code) {
            Some(_) => {
                self.logger
                    .info(&format!("Instance for zip {} torn down", zip_code));
                Ok(())
            }
            None => Err(ElektraError::not_found(format!(
                "No instance for zip {}",
                zip_code
            ))),
        }
    }

    /// Access an instance for metric reads
    pub fn get(&self, zip_code: &str) -> Option<&Integration> {
        self.instances.get(zip_code)
    }

    /// Registered instance ids, in key order
    pub fn instance_ids(&self) -> Vec<String> {
        self.instances.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Callable service: prices for a specific calendar date
    ///
    /// Selects the instance for the given zip (or the first registered one
    /// when omitted), triggers a refresh, then filters the latest snapshot's
    /// today-entries by the requested date. A refresh failure leaves stale
    /// data readable; only a missing instance, missing data, or an empty
    /// filter result is a NotFound error.
    pub async fn get_prices_for_date(
        &mut self,
        date: NaiveDate,
        zip_code: Option<&str>,
    ) -> Result<Vec<PriceEntry>> {
        let instance = match zip_code {
            Some(zip) => self.instances.get_mut(zip).ok_or_else(|| {
                ElektraError::not_found(format!("No instance for zip {}", zip))
            })?,
            None => self.instances.values_mut().next().ok_or_else(|| {
                ElektraError::not_found("No instance configured")
            })?,
        };

        // Refresh for freshness; degraded state is recorded either way, and
        // stale data remains usable when only this refresh failed
        if let Err(failure) = instance.refresh().await
            && instance.snapshot().is_none()
        {
            return Err(failure.into());
        }

        let snapshot = instance
            .snapshot()
            .ok_or_else(|| ElektraError::not_found("No price data available"))?;

        let entries: Vec<PriceEntry> = snapshot
            .prices_today
            .iter()
            .filter(|e| e.local_datetime.date_naive() == date)
            .cloned()
            .collect();

        if entries.is_empty() {
            return Err(ElektraError::not_found(format!(
                "No prices found for date {}",
                date
            )));
        }
        Ok(entries)
    }
}

impl Default for HostRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Credential check against a live transport, for configuration forms
///
/// Maps the failure taxonomy onto the two outcomes a form can act on:
/// rejected or malformed grants are an auth problem, transport failures are
/// a connectivity problem. Anything else propagates.
pub async fn validate_credentials(api: &dyn PricingApi) -> Result<SetupCheck> {
    match api.request_token().await {
        Ok(_) => Ok(SetupCheck::Ok),
        Err(err @ (ElektraError::Auth { .. } | ElektraError::Protocol { .. })) => {
            Ok(SetupCheck::InvalidAuth(err.to_string()))
        }
        Err(err @ (ElektraError::Connection { .. } | ElektraError::Timeout { .. })) => {
            Ok(SetupCheck::CannotConnect(err.to_string()))
        }
        Err(err) => Err(err),
    }
}

/// Build a short-lived client and check the configured credentials
///
/// The client is dropped before returning; setup later builds its own.
pub async fn validate_setup(config: &Config) -> Result<SetupCheck> {
    config.validate()?;
    let api = OstromApiClient::new(
        config.credentials.client_id.clone(),
        config.credentials.client_secret.clone(),
        &config.api,
    )?;
    validate_credentials(&api).await
}
