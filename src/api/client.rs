//! HTTP client for the Ostrom API
//!
//! [`PricingApi`] is the seam the token manager and coordinator talk through;
//! [`OstromApiClient`] is the reqwest-backed implementation owning the
//! long-lived connection pool. Envelope validation lives in plain functions
//! so the status/shape taxonomy is testable without a server.

use chrono::{DateTime, Utc};

use super::types::{RawPriceRecord, SpotPricesEnvelope, TokenGrant, TokenResponse};
use crate::config::ApiConfig;
use crate::error::{ElektraError, Result};
use crate::logging::{StructuredLogger, get_logger};

/// Per-call bound on upstream requests, seconds
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Wire format for the startDate/endDate query parameters (whole hours, UTC)
const WINDOW_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:00:00.000Z";

/// Upstream operations the integration depends on
#[async_trait::async_trait]
pub trait PricingApi: Send + Sync {
    /// Perform the OAuth2 client-credentials exchange
    async fn request_token(&self) -> Result<TokenGrant>;

    /// Fetch hourly spot prices for a UTC window
    async fn fetch_spot_prices(
        &self,
        access_token: &str,
        zip_code: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RawPriceRecord>>;
}

/// reqwest-backed Ostrom API client
pub struct OstromApiClient {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    auth_url: String,
    base_url: String,
    logger: StructuredLogger,
}

impl OstromApiClient {
    /// Create a new client; builds the HTTP pool once for the instance lifetime
    pub fn new(client_id: String, client_secret: String, api: &ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            client_id,
            client_secret,
            auth_url: api.auth_url.clone(),
            base_url: api.base_url.clone(),
            logger: get_logger("api"),
        })
    }
}

/// Format a window boundary for the startDate/endDate query parameters
pub fn format_window_timestamp(instant: DateTime<Utc>) -> String {
    instant.format(WINDOW_TIMESTAMP_FORMAT).to_string()
}

/// Validate a token-endpoint reply
///
/// The exchange answers 201 on success; any other status means the
/// credentials were rejected. A 201 whose body is missing required fields or
/// grants a non-Bearer token violates the documented shape.
pub fn parse_token_response(status: u16, body: &str) -> Result<TokenGrant> {
    if status != 201 {
        return Err(ElektraError::auth(format!(
            "Token endpoint returned status {}",
            status
        )));
    }

    let parsed: TokenResponse = serde_json::from_str(body)
        .map_err(|e| ElektraError::auth(format!("Malformed token response: {}", e)))?;

    let (Some(access_token), Some(token_type), Some(expires_in)) =
        (parsed.access_token, parsed.token_type, parsed.expires_in)
    else {
        return Err(ElektraError::protocol(
            "Token response missing access_token, token_type or expires_in",
        ));
    };

    if token_type != "Bearer" {
        return Err(ElektraError::protocol(format!(
            "Unexpected token type: {}",
            token_type
        )));
    }

    Ok(TokenGrant {
        access_token,
        expires_in,
    })
}

/// Validate a spot-price reply envelope
///
/// A successful envelope with an absent or empty record list is an empty
/// result, reported distinctly from transport failures.
pub fn parse_spot_prices_response(
    status: u16,
    body: &str,
    window: &str,
) -> Result<Vec<RawPriceRecord>> {
    if !(200..300).contains(&status) {
        return Err(ElektraError::connection(format!(
            "Price endpoint returned status {}",
            status
        )));
    }

    let envelope: SpotPricesEnvelope = serde_json::from_str(body)
        .map_err(|e| ElektraError::protocol(format!("Malformed price response: {}", e)))?;

    match envelope.data {
        Some(records) if !records.is_empty() => Ok(records),
        _ => Err(ElektraError::empty_result(format!(
            "No price data received for window {}",
            window
        ))),
    }
}

#[async_trait::async_trait]
impl PricingApi for OstromApiClient {
    async fn request_token(&self) -> Result<TokenGrant> {
        let response = self
            .client
            .post(&self.auth_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        parse_token_response(status, &body)
    }

    async fn fetch_spot_prices(
        &self,
        access_token: &str,
        zip_code: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RawPriceRecord>> {
        let url = format!("{}/spot-prices", self.base_url);
        let start_param = format_window_timestamp(start);
        let end_param = format_window_timestamp(end);
        self.logger.debug(&format!(
            "Fetching prices from {} to {} for zip {}",
            start_param, end_param, zip_code
        ));

        let response = self
            .client
            .get(&url)
            .bearer_auth(access_token)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[
                ("startDate", start_param.as_str()),
                ("endDate", end_param.as_str()),
                ("resolution", "HOUR"),
                ("zip", zip_code),
            ])
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        let window = format!("{}..{}", start_param, end_param);
        let records = parse_spot_prices_response(status, &body, &window)?;
        self.logger
            .debug(&format!("Received {} prices from API", records.len()));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn window_timestamps_are_whole_hours_utc() {
        let instant = Utc.with_ymd_and_hms(2024, 5, 3, 23, 0, 0).unwrap();
        assert_eq!(format_window_timestamp(instant), "2024-05-03T23:00:00.000Z");
    }

    #[test]
    fn token_parse_rejects_non_created_status() {
        let err = parse_token_response(200, "{}").unwrap_err();
        assert!(matches!(err, ElektraError::Auth { .. }));
    }
}
