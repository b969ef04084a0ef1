//! OAuth2 token lifecycle management

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use super::client::PricingApi;
use crate::error::Result;
use crate::logging::{StructuredLogger, get_logger};

/// Safety margin subtracted from the server-declared expiry to absorb clock
/// skew and in-flight request latency, seconds
pub const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

/// Bearer token with its margin-adjusted local expiry
///
/// Replaced wholesale on renewal, never mutated in place.
#[derive(Debug, Clone)]
pub struct Token {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl Token {
    /// A token is valid strictly before its expiry instant
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Owns the held token; the single writer across refresh cycles
pub struct TokenManager {
    api: Arc<dyn PricingApi>,
    current: Option<Token>,
    logger: StructuredLogger,
}

impl TokenManager {
    pub fn new(api: Arc<dyn PricingApi>) -> Self {
        Self {
            api,
            current: None,
            logger: get_logger("token"),
        }
    }

    /// Return a valid token, exchanging credentials only when the held one
    /// is absent or expired
    ///
    /// Safe to call every refresh cycle: a still-valid token short-circuits
    /// without any network traffic.
    pub async fn ensure_valid_token(&mut self) -> Result<Token> {
        self.ensure_valid_token_at(Utc::now()).await
    }

    /// Clock-explicit variant of [`Self::ensure_valid_token`]
    pub async fn ensure_valid_token_at(&mut self, now: DateTime<Utc>) -> Result<Token> {
        if let Some(token) = &self.current
            && token.is_valid_at(now)
        {
            return Ok(token.clone());
        }

        let grant = self.api.request_token().await?;
        let usable_secs = grant.expires_in as i64 - TOKEN_EXPIRY_MARGIN_SECS;
        let token = Token {
            access_token: grant.access_token,
            expires_at: now + Duration::seconds(usable_secs),
        };
        self.logger.debug(&format!(
            "Obtained new access token, usable for {} seconds",
            usable_secs
        ));
        self.current = Some(token.clone());
        Ok(token)
    }

    /// Currently held token, if any
    pub fn current(&self) -> Option<&Token> {
        self.current.as_ref()
    }
}
