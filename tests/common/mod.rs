//! Shared test fixtures: a scripted stand-in for the live Ostrom API

// Not every test binary uses every fixture
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Duration, TimeZone, Utc};
use chrono_tz::Tz;
use elektra::api::{PricingApi, RawPriceRecord, TokenGrant};
use elektra::error::{ElektraError, Result};

/// Scripted [`PricingApi`] implementation
///
/// Each call pops the next scripted response; an unscripted call fails
/// loudly so tests cannot silently over-consume.
#[derive(Default)]
pub struct ScriptedApi {
    pub token_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
    token_responses: Mutex<VecDeque<Result<TokenGrant>>>,
    fetch_responses: Mutex<VecDeque<Result<Vec<RawPriceRecord>>>>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_token(&self, response: Result<TokenGrant>) {
        self.token_responses
            .lock()
            .unwrap()
            .push_back(response);
    }

    pub fn push_fetch(&self, response: Result<Vec<RawPriceRecord>>) {
        self.fetch_responses
            .lock()
            .unwrap()
            .push_back(response);
    }

    pub fn token_calls(&self) -> usize {
        self.token_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl PricingApi for ScriptedApi {
    async fn request_token(&self) -> Result<TokenGrant> {
        self.token_calls.fetch_add(1, Ordering::SeqCst);
        self.token_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ElektraError::generic("unscripted token call")))
    }

    async fn fetch_spot_prices(
        &self,
        _access_token: &str,
        _zip_code: &str,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<Vec<RawPriceRecord>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.fetch_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ElektraError::generic("unscripted fetch call")))
    }
}

/// A grant with the given lifetime
pub fn grant(expires_in: u64) -> TokenGrant {
    TokenGrant {
        access_token: "test-access-token".to_string(),
        expires_in,
    }
}

/// One fully populated hourly record at a whole-hour UTC instant
pub fn record_at(instant: DateTime<Utc>, price: f64) -> RawPriceRecord {
    RawPriceRecord {
        date: Some(instant.format("%Y-%m-%dT%H:00:00.000Z").to_string()),
        gross_kwh_price: Some(price),
        net_kwh_price: Some(price / 1.19),
        net_mwh_price: Some(price / 1.19 * 1000.0),
        net_kwh_tax_and_levies: Some(0.05),
        gross_kwh_tax_and_levies: Some(0.06),
        gross_monthly_base_fee: Some(5.0),
        gross_monthly_grid_fees: Some(4.0),
    }
}

/// Hourly records spanning yesterday through tomorrow around `now` in `tz`
///
/// Broad coverage keeps wall-clock tests insensitive to the test process
/// crossing an hour (or even day) boundary mid-run.
pub fn three_day_records(now: DateTime<Utc>, tz: Tz, price: f64) -> Vec<RawPriceRecord> {
    let today = now.with_timezone(&tz).date_naive();
    let mut records = Vec::new();
    for day_offset in -1..=1 {
        let date = today + Duration::days(day_offset);
        for hour in 0..24 {
            let naive = date.and_hms_opt(hour, 0, 0).unwrap();
            let Some(local) = tz.from_local_datetime(&naive).earliest() else {
                // Hour skipped by a DST transition
                continue;
            };
            records.push(record_at(local.with_timezone(&Utc), price));
        }
    }
    records
}
