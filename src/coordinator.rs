//! Refresh coordination for the Ostrom price feed
//!
//! One refresh cycle: ensure the bearer token is valid, fetch two overlapping
//! date windows of hourly prices, normalize each onto its target calendar
//! day, reconcile the current and next hour against the series, derive the
//! aggregates, and publish the result as an immutable [`Snapshot`]. Every
//! failure is translated into a single [`RefreshFailed`] for the host.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::api::{PricingApi, RawPriceRecord, TokenManager};
use crate::error::{ElektraError, RefreshFailed, Result};
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use crate::metrics::ATTRIBUTION;
use crate::normalize::{PriceEntry, normalize};

/// Complete output of one refresh cycle
///
/// Immutable once produced; the coordinator replaces its retained snapshot
/// wholesale so consumers only ever observe a complete cycle.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    /// UTC instant the cycle completed
    pub fetched_at: DateTime<Utc>,

    /// Gross price for the current hour, EUR/kWh
    pub current_price: f64,

    /// Gross price for the next hour; absent while tomorrow is unpublished
    pub next_hour_price: Option<f64>,

    /// Cheapest gross price of today's series, EUR/kWh
    pub lowest_price_today: f64,

    /// Most expensive gross price of today's series, EUR/kWh
    pub highest_price_today: f64,

    /// Monthly base fee, EUR
    pub base_fee: f64,

    /// Monthly grid fee, EUR
    pub grid_fee: f64,

    /// Today's hourly entries, ascending by local time
    pub prices_today: Vec<PriceEntry>,

    /// Tomorrow's hourly entries, ascending by local time (may be empty)
    pub prices_tomorrow: Vec<PriceEntry>,

    /// Upstream attribution string
    pub attribution: &'static str,
}

/// Orchestrates token manager, fetcher and normalizer into snapshots
pub struct PriceCoordinator {
    zip_code: String,
    tz: Tz,
    api: Arc<dyn PricingApi>,
    tokens: TokenManager,
    latest: Option<Arc<Snapshot>>,
    logger: StructuredLogger,
}

impl PriceCoordinator {
    /// Create a coordinator for one credentials+zip instance
    pub fn new(zip_code: String, tz: Tz, api: Arc<dyn PricingApi>) -> Self {
        let logger = get_logger_with_context(
            LogContext::new("coordinator").with_instance(zip_code.clone()),
        );
        Self {
            tokens: TokenManager::new(api.clone()),
            api,
            zip_code,
            tz,
            latest: None,
            logger,
        }
    }

    /// Postal code this instance is scoped to
    pub fn zip_code(&self) -> &str {
        &self.zip_code
    }

    /// Configured local timezone
    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Latest complete snapshot, if any cycle has succeeded
    pub fn latest(&self) -> Option<Arc<Snapshot>> {
        self.latest.clone()
    }

    /// Run one refresh cycle anchored on the wall clock
    pub async fn refresh(&mut self) -> std::result::Result<Arc<Snapshot>, RefreshFailed> {
        self.refresh_at(Utc::now()).await
    }

    /// Clock-explicit variant of [`Self::refresh`]
    pub async fn refresh_at(
        &mut self,
        now: DateTime<Utc>,
    ) -> std::result::Result<Arc<Snapshot>, RefreshFailed> {
        match self.run_cycle(now).await {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                self.latest = Some(Arc::clone(&snapshot));
                Ok(snapshot)
            }
            Err(err) => {
                let failure = RefreshFailed::from(err);
                self.logger.error(&failure.to_string());
                Err(failure)
            }
        }
    }

    async fn run_cycle(&mut self, now: DateTime<Utc>) -> Result<Snapshot> {
        let token = self.tokens.ensure_valid_token_at(now).await?;

        let now_local = now.with_timezone(&self.tz);
        let today = now_local.date_naive();
        let tomorrow = today + Duration::days(1);

        // Window A: start of yesterday to start of tomorrow. Over-fetching a
        // day on each side keeps today complete across timezone boundaries.
        let a_start = start_of_day(self.tz, today - Duration::days(1));
        let a_end = start_of_day(self.tz, tomorrow);

        // Window B: start of today to start of the day after tomorrow.
        // Tomorrow's series may not be published yet.
        let b_start = start_of_day(self.tz, today);
        let b_end = start_of_day(self.tz, today + Duration::days(2));

        let raw_today = self
            .api
            .fetch_spot_prices(&token.access_token, &self.zip_code, a_start, a_end)
            .await?;
        let raw_tomorrow = self
            .api
            .fetch_spot_prices(&token.access_token, &self.zip_code, b_start, b_end)
            .await?;

        let today_entries = normalize(&raw_today, today, self.tz);
        let tomorrow_entries = normalize(&raw_tomorrow, tomorrow, self.tz);

        if today_entries.is_empty() {
            return Err(ElektraError::empty_result(format!(
                "No valid price data found for {}",
                today
            )));
        }

        // Exact-match lookups only; a nearest-neighbor fallback would mask
        // series gaps and timezone misconfiguration.
        let current_hour = truncate_to_hour(now_local.naive_local());
        let next_hour = current_hour + Duration::hours(1);

        let current = today_entries
            .iter()
            .find(|e| e.local_datetime.naive_local() == current_hour)
            .ok_or_else(|| {
                ElektraError::missing_current_hour(format!(
                    "No entry for {} in today's series",
                    current_hour
                ))
            })?;

        let next = today_entries
            .iter()
            .chain(tomorrow_entries.iter())
            .find(|e| e.local_datetime.naive_local() == next_hour);
        if next.is_none() {
            self.logger
                .debug(&format!("No entry for next hour {} yet", next_hour));
        }

        let mut lowest = f64::INFINITY;
        let mut highest = f64::NEG_INFINITY;
        for entry in &today_entries {
            lowest = lowest.min(entry.price);
            highest = highest.max(entry.price);
        }

        let (base_fee, grid_fee) = monthly_fees(&raw_today)?;

        let snapshot = Snapshot {
            fetched_at: now,
            current_price: current.price,
            next_hour_price: next.map(|e| e.price),
            lowest_price_today: lowest,
            highest_price_today: highest,
            base_fee,
            grid_fee,
            prices_today: today_entries,
            prices_tomorrow: tomorrow_entries,
            attribution: ATTRIBUTION,
        };

        self.logger.debug(&format!(
            "Refresh complete: current={:.4} next={} low={:.4} high={:.4} today={} tomorrow={}",
            snapshot.current_price,
            snapshot
                .next_hour_price
                .map_or_else(|| "n/a".to_string(), |p| format!("{:.4}", p)),
            snapshot.lowest_price_today,
            snapshot.highest_price_today,
            snapshot.prices_today.len(),
            snapshot.prices_tomorrow.len(),
        ));

        Ok(snapshot)
    }
}

/// UTC instant of local midnight for the given date
fn start_of_day(tz: Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    // A DST gap can skip local midnight; the hour after always exists.
    // Ambiguous midnights take the earliest instant so windows err toward
    // covering more.
    let local = tz.from_local_datetime(&midnight).earliest().or_else(|| {
        tz.from_local_datetime(&(midnight + Duration::hours(1)))
            .earliest()
    });
    match local {
        Some(dt) => dt.with_timezone(&Utc),
        None => Utc.from_utc_datetime(&midnight),
    }
}

/// Truncate a local time to the start of its hour
fn truncate_to_hour(local: NaiveDateTime) -> NaiveDateTime {
    local.date().and_time(NaiveTime::MIN) + Duration::hours(i64::from(local.hour()))
}

/// Monthly fees from the first record of a window; constant across a fetch
fn monthly_fees(records: &[RawPriceRecord]) -> Result<(f64, f64)> {
    let first = records
        .first()
        .ok_or_else(|| ElektraError::empty_result("No price data received"))?;
    match (first.gross_monthly_base_fee, first.gross_monthly_grid_fees) {
        (Some(base), Some(grid)) => Ok((base, grid)),
        _ => Err(ElektraError::protocol(
            "First price record missing monthly fee fields",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Europe::Berlin;

    #[test]
    fn truncation_keeps_date_and_hour() {
        let local = NaiveDate::from_ymd_opt(2024, 5, 4)
            .unwrap()
            .and_hms_opt(13, 47, 12)
            .unwrap();
        let truncated = truncate_to_hour(local);
        assert_eq!(
            truncated,
            NaiveDate::from_ymd_opt(2024, 5, 4)
                .unwrap()
                .and_hms_opt(13, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn fees_require_both_fields() {
        let record = RawPriceRecord {
            date: Some("2024-05-04T10:00:00.000Z".to_string()),
            gross_monthly_base_fee: Some(5.0),
            ..RawPriceRecord::default()
        };
        assert!(monthly_fees(&[record]).is_err());

        let record = RawPriceRecord {
            gross_monthly_base_fee: Some(5.0),
            gross_monthly_grid_fees: Some(4.0),
            ..RawPriceRecord::default()
        };
        let (base, grid) = monthly_fees(&[record]).unwrap();
        assert!((base - 5.0).abs() < f64::EPSILON);
        assert!((grid - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn start_of_day_is_local_midnight_in_utc() {
        // CEST on 2024-07-10: local midnight is 22:00Z the day before
        let date = NaiveDate::from_ymd_opt(2024, 7, 10).unwrap();
        assert_eq!(
            start_of_day(Berlin, date),
            Utc.with_ymd_and_hms(2024, 7, 9, 22, 0, 0).unwrap()
        );
        // CET in January: 23:00Z the day before
        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        assert_eq!(
            start_of_day(Berlin, date),
            Utc.with_ymd_and_hms(2024, 1, 9, 23, 0, 0).unwrap()
        );
    }
}
