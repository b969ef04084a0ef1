//! Timezone normalization of raw price records
//!
//! Converts the API's UTC-stamped hourly records into a date-filtered,
//! time-sorted series in the configured local timezone. One malformed record
//! is skipped with a warning; it never fails the batch.

use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use serde::Serialize;

use crate::api::RawPriceRecord;
use crate::logging::get_logger;

/// One hourly price entry in the configured local timezone
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceEntry {
    /// Hour-slot start in the configured local timezone
    pub local_datetime: DateTime<Tz>,

    /// Gross price in EUR/kWh
    pub price: f64,

    /// Net price in EUR/kWh
    pub net_price: f64,

    /// Net price in EUR/MWh
    pub net_mwh_price: f64,

    /// Net taxes and levies in EUR/kWh
    pub net_tax_and_levies: f64,

    /// Gross taxes and levies in EUR/kWh
    pub gross_tax_and_levies: f64,
}

/// Project raw records onto one local calendar day
///
/// Keeps only records whose local date equals `target_date`, renames fields
/// into the [`PriceEntry`] shape, and returns the set sorted ascending by
/// local time (stable, so equal timestamps keep input order). Deterministic
/// for a given input list and target date.
pub fn normalize(records: &[RawPriceRecord], target_date: NaiveDate, tz: Tz) -> Vec<PriceEntry> {
    let logger = get_logger("normalize");
    let mut entries = Vec::with_capacity(records.len());

    for record in records {
        match project(record, target_date, tz) {
            Ok(Some(entry)) => entries.push(entry),
            // Different calendar day; not this batch's concern
            Ok(None) => {}
            Err(reason) => logger.warn(&format!("Skipping price record: {}", reason)),
        }
    }

    entries.sort_by(|a, b| a.local_datetime.cmp(&b.local_datetime));
    entries
}

fn project(
    record: &RawPriceRecord,
    target_date: NaiveDate,
    tz: Tz,
) -> std::result::Result<Option<PriceEntry>, String> {
    let Some(date) = record.date.as_deref() else {
        return Err("missing date field".to_string());
    };

    let utc = DateTime::parse_from_rfc3339(date)
        .map_err(|e| format!("unparseable timestamp {:?}: {}", date, e))?;
    let local = utc.with_timezone(&tz);

    if local.date_naive() != target_date {
        return Ok(None);
    }

    let (Some(price), Some(net_price), Some(net_mwh_price), Some(net_tax), Some(gross_tax)) = (
        record.gross_kwh_price,
        record.net_kwh_price,
        record.net_mwh_price,
        record.net_kwh_tax_and_levies,
        record.gross_kwh_tax_and_levies,
    ) else {
        return Err(format!("record at {} missing required price fields", date));
    };

    Ok(Some(PriceEntry {
        local_datetime: local,
        price,
        net_price,
        net_mwh_price,
        net_tax_and_levies: net_tax,
        gross_tax_and_levies: gross_tax,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use chrono_tz::Europe::Berlin;

    fn record(date: &str, price: f64) -> RawPriceRecord {
        RawPriceRecord {
            date: Some(date.to_string()),
            gross_kwh_price: Some(price),
            net_kwh_price: Some(price / 1.19),
            net_mwh_price: Some(price / 1.19 * 1000.0),
            net_kwh_tax_and_levies: Some(0.05),
            gross_kwh_tax_and_levies: Some(0.06),
            ..RawPriceRecord::default()
        }
    }

    #[test]
    fn converts_utc_midnight_crossing_into_local_day() {
        // 23:00Z on the 3rd is 01:00 on the 4th in Berlin (CEST)
        let records = vec![record("2024-05-03T23:00:00.000Z", 0.31)];
        let target = NaiveDate::from_ymd_opt(2024, 5, 4).unwrap();
        let entries = normalize(&records, target, Berlin);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].local_datetime.to_rfc3339(), "2024-05-04T01:00:00+02:00");
    }

    #[test]
    fn drops_record_without_timestamp() {
        let mut broken = record("2024-05-04T10:00:00.000Z", 0.30);
        broken.date = None;
        let target = NaiveDate::from_ymd_opt(2024, 5, 4).unwrap();
        let entries = normalize(&[broken, record("2024-05-04T11:00:00.000Z", 0.32)], target, Berlin);
        assert_eq!(entries.len(), 1);
        assert!((entries[0].price - 0.32).abs() < f64::EPSILON);
    }
}
