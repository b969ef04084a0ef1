//! Wire types for the Ostrom API

use serde::Deserialize;

/// Validated result of a client-credentials exchange
#[derive(Debug, Clone)]
pub struct TokenGrant {
    pub access_token: String,
    pub expires_in: u64,
}

/// Raw token-endpoint payload prior to validation
///
/// All fields optional so field presence can be checked explicitly instead of
/// failing deserialization wholesale.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub token_type: Option<String>,
    pub expires_in: Option<u64>,
}

/// One hourly spot-price record as returned by the API
///
/// Every field is optional at the wire level; the normalizer decides which
/// absences disqualify a record.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPriceRecord {
    /// Slot start as a UTC timestamp string
    pub date: Option<String>,

    /// Gross price in EUR/kWh (taxes and levies included)
    pub gross_kwh_price: Option<f64>,

    /// Net price in EUR/kWh
    pub net_kwh_price: Option<f64>,

    /// Net price in EUR/MWh
    pub net_mwh_price: Option<f64>,

    /// Net taxes and levies in EUR/kWh
    pub net_kwh_tax_and_levies: Option<f64>,

    /// Gross taxes and levies in EUR/kWh
    pub gross_kwh_tax_and_levies: Option<f64>,

    /// Monthly base fee in EUR, constant across a fetch window
    #[serde(rename = "grossMonthlyOstromBaseFee")]
    pub gross_monthly_base_fee: Option<f64>,

    /// Monthly grid fee in EUR, constant across a fetch window
    #[serde(rename = "grossMonthlyGridFees")]
    pub gross_monthly_grid_fees: Option<f64>,
}

/// Envelope wrapping the spot-price record list
#[derive(Debug, Deserialize)]
pub struct SpotPricesEnvelope {
    pub data: Option<Vec<RawPriceRecord>>,
}
