//! Core types and constants

use crate::currency::CurrencyCode;
use crate::error::{DashboardError, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Wall-clock timestamp of an observation (no zone is stored in the log)
pub type Timestamp = NaiveDateTime;

/// Exchange rate type
pub type Rate = f64;

/// Format of the `Timestamp` column
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Header row of the observation log, in column order
pub const LOG_HEADER: [&str; 4] = ["Timestamp", "Base", "Currency", "Rate"];

/// One logged exchange rate observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    pub timestamp: Timestamp,
    pub base: CurrencyCode,
    pub currency: CurrencyCode,
    pub rate: Rate,
}

impl ObservationRecord {
    /// Create a new observation
    pub fn new(timestamp: Timestamp, base: CurrencyCode, currency: CurrencyCode, rate: Rate) -> Self {
        Self {
            timestamp,
            base,
            currency,
            rate,
        }
    }

    /// Row cells in `LOG_HEADER` order
    pub fn to_row(&self) -> Vec<String> {
        vec![
            format_timestamp(&self.timestamp),
            self.base.to_string(),
            self.currency.to_string(),
            self.rate.to_string(),
        ]
    }

    /// Whether this observation belongs to the given pair
    pub fn is_pair(&self, base: &CurrencyCode, currency: &CurrencyCode) -> bool {
        &self.base == base && &self.currency == currency
    }
}

/// Render a timestamp the way the log stores it
pub fn format_timestamp(ts: &Timestamp) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a stored timestamp
///
/// Accepts the log format, the same with fractional seconds or a `T`
/// separator, and RFC 3339 (converted to its naive UTC value).
pub fn parse_timestamp(s: &str) -> Result<Timestamp> {
    let s = s.trim();
    for fmt in [
        TIMESTAMP_FORMAT,
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
    ] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(ts);
        }
    }
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.naive_utc())
        .map_err(|e| DashboardError::SheetError(format!("Invalid timestamp '{}': {}", s, e)))
}
