//! Currency codes and rate snapshots

use crate::error::{DashboardError, Result};
use chrono::{DateTime, Utc};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// ISO 4217 style currency code (three uppercase ASCII letters)
///
/// The set of codes is open: whatever the rate source prices is a valid
/// code, so this is a validated string rather than an enum.
///
/// # Example
/// ```
/// use currency_dashboard::currency::CurrencyCode;
///
/// let eur: CurrencyCode = "eur".parse().unwrap();
/// assert_eq!(eur.as_str(), "EUR");
/// assert!("EURO".parse::<CurrencyCode>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Parse and normalise a currency code
    pub fn new(code: &str) -> Result<Self> {
        let trimmed = code.trim();
        if trimmed.len() != 3 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(DashboardError::InvalidCurrency(code.to_string()));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// Get currency code as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CurrencyCode {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = DashboardError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl AsRef<str> for CurrencyCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rates for one base currency at one point in time
///
/// `rates[X]` is the amount of `X` bought by one unit of `base`.
#[derive(Debug, Clone)]
pub struct RateSnapshot {
    pub base: CurrencyCode,
    pub retrieved_at: DateTime<Utc>,
    rates: HashMap<CurrencyCode, f64>,
}

impl RateSnapshot {
    /// Create a snapshot retrieved now
    pub fn new(base: CurrencyCode, rates: HashMap<CurrencyCode, f64>) -> Self {
        Self::at(base, Utc::now(), rates)
    }

    /// Create a snapshot with an explicit retrieval time
    pub fn at(
        base: CurrencyCode,
        retrieved_at: DateTime<Utc>,
        rates: HashMap<CurrencyCode, f64>,
    ) -> Self {
        Self {
            base,
            retrieved_at,
            rates,
        }
    }

    /// Raw rate as reported by the source
    pub fn get(&self, code: &CurrencyCode) -> Option<f64> {
        self.rates.get(code).copied()
    }

    /// Rate usable for display and logging
    ///
    /// Absent, zero, negative and non-finite rates are all rejected.
    pub fn valid_rate(&self, code: &CurrencyCode) -> Option<f64> {
        self.get(code).filter(|rate| rate.is_finite() && *rate > 0.0)
    }

    /// All priced codes, sorted
    pub fn codes(&self) -> BTreeSet<CurrencyCode> {
        self.rates.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

/// Display line for one rate: `1 USD = 0.92 EUR`
pub fn format_rate_line(base: &CurrencyCode, target: &CurrencyCode, rate: f64) -> String {
    format!("1 {} = {:.2} {}", base, rate, target)
}
