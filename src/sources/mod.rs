//! Exchange rate sources
//!
//! - ExchangeRate-API: live rates over HTTP
//! - In-memory: fixed rate tables for offline runs and tests

pub mod exchange_rate_api;
pub mod in_memory;

pub use exchange_rate_api::ExchangeRateApiClient;
pub use in_memory::InMemoryRateSource;

use crate::currency::{CurrencyCode, RateSnapshot};
use crate::error::Result;
use std::collections::BTreeSet;
use std::future::Future;

/// Trait for exchange rate sources
///
/// Both calls fail with `DashboardError::SourceUnavailable` when the
/// service cannot be reached or answers with anything but a usable payload.
/// Nothing is retried.
pub trait RateSource: Send + Sync {
    /// Enumerate every currency code the source can price
    fn supported_currencies(&self) -> impl Future<Output = Result<BTreeSet<CurrencyCode>>> + Send;

    /// Fetch the latest rates quoted against `base`
    fn latest_rates(&self, base: &CurrencyCode) -> impl Future<Output = Result<RateSnapshot>> + Send;

    /// Get the source name
    fn name(&self) -> &str;
}
