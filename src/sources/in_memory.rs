//! In-memory rate source
//!
//! Serves fixed rate tables keyed by base currency. Used by `--offline`
//! runs and by tests that need a deterministic source.

use super::RateSource;
use crate::currency::{CurrencyCode, RateSnapshot};
use crate::error::{DashboardError, Result};
use hashbrown::HashMap;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Fixed-table rate source
///
/// A base without an explicit table is derived by cross rates through any
/// table that prices it, so a single USD table is enough to quote every
/// listed currency as base.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRateSource {
    tables: HashMap<CurrencyCode, HashMap<CurrencyCode, f64>>,
    unavailable: Arc<AtomicBool>,
    universe_calls: Arc<AtomicUsize>,
    rate_calls: Arc<AtomicUsize>,
}

impl InMemoryRateSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace one rate: 1 `base` = `rate` `target`
    pub fn with_rate(mut self, base: CurrencyCode, target: CurrencyCode, rate: f64) -> Self {
        self.tables.entry(base).or_default().insert(target, rate);
        self
    }

    /// Add a whole table for `base`; the base itself is priced at 1.0
    pub fn with_table<I>(mut self, base: CurrencyCode, rates: I) -> Self
    where
        I: IntoIterator<Item = (CurrencyCode, f64)>,
    {
        let table = self.tables.entry(base.clone()).or_default();
        table.insert(base, 1.0);
        table.extend(rates);
        self
    }

    /// Sample table used for offline runs, quoted against USD
    pub fn sample() -> Result<Self> {
        let rates = [
            ("EUR", 0.92),
            ("GBP", 0.79),
            ("INR", 83.12),
            ("JPY", 149.5),
            ("PKR", 278.5),
            ("CHF", 0.88),
            ("CAD", 1.36),
            ("AUD", 1.52),
            ("CNY", 7.19),
            ("AED", 3.6725),
        ]
        .into_iter()
        .map(|(code, rate)| CurrencyCode::new(code).map(|code| (code, rate)))
        .collect::<Result<Vec<_>>>()?;

        Ok(Self::new().with_table(CurrencyCode::new("USD")?, rates))
    }

    /// Make every call fail with `SourceUnavailable` (or succeed again)
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of universe enumerations served so far
    pub fn universe_calls(&self) -> usize {
        self.universe_calls.load(Ordering::SeqCst)
    }

    /// Number of rate fetches served so far
    pub fn rate_calls(&self) -> usize {
        self.rate_calls.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DashboardError::SourceUnavailable(
                "in-memory source switched off".to_string(),
            ));
        }
        Ok(())
    }

    fn table_for(&self, base: &CurrencyCode) -> Option<HashMap<CurrencyCode, f64>> {
        if let Some(table) = self.tables.get(base) {
            return Some(table.clone());
        }

        // Cross through the first table that prices `base`
        self.tables.values().find_map(|table| {
            let pivot = table.get(base).copied().filter(|rate| *rate > 0.0)?;
            Some(
                table
                    .iter()
                    .map(|(code, rate)| (code.clone(), rate / pivot))
                    .collect(),
            )
        })
    }
}

impl RateSource for InMemoryRateSource {
    async fn supported_currencies(&self) -> Result<BTreeSet<CurrencyCode>> {
        self.universe_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        Ok(self
            .tables
            .iter()
            .flat_map(|(base, table)| std::iter::once(base).chain(table.keys()))
            .cloned()
            .collect())
    }

    async fn latest_rates(&self, base: &CurrencyCode) -> Result<RateSnapshot> {
        self.rate_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        match self.table_for(base) {
            Some(table) if !table.is_empty() => Ok(RateSnapshot::new(base.clone(), table)),
            _ => Err(DashboardError::SourceUnavailable(format!(
                "No rates for base {}",
                base
            ))),
        }
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}
