//! ExchangeRate-API data source integration
//!
//! Live rates from `GET {base_url}/{api_key}/latest/{base}`. The JSON body is
//! validated into typed values here; nothing downstream sees raw payloads.

use super::RateSource;
use crate::currency::{CurrencyCode, RateSnapshot};
use crate::error::{DashboardError, Result};
use chrono::{DateTime, Utc};
use hashbrown::HashMap;
use reqwest::Client;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://v6.exchangerate-api.com/v6";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// ExchangeRate-API client
pub struct ExchangeRateApiClient {
    api_key: String,
    base_url: String,
    universe_base: CurrencyCode,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct LatestResponse {
    result: String,
    #[serde(rename = "error-type", default)]
    error_type: Option<String>,
    #[serde(default)]
    base_code: Option<String>,
    #[serde(default)]
    time_last_update_unix: Option<i64>,
    #[serde(default)]
    conversion_rates: Option<BTreeMap<String, f64>>,
}

impl ExchangeRateApiClient {
    /// Create a client against the public endpoint
    pub fn new(api_key: String) -> Result<Self> {
        Self::with_config(
            api_key,
            DEFAULT_BASE_URL.to_string(),
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    /// Create a client against another endpoint (mirrors, test servers)
    pub fn new_with_url(api_key: String, base_url: String) -> Result<Self> {
        Self::with_config(api_key, base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_config(api_key: String, base_url: String, timeout: Duration) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(DashboardError::ConfigError(
                "ExchangeRate-API key is empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("currency-dashboard/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                DashboardError::SourceUnavailable(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            universe_base: CurrencyCode::new("USD")?,
            client,
        })
    }

    /// Base currency whose rate table enumerates the universe
    pub fn with_universe_base(mut self, base: CurrencyCode) -> Self {
        self.universe_base = base;
        self
    }

    async fn fetch_latest(&self, base: &CurrencyCode) -> Result<LatestResponse> {
        let url = format!("{}/{}/latest/{}", self.base_url, self.api_key, base);
        log::debug!("GET {}/<key>/latest/{}", self.base_url, base);

        // The URL carries the API key; keep it out of error messages.
        let response = self.client.get(&url).send().await.map_err(|e| {
            DashboardError::SourceUnavailable(format!("HTTP request failed: {}", e.without_url()))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DashboardError::SourceUnavailable(format!(
                "ExchangeRate-API returned HTTP {}",
                status
            )));
        }

        response.json::<LatestResponse>().await.map_err(|e| {
            DashboardError::SourceUnavailable(format!("JSON parse error: {}", e.without_url()))
        })
    }

    fn parse_response(&self, base: &CurrencyCode, data: LatestResponse) -> Result<RateSnapshot> {
        if data.result != "success" {
            return Err(DashboardError::SourceUnavailable(format!(
                "ExchangeRate-API returned result '{}' ({})",
                data.result,
                data.error_type.as_deref().unwrap_or("no error type")
            )));
        }

        if let Some(reported) = data.base_code.as_deref() {
            if !reported.eq_ignore_ascii_case(base.as_str()) {
                log::warn!("Requested base {} but service reported {}", base, reported);
            }
        }

        let raw = data.conversion_rates.ok_or_else(|| {
            DashboardError::SourceUnavailable("Response has no conversion_rates".to_string())
        })?;

        let mut rates = HashMap::with_capacity(raw.len());
        for (code, rate) in raw {
            match CurrencyCode::new(&code) {
                Ok(code) => {
                    rates.insert(code, rate);
                }
                Err(_) => log::warn!("Dropping rate with invalid currency code '{}'", code),
            }
        }

        if rates.is_empty() {
            return Err(DashboardError::SourceUnavailable(
                "Response contains no usable rates".to_string(),
            ));
        }

        let retrieved_at = data
            .time_last_update_unix
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .unwrap_or_else(Utc::now);

        Ok(RateSnapshot::at(base.clone(), retrieved_at, rates))
    }
}

impl RateSource for ExchangeRateApiClient {
    async fn supported_currencies(&self) -> Result<BTreeSet<CurrencyCode>> {
        let data = self.fetch_latest(&self.universe_base).await?;
        let snapshot = self.parse_response(&self.universe_base, data)?;
        Ok(snapshot.codes())
    }

    async fn latest_rates(&self, base: &CurrencyCode) -> Result<RateSnapshot> {
        let data = self.fetch_latest(base).await?;
        let snapshot = self.parse_response(base, data)?;
        log::debug!("Fetched {} rates for base {}", snapshot.len(), base);
        Ok(snapshot)
    }

    fn name(&self) -> &str {
        "exchangerate-api"
    }
}
