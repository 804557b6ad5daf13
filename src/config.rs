//! Dashboard configuration
//!
//! Loaded from TOML. Lookup order: explicit path, then
//! `~/.currency-dashboard/config.toml`, then built-in defaults. The API key
//! can also come from `EXCHANGE_RATE_API_KEY`, which wins over the file.

use crate::currency::CurrencyCode;
use crate::error::{DashboardError, Result};
use crate::logger::LogClock;
use crate::sources::exchange_rate_api::DEFAULT_BASE_URL;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const API_KEY_ENV: &str = "EXCHANGE_RATE_API_KEY";
pub const SHEET_NAME: &str = "Currency_Exchange_Log";

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// ExchangeRate-API key
    pub api_key: Option<String>,
    pub api_base_url: String,
    /// Base whose table enumerates the supported currencies
    pub universe_base: String,
    pub default_base: String,
    pub preferred_targets: Vec<String>,
    /// Upper bound on selected targets
    pub max_targets: usize,
    /// Upper bound on targets pre-selected from `preferred_targets`
    pub default_target_cap: usize,
    pub sheet_path: PathBuf,
    pub chart_dir: PathBuf,
    pub chart_width: u32,
    pub chart_height: u32,
    /// IANA zone for log timestamps; local time when unset
    pub timezone: Option<String>,
    pub request_timeout_secs: u64,
}

fn app_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".currency-dashboard")
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: DEFAULT_BASE_URL.to_string(),
            universe_base: "USD".to_string(),
            default_base: "USD".to_string(),
            preferred_targets: ["PKR", "EUR", "GBP", "INR", "JPY"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            max_targets: 15,
            default_target_cap: 10,
            sheet_path: app_dir().join(format!("{}.csv", SHEET_NAME)),
            chart_dir: app_dir().join("charts"),
            chart_width: 1200,
            chart_height: 600,
            timezone: None,
            request_timeout_secs: 30,
        }
    }
}

impl DashboardConfig {
    /// Default config file location
    pub fn default_path() -> PathBuf {
        app_dir().join("config.toml")
    }

    /// Parse a TOML document
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)
            .map_err(|e| DashboardError::ConfigError(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration
    ///
    /// An explicit path must exist and parse. The default location is
    /// optional. The API key environment variable is applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let contents = fs::read_to_string(path).map_err(|e| {
                    DashboardError::ConfigError(format!(
                        "Failed to read config {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                Self::from_toml(&contents)?
            }
            None => {
                let default_path = Self::default_path();
                if default_path.exists() {
                    log::debug!("Loading config from {}", default_path.display());
                    Self::from_toml(&fs::read_to_string(&default_path)?)?
                } else {
                    Self::default()
                }
            }
        };

        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                config.api_key = Some(key);
            }
        }

        Ok(config)
    }

    /// Check field values that serde cannot
    pub fn validate(&self) -> Result<()> {
        CurrencyCode::new(&self.universe_base)?;
        CurrencyCode::new(&self.default_base)?;
        for code in &self.preferred_targets {
            CurrencyCode::new(code)?;
        }
        if self.max_targets == 0 {
            return Err(DashboardError::ConfigError(
                "max_targets must be at least 1".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(DashboardError::ConfigError(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }
        self.log_clock()?;
        Ok(())
    }

    /// API key, required for the live source
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                DashboardError::ConfigError(format!(
                    "No API key configured; set {} or api_key in the config file",
                    API_KEY_ENV
                ))
            })
    }

    pub fn universe_base_code(&self) -> Result<CurrencyCode> {
        CurrencyCode::new(&self.universe_base)
    }

    pub fn default_base_code(&self) -> Result<CurrencyCode> {
        CurrencyCode::new(&self.default_base)
    }

    pub fn preferred_codes(&self) -> Result<Vec<CurrencyCode>> {
        self.preferred_targets
            .iter()
            .map(|code| CurrencyCode::new(code))
            .collect()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Clock used to stamp log rows
    pub fn log_clock(&self) -> Result<LogClock> {
        match self.timezone.as_deref() {
            None => Ok(LogClock::Local),
            Some(name) => name
                .parse::<chrono_tz::Tz>()
                .map(LogClock::Zone)
                .map_err(|e| DashboardError::ConfigError(format!("Unknown timezone {}: {}", name, e))),
        }
    }
}
