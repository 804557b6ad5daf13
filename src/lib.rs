//! # Currency Dashboard
//!
//! Fetches live exchange rates, logs every valid observation to an
//! append-only worksheet, and replays the log into per-pair trend charts.
//!
//! One render pass runs: fetch the currency universe (cached per session),
//! resolve the selection, fetch rates for the base, display and log the
//! valid ones, read the whole log back and chart each selected target.
//!
//! ## Example
//!
//! ```rust,no_run
//! use currency_dashboard::prelude::*;
//!
//! # async fn run() -> Result<()> {
//! let source = InMemoryRateSource::sample()?;
//! let sheet = CsvSheetConnector::new("Currency_Exchange_Log.csv");
//! let policy = SelectionPolicy::new("USD".parse()?, vec!["EUR".parse()?]);
//! let mut dashboard = Dashboard::new(source, sheet, policy);
//!
//! let output = dashboard.run(&SelectionRequest::default()).await;
//! for line in output.lines() {
//!     println!("{}", line);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod chart;
pub mod config;
pub mod currency;
pub mod error;
pub mod history;
pub mod logger;
pub mod pipeline;
pub mod sheet;
pub mod sources;
pub mod types;

pub mod prelude {
    //! Commonly used types and traits
    pub use crate::chart::{TrendChart, TrendRenderer, TrendSeries, TrendSummary};
    pub use crate::config::DashboardConfig;
    pub use crate::currency::{format_rate_line, CurrencyCode, RateSnapshot};
    pub use crate::error::{DashboardError, ErrorKind, Result};
    pub use crate::history::{HistoryRead, HistoryReader};
    pub use crate::logger::{AppendReport, LogClock, ObservationLogger};
    pub use crate::pipeline::{
        Dashboard, DashboardEvent, Notice, NoticeLevel, PipelineState, RenderOutput,
        SelectionPolicy, SelectionRequest,
    };
    pub use crate::sheet::{CsvSheetConnector, InMemoryWorksheet, SheetConnector, Worksheet};
    pub use crate::sources::{ExchangeRateApiClient, InMemoryRateSource, RateSource};
    pub use crate::types::*;
}
