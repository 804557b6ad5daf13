//! History reader
//!
//! Replays the observation log into structured records. The header decides
//! where each field lives; a header missing any required column rejects the
//! whole read, while individual malformed rows are skipped and counted.

use crate::currency::CurrencyCode;
use crate::error::{DashboardError, Result};
use crate::sheet::Worksheet;
use crate::types::{parse_timestamp, ObservationRecord, LOG_HEADER};

/// Records recovered from the log
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryRead {
    /// Parsed records, in log order
    pub records: Vec<ObservationRecord>,
    /// Data rows that could not be parsed
    pub skipped_rows: usize,
}

impl HistoryRead {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records for one currency pair, in log order
    pub fn for_pair(
        &self,
        base: &CurrencyCode,
        currency: &CurrencyCode,
    ) -> impl Iterator<Item = &ObservationRecord> + '_ {
        let (base, currency) = (base.clone(), currency.clone());
        self.records
            .iter()
            .filter(move |r| r.is_pair(&base, &currency))
    }
}

/// Column positions of the four log fields
#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    timestamp: usize,
    base: usize,
    currency: usize,
    rate: usize,
}

impl ColumnMap {
    fn from_header(header: &[String]) -> Result<Self> {
        let find = |name: &str| header.iter().position(|h| h.trim() == name);

        let positions: Vec<Option<usize>> = LOG_HEADER.iter().map(|&name| find(name)).collect();
        let missing: Vec<String> = LOG_HEADER
            .iter()
            .zip(&positions)
            .filter(|(_, pos)| pos.is_none())
            .map(|(name, _)| name.to_string())
            .collect();

        match positions[..] {
            [Some(timestamp), Some(base), Some(currency), Some(rate)] => Ok(Self {
                timestamp,
                base,
                currency,
                rate,
            }),
            _ => Err(DashboardError::LogSchemaMismatch { missing }),
        }
    }

    fn parse_row(&self, row: &[String]) -> Result<ObservationRecord> {
        let cell = |idx: usize| row.get(idx).map(|c| c.trim()).unwrap_or("");

        let timestamp = parse_timestamp(cell(self.timestamp))?;
        let base = CurrencyCode::new(cell(self.base))?;
        let currency = CurrencyCode::new(cell(self.currency))?;
        let rate: f64 = cell(self.rate).parse().map_err(|e| {
            DashboardError::SheetError(format!("Invalid rate '{}': {}", cell(self.rate), e))
        })?;
        // same rule as the write side: only finite, positive rates are history
        if !(rate.is_finite() && rate > 0.0) {
            return Err(DashboardError::SheetError(format!(
                "Rate '{}' is not a positive number",
                cell(self.rate)
            )));
        }

        Ok(ObservationRecord::new(timestamp, base, currency, rate))
    }
}

/// Reads the observation log back
#[derive(Debug, Clone, Copy, Default)]
pub struct HistoryReader;

impl HistoryReader {
    pub fn new() -> Self {
        Self
    }

    /// Read every data row of the log
    ///
    /// - storage failure: `HistoryUnavailable`
    /// - header missing a required column: `LogSchemaMismatch`
    /// - no data rows: empty `HistoryRead`
    pub fn read_all<W: Worksheet + ?Sized>(&self, sheet: &W) -> Result<HistoryRead> {
        let rows = sheet
            .all_values()
            .map_err(|e| DashboardError::HistoryUnavailable(e.to_string()))?;

        let mut rows = rows.into_iter();
        let Some(header) = rows.next() else {
            return Ok(HistoryRead::default());
        };
        let columns = ColumnMap::from_header(&header)?;

        let mut history = HistoryRead::default();
        for (idx, row) in rows.enumerate() {
            if row.iter().all(|c| c.trim().is_empty()) {
                continue;
            }
            match columns.parse_row(&row) {
                Ok(record) => history.records.push(record),
                Err(e) => {
                    // idx 0 is sheet row 2
                    log::warn!("Skipping log row {}: {}", idx + 2, e);
                    history.skipped_rows += 1;
                }
            }
        }

        log::debug!(
            "Read {} record(s) from '{}', skipped {}",
            history.records.len(),
            sheet.title(),
            history.skipped_rows
        );
        Ok(history)
    }
}
