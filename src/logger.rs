//! Observation logger
//!
//! Appends validated rate observations to the worksheet log, one row per
//! target. There is no transaction: rows written before a failure stay
//! written.

use crate::currency::{CurrencyCode, RateSnapshot};
use crate::error::{DashboardError, Result};
use crate::sheet::Worksheet;
use crate::types::{ObservationRecord, Timestamp, LOG_HEADER};
use chrono::{Local, Timelike, Utc};
use chrono_tz::Tz;

/// Source of observation timestamps
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum LogClock {
    /// System local time
    #[default]
    Local,
    /// Wall-clock time in a fixed IANA zone
    Zone(Tz),
}

impl LogClock {
    /// Current wall-clock time, truncated to whole seconds
    pub fn now(&self) -> Timestamp {
        let now = match self {
            LogClock::Local => Local::now().naive_local(),
            LogClock::Zone(tz) => Utc::now().with_timezone(tz).naive_local(),
        };
        now.with_nanosecond(0).unwrap_or(now)
    }
}

/// Outcome of one append batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppendReport {
    /// Rows written, in order
    pub written: Vec<ObservationRecord>,
    /// Targets without a usable rate
    pub skipped: Vec<CurrencyCode>,
}

/// Writes observations to a worksheet
#[derive(Debug, Clone, Default)]
pub struct ObservationLogger {
    clock: LogClock,
}

impl ObservationLogger {
    pub fn new(clock: LogClock) -> Self {
        Self { clock }
    }

    /// Make sure row 1 is exactly the log header
    ///
    /// Inserts the header above whatever row 1 holds when it differs, so
    /// calling this repeatedly leaves a single header.
    pub fn ensure_header<W: Worksheet + ?Sized>(&self, sheet: &mut W) -> Result<bool> {
        let write_failed = |e: DashboardError| DashboardError::LogWriteFailed(e.to_string());

        let first_row = if sheet.row_count().map_err(write_failed)? == 0 {
            Vec::new()
        } else {
            sheet.row_values(1).map_err(write_failed)?
        };

        if first_row.iter().map(String::as_str).eq(LOG_HEADER) {
            return Ok(false);
        }

        let header: Vec<String> = LOG_HEADER.iter().map(|h| h.to_string()).collect();
        sheet.insert_row(&header, 1).map_err(write_failed)?;
        log::info!("Inserted log header into worksheet '{}'", sheet.title());
        Ok(true)
    }

    /// Append observations stamped with the logger's clock
    pub fn append<W: Worksheet + ?Sized>(
        &self,
        sheet: &mut W,
        base: &CurrencyCode,
        targets: &[CurrencyCode],
        rates: &RateSnapshot,
    ) -> Result<AppendReport> {
        self.append_at(sheet, self.clock.now(), base, targets, rates)
    }

    /// Append observations with an explicit timestamp
    ///
    /// The header is ensured first. Every target with a rate that is present
    /// and strictly positive becomes one row; the rest are reported as
    /// skipped. The first failing write aborts the batch with
    /// `LogWriteFailed`, keeping the rows already written.
    pub fn append_at<W: Worksheet + ?Sized>(
        &self,
        sheet: &mut W,
        timestamp: Timestamp,
        base: &CurrencyCode,
        targets: &[CurrencyCode],
        rates: &RateSnapshot,
    ) -> Result<AppendReport> {
        self.ensure_header(sheet)?;

        let mut report = AppendReport::default();
        for target in targets {
            let Some(rate) = rates.valid_rate(target) else {
                log::debug!("No valid {}/{} rate, not logging", base, target);
                report.skipped.push(target.clone());
                continue;
            };

            let record = ObservationRecord::new(timestamp, base.clone(), target.clone(), rate);
            sheet.append_row(&record.to_row()).map_err(|e| {
                DashboardError::LogWriteFailed(format!(
                    "{} after {} of {} rows: {}",
                    target,
                    report.written.len(),
                    targets.len(),
                    e
                ))
            })?;
            report.written.push(record);
        }

        log::info!(
            "Logged {} observation(s) for base {} ({} skipped)",
            report.written.len(),
            base,
            report.skipped.len()
        );
        Ok(report)
    }
}
