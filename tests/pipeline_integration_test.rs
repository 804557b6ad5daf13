//! Integration tests for render passes
//!
//! Drives the dashboard end to end with in-memory sources and sheets.

use currency_dashboard::currency::CurrencyCode;
use currency_dashboard::error::{DashboardError, ErrorKind, Result};
use currency_dashboard::pipeline::{
    Dashboard, DashboardEvent, NoticeLevel, PipelineState, SelectionPolicy, SelectionRequest,
};
use currency_dashboard::sheet::{InMemoryWorksheet, SheetConnector, Worksheet};
use currency_dashboard::sources::InMemoryRateSource;
use currency_dashboard::types::LOG_HEADER;

fn code(s: &str) -> CurrencyCode {
    CurrencyCode::new(s).unwrap()
}

fn codes(list: &[&str]) -> Vec<CurrencyCode> {
    list.iter().map(|c| code(c)).collect()
}

fn policy() -> SelectionPolicy {
    SelectionPolicy::new(code("USD"), codes(&["PKR", "EUR", "GBP", "INR", "JPY"]))
}

fn usd_source(rates: &[(&str, f64)]) -> InMemoryRateSource {
    InMemoryRateSource::new().with_table(
        code("USD"),
        rates.iter().map(|(c, r)| (code(c), *r)).collect::<Vec<_>>(),
    )
}

fn usd_request(targets: &[&str]) -> SelectionRequest {
    SelectionRequest::new(Some(code("USD")), Some(codes(targets)))
}

#[tokio::test]
async fn test_eur_pkr_scenario() {
    let sheet = InMemoryWorksheet::new("Currency_Exchange_Log");
    let source = usd_source(&[("EUR", 0.92), ("PKR", 278.5)]);
    let mut dashboard = Dashboard::new(source, sheet.clone(), policy());

    let output = dashboard.run(&usd_request(&["EUR", "PKR"])).await;

    assert_eq!(output.lines(), vec!["1 USD = 0.92 EUR", "1 USD = 278.50 PKR"]);
    assert!(output.completed);
    assert!(output.notices.is_empty());

    let rows = sheet.rows();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0], LOG_HEADER.to_vec());
    assert_eq!(&rows[1][1..], ["USD", "EUR", "0.92"]);
    assert_eq!(&rows[2][1..], ["USD", "PKR", "278.5"]);
    assert_eq!(rows[1][0], rows[2][0]);

    assert_eq!(output.charts.len(), 2);
    assert_eq!(output.charts[0].chart.series.len(), 1);
    assert_eq!(output.charts[1].chart.series.title(), "PKR Trend vs USD");
}

#[tokio::test]
async fn test_zero_rate_warns_and_skips_row() {
    let sheet = InMemoryWorksheet::new("log");
    let source = usd_source(&[("EUR", 0.0), ("PKR", 278.5)]);
    let mut dashboard = Dashboard::new(source, sheet.clone(), policy());

    let output = dashboard.run(&usd_request(&["EUR", "PKR"])).await;

    let warnings: Vec<_> = output.notices_at(NoticeLevel::Warning).collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].kind, Some(ErrorKind::NoValidRate));
    assert!(warnings[0].message.contains("EUR"));

    assert_eq!(output.lines(), vec!["1 USD = 278.50 PKR"]);
    let rows = sheet.rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1][2], "PKR");

    let report = output.append.unwrap();
    assert_eq!(report.skipped, codes(&["EUR"]));

    // EUR still gets a (placeholder) chart
    assert_eq!(output.charts.len(), 2);
    assert!(output.charts[0].chart.series.is_empty());
}

/// What goes wrong when the whole log is read back
#[derive(Clone, Copy)]
enum ReadFault {
    /// The `Rate` column disappears from the header
    DropRateColumn,
    /// The read itself fails
    Unavailable,
}

/// Sheet that writes normally but misbehaves on full reads
#[derive(Clone)]
struct FaultyReads {
    inner: InMemoryWorksheet,
    fault: ReadFault,
}

impl Worksheet for FaultyReads {
    fn title(&self) -> &str {
        self.inner.title()
    }

    fn row_count(&self) -> Result<usize> {
        self.inner.row_count()
    }

    fn row_values(&self, row: usize) -> Result<Vec<String>> {
        self.inner.row_values(row)
    }

    fn insert_row(&mut self, values: &[String], index: usize) -> Result<()> {
        self.inner.insert_row(values, index)
    }

    fn append_row(&mut self, values: &[String]) -> Result<()> {
        self.inner.append_row(values)
    }

    fn all_values(&self) -> Result<Vec<Vec<String>>> {
        match self.fault {
            ReadFault::DropRateColumn => {
                let mut rows = self.inner.all_values()?;
                if let Some(header) = rows.first_mut() {
                    header.retain(|h| h != "Rate");
                }
                Ok(rows)
            }
            ReadFault::Unavailable => Err(DashboardError::SheetError("read timed out".to_string())),
        }
    }
}

impl SheetConnector for FaultyReads {
    type Sheet = FaultyReads;

    fn connect(&self) -> Result<FaultyReads> {
        Ok(self.clone())
    }
}

fn faulty(fault: ReadFault) -> FaultyReads {
    FaultyReads {
        inner: InMemoryWorksheet::new("log"),
        fault,
    }
}

#[tokio::test]
async fn test_missing_rate_column_skips_charts() {
    let sheet = faulty(ReadFault::DropRateColumn);
    let source = usd_source(&[("EUR", 0.92), ("PKR", 278.5)]);
    let mut dashboard = Dashboard::new(source, sheet, policy());

    let output = dashboard.run(&usd_request(&["EUR", "PKR"])).await;

    assert!(output.has_kind(ErrorKind::LogSchemaMismatch));
    assert!(!output.has_errors());
    assert!(output.charts.is_empty());
    assert!(!output.completed);
    assert_eq!(output.stopped_at, PipelineState::ReadingHistory);
    // rates were still shown and logged
    assert_eq!(output.lines().len(), 2);
    assert_eq!(output.append.unwrap().written.len(), 2);
}

#[tokio::test]
async fn test_log_write_failure_keeps_display() {
    let sheet = InMemoryWorksheet::new("log");
    sheet.fail_after_appends(1);
    let source = usd_source(&[("EUR", 0.92), ("PKR", 278.5), ("GBP", 0.79)]);
    let mut dashboard = Dashboard::new(source, sheet.clone(), policy());

    let output = dashboard.run(&usd_request(&["EUR", "PKR", "GBP"])).await;

    assert_eq!(output.lines().len(), 3);
    let errors: Vec<_> = output.notices_at(NoticeLevel::Error).collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, Some(ErrorKind::LogWriteFailed));

    // header and EUR were written before the failure
    assert_eq!(sheet.rows().len(), 2);
    assert!(!output.visited(PipelineState::ReadingHistory));
    assert!(output.charts.is_empty());
}

#[tokio::test]
async fn test_history_unavailable_is_warning() {
    let sheet = faulty(ReadFault::Unavailable);
    let source = usd_source(&[("EUR", 0.92)]);
    let mut dashboard = Dashboard::new(source, sheet, policy());

    let output = dashboard.run(&usd_request(&["EUR"])).await;

    assert!(output.has_kind(ErrorKind::HistoryUnavailable));
    assert!(!output.has_errors());
    assert!(!output.visited(PipelineState::Rendering));
}

#[tokio::test]
async fn test_empty_universe_stops_pass() {
    let source = InMemoryRateSource::new();
    let mut dashboard = Dashboard::new(source.clone(), InMemoryWorksheet::new("log"), policy());

    let output = dashboard.run(&SelectionRequest::default()).await;

    assert!(output.has_kind(ErrorKind::EmptyUniverse));
    assert!(output.selection.is_none());
    assert_eq!(output.trace, vec![PipelineState::FetchingUniverse]);
    assert_eq!(source.rate_calls(), 0);
}

#[tokio::test]
async fn test_rate_fetch_failure_after_cached_universe() {
    let source = usd_source(&[("EUR", 0.92)]);
    let sheet = InMemoryWorksheet::new("log");
    let mut dashboard = Dashboard::new(source.clone(), sheet.clone(), policy());

    assert!(dashboard.run(&usd_request(&["EUR"])).await.completed);

    source.set_unavailable(true);
    let output = dashboard.handle(DashboardEvent::Refresh).await;

    assert!(output.has_kind(ErrorKind::SourceUnavailable));
    assert_eq!(output.stopped_at, PipelineState::FetchingRates);
    assert!(output.lines().is_empty());
    assert_eq!(source.universe_calls(), 1);
    assert_eq!(sheet.rows().len(), 2);
}

#[tokio::test]
async fn test_every_pass_appends() {
    let sheet = InMemoryWorksheet::new("log");
    let source = usd_source(&[("EUR", 0.92), ("PKR", 278.5)]);
    let mut dashboard = Dashboard::new(source, sheet.clone(), policy());

    for _ in 0..3 {
        dashboard.handle(DashboardEvent::Refresh).await;
    }

    // defaults: PKR and EUR from the preferred list
    assert_eq!(sheet.rows().len(), 1 + 3 * 2);
    let output = dashboard.handle(DashboardEvent::Refresh).await;
    assert_eq!(output.charts[0].chart.series.len(), 4);
}

#[tokio::test]
async fn test_foreign_first_row_gets_header_above() {
    let sheet = InMemoryWorksheet::with_rows(
        "log",
        vec![vec!["2024-05-01 10:00:00", "USD", "EUR", "0.91"]],
    );
    let source = usd_source(&[("EUR", 0.92)]);
    let mut dashboard = Dashboard::new(source, sheet.clone(), policy());

    let output = dashboard.run(&usd_request(&["EUR"])).await;

    let rows = sheet.rows();
    assert_eq!(rows[0], LOG_HEADER.to_vec());
    assert_eq!(rows.len(), 3);
    // the pre-existing row is now ordinary history
    assert_eq!(output.charts[0].chart.series.len(), 2);
}

#[tokio::test]
async fn test_invalidate_reopens_sheet() {
    let sheet = InMemoryWorksheet::new("log");
    let source = usd_source(&[("EUR", 0.92)]);
    let mut dashboard = Dashboard::new(source, sheet.clone(), policy());

    dashboard.run(&usd_request(&["EUR"])).await;
    dashboard.handle(DashboardEvent::InvalidateCaches).await;
    assert_eq!(sheet.connects(), 2);
}
