//! Integration tests for the CSV-backed observation log
//!
//! Tests writing, replaying and charting through real files.

use chrono::NaiveDate;
use currency_dashboard::chart::TrendRenderer;
use currency_dashboard::currency::{CurrencyCode, RateSnapshot};
use currency_dashboard::history::HistoryReader;
use currency_dashboard::logger::ObservationLogger;
use currency_dashboard::pipeline::{Dashboard, SelectionPolicy, SelectionRequest};
use currency_dashboard::sheet::{CsvSheetConnector, CsvWorksheet, SheetConnector, Worksheet};
use currency_dashboard::sources::InMemoryRateSource;
use currency_dashboard::types::{ObservationRecord, Timestamp};
use hashbrown::HashMap;
use std::fs;
use tempfile::tempdir;

fn code(s: &str) -> CurrencyCode {
    CurrencyCode::new(s).unwrap()
}

fn at(day: u32, hour: u32) -> Timestamp {
    NaiveDate::from_ymd_opt(2024, 5, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

fn snapshot(rates: &[(&str, f64)]) -> RateSnapshot {
    let rates: HashMap<_, _> = rates.iter().map(|(c, r)| (code(c), *r)).collect();
    RateSnapshot::new(code("USD"), rates)
}

#[test]
fn test_written_record_replays_into_trend() {
    let dir = tempdir().unwrap();
    let mut sheet = CsvWorksheet::open(dir.path().join("Currency_Exchange_Log.csv")).unwrap();
    let logger = ObservationLogger::default();

    logger
        .append_at(
            &mut sheet,
            at(1, 9),
            &code("USD"),
            &[code("EUR"), code("PKR")],
            &snapshot(&[("EUR", 0.91), ("PKR", 278.1)]),
        )
        .unwrap();
    logger
        .append_at(
            &mut sheet,
            at(2, 9),
            &code("USD"),
            &[code("EUR")],
            &snapshot(&[("EUR", 0.93)]),
        )
        .unwrap();

    let history = HistoryReader::new().read_all(&sheet).unwrap();
    assert_eq!(history.records.len(), 3);

    let expected = ObservationRecord::new(at(2, 9), code("USD"), code("EUR"), 0.93);
    let eur: Vec<_> = history.for_pair(&code("USD"), &code("EUR")).collect();
    assert_eq!(eur.len(), 2);
    assert_eq!(eur[1], &expected);

    let chart = TrendRenderer::default()
        .render(&history.records, &code("USD"), &code("EUR"))
        .unwrap();
    assert_eq!(chart.series.len(), 2);
    let summary = chart.series.summary().unwrap();
    assert!(summary.change_pct > 0.0);
}

#[test]
fn test_file_layout() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("log.csv");
    let mut sheet = CsvWorksheet::open(&path).unwrap();

    ObservationLogger::default()
        .append_at(
            &mut sheet,
            at(2, 14),
            &code("USD"),
            &[code("EUR"), code("PKR")],
            &snapshot(&[("EUR", 0.92), ("PKR", 278.5)]),
        )
        .unwrap();

    let contents = fs::read_to_string(&path).unwrap();
    assert_eq!(
        contents,
        "Timestamp,Base,Currency,Rate\n\
         2024-05-02 14:00:00,USD,EUR,0.92\n\
         2024-05-02 14:00:00,USD,PKR,278.5\n"
    );
}

#[test]
fn test_existing_rows_survive_header_insert() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("log.csv");
    fs::write(&path, "2024-05-01 10:00:00,USD,EUR,0.9\n").unwrap();

    let mut sheet = CsvSheetConnector::new(&path).connect().unwrap();
    assert!(ObservationLogger::default().ensure_header(&mut sheet).unwrap());
    assert_eq!(sheet.row_count().unwrap(), 2);

    let history = HistoryReader::new().read_all(&sheet).unwrap();
    assert_eq!(history.records.len(), 1);
    assert_eq!(history.records[0].rate, 0.9);
}

#[test]
fn test_append_to_log_without_trailing_newline() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("log.csv");
    fs::write(&path, "Timestamp,Base,Currency,Rate\n2024-05-01 10:00:00,USD,EUR,0.9").unwrap();

    let mut sheet = CsvSheetConnector::new(&path).connect().unwrap();
    ObservationLogger::default()
        .append_at(
            &mut sheet,
            at(2, 9),
            &code("USD"),
            &[code("EUR")],
            &snapshot(&[("EUR", 0.92)]),
        )
        .unwrap();

    let history = HistoryReader::new().read_all(&sheet).unwrap();
    assert_eq!(history.skipped_rows, 0);
    let rates: Vec<f64> = history.records.iter().map(|r| r.rate).collect();
    assert_eq!(rates, vec![0.9, 0.92]);
}

#[test]
fn test_unusable_logged_rates_do_not_reach_charts() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("log.csv");
    fs::write(
        &path,
        "Timestamp,Base,Currency,Rate\n\
         2024-05-01 09:00:00,USD,EUR,inf\n\
         2024-05-01 10:00:00,USD,EUR,NaN\n\
         2024-05-01 11:00:00,USD,EUR,-3\n\
         2024-05-01 12:00:00,USD,EUR,0\n\
         2024-05-01 13:00:00,USD,EUR,0.92\n",
    )
    .unwrap();

    let sheet = CsvWorksheet::open(&path).unwrap();
    let history = HistoryReader::new().read_all(&sheet).unwrap();
    assert_eq!(history.skipped_rows, 4);

    let chart = TrendRenderer::default()
        .render(&history.records, &code("USD"), &code("EUR"))
        .unwrap();
    assert_eq!(chart.series.len(), 1);
    assert_eq!(chart.series.summary().unwrap().mean, 0.92);
}

#[test]
fn test_schema_mismatch_from_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("log.csv");
    fs::write(&path, "Timestamp,Base,Currency\n2024-05-01 10:00:00,USD,EUR\n").unwrap();

    let sheet = CsvWorksheet::open(&path).unwrap();
    let err = HistoryReader::new().read_all(&sheet).unwrap_err();
    assert_eq!(err.to_string(), "Log is missing required columns: Rate");
}

#[tokio::test]
async fn test_offline_pass_writes_log_and_charts() {
    let dir = tempdir().unwrap();
    let log_path = dir.path().join("data").join("Currency_Exchange_Log.csv");
    let chart_dir = dir.path().join("charts");

    let policy = SelectionPolicy::new(code("USD"), vec![code("PKR"), code("EUR")]);
    let mut dashboard = Dashboard::new(
        InMemoryRateSource::sample().unwrap(),
        CsvSheetConnector::new(&log_path),
        policy,
    )
    .with_chart_dir(&chart_dir);

    let output = dashboard.run(&SelectionRequest::default()).await;
    assert!(output.completed, "notices: {:?}", output.notices);
    dashboard.run(&SelectionRequest::default()).await;

    let lines = fs::read_to_string(&log_path).unwrap();
    assert_eq!(lines.lines().count(), 1 + 2 * 2);

    let svg_path = chart_dir.join("USD_PKR.svg");
    assert_eq!(output.charts[0].path.as_deref(), Some(svg_path.as_path()));
    let svg = fs::read_to_string(&svg_path).unwrap();
    assert!(svg.contains("<svg"));
    assert!(chart_dir.join("USD_EUR.svg").exists());
}
