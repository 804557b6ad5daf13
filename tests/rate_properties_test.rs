//! Property tests for rate display and observation logging

use chrono::NaiveDate;
use currency_dashboard::currency::{format_rate_line, CurrencyCode, RateSnapshot};
use currency_dashboard::logger::ObservationLogger;
use currency_dashboard::sheet::InMemoryWorksheet;
use currency_dashboard::types::Timestamp;
use hashbrown::HashMap;
use proptest::prelude::*;

const POOL: [&str; 8] = ["EUR", "GBP", "INR", "JPY", "PKR", "CHF", "CAD", "AUD"];

fn code(s: &str) -> CurrencyCode {
    CurrencyCode::new(s).unwrap()
}

fn ts() -> Timestamp {
    NaiveDate::from_ymd_opt(2024, 5, 2)
        .unwrap()
        .and_hms_opt(8, 15, 0)
        .unwrap()
}

/// Rates that are either usable or one of the rejected shapes
fn any_rate() -> impl Strategy<Value = Option<f64>> {
    prop_oneof![
        3 => (1e-6f64..1e6).prop_map(Some),
        1 => Just(Some(0.0)),
        1 => (-1e6f64..-1e-6).prop_map(Some),
        1 => Just(Some(f64::NAN)),
        1 => Just(None),
    ]
}

proptest! {
    #[test]
    fn display_line_has_two_decimals(rate in 1e-4f64..1e7, idx in 0usize..POOL.len()) {
        let line = format_rate_line(&code("USD"), &code(POOL[idx]), rate);

        let expected_prefix = "1 USD = ";
        let expected_suffix = format!(" {}", POOL[idx]);
        prop_assert!(line.starts_with(expected_prefix));
        prop_assert!(line.ends_with(&expected_suffix));

        let number = &line[expected_prefix.len()..line.len() - expected_suffix.len()];
        let decimals = number.split('.').nth(1).map(str::len);
        prop_assert_eq!(decimals, Some(2));
        prop_assert!((number.parse::<f64>().unwrap() - rate).abs() <= 0.005 + rate * 1e-12);
    }

    #[test]
    fn only_positive_rates_are_logged(rates in prop::collection::vec(any_rate(), POOL.len())) {
        let targets: Vec<CurrencyCode> = POOL.iter().map(|c| code(c)).collect();
        let table: HashMap<CurrencyCode, f64> = targets
            .iter()
            .zip(&rates)
            .filter_map(|(c, r)| r.map(|r| (c.clone(), r)))
            .collect();
        let snapshot = RateSnapshot::new(code("USD"), table);

        let mut sheet = InMemoryWorksheet::new("log");
        let report = ObservationLogger::default()
            .append_at(&mut sheet, ts(), &code("USD"), &targets, &snapshot)
            .unwrap();

        let valid = rates
            .iter()
            .filter(|r| matches!(r, Some(v) if v.is_finite() && *v > 0.0))
            .count();
        let rows = sheet.rows();

        prop_assert_eq!(report.written.len(), valid);
        prop_assert_eq!(report.skipped.len(), POOL.len() - valid);
        prop_assert_eq!(rows.len(), 1 + valid);
        for row in &rows[1..] {
            prop_assert_eq!(row[0].as_str(), "2024-05-02 08:15:00");
            prop_assert_eq!(row[1].as_str(), "USD");
            prop_assert!(row[3].parse::<f64>().unwrap() > 0.0);
        }
    }

    #[test]
    fn header_stays_single(passes in 1usize..5) {
        let mut sheet = InMemoryWorksheet::new("log");
        let logger = ObservationLogger::default();
        for _ in 0..passes {
            logger.ensure_header(&mut sheet).unwrap();
        }
        prop_assert_eq!(sheet.rows().len(), 1);
    }
}
