//! ExchangeRate-API client against a mock server

use anyhow::Result;
use approx::assert_relative_eq;
use currency_dashboard::currency::CurrencyCode;
use currency_dashboard::error::DashboardError;
use currency_dashboard::sources::{ExchangeRateApiClient, RateSource};

fn code(s: &str) -> CurrencyCode {
    CurrencyCode::new(s).unwrap()
}

fn client(server: &mockito::Server) -> ExchangeRateApiClient {
    ExchangeRateApiClient::new_with_url("test_key".to_string(), format!("{}/v6", server.url()))
        .unwrap()
}

const USD_BODY: &str = r#"{
    "result": "success",
    "base_code": "USD",
    "time_last_update_unix": 1714608001,
    "conversion_rates": {"USD": 1, "EUR": 0.92, "PKR": 278.5, "GBP": 0.79}
}"#;

#[tokio::test]
async fn test_latest_rates_success() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/v6/test_key/latest/USD")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(USD_BODY)
        .create_async()
        .await;

    let snapshot = client(&server).latest_rates(&code("USD")).await?;

    mock.assert_async().await;
    assert_eq!(snapshot.base, code("USD"));
    assert_eq!(snapshot.len(), 4);
    assert_relative_eq!(snapshot.get(&code("PKR")).unwrap(), 278.5);
    assert_eq!(snapshot.retrieved_at.timestamp(), 1714608001);

    Ok(())
}

#[tokio::test]
async fn test_supported_currencies_uses_universe_base() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/v6/test_key/latest/EUR")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"result": "success", "base_code": "EUR",
                "conversion_rates": {"EUR": 1, "USD": 1.08, "CHF": 0.97}}"#,
        )
        .create_async()
        .await;

    let universe = client(&server)
        .with_universe_base(code("EUR"))
        .supported_currencies()
        .await?;

    mock.assert_async().await;
    assert_eq!(
        universe.into_iter().collect::<Vec<_>>(),
        vec![code("CHF"), code("EUR"), code("USD")]
    );

    Ok(())
}

#[tokio::test]
async fn test_error_result_is_source_unavailable() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/v6/test_key/latest/USD")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"result": "error", "error-type": "invalid-key"}"#)
        .create_async()
        .await;

    let err = client(&server)
        .latest_rates(&code("USD"))
        .await
        .unwrap_err();

    assert!(matches!(err, DashboardError::SourceUnavailable(_)));
    assert!(err.to_string().contains("invalid-key"));

    Ok(())
}

#[tokio::test]
async fn test_http_error_status() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/v6/test_key/latest/USD")
        .with_status(503)
        .create_async()
        .await;

    let err = client(&server)
        .latest_rates(&code("USD"))
        .await
        .unwrap_err();

    assert!(matches!(err, DashboardError::SourceUnavailable(_)));
    assert!(err.to_string().contains("503"));

    Ok(())
}

#[tokio::test]
async fn test_malformed_body() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/v6/test_key/latest/USD")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("<html>maintenance</html>")
        .create_async()
        .await;

    let result = client(&server).latest_rates(&code("USD")).await;
    assert!(matches!(result, Err(DashboardError::SourceUnavailable(_))));

    Ok(())
}

#[tokio::test]
async fn test_empty_rates_rejected() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/v6/test_key/latest/USD")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"result": "success", "conversion_rates": {"bogus": 1.0}}"#)
        .create_async()
        .await;

    let result = client(&server).latest_rates(&code("USD")).await;
    assert!(matches!(result, Err(DashboardError::SourceUnavailable(_))));

    Ok(())
}

#[tokio::test]
async fn test_api_key_not_leaked_in_errors() -> Result<()> {
    let client = ExchangeRateApiClient::new_with_url(
        "secret_key".to_string(),
        "http://127.0.0.1:1/v6".to_string(),
    )?;

    let err = client.latest_rates(&code("USD")).await.unwrap_err();
    assert!(matches!(err, DashboardError::SourceUnavailable(_)));
    assert!(!err.to_string().contains("secret_key"));

    Ok(())
}
