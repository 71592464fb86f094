use std::time::Duration;

use chrono::NaiveDate;
use mockito::Matcher;
use optionpro::api::{MarketDataProvider, YahooClient};
use optionpro::OptionType;

const CHART: &str = r#"{
    "chart": {
        "result": [{
            "timestamp": [1720540800, 1720533600, 1720537200],
            "indicators": {"quote": [{
                "open":   [101.0, 100.0, null],
                "high":   [102.0, 101.0, null],
                "low":    [100.5, 99.5,  null],
                "close":  [101.5, 100.5, null],
                "volume": [1200,  1000,  null]
            }]}
        }],
        "error": null
    }
}"#;

const OPTIONS: &str = r#"{
    "optionChain": {
        "result": [{
            "expirationDates": [1721347200, 1720742400],
            "quote": {"regularMarketPrice": 190.25},
            "options": [{
                "calls": [{"contractSymbol": "AAPL240719C00190000", "strike": 190.0,
                           "bid": 3.0, "ask": 3.2, "volume": 500,
                           "openInterest": 1200, "impliedVolatility": 0.24}],
                "puts":  [{"contractSymbol": "AAPL240719P00185000", "strike": 185.0,
                           "bid": 1.1, "ask": 1.2, "openInterest": 800,
                           "impliedVolatility": 0.26}]
            }]
        }],
        "error": null
    }
}"#;

fn client(url: &str) -> YahooClient {
    YahooClient::with_base_url(url, 6_000)
        .unwrap()
        .with_backoff(Duration::from_millis(5))
}

#[tokio::test]
async fn test_candles_sorted_and_nulls_skipped() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/v8/finance/chart/AAPL")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("interval".into(), "1h".into()),
            Matcher::UrlEncoded("includePrePost".into(), "false".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(CHART)
        .create_async()
        .await;

    let candles = client(&server.url()).candles("AAPL", "1h", 5).await.unwrap();

    mock.assert_async().await;
    assert_eq!(candles.len(), 2);
    assert_eq!(candles[0].close, 100.5);
    assert_eq!(candles[1].close, 101.5);
    assert_eq!(candles[0].symbol, "AAPL");
}

#[tokio::test]
async fn test_option_chain_flow() {
    let mut server = mockito::Server::new_async().await;
    let expiry = NaiveDate::from_ymd_opt(2024, 7, 19).unwrap();

    let mock = server
        .mock("GET", "/v7/finance/options/AAPL")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(OPTIONS)
        .expect(2)
        .create_async()
        .await;

    let yahoo = client(&server.url());
    let expirations = yahoo.option_expirations("AAPL").await.unwrap();
    assert_eq!(
        expirations,
        vec![NaiveDate::from_ymd_opt(2024, 7, 12).unwrap(), expiry]
    );

    let chain = yahoo.option_quotes("AAPL", expiry).await.unwrap();
    assert_eq!(chain.spot, 190.25);
    assert_eq!(chain.quotes.len(), 2);
    assert_eq!(chain.quotes[1].option_type, OptionType::Put);
    assert_eq!(chain.quotes[1].strike, 185.0);

    mock.assert_async().await;
}

#[tokio::test]
async fn test_client_error_not_retried() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/v8/finance/chart/NOPE")
        .match_query(Matcher::Any)
        .with_status(404)
        .with_body("Not Found")
        .expect(1)
        .create_async()
        .await;

    let err = client(&server.url())
        .candles("NOPE", "1h", 5)
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert!(err.to_string().contains("404"));
}

#[tokio::test]
async fn test_server_error_retried() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/v8/finance/chart/SPY")
        .match_query(Matcher::Any)
        .with_status(503)
        .expect(3)
        .create_async()
        .await;

    let result = client(&server.url()).candles("SPY", "1h", 5).await;

    mock.assert_async().await;
    assert!(result.is_err());
}
