use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::Deserialize;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use super::MarketDataProvider;
use crate::models::{Candle, ChainSnapshot, OptionQuote, OptionType};

pub const YAHOO_API_BASE: &str = "https://query2.finance.yahoo.com";
pub const DEFAULT_RATE_LIMIT_RPM: u32 = 60;
const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 1000;
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

type YahooRateLimiter = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Yahoo Finance client for chart history and option chains
///
/// Cloneable; all clones share the same rate limiter.
#[derive(Clone)]
pub struct YahooClient {
    client: Client,
    base_url: String,
    rate_limiter: Arc<YahooRateLimiter>,
    initial_backoff: Duration,
}

// ============== Response Types ==============

#[derive(Debug, Deserialize)]
struct YahooError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    result: Option<Vec<ChartResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteSeries>,
}

#[derive(Debug, Deserialize, Default)]
struct QuoteSeries {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OptionsResponse {
    #[serde(rename = "optionChain")]
    option_chain: OptionsEnvelope,
}

#[derive(Debug, Deserialize)]
struct OptionsEnvelope {
    result: Option<Vec<OptionsResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionsResult {
    #[serde(default)]
    expiration_dates: Vec<i64>,
    quote: Option<UnderlyingQuote>,
    #[serde(default)]
    options: Vec<OptionsByExpiry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UnderlyingQuote {
    regular_market_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OptionsByExpiry {
    #[serde(default)]
    calls: Vec<RawContract>,
    #[serde(default)]
    puts: Vec<RawContract>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawContract {
    contract_symbol: String,
    strike: f64,
    last_price: Option<f64>,
    bid: Option<f64>,
    ask: Option<f64>,
    volume: Option<u64>,
    open_interest: Option<u64>,
    implied_volatility: Option<f64>,
}

impl RawContract {
    fn into_quote(self, symbol: &str, expiry: NaiveDate, option_type: OptionType) -> OptionQuote {
        OptionQuote {
            symbol: symbol.to_string(),
            contract_symbol: self.contract_symbol,
            expiry,
            option_type,
            strike: self.strike,
            bid: self.bid.unwrap_or(0.0),
            ask: self.ask.unwrap_or(0.0),
            last_price: self.last_price.unwrap_or(0.0),
            volume: self.volume.unwrap_or(0),
            open_interest: self.open_interest.unwrap_or(0),
            implied_volatility: self.implied_volatility.unwrap_or(0.0),
        }
    }
}

// ============== Parsing ==============

fn describe(error: Option<YahooError>) -> String {
    error
        .map(|e| format!("{}: {}", e.code, e.description))
        .unwrap_or_else(|| "empty result".to_string())
}

fn epoch_to_date(epoch: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(epoch, 0).map(|dt| dt.date_naive())
}

/// Convert a chart response into candles; bars with missing prices are skipped
pub(crate) fn parse_chart(symbol: &str, response: ChartResponse) -> Result<Vec<Candle>> {
    let result = match response.chart.result.and_then(|r| r.into_iter().next()) {
        Some(result) => result,
        None => anyhow::bail!(
            "Yahoo chart error for {}: {}",
            symbol,
            describe(response.chart.error)
        ),
    };

    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let field = |series: &[Option<f64>], i: usize| series.get(i).copied().flatten();

    let mut candles: Vec<Candle> = result
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| {
            let close = field(&quote.close, i).filter(|c| c.is_finite() && *c > 0.0)?;
            Some(Candle {
                symbol: symbol.to_string(),
                timestamp: DateTime::from_timestamp(ts, 0)?,
                open: field(&quote.open, i).unwrap_or(close),
                high: field(&quote.high, i).unwrap_or(close),
                low: field(&quote.low, i).unwrap_or(close),
                close,
                volume: field(&quote.volume, i).unwrap_or(0.0),
            })
        })
        .collect();

    candles.sort_by_key(|c| c.timestamp);
    Ok(candles)
}

fn first_options_result(symbol: &str, response: OptionsResponse) -> Result<OptionsResult> {
    let envelope = response.option_chain;
    match envelope.result.and_then(|r| r.into_iter().next()) {
        Some(result) => Ok(result),
        None => anyhow::bail!(
            "Yahoo options error for {}: {}",
            symbol,
            describe(envelope.error)
        ),
    }
}

pub(crate) fn parse_expirations(symbol: &str, response: OptionsResponse) -> Result<Vec<NaiveDate>> {
    let result = first_options_result(symbol, response)?;
    let mut dates: Vec<NaiveDate> = result
        .expiration_dates
        .into_iter()
        .filter_map(epoch_to_date)
        .collect();
    dates.sort();
    dates.dedup();
    Ok(dates)
}

pub(crate) fn parse_option_chain(
    symbol: &str,
    expiry: NaiveDate,
    response: OptionsResponse,
) -> Result<ChainSnapshot> {
    let result = first_options_result(symbol, response)?;

    let spot = result
        .quote
        .and_then(|q| q.regular_market_price)
        .with_context(|| format!("No underlying price in option chain for {}", symbol))?;

    let mut quotes = Vec::new();
    for group in result.options {
        quotes.extend(
            group
                .calls
                .into_iter()
                .map(|c| c.into_quote(symbol, expiry, OptionType::Call)),
        );
        quotes.extend(
            group
                .puts
                .into_iter()
                .map(|p| p.into_quote(symbol, expiry, OptionType::Put)),
        );
    }

    Ok(ChainSnapshot { spot, quotes })
}

// ============== Implementation ==============

impl YahooClient {
    /// Create a client against the public Yahoo Finance API
    pub fn new() -> Result<Self> {
        Self::with_base_url(YAHOO_API_BASE, DEFAULT_RATE_LIMIT_RPM)
    }

    /// Create a client against another base URL (mirrors, test servers)
    pub fn with_base_url(base_url: &str, requests_per_minute: u32) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        let rpm = NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_minute(rpm)));

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            rate_limiter,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
        })
    }

    /// Override the first retry delay (doubles on each attempt)
    pub fn with_backoff(mut self, initial_backoff: Duration) -> Self {
        self.initial_backoff = initial_backoff;
        self
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.initial_backoff * 2u32.pow(attempt.saturating_sub(1))
    }

    /// Make a rate-limited API request with retry logic
    async fn make_request(&self, url: &str) -> Result<reqwest::Response> {
        for attempt in 1..=MAX_RETRIES {
            self.rate_limiter.until_ready().await;

            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return Ok(response);
                    }

                    if status.as_u16() == 429 || status.is_server_error() {
                        let backoff = self.backoff(attempt);
                        tracing::warn!(
                            "Yahoo returned {}, retrying in {:?} (attempt {}/{})",
                            status,
                            backoff,
                            attempt,
                            MAX_RETRIES
                        );
                        if attempt < MAX_RETRIES {
                            tokio::time::sleep(backoff).await;
                        }
                        continue;
                    }

                    // Other errors (4xx) - don't retry
                    let error_text = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());
                    anyhow::bail!("Yahoo API error ({}): {}", status, error_text);
                }
                Err(e) if attempt < MAX_RETRIES => {
                    let backoff = self.backoff(attempt);
                    tracing::warn!(
                        "Network error: {}, retrying in {:?} (attempt {}/{})",
                        e,
                        backoff,
                        attempt,
                        MAX_RETRIES
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => anyhow::bail!("Network error after {} retries: {}", MAX_RETRIES, e),
            }
        }

        anyhow::bail!("Failed after {} retries", MAX_RETRIES)
    }

    /// Fetch chart history between two instants
    pub async fn get_chart(
        &self,
        symbol: &str,
        interval: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Candle>> {
        let url = format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval={}&includePrePost=false",
            self.base_url,
            symbol,
            start.timestamp(),
            end.timestamp(),
            interval
        );

        tracing::debug!("Fetching {} chart for {} ({} .. {})", interval, symbol, start, end);

        let response = self.make_request(&url).await?;
        let data: ChartResponse = response
            .json()
            .await
            .with_context(|| format!("Failed to parse chart for {}", symbol))?;

        let candles = parse_chart(symbol, data)?;
        tracing::debug!("Fetched {} candles for {}", candles.len(), symbol);
        Ok(candles)
    }

    async fn get_options(&self, symbol: &str, expiry: Option<NaiveDate>) -> Result<OptionsResponse> {
        let mut url = format!("{}/v7/finance/options/{}", self.base_url, symbol);
        if let Some(expiry) = expiry {
            let epoch = expiry.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp());
            if let Some(epoch) = epoch {
                url.push_str(&format!("?date={}", epoch));
            }
        }

        let response = self.make_request(&url).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse option chain for {}", symbol))
    }
}

#[async_trait]
impl MarketDataProvider for YahooClient {
    async fn candles(
        &self,
        symbol: &str,
        interval: &str,
        lookback_days: u32,
    ) -> Result<Vec<Candle>> {
        let end = Utc::now();
        let start = end - ChronoDuration::days(i64::from(lookback_days));
        self.get_chart(symbol, interval, start, end).await
    }

    async fn option_expirations(&self, symbol: &str) -> Result<Vec<NaiveDate>> {
        let response = self.get_options(symbol, None).await?;
        parse_expirations(symbol, response)
    }

    async fn option_quotes(&self, symbol: &str, expiry: NaiveDate) -> Result<ChainSnapshot> {
        let response = self.get_options(symbol, Some(expiry)).await?;
        parse_option_chain(symbol, expiry, response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chart_skips_null_bars() {
        let json = r#"{
            "chart": {
                "result": [{
                    "timestamp": [1720533600, 1720537200, 1720540800],
                    "indicators": {"quote": [{
                        "open":   [100.0, null, 101.0],
                        "high":   [101.0, null, 102.0],
                        "low":    [99.5,  null, 100.5],
                        "close":  [100.5, null, 101.5],
                        "volume": [1000,  null, 1200]
                    }]}
                }],
                "error": null
            }
        }"#;
        let response: ChartResponse = serde_json::from_str(json).unwrap();
        let candles = parse_chart("AAPL", response).unwrap();

        assert_eq!(candles.len(), 2);
        assert_eq!(candles[1].close, 101.5);
        assert_eq!(candles[1].volume, 1200.0);
        assert!(candles[0].timestamp < candles[1].timestamp);
    }

    #[test]
    fn test_parse_chart_error() {
        let json = r#"{"chart": {"result": null, "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}}}"#;
        let response: ChartResponse = serde_json::from_str(json).unwrap();
        let err = parse_chart("ZZZZ", response).unwrap_err();
        assert!(err.to_string().contains("delisted"));
    }

    #[test]
    fn test_parse_option_chain() {
        let json = r#"{
            "optionChain": {
                "result": [{
                    "underlyingSymbol": "AAPL",
                    "expirationDates": [1721347200, 1720742400],
                    "quote": {"regularMarketPrice": 190.25},
                    "options": [{
                        "expirationDate": 1721347200,
                        "calls": [{"contractSymbol": "AAPL240719C00190000", "strike": 190.0,
                                   "lastPrice": 3.1, "bid": 3.0, "ask": 3.2, "volume": 500,
                                   "openInterest": 1200, "impliedVolatility": 0.24}],
                        "puts":  [{"contractSymbol": "AAPL240719P00190000", "strike": 190.0,
                                   "bid": 2.8, "ask": 3.0, "impliedVolatility": 0.25}]
                    }]
                }],
                "error": null
            }
        }"#;

        let expiry = NaiveDate::from_ymd_opt(2024, 7, 19).unwrap();
        let response: OptionsResponse = serde_json::from_str(json).unwrap();
        let chain = parse_option_chain("AAPL", expiry, response).unwrap();

        assert_eq!(chain.spot, 190.25);
        assert_eq!(chain.quotes.len(), 2);
        assert_eq!(chain.quotes[0].option_type, OptionType::Call);
        assert_eq!(chain.quotes[0].open_interest, 1200);
        assert_eq!(chain.quotes[1].option_type, OptionType::Put);
        assert_eq!(chain.quotes[1].volume, 0);
        assert_eq!(chain.quotes[1].expiry, expiry);

        let response: OptionsResponse = serde_json::from_str(json).unwrap();
        let dates = parse_expirations("AAPL", response).unwrap();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2024, 7, 12).unwrap(),
                NaiveDate::from_ymd_opt(2024, 7, 19).unwrap(),
            ]
        );
    }
}
