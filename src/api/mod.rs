pub mod yahoo;

pub use yahoo::YahooClient;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::{Candle, ChainSnapshot};

/// Source of underlying candles and option chains
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// OHLCV history, oldest first
    async fn candles(&self, symbol: &str, interval: &str, lookback_days: u32)
        -> Result<Vec<Candle>>;

    /// Listed option expirations, ascending
    async fn option_expirations(&self, symbol: &str) -> Result<Vec<NaiveDate>>;

    /// Calls and puts for one expiry plus the current underlying price
    async fn option_quotes(&self, symbol: &str, expiry: NaiveDate) -> Result<ChainSnapshot>;
}
