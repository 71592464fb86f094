//! Per-bar feature frame built from OHLCV candles.
//!
//! Columns mirror what the forecast and scoring steps consume: returns,
//! RSI(14), rolling z-score of close, ATR(14), realized per-bar volatility
//! of log returns and two trend EMAs.

use chrono::{DateTime, Utc};

use crate::error::FeatureError;
use crate::indicators::{
    calculate_atr_series, ema_series, log_returns, pct_returns, rolling_std, rolling_zscore,
    rsi_series,
};
use crate::models::Candle;

pub const RSI_PERIOD: usize = 14;
pub const ATR_PERIOD: usize = 14;
pub const ZSCORE_WINDOW: usize = 20;
pub const RV_WINDOW: usize = 20;
pub const EMA_FAST: usize = 20;
pub const EMA_SLOW: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
    pub ret: Option<f64>,
    pub logret: Option<f64>,
    pub rsi14: f64,
    pub z20: Option<f64>,
    pub atr14: f64,
    pub rv_bar_20: Option<f64>,
    pub ema20: f64,
    pub ema50: f64,
}

/// Candles plus derived features, one row per bar, oldest first
#[derive(Debug, Clone)]
pub struct FeatureFrame {
    pub symbol: String,
    rows: Vec<FeatureRow>,
}

impl FeatureFrame {
    /// Build the frame; does not mutate the candles
    pub fn from_candles(symbol: &str, candles: &[Candle]) -> Result<Self, FeatureError> {
        if candles.is_empty() {
            return Err(FeatureError::Empty(symbol.to_string()));
        }

        if let Some((index, candle)) = candles
            .iter()
            .enumerate()
            .find(|(_, c)| !(c.close.is_finite() && c.close > 0.0))
        {
            return Err(FeatureError::InvalidClose {
                symbol: symbol.to_string(),
                index,
                close: candle.close,
            });
        }

        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();

        let ret = pct_returns(&closes);
        let logret = log_returns(&closes);
        let rsi = rsi_series(&closes, RSI_PERIOD);
        let z20 = rolling_zscore(&closes, ZSCORE_WINDOW, ZSCORE_WINDOW / 2);
        let atr = calculate_atr_series(candles, ATR_PERIOD);
        let rv = rolling_std(&logret, RV_WINDOW, RV_WINDOW / 2);
        let ema_fast = ema_series(&closes, EMA_FAST);
        let ema_slow = ema_series(&closes, EMA_SLOW);

        let rows = candles
            .iter()
            .enumerate()
            .map(|(i, candle)| FeatureRow {
                timestamp: candle.timestamp,
                close: candle.close,
                ret: ret[i],
                logret: logret[i],
                rsi14: rsi[i],
                z20: z20[i],
                atr14: atr[i],
                rv_bar_20: rv[i],
                ema20: ema_fast[i],
                ema50: ema_slow[i],
            })
            .collect();

        Ok(Self {
            symbol: symbol.to_string(),
            rows,
        })
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn last(&self) -> Option<&FeatureRow> {
        self.rows.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.close).collect()
    }

    pub fn log_returns(&self) -> Vec<Option<f64>> {
        self.rows.iter().map(|r| r.logret).collect()
    }
}
