// Forecasting strategy module
pub mod context;
pub mod features;
pub mod signals;

pub use context::{forecast_move, is_market_hours, regime_at, BiasMode, MarketContext, Regime};
pub use features::{FeatureFrame, FeatureRow};
pub use signals::{
    bars_per_hour, latest_snapshot, latest_snapshots, realized_vol, rsi_bias, SignalConfig,
    Snapshot,
};

use crate::models::Candle;
use crate::Result;

/// Base trait for forecasting strategies
pub trait Strategy: Send + Sync {
    /// Forecast the underlying over `horizon_hours` from its candle history
    fn snapshot(&self, symbol: &str, candles: &[Candle], horizon_hours: f64) -> Result<Snapshot>;

    /// Get strategy name
    fn name(&self) -> &str;

    /// Minimum candles required for a clean forecast
    fn min_candles_required(&self) -> usize;
}

/// RSI-weighted z-score mean reversion
#[derive(Debug, Clone)]
pub struct RsiReversionStrategy {
    config: SignalConfig,
    bars_per_hour: u32,
}

impl RsiReversionStrategy {
    pub fn new(config: SignalConfig, interval: &str) -> Self {
        Self {
            config,
            bars_per_hour: bars_per_hour(interval),
        }
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }
}

impl Default for RsiReversionStrategy {
    fn default() -> Self {
        Self::new(SignalConfig::default(), "1h")
    }
}

impl Strategy for RsiReversionStrategy {
    fn snapshot(&self, symbol: &str, candles: &[Candle], horizon_hours: f64) -> Result<Snapshot> {
        let frame = FeatureFrame::from_candles(symbol, candles)?;
        let snapshot = latest_snapshot(&frame, horizon_hours, self.bars_per_hour, &self.config)?;

        tracing::debug!(
            symbol,
            price = snapshot.price,
            rsi = snapshot.rsi14,
            z20 = snapshot.z20,
            exp_ds = snapshot.exp_ds,
            "Forecast snapshot"
        );

        Ok(snapshot)
    }

    fn name(&self) -> &str {
        "rsi_reversion"
    }

    fn min_candles_required(&self) -> usize {
        self.config.min_bars
    }
}
