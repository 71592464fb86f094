// Technical indicators module
// Implements RSI, EMA/SMA, ATR, returns and rolling volatility

pub mod atr;
pub mod moving_average;
pub mod rsi;
pub mod volatility;

pub use atr::{calculate_atr, calculate_atr_series, true_ranges};
pub use moving_average::{calculate_ema, calculate_sma, ema_series};
pub use rsi::{calculate_rsi, rsi_series, NEUTRAL_RSI};
pub use volatility::{
    log_returns, mean, pct_returns, population_std, rolling_std, rolling_zscore, sample_std,
};
