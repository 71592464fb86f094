/// Average True Range (ATR) indicator
///
/// Measures market volatility by averaging true ranges over a period.
/// True Range is the greatest of:
/// - Current High - Current Low
/// - Abs(Current High - Previous Close)
/// - Abs(Current Low - Previous Close)
///
/// Uses Wilder's smoothing (same as RSI) for the moving average.

use crate::models::Candle;

/// True range per candle; the first candle has no previous close and uses high - low
pub fn true_ranges(candles: &[Candle]) -> Vec<f64> {
    candles
        .iter()
        .enumerate()
        .map(|(i, candle)| {
            let range = (candle.high - candle.low).abs();
            match i.checked_sub(1).map(|p| candles[p].close) {
                Some(prev_close) => range
                    .max((candle.high - prev_close).abs())
                    .max((candle.low - prev_close).abs()),
                None => range,
            }
        })
        .collect()
}

/// ATR series aligned with the candles
pub fn calculate_atr_series(candles: &[Candle], period: usize) -> Vec<f64> {
    let alpha = 1.0 / period.max(1) as f64;
    let mut series = Vec::with_capacity(candles.len());

    let mut atr: Option<f64> = None;
    for tr in true_ranges(candles) {
        let next = match atr {
            Some(prev) => prev + alpha * (tr - prev),
            None => tr,
        };
        atr = Some(next);
        series.push(next);
    }

    series
}

/// Calculate ATR for the given candles
///
/// Returns the current ATR value, or None if insufficient data
pub fn calculate_atr(candles: &[Candle], period: usize) -> Option<f64> {
    if candles.len() < period + 1 {
        return None;
    }

    calculate_atr_series(candles, period).last().copied()
}
