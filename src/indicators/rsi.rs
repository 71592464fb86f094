/// RSI reported when there are no losses to measure against
pub const NEUTRAL_RSI: f64 = 50.0;

/// Calculate the Relative Strength Index (RSI) series
///
/// RSI measures the magnitude of recent price changes to evaluate
/// overbought or oversold conditions.
///
/// Uses Wilder's smoothing: an exponential average with alpha = 1/period,
/// seeded with the first price change. The first bar has no change and is
/// reported as neutral, as is any bar whose average loss is zero.
///
/// Values:
/// - RSI > 70: Overbought
/// - RSI < 30: Oversold
///
pub fn rsi_series(prices: &[f64], period: usize) -> Vec<f64> {
    let mut series = Vec::with_capacity(prices.len());
    if prices.is_empty() {
        return series;
    }
    series.push(NEUTRAL_RSI);

    let alpha = 1.0 / period.max(1) as f64;
    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;

    for (i, window) in prices.windows(2).enumerate() {
        let change = window[1] - window[0];
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);

        if i == 0 {
            avg_gain = gain;
            avg_loss = loss;
        } else {
            avg_gain += alpha * (gain - avg_gain);
            avg_loss += alpha * (loss - avg_loss);
        }

        series.push(rsi_from_averages(avg_gain, avg_loss));
    }

    series
}

/// Calculate the latest RSI value
///
/// Returns None when there are fewer than `period + 1` prices.
pub fn calculate_rsi(prices: &[f64], period: usize) -> Option<f64> {
    if prices.len() < period + 1 {
        return None;
    }

    rsi_series(prices, period).last().copied()
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return NEUTRAL_RSI;
    }

    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}
