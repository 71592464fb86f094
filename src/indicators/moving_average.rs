/// Calculate Simple Moving Average (SMA)
pub fn calculate_sma(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period {
        return None;
    }

    let sum: f64 = prices.iter().rev().take(period).sum();
    Some(sum / period as f64)
}

/// Exponential Moving Average series with alpha = 2 / (span + 1)
///
/// Seeded with the first price, so the output is aligned with the input.
pub fn ema_series(prices: &[f64], span: usize) -> Vec<f64> {
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut series = Vec::with_capacity(prices.len());

    let mut ema = match prices.first() {
        Some(first) => *first,
        None => return series,
    };

    for price in prices {
        ema += alpha * (price - ema);
        series.push(ema);
    }

    series
}

/// Calculate Exponential Moving Average (EMA)
pub fn calculate_ema(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period {
        return None;
    }

    ema_series(prices, period).last().copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sma() {
        let prices = vec![100.0, 102.0, 104.0, 106.0, 108.0];
        let sma = calculate_sma(&prices, 5);
        assert_eq!(sma, Some(104.0));
    }

    #[test]
    fn test_sma_insufficient_data() {
        let prices = vec![100.0, 102.0];
        let sma = calculate_sma(&prices, 5);
        assert!(sma.is_none());
    }

    #[test]
    fn test_ema() {
        let prices = vec![100.0, 102.0, 104.0, 106.0, 108.0, 110.0];
        let ema = calculate_ema(&prices, 5);
        assert!(ema.is_some());
        // Lags the last price but weights recent bars more than the SMA
        let ema = ema.unwrap();
        assert!(ema > 106.0 && ema < 110.0);
    }

    #[test]
    fn test_ema_constant_series() {
        let series = ema_series(&[50.0; 10], 20);
        assert_eq!(series.len(), 10);
        assert!(series.iter().all(|v| (*v - 50.0).abs() < 1e-12));
    }
}
