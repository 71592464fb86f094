/// Returns, rolling dispersion and z-scores
///
/// Rolling windows follow the usual "min periods" convention: a window
/// yields a value once it holds at least `min_periods` observations, and
/// missing observations (`None`) are skipped.

/// Simple returns aligned with the input; the first entry is None
pub fn pct_returns(prices: &[f64]) -> Vec<Option<f64>> {
    aligned_changes(prices, |prev, curr| {
        (prev != 0.0).then(|| curr / prev - 1.0)
    })
}

/// Log returns aligned with the input; the first entry is None
pub fn log_returns(prices: &[f64]) -> Vec<Option<f64>> {
    aligned_changes(prices, |prev, curr| {
        (prev > 0.0 && curr > 0.0).then(|| (curr / prev).ln())
    })
}

fn aligned_changes(prices: &[f64], f: impl Fn(f64, f64) -> Option<f64>) -> Vec<Option<f64>> {
    if prices.is_empty() {
        return Vec::new();
    }

    std::iter::once(None)
        .chain(prices.windows(2).map(|w| f(w[0], w[1])))
        .collect()
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (ddof = 0)
pub fn population_std(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    Some(var.sqrt())
}

/// Sample standard deviation (ddof = 1)
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

fn window_values(values: &[Option<f64>], end: usize, window: usize) -> Vec<f64> {
    let start = (end + 1).saturating_sub(window);
    values[start..=end].iter().flatten().copied().collect()
}

/// Rolling population standard deviation
pub fn rolling_std(values: &[Option<f64>], window: usize, min_periods: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            let w = window_values(values, i, window);
            if w.len() < min_periods.max(1) {
                return None;
            }
            population_std(&w)
        })
        .collect()
}

/// Rolling z-score of each value against its own trailing window
///
/// Uses the population standard deviation; a zero deviation yields None.
pub fn rolling_zscore(values: &[f64], window: usize, min_periods: usize) -> Vec<Option<f64>> {
    let wrapped: Vec<Option<f64>> = values.iter().copied().map(Some).collect();

    (0..values.len())
        .map(|i| {
            let w = window_values(&wrapped, i, window);
            if w.len() < min_periods.max(1) {
                return None;
            }
            let m = mean(&w)?;
            let sd = population_std(&w)?;
            (sd > 0.0).then(|| (values[i] - m) / sd)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_returns_alignment() {
        let prices = [100.0, 110.0, 99.0];
        let pct = pct_returns(&prices);
        assert_eq!(pct.len(), 3);
        assert!(pct[0].is_none());
        assert!((pct[1].unwrap() - 0.10).abs() < 1e-12);
        assert!((pct[2].unwrap() + 0.10).abs() < 1e-12);

        let logs = log_returns(&prices);
        assert!((logs[1].unwrap() - (1.1f64).ln()).abs() < 1e-12);
    }

    #[test]
    fn test_population_vs_sample_std() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(population_std(&values), Some(2.0));
        assert!(sample_std(&values).unwrap() > 2.0);
        assert!(sample_std(&[1.0]).is_none());
    }

    #[test]
    fn test_rolling_std_min_periods() {
        let values: Vec<Option<f64>> = (0..30).map(|i| Some(i as f64)).collect();
        let rolled = rolling_std(&values, 20, 10);
        assert!(rolled[8].is_none());
        assert!(rolled[9].is_some());
        assert_eq!(rolled.len(), 30);
    }

    #[test]
    fn test_rolling_std_skips_missing() {
        let values = vec![None, Some(1.0), Some(3.0)];
        let rolled = rolling_std(&values, 3, 2);
        assert_eq!(rolled[2], Some(1.0));
    }

    #[test]
    fn test_rolling_zscore() {
        let mut values = vec![100.0; 19];
        values.push(110.0);
        let z = rolling_zscore(&values, 20, 10);
        assert!(z[19].unwrap() > 4.0);
        // Flat window has zero dispersion
        assert!(z[15].is_none());
    }
}
