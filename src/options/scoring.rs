//! Expected-value scoring and tiering of option contracts.
//!
//! Each contract gets a second-order greek estimate of its price change over
//! the forecast horizon. Greeks and ROI are min-max normalized across the
//! whole candidate set, blended by weight and penalized for wide markets.

use serde::{Deserialize, Serialize};

use crate::models::OptionContract;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreConfig {
    pub w_delta: f64,
    pub w_gamma: f64,
    pub w_theta: f64,
    pub w_vega: f64,
    pub w_exp_roi: f64,
    /// Subtracted per unit of spread_pct
    pub penalty_wide_spread: f64,
    pub tier1_min: f64,
    pub tier2_min: f64,
    /// Size of the fallback watchlist
    pub watch_size: usize,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            w_delta: 0.35,
            w_gamma: 0.10,
            w_theta: 0.10,
            w_vega: 0.15,
            w_exp_roi: 0.30,
            penalty_wide_spread: 0.10,
            tier1_min: 0.65,
            tier2_min: 0.45,
            watch_size: 5,
        }
    }
}

impl ScoreConfig {
    fn weight_sum(&self) -> f64 {
        self.w_delta + self.w_gamma + self.w_theta + self.w_vega + self.w_exp_roi
    }
}

/// Scored contracts split into tiers; `all` holds the full ranking
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RankedContracts {
    pub tier1: Vec<OptionContract>,
    pub tier2: Vec<OptionContract>,
    pub watch: Vec<OptionContract>,
    pub all: Vec<OptionContract>,
}

impl RankedContracts {
    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }
}

/// Δ·dS + ½Γ·dS² + θ·(h/24) + vega·dIV
pub fn expected_change(contract: &OptionContract) -> f64 {
    let g = &contract.greeks;
    let ds = contract.exp_ds;

    g.delta * ds
        + 0.5 * g.gamma * ds * ds
        + g.theta_day * (contract.horizon_h / 24.0)
        + g.vega * contract.exp_div_pts
}

/// Min-max scale to [0, 1]; a constant series maps to 0.5
pub fn normalize(values: &[f64]) -> Vec<f64> {
    let (lo, hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });

    let range = hi - lo;
    if !(range.is_finite() && range > 0.0) {
        return vec![0.5; values.len()];
    }

    values.iter().map(|v| (v - lo) / range).collect()
}

/// Score, rank and tier a candidate set
pub fn score_contracts(contracts: Vec<OptionContract>, config: &ScoreConfig) -> RankedContracts {
    let mut scored: Vec<OptionContract> = contracts
        .into_iter()
        .filter_map(|mut c| {
            let change = expected_change(&c);
            let roi = change / c.mid * 100.0;
            if !(change.is_finite() && roi.is_finite()) {
                tracing::debug!("Dropping {}: non-finite expected change", c.quote.contract_symbol);
                return None;
            }
            c.exp_change = Some(change);
            c.exp_roi = Some(roi);
            c.target_price = Some((c.mid + change).max(0.0));
            Some(c)
        })
        .collect();

    if scored.is_empty() {
        return RankedContracts::default();
    }

    let column = |f: fn(&OptionContract) -> f64| normalize(&scored.iter().map(f).collect::<Vec<_>>());
    let n_delta = column(|c| c.greeks.delta.abs());
    let n_gamma = column(|c| c.greeks.gamma);
    let n_theta = column(|c| c.greeks.theta_day);
    let n_vega = column(|c| c.greeks.vega);
    let n_roi = column(|c| c.exp_roi.unwrap_or(0.0));

    let weight_sum = config.weight_sum();
    for (i, c) in scored.iter_mut().enumerate() {
        let blended = if weight_sum > 0.0 {
            (config.w_delta * n_delta[i]
                + config.w_gamma * n_gamma[i]
                + config.w_theta * n_theta[i]
                + config.w_vega * n_vega[i]
                + config.w_exp_roi * n_roi[i])
                / weight_sum
        } else {
            0.0
        };
        let score = blended - config.penalty_wide_spread * c.spread_pct;
        c.score = Some(score.clamp(0.0, 1.0));
    }

    scored.sort_by(|a, b| {
        let score = |c: &OptionContract| c.score.unwrap_or(0.0);
        let roi = |c: &OptionContract| c.exp_roi.unwrap_or(0.0);
        score(b)
            .total_cmp(&score(a))
            .then_with(|| roi(b).total_cmp(&roi(a)))
    });

    let mut ranked = RankedContracts {
        all: scored.clone(),
        ..RankedContracts::default()
    };

    for c in scored {
        let score = c.score.unwrap_or(0.0);
        let profitable = c.exp_roi.is_some_and(|r| r > 0.0);

        if profitable && score >= config.tier1_min {
            ranked.tier1.push(c);
        } else if profitable && score >= config.tier2_min {
            ranked.tier2.push(c);
        } else if ranked.watch.len() < config.watch_size {
            ranked.watch.push(c);
        }
    }

    tracing::debug!(
        "Ranked {} contracts: {} tier1, {} tier2, {} watch",
        ranked.all.len(),
        ranked.tier1.len(),
        ranked.tier2.len(),
        ranked.watch.len()
    );

    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Greeks, OptionType};
    use crate::options::fixtures::contract;

    fn with_forecast(mut c: OptionContract, exp_ds: f64, exp_div_pts: f64) -> OptionContract {
        c.exp_ds = exp_ds;
        c.exp_div_pts = exp_div_pts;
        c.horizon_h = 2.0;
        c
    }

    #[test]
    fn test_expected_change() {
        let c = with_forecast(contract("SPY", OptionType::Call, 500.0, 2.0, 2.1), 2.0, 0.5);
        // 0.5*2 + 0.5*0.02*4 - 0.05*2/24 + 0.10*0.5
        let expected = 1.0 + 0.04 - 0.05 / 12.0 + 0.05;
        assert!((expected_change(&c) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_put_gains_on_down_move() {
        let put = with_forecast(contract("SPY", OptionType::Put, 500.0, 2.0, 2.1), -2.0, 0.0);
        assert!(expected_change(&put) > 0.0);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(&[1.0, 2.0, 3.0]), vec![0.0, 0.5, 1.0]);
        assert_eq!(normalize(&[2.0, 2.0]), vec![0.5, 0.5]);
        assert!(normalize(&[]).is_empty());
    }

    #[test]
    fn test_dominant_contract_ranks_first() {
        let mut strong = with_forecast(contract("AAPL", OptionType::Call, 200.0, 2.0, 2.1), 2.0, 0.0);
        strong.greeks = Greeks {
            delta: 0.6,
            gamma: 0.03,
            theta_day: -0.02,
            vega: 0.12,
            rho: 0.0,
        };
        let mut weak = with_forecast(contract("AAPL", OptionType::Call, 210.0, 2.0, 2.1), 2.0, 0.0);
        weak.greeks = Greeks {
            delta: 0.3,
            gamma: 0.01,
            theta_day: -0.06,
            vega: 0.05,
            rho: 0.0,
        };

        let ranked = score_contracts(vec![weak, strong], &ScoreConfig::default());

        assert_eq!(ranked.all.len(), 2);
        let top = &ranked.all[0];
        assert_eq!(top.quote.strike, 200.0);
        let expected = 1.0 - 0.10 * top.spread_pct;
        assert!((top.score.unwrap() - expected).abs() < 1e-12);
        assert_eq!(ranked.all[1].score, Some(0.0));

        assert_eq!(ranked.tier1.len(), 1);
        assert!(ranked.tier2.is_empty());
        assert_eq!(ranked.watch.len(), 1);
        assert_eq!(ranked.watch[0].quote.strike, 210.0);
    }

    #[test]
    fn test_target_price_floored_at_zero() {
        let c = with_forecast(contract("F", OptionType::Call, 12.0, 0.20, 0.22), -10.0, -2.0);
        let ranked = score_contracts(vec![c], &ScoreConfig::default());
        let c = &ranked.all[0];
        assert!(c.exp_change.unwrap() < 0.0);
        assert_eq!(c.target_price, Some(0.0));
        // Negative ROI never reaches a tier
        assert!(ranked.tier1.is_empty() && ranked.tier2.is_empty());
        assert_eq!(ranked.watch.len(), 1);
    }

    #[test]
    fn test_tiers_disjoint_and_watch_capped() {
        let contracts: Vec<OptionContract> = (0..12)
            .map(|i| {
                let mut c = with_forecast(
                    contract("TSLA", OptionType::Call, 300.0 + i as f64, 2.0, 2.1 + 0.05 * i as f64),
                    if i % 3 == 0 { -1.0 } else { 1.5 },
                    0.0,
                );
                c.greeks.delta = 0.3 + 0.03 * i as f64;
                c
            })
            .collect();

        let ranked = score_contracts(contracts, &ScoreConfig::default());

        assert_eq!(ranked.all.len(), 12);
        assert!(ranked.watch.len() <= 5);
        for pair in ranked.all.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        for c in &ranked.all {
            let s = c.score.unwrap();
            assert!((0.0..=1.0).contains(&s));
        }

        let mut seen: Vec<&str> = ranked
            .tier1
            .iter()
            .chain(&ranked.tier2)
            .chain(&ranked.watch)
            .map(|c| c.quote.contract_symbol.as_str())
            .collect();
        let total = seen.len();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), total);
    }

    #[test]
    fn test_empty_input() {
        assert!(score_contracts(Vec::new(), &ScoreConfig::default()).is_empty());
    }
}
