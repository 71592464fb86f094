use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::features::FeatureFrame;
use crate::error::FeatureError;
use crate::models::Bias;

/// Configuration for signal generation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// RSI at or below this favours calls
    pub rsi_buy: f64,
    /// RSI at or above this favours puts
    pub rsi_sell: f64,
    /// RSI stretch levels where mean-reversion weight starts to grow
    pub rsi_stretch_low: f64,
    pub rsi_stretch_high: f64,
    /// Below this |z20| a neutral RSI carries no direction of its own
    pub neutral_z_band: f64,
    /// Cap on the z-score magnitude used for the expected move
    pub max_z_magnitude: f64,
    /// Expected implied volatility change in points (clamped to ±2)
    pub iv_revert_pts: f64,
    /// Bars below which the snapshot is flagged with an issue
    pub min_bars: usize,
    /// Skip symbols whose expected move is smaller than this many dollars
    pub min_exp_move: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            rsi_buy: 40.0,
            rsi_sell: 60.0,
            rsi_stretch_low: 35.0,
            rsi_stretch_high: 65.0,
            neutral_z_band: 0.3,
            max_z_magnitude: 2.5,
            iv_revert_pts: 0.5,
            min_bars: 30,
            min_exp_move: 0.15,
        }
    }
}

/// Forecast for the most recent bar of one symbol
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub symbol: String,
    pub bars: usize,
    pub price: f64,
    pub rsi14: f64,
    pub z20: f64,
    pub atr14: f64,
    pub rv_bar_20: Option<f64>,
    /// Horizon volatility in log space
    pub sigma_h_log: f64,
    /// Horizon volatility in dollars
    pub sigma_h_usd: f64,
    /// Expected underlying move over the horizon, in dollars
    pub exp_ds: f64,
    /// Expected IV change, in vol points
    pub exp_div_pts: f64,
    pub horizon_h: f64,
    pub bias: Bias,
    pub issue: Option<String>,
}

/// Map an RSI reading to a directional bias
pub fn rsi_bias(rsi: f64, config: &SignalConfig) -> Bias {
    if rsi <= config.rsi_buy {
        Bias::Bullish
    } else if rsi >= config.rsi_sell {
        Bias::Bearish
    } else {
        Bias::Neutral
    }
}

/// Number of bars per hour for a provider interval string
///
/// Daily and unknown intervals count as one bar per hour.
pub fn bars_per_hour(interval: &str) -> u32 {
    match interval {
        "1m" => 60,
        "2m" => 30,
        "5m" => 12,
        "15m" => 4,
        "30m" => 2,
        "60m" | "1h" => 1,
        _ => 1,
    }
}

/// Horizon volatility of log returns using square-root-of-time scaling
///
/// Uses roughly one trading day of the most recent bars (at least 10).
pub fn realized_vol(log_returns: &[Option<f64>], horizon_hours: f64, bars_per_hour: u32) -> f64 {
    let observed: Vec<f64> = log_returns.iter().flatten().copied().collect();
    if observed.is_empty() {
        return 0.0;
    }

    let bars_per_hour = bars_per_hour.max(1);
    let window = 10.max(bars_per_hour as usize * 6);
    let recent = &observed[observed.len().saturating_sub(window)..];

    let sigma_bar = crate::indicators::population_std(recent).unwrap_or(0.0);
    sigma_bar * (horizon_hours.max(0.0) * bars_per_hour as f64).sqrt()
}

fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Build the forecast snapshot for the latest bar
///
/// Expected move heuristic:
///   exp_dS = weight * min(cap, |z20|) * direction * (price * sigma_h)
/// where the weight grows as RSI stretches beyond its reversion levels and
/// the direction opposes the stretch (or the z-score when RSI is neutral).
pub fn latest_snapshot(
    frame: &FeatureFrame,
    horizon_hours: f64,
    bars_per_hour: u32,
    config: &SignalConfig,
) -> Result<Snapshot, FeatureError> {
    let last = frame
        .last()
        .ok_or_else(|| FeatureError::Empty(frame.symbol.clone()))?;

    let price = last.close;
    let sigma_h_log = realized_vol(&frame.log_returns(), horizon_hours, bars_per_hour);
    let sigma_h_usd = price * sigma_h_log;

    let rsi = last.rsi14;
    let z = last.z20.unwrap_or(0.0);

    let (weight, direction) = if rsi >= config.rsi_stretch_high {
        let room = (100.0 - config.rsi_stretch_high).max(f64::EPSILON);
        (1.0 + (rsi - config.rsi_stretch_high) / room, -1.0)
    } else if rsi <= config.rsi_stretch_low {
        let room = config.rsi_stretch_low.max(f64::EPSILON);
        (1.0 + (config.rsi_stretch_low - rsi) / room, 1.0)
    } else if z.abs() < config.neutral_z_band {
        (0.6, 0.0)
    } else {
        (0.6, -sign(z))
    };

    let signal = if direction != 0.0 { direction } else { -sign(z) };
    let magnitude = z.abs().min(config.max_z_magnitude);
    let exp_ds = weight * magnitude * signal * sigma_h_usd;

    let mut issues = Vec::new();
    if frame.len() < config.min_bars {
        issues.push(format!("only {} bars (< {})", frame.len(), config.min_bars));
    }
    if last.z20.is_none() {
        issues.push("z-score unavailable".to_string());
    }

    Ok(Snapshot {
        symbol: frame.symbol.clone(),
        bars: frame.len(),
        price,
        rsi14: rsi,
        z20: z,
        atr14: last.atr14,
        rv_bar_20: last.rv_bar_20,
        sigma_h_log,
        sigma_h_usd,
        exp_ds,
        exp_div_pts: config.iv_revert_pts.clamp(-2.0, 2.0),
        horizon_h: horizon_hours,
        bias: rsi_bias(rsi, config),
        issue: (!issues.is_empty()).then(|| issues.join("; ")),
    })
}

/// Snapshots for several symbols; one failing symbol does not stop the rest
pub fn latest_snapshots(
    frames: &BTreeMap<String, FeatureFrame>,
    horizon_hours: f64,
    bars_per_hour: u32,
    config: &SignalConfig,
) -> BTreeMap<String, Result<Snapshot, FeatureError>> {
    frames
        .iter()
        .map(|(symbol, frame)| {
            (
                symbol.clone(),
                latest_snapshot(frame, horizon_hours, bars_per_hour, config),
            )
        })
        .collect()
}
