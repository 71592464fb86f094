//! Lightweight market context for a ticker: spot, overnight gap, short-term
//! momentum and the US equity session regime.

use chrono::{DateTime, Datelike, NaiveTime, Utc, Weekday};
use chrono_tz::America::New_York;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::indicators::{log_returns, mean, population_std, sample_std};
use crate::models::Candle;

const ZSCORE_WINDOW: usize = 20;

/// Session regime on the US/Eastern clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Regime {
    /// 09:30 - 11:00 ET
    Open,
    /// 11:00 - 15:30 ET
    Midday,
    /// 15:30 - 16:00 ET
    Close,
    Closed,
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Open => "open",
            Self::Midday => "midday",
            Self::Close => "close",
            Self::Closed => "closed",
        };
        write!(f, "{}", s)
    }
}

/// How the context bias is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BiasMode {
    /// Lean against an extended z-score
    #[default]
    Revert,
    /// Lean with 3h momentum
    Trend,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketContext {
    pub spot: f64,
    /// Today's open vs prior close, percent
    pub gap_pct: f64,
    pub mom_1h: f64,
    pub mom_3h: f64,
    /// Hourly log-return volatility
    pub sigma_1h: f64,
    pub zscore_20: Option<f64>,
    pub regime: Regime,
    pub bias_mode: BiasMode,
    pub bias_value: f64,
}

fn to_eastern(now: DateTime<Utc>) -> DateTime<Tz> {
    now.with_timezone(&New_York)
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default()
}

/// Session regime at `now`; boundaries are inclusive and the earlier regime wins
pub fn regime_at(now: DateTime<Utc>) -> Regime {
    let t = to_eastern(now).time();

    if (hm(9, 30)..=hm(11, 0)).contains(&t) {
        Regime::Open
    } else if (hm(11, 0)..=hm(15, 30)).contains(&t) {
        Regime::Midday
    } else if (hm(15, 30)..=hm(16, 0)).contains(&t) {
        Regime::Close
    } else {
        Regime::Closed
    }
}

/// Weekday between 09:30 and 16:00 ET (exchange holidays are not modelled)
pub fn is_market_hours(now: DateTime<Utc>) -> bool {
    let weekday = to_eastern(now).weekday();
    if matches!(weekday, Weekday::Sat | Weekday::Sun) {
        return false;
    }
    regime_at(now) != Regime::Closed
}

/// Z-score of the last close against the trailing window (sample deviation)
fn last_zscore(closes: &[f64], window: usize) -> Option<f64> {
    if closes.len() < window + 2 {
        return None;
    }

    let recent = &closes[closes.len() - window..];
    let m = mean(recent)?;
    let sd = sample_std(recent)?;
    let last = *closes.last()?;

    if sd == 0.0 || !sd.is_finite() {
        return Some(0.0);
    }
    Some((last - m) / sd)
}

fn momentum_pct(closes: &[f64], bars_back: usize) -> f64 {
    if closes.len() <= bars_back {
        return 0.0;
    }
    let last = closes[closes.len() - 1];
    let base = closes[closes.len() - 1 - bars_back];
    if base == 0.0 {
        return 0.0;
    }
    (last / base - 1.0) * 100.0
}

fn gap_pct(daily: &[Candle]) -> f64 {
    match daily {
        [.., prior, today] if prior.close > 0.0 => (today.open / prior.close - 1.0) * 100.0,
        _ => 0.0,
    }
}

/// Build the market context for a ticker
///
/// `hourly` and `daily` must be sorted oldest first. With fewer than five
/// hourly closes only the session regime is filled in.
pub fn forecast_move(
    hourly: &[Candle],
    daily: &[Candle],
    now: DateTime<Utc>,
    bias_mode: BiasMode,
) -> MarketContext {
    let mut ctx = MarketContext {
        spot: 0.0,
        gap_pct: 0.0,
        mom_1h: 0.0,
        mom_3h: 0.0,
        sigma_1h: 0.0,
        zscore_20: None,
        regime: regime_at(now),
        bias_mode,
        bias_value: 0.0,
    };

    let closes: Vec<f64> = hourly
        .iter()
        .map(|c| c.close)
        .filter(|c| c.is_finite())
        .collect();
    if closes.len() < 5 {
        return ctx;
    }

    ctx.spot = closes[closes.len() - 1];

    let rets: Vec<f64> = log_returns(&closes).into_iter().flatten().collect();
    ctx.sigma_1h = population_std(&rets).unwrap_or(0.0);

    ctx.mom_1h = momentum_pct(&closes, 1);
    ctx.mom_3h = momentum_pct(&closes, 3);
    ctx.zscore_20 = last_zscore(&closes, ZSCORE_WINDOW);
    ctx.gap_pct = gap_pct(daily);

    ctx.bias_value = match bias_mode {
        BiasMode::Revert => ctx.zscore_20.map(|z| -z).unwrap_or(0.0),
        BiasMode::Trend => ctx.mom_3h,
    };

    ctx
}
