//! Seeded offline market: candles and option chains without network access.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::api::MarketDataProvider;
use crate::models::{Candle, ChainSnapshot, OptionQuote, OptionType};
use crate::options::greeks::{years_to_expiry, BlackScholes};

/// Regular session minutes per trading day
const SESSION_MINUTES: i64 = 390;
const STRIKES_PER_SIDE: i64 = 20;

/// Price path shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketScenario {
    /// Steady uptrend with noise
    Uptrend,
    /// Steady downtrend with noise
    Downtrend,
    /// Mean-reverting chop around the start price
    Sideways,
    /// Large swings
    Volatile,
}

impl MarketScenario {
    const ALL: [MarketScenario; 4] = [
        MarketScenario::Uptrend,
        MarketScenario::Downtrend,
        MarketScenario::Sideways,
        MarketScenario::Volatile,
    ];
}

fn symbol_hash(symbol: &str) -> u64 {
    symbol
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325, |h, b| (h ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3))
}

/// Minutes per bar for "5m", "1h", "1d" style intervals; hourly if unknown
pub fn interval_minutes(interval: &str) -> i64 {
    let Some((split, _)) = interval.char_indices().last() else {
        return 60;
    };
    let (count, unit) = interval.split_at(split);
    let count: i64 = count.parse().unwrap_or(1).max(1);
    match unit {
        "m" => count,
        "h" => count * 60,
        "d" => count * 1440,
        _ => 60,
    }
}

/// Strike grid spacing used by listed US equity options
fn strike_step(spot: f64) -> f64 {
    match spot {
        s if s < 25.0 => 0.5,
        s if s < 100.0 => 1.0,
        s if s < 300.0 => 2.5,
        _ => 5.0,
    }
}

/// Deterministic market data keyed by (seed, symbol)
///
/// Every symbol has a fixed current price; candle paths are generated and
/// then rescaled so their last close equals it, so hourly, daily and chain
/// data agree with each other whatever the lookback.
#[derive(Debug, Clone)]
pub struct SyntheticMarket {
    seed: u64,
    anchor: DateTime<Utc>,
    scenarios: HashMap<String, MarketScenario>,
    pricer: BlackScholes,
}

impl SyntheticMarket {
    pub fn new(seed: u64, anchor: DateTime<Utc>) -> Self {
        Self {
            seed,
            anchor,
            scenarios: HashMap::new(),
            pricer: BlackScholes::default(),
        }
    }

    /// Pin a symbol to a scenario instead of the hash-derived default
    pub fn with_scenario(mut self, symbol: &str, scenario: MarketScenario) -> Self {
        self.scenarios.insert(symbol.to_string(), scenario);
        self
    }

    pub fn anchor(&self) -> DateTime<Utc> {
        self.anchor
    }

    pub fn scenario(&self, symbol: &str) -> MarketScenario {
        self.scenarios.get(symbol).copied().unwrap_or_else(|| {
            let idx = (symbol_hash(symbol) % MarketScenario::ALL.len() as u64) as usize;
            MarketScenario::ALL[idx]
        })
    }

    /// Current underlying price
    pub fn spot(&self, symbol: &str) -> f64 {
        let cents = symbol_hash(symbol) % 40_000;
        10.0 + cents as f64 / 100.0
    }

    fn rng(&self, symbol: &str, salt: u64) -> StdRng {
        StdRng::seed_from_u64(self.seed ^ symbol_hash(symbol) ^ salt.wrapping_mul(0x9e37_79b9))
    }

    /// Generate `num_candles` bars ending at the anchor
    pub fn generate(&self, symbol: &str, num_candles: usize, interval_minutes: i64) -> Vec<Candle> {
        if num_candles == 0 {
            return Vec::new();
        }

        let mut rng = self.rng(symbol, interval_minutes as u64);
        let scenario = self.scenario(symbol);
        // Daily bars move about sqrt(6.5) times as much as hourly bars
        let scale = (interval_minutes as f64 / 60.0).sqrt().max(0.3);

        let mut closes = Vec::with_capacity(num_candles);
        let mut price = 100.0;
        for _ in 0..num_candles {
            let step = match scenario {
                MarketScenario::Uptrend => 0.0015 + rng.gen_range(-0.003..0.003),
                MarketScenario::Downtrend => -0.0015 + rng.gen_range(-0.003..0.003),
                MarketScenario::Sideways => (100.0 - price) / price * 0.1 + rng.gen_range(-0.006..0.006),
                MarketScenario::Volatile => rng.gen_range(-0.015..0.015),
            };
            price *= 1.0 + step * scale;
            price = price.max(1.0);
            closes.push(price);
        }

        let factor = self.spot(symbol) / price;
        let start = self.anchor - Duration::minutes(interval_minutes * (num_candles as i64 - 1));

        closes
            .into_iter()
            .enumerate()
            .map(|(i, close)| {
                let close = close * factor;
                let timestamp = start + Duration::minutes(interval_minutes * i as i64);
                self.create_candle(&mut rng, symbol, close, timestamp)
            })
            .collect()
    }

    fn create_candle(
        &self,
        rng: &mut StdRng,
        symbol: &str,
        close: f64,
        timestamp: DateTime<Utc>,
    ) -> Candle {
        let noise_pct = 0.002;
        let high = close * (1.0 + rng.gen_range(0.0..noise_pct));
        let low = close * (1.0 - rng.gen_range(0.0..noise_pct));
        let open = (close * (1.0 + rng.gen_range(-noise_pct..noise_pct))).clamp(low, high);

        Candle {
            symbol: symbol.to_string(),
            timestamp,
            open,
            high,
            low,
            close,
            volume: 1_000_000.0 * rng.gen_range(0.7..1.3),
        }
    }

    /// Next three weekly Fridays plus a monthly expiry about six weeks out
    pub fn expirations(&self) -> Vec<NaiveDate> {
        let today = self.anchor.date_naive();
        let until_friday = (Weekday::Fri.num_days_from_monday() + 7
            - today.weekday().num_days_from_monday())
            % 7;
        let first = today + Duration::days(i64::from(until_friday));

        let mut out: Vec<NaiveDate> = (0..3).map(|w| first + Duration::weeks(w)).collect();
        out.push(first + Duration::weeks(6));
        out
    }

    /// Quotes for one expiry priced off a smile around `spot`
    pub fn chain(&self, symbol: &str, expiry: NaiveDate) -> ChainSnapshot {
        let spot = self.spot(symbol);
        let step = strike_step(spot);
        let center = (spot / step).round() * step;
        let time = years_to_expiry(self.anchor, expiry).max(1.0 / 365.0);
        let base_iv = 0.22 + (symbol_hash(symbol) % 30) as f64 / 100.0;
        let mut rng = self.rng(symbol, expiry.num_days_from_ce() as u64);

        let mut quotes = Vec::new();
        for k in -STRIKES_PER_SIDE..=STRIKES_PER_SIDE {
            let strike = center + k as f64 * step;
            if strike <= 0.0 {
                continue;
            }
            let moneyness = (strike / spot).ln();
            let iv = base_iv + 0.8 * moneyness * moneyness;
            let distance = (k.unsigned_abs() as f64 + 1.0).recip();

            for option_type in [OptionType::Call, OptionType::Put] {
                let fair = self
                    .pricer
                    .price(spot, strike, time, iv, option_type)
                    .unwrap_or(0.0);
                let half_spread = (fair * 0.03).max(0.01);
                let (bid, ask) = if fair < 0.05 {
                    (0.0, 0.05)
                } else {
                    ((fair - half_spread).max(0.0), fair + half_spread)
                };

                let open_interest = (5_000.0 * distance * rng.gen_range(0.5..1.5)) as u64;
                let volume = (2_000.0 * distance * rng.gen_range(0.0..1.0)) as u64;

                quotes.push(OptionQuote {
                    symbol: symbol.to_string(),
                    contract_symbol: format!(
                        "{}{}{}{:08}",
                        symbol,
                        expiry.format("%y%m%d"),
                        if option_type == OptionType::Call { "C" } else { "P" },
                        (strike * 1000.0).round() as u64
                    ),
                    expiry,
                    option_type,
                    strike,
                    bid: (bid * 100.0).round() / 100.0,
                    ask: (ask * 100.0).round() / 100.0,
                    last_price: (fair * 100.0).round() / 100.0,
                    volume,
                    open_interest,
                    implied_volatility: iv,
                });
            }
        }

        ChainSnapshot { spot, quotes }
    }
}

#[async_trait]
impl MarketDataProvider for SyntheticMarket {
    async fn candles(
        &self,
        symbol: &str,
        interval: &str,
        lookback_days: u32,
    ) -> Result<Vec<Candle>> {
        let minutes = interval_minutes(interval);
        let per_day = if minutes >= 1440 {
            1
        } else {
            (SESSION_MINUTES + minutes - 1) / minutes
        };
        let bars = i64::from(lookback_days) * per_day;
        Ok(self.generate(symbol, bars as usize, minutes))
    }

    async fn option_expirations(&self, _symbol: &str) -> Result<Vec<NaiveDate>> {
        Ok(self.expirations())
    }

    async fn option_quotes(&self, symbol: &str, expiry: NaiveDate) -> Result<ChainSnapshot> {
        if !self.expirations().contains(&expiry) {
            anyhow::bail!("No listed {} options expiring {}", symbol, expiry);
        }
        Ok(self.chain(symbol, expiry))
    }
}
