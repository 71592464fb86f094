use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// OHLCV candlestick for one bar of an underlying
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Option type (call or put)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Put => "put",
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Call => write!(f, "CALL"),
            Self::Put => write!(f, "PUT"),
        }
    }
}

/// Directional bias derived from RSI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bias {
    /// Oversold: favours calls
    Bullish,
    /// Overbought: favours puts
    Bearish,
    Neutral,
}

impl Bias {
    /// Option type that benefits from this bias, if any
    pub fn favoured_type(&self) -> Option<OptionType> {
        match self {
            Self::Bullish => Some(OptionType::Call),
            Self::Bearish => Some(OptionType::Put),
            Self::Neutral => None,
        }
    }
}

impl fmt::Display for Bias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Bullish => "bullish",
            Self::Bearish => "bearish",
            Self::Neutral => "neutral",
        };
        write!(f, "{}", s)
    }
}

/// Raw option chain row as returned by a market data provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionQuote {
    pub symbol: String,
    pub contract_symbol: String,
    pub expiry: NaiveDate,
    pub option_type: OptionType,
    pub strike: f64,
    pub bid: f64,
    pub ask: f64,
    pub last_price: f64,
    pub volume: u64,
    pub open_interest: u64,
    /// Annualized, as a decimal (0.25 = 25%)
    pub implied_volatility: f64,
}

/// One expiry of an option chain together with the underlying price
#[derive(Debug, Clone)]
pub struct ChainSnapshot {
    pub spot: f64,
    pub quotes: Vec<OptionQuote>,
}

/// Black-Scholes greeks in retail units
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Greeks {
    pub delta: f64,
    /// Per $ squared
    pub gamma: f64,
    /// Per calendar day
    pub theta_day: f64,
    /// Per 1 vol point
    pub vega: f64,
    /// Per 1% change in rates
    pub rho: f64,
}

/// Option contract enriched with pricing, greeks, forecast context and score.
///
/// This is the trade idea that ends up in the report: entry is `mid`,
/// target is `target_price`, estimated profit per contract is
/// `exp_change * 100`, probability is `prob_itm`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionContract {
    pub quote: OptionQuote,
    pub spot: f64,
    pub dte: i64,
    pub mid: f64,
    pub spread: f64,
    pub spread_pct: f64,
    pub greeks: Greeks,
    /// Risk-neutral probability of finishing in the money
    pub prob_itm: f64,

    // Forecast context
    pub exp_ds: f64,
    pub exp_div_pts: f64,
    pub horizon_h: f64,

    // Scoring output
    pub exp_change: Option<f64>,
    pub exp_roi: Option<f64>,
    pub target_price: Option<f64>,
    pub score: Option<f64>,
}

impl OptionContract {
    pub fn symbol(&self) -> &str {
        &self.quote.symbol
    }

    pub fn option_type(&self) -> OptionType {
        self.quote.option_type
    }

    /// Estimated dollar profit for one 100-share contract
    pub fn estimated_profit(&self) -> Option<f64> {
        self.exp_change.map(|c| c * 100.0)
    }
}
