//! Shared builders for option unit tests.

use chrono::NaiveDate;

use crate::models::{Greeks, OptionContract, OptionQuote, OptionType};

pub(crate) fn expiry() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 7, 18).unwrap()
}

pub(crate) fn quote(
    symbol: &str,
    expiry: NaiveDate,
    option_type: OptionType,
    strike: f64,
    bid: f64,
    ask: f64,
) -> OptionQuote {
    OptionQuote {
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
        bid,
        ask,
        last_price: (bid + ask) / 2.0,
        volume: 500,
        open_interest: 1_000,
        implied_volatility: 0.30,
    }
}

/// Contract with fixed at-the-money style greeks and no forecast attached
pub(crate) fn contract(
    symbol: &str,
    option_type: OptionType,
    strike: f64,
    bid: f64,
    ask: f64,
) -> OptionContract {
    let mid = (bid + ask) / 2.0;
    let spread = ask - bid;
    let delta = match option_type {
        OptionType::Call => 0.5,
        OptionType::Put => -0.5,
    };

    OptionContract {
        quote: quote(symbol, expiry(), option_type, strike, bid, ask),
        spot: 500.0,
        dte: 9,
        mid,
        spread,
        spread_pct: spread / mid,
        greeks: Greeks {
            delta,
            gamma: 0.02,
            theta_day: -0.05,
            vega: 0.10,
            rho: 0.01,
        },
        prob_itm: 0.5,
        exp_ds: 0.0,
        exp_div_pts: 0.0,
        horizon_h: 2.0,
        exp_change: None,
        exp_roi: None,
        target_price: None,
        score: None,
    }
}
