//! Near-the-money option universe with pricing helpers and greeks.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};

use super::greeks::{years_to_expiry, BlackScholes};
use crate::api::MarketDataProvider;
use crate::models::{OptionContract, OptionQuote};

/// Which slice of the chain to pull
#[derive(Debug, Clone, Copy)]
pub struct ChainRequest {
    pub max_dte_days: i64,
    /// Strikes kept on each side of spot
    pub strikes_around: usize,
    pub risk_free: f64,
}

/// Days to expiry counted in calendar days from `now`'s UTC date
pub fn days_to_expiry(now: DateTime<Utc>, expiry: NaiveDate) -> i64 {
    (expiry - now.date_naive()).num_days()
}

/// Pick `n` distinct strikes at or below spot and `n` above it
pub fn select_near_money_strikes(strikes: &[f64], spot: f64, n: usize) -> Vec<f64> {
    let mut distinct: Vec<f64> = strikes.iter().copied().filter(|s| s.is_finite()).collect();
    distinct.sort_by(|a, b| a.total_cmp(b));
    distinct.dedup();

    let split = distinct.partition_point(|s| *s <= spot);
    let lo = split.saturating_sub(n);
    let hi = (split + n).min(distinct.len());
    distinct[lo..hi].to_vec()
}

/// Mid price, or None when there is no two-sided market
pub fn mid_price(bid: f64, ask: f64) -> Option<f64> {
    let mid = (bid + ask) / 2.0;
    (mid.is_finite() && mid > 0.0).then_some(mid)
}

/// Price a raw quote; None when it has no usable market, IV or time value
pub fn enrich_quote(
    quote: OptionQuote,
    spot: f64,
    now: DateTime<Utc>,
    pricer: &BlackScholes,
) -> Option<OptionContract> {
    let mid = mid_price(quote.bid, quote.ask)?;
    let spread = (quote.ask - quote.bid).max(0.0);
    let time = years_to_expiry(now, quote.expiry);
    let iv = quote.implied_volatility;

    let greeks = pricer.greeks(spot, quote.strike, time, iv, quote.option_type)?;
    let prob_itm = pricer.prob_itm(spot, quote.strike, time, iv, quote.option_type)?;

    Some(OptionContract {
        dte: days_to_expiry(now, quote.expiry),
        quote,
        spot,
        mid,
        spread,
        spread_pct: spread / mid,
        greeks,
        prob_itm,
        exp_ds: 0.0,
        exp_div_pts: 0.0,
        horizon_h: 0.0,
        exp_change: None,
        exp_roi: None,
        target_price: None,
        score: None,
    })
}

/// Tight markets first, then open interest, then volume
pub fn sort_by_liquidity(contracts: &mut [OptionContract]) {
    contracts.sort_by(|a, b| {
        a.spread_pct
            .total_cmp(&b.spread_pct)
            .then_with(|| b.quote.open_interest.cmp(&a.quote.open_interest))
            .then_with(|| b.quote.volume.cmp(&a.quote.volume))
    });
}

/// Fetch a near-the-money chain across all expiries inside the DTE window
pub async fn near_money_chain<P>(
    provider: &P,
    symbol: &str,
    request: ChainRequest,
    now: DateTime<Utc>,
) -> Result<Vec<OptionContract>>
where
    P: MarketDataProvider + ?Sized,
{
    let pricer = BlackScholes::new(request.risk_free);

    let expirations: Vec<NaiveDate> = provider
        .option_expirations(symbol)
        .await?
        .into_iter()
        .filter(|e| (0..=request.max_dte_days).contains(&days_to_expiry(now, *e)))
        .collect();

    tracing::debug!(
        "{}: {} expirations within {} days",
        symbol,
        expirations.len(),
        request.max_dte_days
    );

    let mut contracts = Vec::new();
    for expiry in expirations {
        let chain = provider.option_quotes(symbol, expiry).await?;
        if !(chain.spot.is_finite() && chain.spot > 0.0) {
            tracing::warn!("{} {}: invalid underlying price {}", symbol, expiry, chain.spot);
            continue;
        }

        let strikes: Vec<f64> = chain.quotes.iter().map(|q| q.strike).collect();
        let keep = select_near_money_strikes(&strikes, chain.spot, request.strikes_around);

        let before = contracts.len();
        contracts.extend(
            chain
                .quotes
                .into_iter()
                .filter(|q| keep.contains(&q.strike))
                .filter_map(|q| enrich_quote(q, chain.spot, now, &pricer)),
        );

        tracing::debug!(
            "{} {}: kept {} near-money contracts",
            symbol,
            expiry,
            contracts.len() - before
        );
    }

    sort_by_liquidity(&mut contracts);
    Ok(contracts)
}
