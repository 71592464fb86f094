//! Per-ticker scan pipeline producing ranked option ideas.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::api::MarketDataProvider;
use crate::config::AppConfig;
use crate::models::OptionContract;
use crate::options::{
    filter_contracts, near_money_chain, score_contracts, FilterConfig, RankedContracts,
    ScoreConfig,
};
use crate::strategy::{forecast_move, RsiReversionStrategy, Snapshot, Strategy};

/// Run metadata attached to every scan
#[derive(Debug, Clone, Serialize)]
pub struct ScanMeta {
    pub run_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub horizon_min: u32,
    pub max_dte_days: i64,
    pub strikes_around: usize,
    pub universe: Vec<String>,
    pub filter: FilterConfig,
    pub score: ScoreConfig,
}

/// Per-symbol forecast log line, naming the option type the RSI bias favours
pub fn forecast_line(symbol: &str, snapshot: &Snapshot) -> String {
    let favours = snapshot
        .bias
        .favoured_type()
        .map_or_else(|| "either".to_string(), |t| t.to_string());

    format!(
        "[{}] Forecast: price {:.2} | RSI {:.1} ({}, favours {}) | z20 {:.2} | exp_dS ${:.2} | exp_dIV {:.2} pts | issue: {}",
        symbol,
        snapshot.price,
        snapshot.rsi14,
        snapshot.bias,
        favours,
        snapshot.z20,
        snapshot.exp_ds,
        snapshot.exp_div_pts,
        snapshot.issue.as_deref().unwrap_or("none")
    )
}

/// Ranked ideas across the whole universe plus per-symbol diagnostics
#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    pub tier1: Vec<OptionContract>,
    pub tier2: Vec<OptionContract>,
    pub watch: Vec<OptionContract>,
    pub all: Vec<OptionContract>,
    pub logs: Vec<String>,
    pub meta: ScanMeta,
}

impl ScanResult {
    pub fn idea_count(&self) -> usize {
        self.tier1.len() + self.tier2.len() + self.watch.len()
    }
}

pub struct Scanner {
    provider: Arc<dyn MarketDataProvider>,
    strategy: Box<dyn Strategy>,
    config: AppConfig,
}

impl Scanner {
    pub fn new(provider: Arc<dyn MarketDataProvider>, config: AppConfig) -> Self {
        let strategy = RsiReversionStrategy::new(config.signal.clone(), &config.interval);
        Self {
            provider,
            strategy: Box::new(strategy),
            config,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub async fn generate_ranked_ideas(&self, tickers: &[String]) -> ScanResult {
        self.generate_ranked_ideas_at(tickers, Utc::now()).await
    }

    /// Scan `tickers` as of `now`, score every surviving contract together
    /// and split the ranking into tiers
    pub async fn generate_ranked_ideas_at(&self, tickers: &[String], now: DateTime<Utc>) -> ScanResult {
        let run_id = Uuid::new_v4();
        tracing::info!(%run_id, "Scanning {} tickers with {}", tickers.len(), self.strategy.name());

        let mut logs = Vec::new();
        let mut candidates = Vec::new();

        for symbol in tickers {
            let contracts = self.scan_symbol(symbol, now, &mut logs).await;
            candidates.extend(contracts);
        }

        let RankedContracts {
            tier1,
            tier2,
            watch,
            all,
        } = score_contracts(candidates, &self.config.score);

        tracing::info!(
            %run_id,
            "Scan complete: {} tier1, {} tier2, {} watch, {} scored",
            tier1.len(),
            tier2.len(),
            watch.len(),
            all.len()
        );

        ScanResult {
            tier1,
            tier2,
            watch,
            all,
            logs,
            meta: ScanMeta {
                run_id,
                timestamp: now,
                horizon_min: self.config.horizon_min,
                max_dte_days: self.config.max_dte_days,
                strikes_around: self.config.strikes_around,
                universe: tickers.to_vec(),
                filter: self.config.filter.clone(),
                score: self.config.score.clone(),
            },
        }
    }

    /// Filtered near-money contracts for one symbol with the forecast
    /// attached; failures become log lines and an empty result
    async fn scan_symbol(
        &self,
        symbol: &str,
        now: DateTime<Utc>,
        logs: &mut Vec<String>,
    ) -> Vec<OptionContract> {
        let cfg = &self.config;
        let mut warn = |msg: String| {
            tracing::warn!("{}", msg);
            logs.push(msg);
        };

        let candles = match self
            .provider
            .candles(symbol, &cfg.interval, cfg.lookback_days)
            .await
        {
            Ok(c) => c,
            Err(e) => {
                warn(format!("[{}] ⚠ Forecast error: {:#}", symbol, e));
                return Vec::new();
            }
        };

        if candles.len() < self.strategy.min_candles_required() {
            tracing::debug!(
                "{}: {} candles, {} wanted",
                symbol,
                candles.len(),
                self.strategy.min_candles_required()
            );
        }

        let snapshot = match self.strategy.snapshot(symbol, &candles, cfg.horizon_hours()) {
            Ok(s) => s,
            Err(e) => {
                warn(format!("[{}] ⚠ Forecast error: {}", symbol, e));
                return Vec::new();
            }
        };

        let forecast = forecast_line(symbol, &snapshot);
        tracing::info!("{}", forecast);
        logs.push(forecast);

        if snapshot.exp_ds.abs() < cfg.signal.min_exp_move {
            let msg = format!(
                "[{}] Expected move ${:.2} below ${:.2}, skipped",
                symbol, snapshot.exp_ds, cfg.signal.min_exp_move
            );
            tracing::info!("{}", msg);
            logs.push(msg);
            return Vec::new();
        }

        match self
            .provider
            .candles(symbol, "1d", cfg.daily_lookback_days)
            .await
        {
            Ok(daily) => {
                let ctx = forecast_move(&candles, &daily, now, cfg.bias_mode);
                let line = format!(
                    "[{}] Context: gap {:+.2}% | mom1h {:+.2}% | mom3h {:+.2}% | regime {} | bias {:+.2}",
                    symbol, ctx.gap_pct, ctx.mom_1h, ctx.mom_3h, ctx.regime, ctx.bias_value
                );
                tracing::debug!("{}", line);
                logs.push(line);
            }
            Err(e) => {
                tracing::debug!("{}: daily candles unavailable: {:#}", symbol, e);
            }
        }

        let chain = match near_money_chain(&*self.provider, symbol, cfg.chain_request(), now).await {
            Ok(c) => c,
            Err(e) => {
                let msg = format!("[{}] ⚠ Chain fetch error: {:#}", symbol, e);
                tracing::warn!("{}", msg);
                logs.push(msg);
                return Vec::new();
            }
        };

        let horizon_h = cfg.horizon_hours();
        let chain: Vec<OptionContract> = chain
            .into_iter()
            .map(|mut c| {
                c.exp_ds = snapshot.exp_ds;
                c.exp_div_pts = snapshot.exp_div_pts;
                c.horizon_h = horizon_h;
                c
            })
            .collect();

        let filtered = filter_contracts(chain, &cfg.filter);
        if filtered.is_empty() {
            let msg = format!("[{}] ⚠ No liquid near-money contracts after filters.", symbol);
            tracing::warn!("{}", msg);
            logs.push(msg);
        }

        filtered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Bias;

    fn snapshot(rsi14: f64, bias: Bias) -> Snapshot {
        Snapshot {
            symbol: "SPY".to_string(),
            bars: 120,
            price: 500.0,
            rsi14,
            z20: 1.8,
            atr14: 2.5,
            rv_bar_20: Some(0.004),
            sigma_h_log: 0.006,
            sigma_h_usd: 3.0,
            exp_ds: -1.25,
            exp_div_pts: 0.5,
            horizon_h: 2.0,
            bias,
            issue: None,
        }
    }

    #[test]
    fn test_forecast_line_names_favoured_type() {
        assert_eq!(
            forecast_line("SPY", &snapshot(72.0, Bias::Bearish)),
            "[SPY] Forecast: price 500.00 | RSI 72.0 (bearish, favours PUT) | z20 1.80 | exp_dS $-1.25 | exp_dIV 0.50 pts | issue: none"
        );
        assert!(forecast_line("SPY", &snapshot(30.0, Bias::Bullish)).contains("(bullish, favours CALL)"));
        assert!(forecast_line("SPY", &snapshot(50.0, Bias::Neutral)).contains("(neutral, favours either)"));
    }
}
