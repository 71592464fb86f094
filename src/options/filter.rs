use serde::{Deserialize, Serialize};

use crate::models::OptionContract;

/// Liquidity and quality filters; keep modest to avoid empty scans
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub min_oi: u64,
    /// Maximum (ask - bid) / mid
    pub max_spread_pct: f64,
    /// Skip dust contracts
    pub min_mid: f64,
    pub min_volume: u64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_oi: 50,
            max_spread_pct: 0.40,
            min_mid: 0.15,
            min_volume: 0,
        }
    }
}

/// Why a contract fails the filters, or None if it passes
pub fn rejection_reason(contract: &OptionContract, config: &FilterConfig) -> Option<&'static str> {
    if contract.quote.open_interest < config.min_oi {
        Some("open interest")
    } else if contract.quote.volume < config.min_volume {
        Some("volume")
    } else if !(contract.mid >= config.min_mid) {
        Some("mid")
    } else if !(contract.spread_pct <= config.max_spread_pct) {
        Some("spread")
    } else {
        None
    }
}

/// Keep contracts that pass every filter, preserving order
pub fn filter_contracts(contracts: Vec<OptionContract>, config: &FilterConfig) -> Vec<OptionContract> {
    let total = contracts.len();
    let kept: Vec<OptionContract> = contracts
        .into_iter()
        .filter(|c| match rejection_reason(c, config) {
            Some(reason) => {
                tracing::trace!(contract = %c.quote.contract_symbol, reason, "Filtered out");
                false
            }
            None => true,
        })
        .collect();

    tracing::debug!("Filters kept {}/{} contracts", kept.len(), total);
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::fixtures::contract;
    use crate::models::OptionType;

    #[test]
    fn test_passes_defaults() {
        let c = contract("SPY", OptionType::Call, 500.0, 2.00, 2.10);
        assert_eq!(rejection_reason(&c, &FilterConfig::default()), None);
    }

    #[test]
    fn test_rejection_reasons() {
        let config = FilterConfig {
            min_volume: 10,
            ..FilterConfig::default()
        };

        let mut low_oi = contract("SPY", OptionType::Call, 500.0, 2.0, 2.1);
        low_oi.quote.open_interest = 10;
        assert_eq!(rejection_reason(&low_oi, &config), Some("open interest"));

        let mut no_volume = contract("SPY", OptionType::Call, 500.0, 2.0, 2.1);
        no_volume.quote.volume = 0;
        assert_eq!(rejection_reason(&no_volume, &config), Some("volume"));

        let dust = contract("SPY", OptionType::Put, 450.0, 0.05, 0.10);
        assert_eq!(rejection_reason(&dust, &config), Some("mid"));

        let wide = contract("SPY", OptionType::Put, 490.0, 1.0, 2.0);
        assert_eq!(rejection_reason(&wide, &config), Some("spread"));
    }

    #[test]
    fn test_filter_contracts_preserves_order() {
        let contracts = vec![
            contract("SPY", OptionType::Call, 500.0, 2.0, 2.1),
            contract("SPY", OptionType::Put, 490.0, 1.0, 2.0),
            contract("SPY", OptionType::Call, 505.0, 1.0, 1.1),
        ];

        let kept = filter_contracts(contracts, &FilterConfig::default());
        let strikes: Vec<f64> = kept.iter().map(|c| c.quote.strike).collect();
        assert_eq!(strikes, vec![500.0, 505.0]);
    }
}
