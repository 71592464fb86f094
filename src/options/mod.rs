pub mod chain;
pub mod filter;
pub mod greeks;
pub mod scoring;

#[cfg(test)]
pub(crate) mod fixtures;

pub use chain::{near_money_chain, ChainRequest};
pub use filter::{filter_contracts, FilterConfig};
pub use greeks::BlackScholes;
pub use scoring::{score_contracts, RankedContracts, ScoreConfig};
