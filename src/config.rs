//! Layered application configuration.
//!
//! Sources, lowest priority first: built-in defaults, an optional TOML file
//! (`option-pro.toml` or an explicit path) and `OPTIONPRO__*` environment
//! variables, e.g. `OPTIONPRO__HORIZON_MIN=60` or
//! `OPTIONPRO__FILTER__MIN_OI=100`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::options::{ChainRequest, FilterConfig, ScoreConfig};
use crate::strategy::{BiasMode, SignalConfig};

pub const DEFAULT_CONFIG_FILE: &str = "option-pro";
pub const ENV_PREFIX: &str = "OPTIONPRO";

/// Liquid, optionable tickers scanned when nothing else is configured
pub const DEFAULT_UNIVERSE: &[&str] = &[
    "SPY", "AAPL", "TSLA", "MSFT", "AMZN", "GOOGL", "NVDA", "META", "NFLX", "AMD", "AAL", "PLTR",
    "F", "RIVN", "SOFI",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    /// STARTTLS instead of implicit TLS
    pub starttls: bool,
    pub subject: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 465,
            starttls: false,
            subject: "Option Pro – Ranked Ideas".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub requests_per_minute: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: crate::api::yahoo::YAHOO_API_BASE.to_string(),
            requests_per_minute: crate::api::yahoo::DEFAULT_RATE_LIMIT_RPM,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub universe: Vec<String>,
    /// Forecast horizon in minutes
    pub horizon_min: u32,
    pub max_dte_days: i64,
    pub strikes_around: usize,
    /// Hourly history pulled for features
    pub lookback_days: u32,
    pub interval: String,
    /// Daily history pulled for the gap calculation
    pub daily_lookback_days: u32,
    pub risk_free: f64,
    pub bias_mode: BiasMode,
    /// `watch` skips runs outside regular US trading hours
    pub market_hours_only: bool,
    pub filter: FilterConfig,
    pub score: ScoreConfig,
    pub signal: SignalConfig,
    pub email: EmailConfig,
    pub api: ApiConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            universe: DEFAULT_UNIVERSE.iter().map(|s| s.to_string()).collect(),
            horizon_min: 120,
            max_dte_days: 14,
            strikes_around: 6,
            lookback_days: 60,
            interval: "1h".to_string(),
            daily_lookback_days: 10,
            risk_free: 0.03,
            bias_mode: BiasMode::default(),
            market_hours_only: false,
            filter: FilterConfig::default(),
            score: ScoreConfig::default(),
            signal: SignalConfig::default(),
            email: EmailConfig::default(),
            api: ApiConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from an explicit file (must exist) or the optional default file,
    /// then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(p) => config::File::from(p).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let cfg: AppConfig = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("universe")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn horizon_hours(&self) -> f64 {
        f64::from(self.horizon_min) / 60.0
    }

    pub fn chain_request(&self) -> ChainRequest {
        ChainRequest {
            max_dte_days: self.max_dte_days,
            strikes_around: self.strikes_around,
            risk_free: self.risk_free,
        }
    }

    /// Replace the universe, normalizing case and dropping blanks
    pub fn with_universe<I, S>(mut self, tickers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.universe = tickers
            .into_iter()
            .map(|t| t.as_ref().trim().to_uppercase())
            .filter(|t| !t.is_empty())
            .collect();
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if self.universe.is_empty() {
            return invalid("universe is empty");
        }
        if self.horizon_min == 0 {
            return invalid("horizon_min must be positive");
        }
        if self.max_dte_days < 0 {
            return invalid("max_dte_days must not be negative");
        }
        if self.strikes_around == 0 {
            return invalid("strikes_around must be at least 1");
        }
        if self.lookback_days == 0 {
            return invalid("lookback_days must be positive");
        }
        if !self.risk_free.is_finite() {
            return invalid("risk_free must be finite");
        }
        if self.signal.rsi_buy >= self.signal.rsi_sell {
            return invalid("signal.rsi_buy must be below signal.rsi_sell");
        }
        if self.score.tier2_min > self.score.tier1_min {
            return invalid("score.tier2_min must not exceed score.tier1_min");
        }
        if self.filter.max_spread_pct < 0.0 || self.filter.min_mid < 0.0 {
            return invalid("filter thresholds must not be negative");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.universe.len(), 15);
        assert_eq!(cfg.horizon_hours(), 2.0);
        assert_eq!(cfg.email.smtp_port, 465);
    }

    #[test]
    fn test_with_universe_normalizes() {
        let cfg = AppConfig::default().with_universe(["aapl", " msft ", ""]);
        assert_eq!(cfg.universe, vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let empty = AppConfig::default().with_universe(Vec::<String>::new());
        assert!(matches!(empty.validate(), Err(ConfigError::Invalid(_))));

        let mut cfg = AppConfig::default();
        cfg.score.tier2_min = 0.9;
        assert!(cfg.validate().is_err());

        let mut cfg = AppConfig::default();
        cfg.signal.rsi_buy = 70.0;
        assert!(cfg.validate().is_err());

        let mut cfg = AppConfig::default();
        cfg.horizon_min = 0;
        assert!(cfg.validate().is_err());
    }

    // The only test touching OPTIONPRO__* vars, so it owns them for its run
    #[test]
    fn test_load_layers_file_then_env() {
        let path = std::env::temp_dir().join(format!("option-pro-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            "horizon_min = 90\nmax_dte_days = 7\n\n[filter]\nmin_oi = 200\n",
        )
        .unwrap();

        let cfg = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(cfg.horizon_min, 90);
        assert_eq!(cfg.max_dte_days, 7);
        assert_eq!(cfg.filter.min_oi, 200);
        assert_eq!(cfg.strikes_around, 6);
        assert_eq!(cfg.universe.len(), DEFAULT_UNIVERSE.len());

        std::env::set_var("OPTIONPRO__HORIZON_MIN", "60");
        std::env::set_var("OPTIONPRO__UNIVERSE", "QQQ,IWM");
        std::env::set_var("OPTIONPRO__FILTER__MIN_OI", "100");
        let layered = AppConfig::load(Some(&path));

        std::env::set_var("OPTIONPRO__HORIZON_MIN", "0");
        let invalid = AppConfig::load(Some(&path));

        for key in ["OPTIONPRO__HORIZON_MIN", "OPTIONPRO__UNIVERSE", "OPTIONPRO__FILTER__MIN_OI"] {
            std::env::remove_var(key);
        }
        let missing = AppConfig::load(Some(&path.with_extension("missing.toml")));
        std::fs::remove_file(&path).unwrap();

        let layered = layered.unwrap();
        assert_eq!(layered.horizon_min, 60);
        assert_eq!(layered.universe, vec!["QQQ", "IWM"]);
        assert_eq!(layered.filter.min_oi, 100);
        assert_eq!(layered.max_dte_days, 7);

        assert!(matches!(invalid, Err(ConfigError::Invalid(_))));
        assert!(matches!(missing, Err(ConfigError::Load(_))));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let cfg: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(
                "horizon_min = 60\nuniverse = [\"QQQ\"]\n\n[filter]\nmin_oi = 200\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(cfg.horizon_min, 60);
        assert_eq!(cfg.universe, vec!["QQQ"]);
        assert_eq!(cfg.filter.min_oi, 200);
        assert_eq!(cfg.filter.max_spread_pct, 0.40);
        assert_eq!(cfg.max_dte_days, 14);
    }
}
