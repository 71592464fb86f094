use thiserror::Error;

/// Errors raised while turning candles into features and forecasts
#[derive(Error, Debug)]
pub enum FeatureError {
    #[error("No price history for {0}")]
    Empty(String),

    #[error("Non-positive close {close} for {symbol} at bar {index}")]
    InvalidClose {
        symbol: String,
        index: usize,
        close: f64,
    },
}

/// Invalid configuration values
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors raised while building or delivering the report email
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Failed to build email: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}
