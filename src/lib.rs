// Core modules
pub mod api;
pub mod config;
pub mod error;
pub mod indicators;
pub mod models;
pub mod notify;
pub mod options;
pub mod schedule;
pub mod scanner;
pub mod strategy;
pub mod synthetic;

// Re-export commonly used types
pub use api::*;
pub use config::AppConfig;
pub use models::*;
pub use scanner::{ScanResult, Scanner};
pub use strategy::Strategy;

// Error handling
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;
