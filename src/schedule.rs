use std::future::Future;

use chrono::{DateTime, Timelike, Utc};
use tokio::time::{Duration, Instant};

use crate::strategy::is_market_hours;

/// Seconds from `now` until the next top of the hour (XX:00:00)
pub fn seconds_until_next_hour(now: DateTime<Utc>) -> u64 {
    let elapsed = u64::from(now.minute() * 60 + now.second());
    3600 - elapsed
}

/// When the next hourly run should fire
pub fn next_hour_boundary() -> Instant {
    Instant::now() + Duration::from_secs(seconds_until_next_hour(Utc::now()))
}

/// What happened on one tick of the hourly loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Outside market hours with `market_hours_only` set
    Skipped,
    Completed,
    /// The run failed; the loop keeps going
    Failed(String),
}

/// Run one scheduled scan at `now`, unless it falls outside market hours
/// and `market_hours_only` is set. Errors are logged, never propagated.
pub async fn run_tick<F, Fut>(market_hours_only: bool, now: DateTime<Utc>, run: F) -> TickOutcome
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = crate::Result<()>>,
{
    if market_hours_only && !is_market_hours(now) {
        tracing::info!("Outside market hours, skipping scan");
        return TickOutcome::Skipped;
    }

    match run().await {
        Ok(()) => TickOutcome::Completed,
        Err(e) => {
            tracing::error!("Scan failed: {}", e);
            TickOutcome::Failed(e.to_string())
        }
    }
}
