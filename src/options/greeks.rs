//! Black-Scholes pricing and greeks.
//!
//! Rates and volatility are decimals (0.25 = 25%), time is in years
//! (ACT/365). Greeks use retail units: theta per calendar day, vega per
//! vol point, rho per 1% change in rates.

use std::f64::consts::PI;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::models::{Greeks, OptionType};

/// Options are treated as expiring at 20:00 UTC on their expiry date
pub const EXPIRY_HOUR_UTC: u32 = 20;

const SECONDS_PER_YEAR: f64 = 365.0 * 86_400.0;

/// Black-Scholes calculator for options pricing and Greeks.
#[derive(Debug, Clone, Copy)]
pub struct BlackScholes {
    /// Risk-free interest rate
    pub rate: f64,
}

impl Default for BlackScholes {
    fn default() -> Self {
        Self { rate: 0.03 }
    }
}

impl BlackScholes {
    pub fn new(rate: f64) -> Self {
        Self { rate }
    }

    /// Standard normal CDF.
    pub fn norm_cdf(x: f64) -> f64 {
        // N(0, 1) parameters are always valid
        Normal::new(0.0, 1.0).map_or(f64::NAN, |normal| normal.cdf(x))
    }

    /// Standard normal PDF.
    pub fn norm_pdf(x: f64) -> f64 {
        (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
    }

    /// d1 and d2, or None for degenerate inputs
    pub fn d1_d2(&self, spot: f64, strike: f64, time: f64, vol: f64) -> Option<(f64, f64)> {
        let valid = [spot, strike, time, vol]
            .iter()
            .all(|v| v.is_finite() && *v > 0.0);
        if !valid {
            return None;
        }

        let sig_sqrt_t = vol * time.sqrt();
        let d1 = ((spot / strike).ln() + (self.rate + 0.5 * vol * vol) * time) / sig_sqrt_t;
        Some((d1, d1 - sig_sqrt_t))
    }

    /// Theoretical option price
    pub fn price(
        &self,
        spot: f64,
        strike: f64,
        time: f64,
        vol: f64,
        opt_type: OptionType,
    ) -> Option<f64> {
        let (d1, d2) = self.d1_d2(spot, strike, time, vol)?;
        let disc = (-self.rate * time).exp();

        Some(match opt_type {
            OptionType::Call => spot * Self::norm_cdf(d1) - strike * disc * Self::norm_cdf(d2),
            OptionType::Put => strike * disc * Self::norm_cdf(-d2) - spot * Self::norm_cdf(-d1),
        })
    }

    /// Delta, gamma, daily theta, vega and rho for one contract
    pub fn greeks(
        &self,
        spot: f64,
        strike: f64,
        time: f64,
        vol: f64,
        opt_type: OptionType,
    ) -> Option<Greeks> {
        let (d1, d2) = self.d1_d2(spot, strike, time, vol)?;
        let disc = (-self.rate * time).exp();
        let sqrt_t = time.sqrt();
        let nd1 = Self::norm_pdf(d1);

        let gamma = nd1 / (spot * vol * sqrt_t);
        let vega = spot * nd1 * sqrt_t / 100.0;
        let decay = -(spot * nd1 * vol) / (2.0 * sqrt_t);

        let (delta, theta_year, rho) = match opt_type {
            OptionType::Call => (
                Self::norm_cdf(d1),
                decay - self.rate * strike * disc * Self::norm_cdf(d2),
                strike * time * disc * Self::norm_cdf(d2) / 100.0,
            ),
            OptionType::Put => (
                Self::norm_cdf(d1) - 1.0,
                decay + self.rate * strike * disc * Self::norm_cdf(-d2),
                -strike * time * disc * Self::norm_cdf(-d2) / 100.0,
            ),
        };

        Some(Greeks {
            delta,
            gamma,
            theta_day: theta_year / 365.0,
            vega,
            rho,
        })
    }

    /// Risk-neutral probability of expiring in the money
    pub fn prob_itm(
        &self,
        spot: f64,
        strike: f64,
        time: f64,
        vol: f64,
        opt_type: OptionType,
    ) -> Option<f64> {
        let (_, d2) = self.d1_d2(spot, strike, time, vol)?;
        Some(match opt_type {
            OptionType::Call => Self::norm_cdf(d2),
            OptionType::Put => Self::norm_cdf(-d2),
        })
    }
}

/// Years from `now` until the contract expires; never negative
pub fn years_to_expiry(now: DateTime<Utc>, expiry: NaiveDate) -> f64 {
    let expires_at = expiry
        .and_time(NaiveTime::from_hms_opt(EXPIRY_HOUR_UTC, 0, 0).unwrap_or_default())
        .and_utc();
    let seconds = (expires_at - now).num_seconds().max(0) as f64;
    seconds / SECONDS_PER_YEAR
}
