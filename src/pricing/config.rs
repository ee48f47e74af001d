use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Which price each simulated path earns in the revenue simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevenueBasis {
    /// Contract fair price (identical on every path)
    #[default]
    Fair,
    /// Path's generation-weighted price at the delivery step, with the
    /// term premium applied
    Realized,
}

/// Futures pricing request
///
/// Market and contract parameters for one pricing run. The solar system
/// itself is described separately by [`crate::SolarSystem`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FuturesRequest {
    /// Current electricity spot price ($/MWh)
    pub current_spot_price: f64,

    /// Annualised price volatility (σ)
    pub price_volatility: f64,

    /// Mean reversion speed (κ)
    pub mean_reversion_speed: f64,

    /// Long-term electricity price ($/MWh, θ)
    pub long_term_price_mean: f64,

    /// Number of monthly contracts requested (1-24)
    pub contract_months: usize,

    /// Risk-free rate
    pub risk_free_rate: f64,

    /// Monte Carlo paths
    pub monte_carlo_paths: usize,

    /// Seed for reproducible runs (None = fresh entropy per request)
    pub seed: Option<u64>,

    /// Price used for path revenues in the risk simulation
    pub revenue_basis: RevenueBasis,
}

impl Default for FuturesRequest {
    fn default() -> Self {
        Self {
            current_spot_price: 50.0,
            price_volatility: 0.25,
            mean_reversion_speed: 1.5,
            long_term_price_mean: 50.0,
            contract_months: 12,
            risk_free_rate: 0.04,
            monte_carlo_paths: 10_000,
            seed: None,
            revenue_basis: RevenueBasis::Fair,
        }
    }
}

impl FuturesRequest {
    pub const MAX_CONTRACT_MONTHS: usize = 24;
    pub const MIN_PATHS: usize = 1_000;
    pub const MAX_PATHS: usize = 100_000;

    /// Create a request from the two required market prices
    pub fn simple(current_spot_price: f64, long_term_price_mean: f64) -> Self {
        Self {
            current_spot_price,
            long_term_price_mean,
            ..Default::default()
        }
    }

    /// Simulation horizon in years (one step per contract month)
    pub fn horizon_years(&self) -> f64 {
        self.contract_months as f64 / 12.0
    }

    /// Time to delivery in years for each requested month
    pub fn time_to_delivery(&self) -> Vec<f64> {
        (1..=self.contract_months).map(|m| m as f64 / 12.0).collect()
    }

    /// Validate request
    pub fn validate(&self) -> Result<()> {
        require_positive("current_spot_price", self.current_spot_price)?;
        require_positive("long_term_price_mean", self.long_term_price_mean)?;
        require_positive("mean_reversion_speed", self.mean_reversion_speed)?;
        require_positive("price_volatility", self.price_volatility)?;

        if self.price_volatility > 2.0 {
            return Err(Error::InvalidParameter(format!(
                "price_volatility must not exceed 2.0, got {}",
                self.price_volatility
            )));
        }

        if self.contract_months == 0 || self.contract_months > Self::MAX_CONTRACT_MONTHS {
            return Err(Error::InvalidParameter(format!(
                "contract_months must be in 1..={}, got {}",
                Self::MAX_CONTRACT_MONTHS,
                self.contract_months
            )));
        }

        if !(0.0..=0.2).contains(&self.risk_free_rate) {
            return Err(Error::InvalidParameter(format!(
                "risk_free_rate must be in [0, 0.2], got {}",
                self.risk_free_rate
            )));
        }

        if !(Self::MIN_PATHS..=Self::MAX_PATHS).contains(&self.monte_carlo_paths) {
            return Err(Error::InvalidParameter(format!(
                "monte_carlo_paths must be in {}..={}, got {}",
                Self::MIN_PATHS,
                Self::MAX_PATHS,
                self.monte_carlo_paths
            )));
        }

        Ok(())
    }
}

/// Fail unless `value` is finite and strictly positive
pub(crate) fn require_positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidParameter(format!(
            "{name} must be positive and finite, got {value}"
        )))
    }
}
