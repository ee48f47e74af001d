//! Mean-reverting electricity price simulation
//!
//! Prices follow an Ornstein-Uhlenbeck process:
//!
//! ```text
//! dS = κ(θ - S)dt + σdW
//! ```
//!
//! Each step uses the exact transition moments, so the discretisation is
//! unbiased for any Δt:
//!
//! ```text
//! S(t+Δt) = S(t)·e^(-κΔt) + θ(1 - e^(-κΔt)) + σ·√((1 - e^(-2κΔt)) / 2κ)·Z
//! ```
//!
//! After every step prices are clamped at [`PRICE_FLOOR`]. The clamp is not a
//! reflecting boundary: paths that would have gone negative are lifted to the
//! floor, which biases their mean slightly upwards.

use crate::pricing::config::require_positive;
use crate::{Error, Result};
use log::debug;
use nalgebra::DMatrix;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};

/// Minimum simulated electricity price ($/MWh)
pub const PRICE_FLOOR: f64 = 0.01;

/// Ornstein-Uhlenbeck simulation parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationParameters {
    /// Initial spot price (S₀)
    pub spot_price0: f64,

    /// Mean reversion speed (κ)
    pub reversion_speed: f64,

    /// Long-run mean price (θ)
    pub long_run_mean: f64,

    /// Volatility (σ)
    pub volatility: f64,

    /// Horizon in years (T)
    pub horizon_years: f64,

    /// Number of time steps
    pub step_count: usize,

    /// Number of simulated paths
    pub path_count: usize,
}

/// Per-step constants of the exact OU transition
#[derive(Debug, Clone, Copy)]
struct Transition {
    decay: f64,
    mean_shift: f64,
    diffusion: f64,
}

impl SimulationParameters {
    /// Validate parameters before any path is drawn
    pub fn validate(&self) -> Result<()> {
        require_positive("spot_price0", self.spot_price0)?;
        require_positive("reversion_speed", self.reversion_speed)?;
        require_positive("long_run_mean", self.long_run_mean)?;
        require_positive("volatility", self.volatility)?;
        require_positive("horizon_years", self.horizon_years)?;

        if self.step_count < 1 {
            return Err(Error::InvalidParameter(
                "step_count must be at least 1".to_string(),
            ));
        }

        if self.path_count < 1 {
            return Err(Error::InvalidParameter(
                "path_count must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Time step Δt = T / steps (years)
    pub fn dt(&self) -> f64 {
        self.horizon_years / self.step_count as f64
    }

    /// Analytic mean of the first step, ignoring the floor
    pub fn one_step_mean(&self) -> f64 {
        let t = self.transition();
        self.spot_price0 * t.decay + t.mean_shift
    }

    /// Half-life of a deviation from θ (years)
    pub fn half_life_years(&self) -> f64 {
        2.0_f64.ln() / self.reversion_speed
    }

    fn transition(&self) -> Transition {
        let kappa = self.reversion_speed;
        let dt = self.dt();
        let decay = (-kappa * dt).exp();

        Transition {
            decay,
            mean_shift: self.long_run_mean * (1.0 - decay),
            diffusion: self.volatility * ((1.0 - (-2.0 * kappa * dt).exp()) / (2.0 * kappa)).sqrt(),
        }
    }
}

/// Simulated price paths
///
/// Rows are paths, columns are time steps `0..=step_count`. Column 0 holds the
/// initial spot price on every path. Immutable once simulated.
#[derive(Debug, Clone)]
pub struct PricePathEnsemble {
    prices: DMatrix<f64>,
}

impl PricePathEnsemble {
    /// Number of simulated paths
    pub fn path_count(&self) -> usize {
        self.prices.nrows()
    }

    /// Number of simulated steps (columns minus the initial column)
    pub fn step_count(&self) -> usize {
        self.prices.ncols() - 1
    }

    /// Initial spot price
    pub fn spot_price0(&self) -> f64 {
        self.prices[(0, 0)]
    }

    /// Price on `path` at `step`, if both are in range
    pub fn price(&self, path: usize, step: usize) -> Option<f64> {
        self.prices.get((path, step)).copied()
    }

    /// All path prices at `step`, if the step was simulated
    pub fn step_prices(&self, step: usize) -> Option<Vec<f64>> {
        (step < self.prices.ncols()).then(|| self.prices.column(step).iter().copied().collect())
    }

    /// One path's trajectory, including the initial price
    pub fn path(&self, path: usize) -> Option<Vec<f64>> {
        (path < self.prices.nrows()).then(|| self.prices.row(path).iter().copied().collect())
    }

    /// Lowest simulated price across the ensemble
    pub fn min_price(&self) -> f64 {
        self.prices.min()
    }

    /// Underlying `[paths × (steps + 1)]` matrix
    pub fn as_matrix(&self) -> &DMatrix<f64> {
        &self.prices
    }
}

/// Simulate an ensemble of mean-reverting price paths
///
/// The caller owns the random source, so concurrent requests never share
/// generator state. Draws are taken step by step across all paths.
pub fn simulate<R: Rng + ?Sized>(
    params: &SimulationParameters,
    rng: &mut R,
) -> Result<PricePathEnsemble> {
    params.validate()?;

    let Transition {
        decay,
        mean_shift,
        diffusion,
    } = params.transition();

    debug!(
        "Simulating {} paths x {} steps (dt={:.4}y, decay={:.4}, diffusion={:.4})",
        params.path_count,
        params.step_count,
        params.dt(),
        decay,
        diffusion
    );

    let mut prices = DMatrix::from_element(
        params.path_count,
        params.step_count + 1,
        params.spot_price0,
    );

    for step in 1..=params.step_count {
        for path in 0..params.path_count {
            let z: f64 = StandardNormal.sample(rng);
            let next = prices[(path, step - 1)] * decay + mean_shift + diffusion * z;
            prices[(path, step)] = next.max(PRICE_FLOOR);
        }
    }

    Ok(PricePathEnsemble { prices })
}
