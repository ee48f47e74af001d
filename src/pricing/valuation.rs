//! Generation-weighted futures fair values
//!
//! For delivery month `m` the simulated prices at step `m + 1` are scaled by
//! the month's generation relative to the peak month:
//!
//! ```text
//! weight        = generation[m] / max(generation)
//! expected      = mean(weight · S[:, m+1])
//! volatility    = stdev(weight · S[:, m+1])
//! fair price    = expected · (1 + 0.02 · ttd[m])
//! ```

use crate::pricing::PricePathEnsemble;
use crate::utils;
use crate::{Error, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Linear term premium per year to delivery
pub const TERM_PREMIUM_RATE: f64 = 0.02;

/// Volatility, as a fraction of spot, used for months beyond the simulated horizon
pub const HORIZON_FALLBACK_VOLATILITY: f64 = 0.25;

/// Expected monthly generation (MWh), one entry per delivery month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationForecast {
    monthly_mwh: Vec<f64>,
}

impl GenerationForecast {
    pub const MAX_MONTHS: usize = 24;

    /// Build a forecast from monthly MWh values
    pub fn new(monthly_mwh: Vec<f64>) -> Result<Self> {
        if monthly_mwh.is_empty() || monthly_mwh.len() > Self::MAX_MONTHS {
            return Err(Error::InvalidParameter(format!(
                "generation forecast must cover 1..={} months, got {}",
                Self::MAX_MONTHS,
                monthly_mwh.len()
            )));
        }

        if let Some((month, value)) = monthly_mwh
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite() || **v < 0.0)
        {
            return Err(Error::InvalidParameter(format!(
                "generation for month {} must be finite and non-negative, got {}",
                month + 1,
                value
            )));
        }

        Ok(Self { monthly_mwh })
    }

    /// Extend an annual profile to `months` entries, cycling through it
    pub fn from_profile(profile_mwh: &[f64], months: usize) -> Result<Self> {
        if profile_mwh.is_empty() {
            return Err(Error::InvalidParameter(
                "generation profile is empty".to_string(),
            ));
        }

        Self::new(
            profile_mwh
                .iter()
                .copied()
                .cycle()
                .take(months)
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.monthly_mwh.len()
    }

    pub fn is_empty(&self) -> bool {
        self.monthly_mwh.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.monthly_mwh
    }

    /// Peak monthly generation
    pub fn peak(&self) -> f64 {
        self.monthly_mwh.iter().copied().fold(0.0, f64::max)
    }

    /// Weight of month `m` relative to the peak month
    ///
    /// 1.0 for every month if the peak is zero; 0.0 past the forecast end.
    pub fn weight(&self, month: usize) -> f64 {
        let peak = self.peak();
        match self.monthly_mwh.get(month) {
            Some(_) if peak <= 0.0 => 1.0,
            Some(generation) => generation / peak,
            None => 0.0,
        }
    }
}

/// Fair prices and price volatilities per delivery month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FairValues {
    pub fair_prices: Vec<f64>,
    pub volatilities: Vec<f64>,
}

/// Price monthly futures from simulated paths and a generation forecast
///
/// `time_to_delivery` must align with `generation`. `risk_free_rate` is
/// validated but not applied: financing is carried by the term premium.
/// Months past the simulated horizon fall back to the initial spot price
/// with a volatility of [`HORIZON_FALLBACK_VOLATILITY`] × spot.
pub fn price_futures(
    paths: &PricePathEnsemble,
    generation: &GenerationForecast,
    risk_free_rate: f64,
    time_to_delivery: &[f64],
) -> Result<FairValues> {
    if time_to_delivery.len() != generation.len() {
        return Err(Error::InvalidParameter(format!(
            "time_to_delivery has {} entries but generation has {}",
            time_to_delivery.len(),
            generation.len()
        )));
    }

    if !risk_free_rate.is_finite() || risk_free_rate < 0.0 {
        return Err(Error::InvalidParameter(format!(
            "risk_free_rate must be finite and non-negative, got {}",
            risk_free_rate
        )));
    }

    if let Some(ttd) = time_to_delivery.iter().find(|t| !t.is_finite() || **t < 0.0) {
        return Err(Error::InvalidParameter(format!(
            "time_to_delivery must be finite and non-negative, got {}",
            ttd
        )));
    }

    let spot = paths.spot_price0();
    let mut fair_prices = Vec::with_capacity(generation.len());
    let mut volatilities = Vec::with_capacity(generation.len());

    for (month, &ttd) in time_to_delivery.iter().enumerate() {
        let Some(delivery_prices) = paths.step_prices(month + 1) else {
            warn!(
                "Delivery month {} beyond simulated horizon ({} steps), using spot fallback",
                month + 1,
                paths.step_count()
            );
            fair_prices.push(spot);
            volatilities.push(spot * HORIZON_FALLBACK_VOLATILITY);
            continue;
        };

        let weight = generation.weight(month);
        let weighted: Vec<f64> = delivery_prices.iter().map(|p| p * weight).collect();

        let expected_price = utils::mean(&weighted);
        let volatility = utils::population_std_dev(&weighted);
        let risk_premium = TERM_PREMIUM_RATE * ttd * expected_price;

        fair_prices.push(expected_price + risk_premium);
        volatilities.push(volatility);
    }

    debug!(
        "Priced {} delivery months from {} paths",
        fair_prices.len(),
        paths.path_count()
    );

    Ok(FairValues {
        fair_prices,
        volatilities,
    })
}

/// Per-path settlement prices for one delivery month
///
/// Each path's weighted price at the delivery step plus the same term premium
/// applied to the fair price, so the mean over paths equals the fair price.
/// Months past the horizon settle at the initial spot on every path.
pub fn path_settlement_prices(
    paths: &PricePathEnsemble,
    generation: &GenerationForecast,
    time_to_delivery: f64,
    month: usize,
) -> Vec<f64> {
    match paths.step_prices(month + 1) {
        Some(delivery_prices) => {
            let scale = generation.weight(month) * (1.0 + TERM_PREMIUM_RATE * time_to_delivery);
            delivery_prices.iter().map(|p| p * scale).collect()
        }
        None => vec![paths.spot_price0(); paths.path_count()],
    }
}
