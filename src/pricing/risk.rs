//! Portfolio risk aggregation over simulated revenue paths
//!
//! Input is one row per simulated path, each row holding that path's monthly
//! revenues. Rows are summed into annual revenues, from which the
//! distribution statistics are taken. Tail metrics are empirical:
//!
//! ```text
//! VaR₉₅ = sorted[⌊0.05·n⌋]          (a revenue level, not a loss)
//! ES₉₅  = mean(sorted[..⌊0.05·n⌋])  (sorted[0] when the tail is empty)
//! ```

use crate::utils;
use serde::{Deserialize, Serialize};

/// Number of calendar months in the seasonal profile
pub const SEASONAL_MONTHS: usize = 12;

/// Tail probability for VaR and Expected Shortfall
pub const TAIL_PROBABILITY: f64 = 0.05;

/// Portfolio-level revenue statistics
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PortfolioRiskMetrics {
    /// Mean annual revenue across paths
    pub mean_revenue: f64,

    /// Population standard deviation of annual revenue
    pub revenue_volatility: f64,

    /// Mean over volatility, 0 when volatility is 0
    pub sharpe_ratio: f64,

    /// Empirical 5th percentile of annual revenue
    pub value_at_risk_95: f64,

    /// Mean annual revenue of the paths below the VaR index
    pub expected_shortfall_95: f64,

    /// Per-month fractional deviation from the flat-seasonality baseline
    pub seasonal_premium: [f64; SEASONAL_MONTHS],
}

/// Aggregate per-path monthly revenues into portfolio risk metrics
///
/// Empty input, or a first path with no months, yields all-zero metrics.
/// Paths shorter than the first path count missing months as zero revenue.
pub fn aggregate(revenue_simulations: &[Vec<f64>]) -> PortfolioRiskMetrics {
    let months = match revenue_simulations.first() {
        Some(first) if !first.is_empty() => first.len(),
        _ => return PortfolioRiskMetrics::default(),
    };

    let mut annual_revenues: Vec<f64> = revenue_simulations
        .iter()
        .map(|path| path.iter().take(months).sum())
        .collect();

    let mean_revenue = utils::mean(&annual_revenues);
    let revenue_volatility = utils::population_std_dev(&annual_revenues);

    annual_revenues.sort_unstable_by(f64::total_cmp);
    let (value_at_risk_95, expected_shortfall_95) = tail_metrics(&annual_revenues);

    let sharpe_ratio = if revenue_volatility > 0.0 {
        mean_revenue / revenue_volatility
    } else {
        0.0
    };

    PortfolioRiskMetrics {
        mean_revenue,
        revenue_volatility,
        sharpe_ratio,
        value_at_risk_95,
        expected_shortfall_95,
        seasonal_premium: seasonal_premium(revenue_simulations, months),
    }
}

/// VaR and ES from ascending-sorted annual revenues
fn tail_metrics(sorted: &[f64]) -> (f64, f64) {
    let index = ((TAIL_PROBABILITY * sorted.len() as f64).floor() as usize).min(sorted.len() - 1);
    let value_at_risk = sorted[index];

    let expected_shortfall = if index > 0 {
        utils::mean(&sorted[..index])
    } else {
        sorted[0]
    };

    (value_at_risk, expected_shortfall)
}

/// Monthly mean revenue relative to the average month, padded to twelve entries
fn seasonal_premium(revenue_simulations: &[Vec<f64>], months: usize) -> [f64; SEASONAL_MONTHS] {
    let path_count = revenue_simulations.len() as f64;

    let monthly_means: Vec<f64> = (0..months)
        .map(|m| {
            revenue_simulations
                .iter()
                .map(|path| path.get(m).copied().unwrap_or(0.0))
                .sum::<f64>()
                / path_count
        })
        .collect();

    let average_month = utils::mean(&monthly_means);
    let mut premium = [0.0; SEASONAL_MONTHS];

    if average_month > 0.0 {
        for (slot, monthly_mean) in premium.iter_mut().zip(monthly_means.iter()) {
            *slot = monthly_mean / average_month - 1.0;
        }
    }

    premium
}
