use crate::market_data::{GenerationSource, SolarSystem, SpotInput, SpotPriceSource};
use crate::pricing::{
    FairValues, FuturesContract, FuturesRequest, GenerationForecast, PortfolioRiskMetrics,
    RevenueBasis, SimulationParameters, aggregate, greeks, path_settlement_prices, price_futures,
    simulate,
};
use crate::utils;
use crate::{Error, Result};
use chrono::{DateTime, Datelike, Utc};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Maximum number of monthly contracts built per request
///
/// Fixed engine limit; requests for more months still simulate and value the
/// full horizon but only the first twelve months become contracts.
pub const MAX_CONTRACTS: usize = 12;

/// Model calibration echoed back with every result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParameters {
    pub kappa: f64,
    pub theta: f64,
    pub sigma: f64,
    pub monte_carlo_paths: usize,
    pub contract_months: usize,
    pub risk_free_rate: f64,
    pub seed: Option<u64>,
}

/// Complete futures pricing result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuturesPricingResult {
    /// Monthly solar output profile (MWh)
    pub monthly_solar_output_mwh: Vec<f64>,

    /// Total of the profile (MWh)
    pub annual_generation_mwh: f64,

    /// Capacity factor (%) when the profile came from a generation source
    pub capacity_factor: Option<f64>,

    /// Spot price the simulation started from ($/MWh)
    pub spot_price: f64,

    /// Monthly futures contracts
    pub futures_contracts: Vec<FuturesContract>,

    /// Sum of expected contract revenues ($)
    pub total_portfolio_value: f64,

    /// Portfolio risk metrics
    pub risk_metrics: PortfolioRiskMetrics,

    /// Correlation between monthly generation and fair prices
    pub correlation_solar_price: f64,

    /// When pricing was calculated
    pub pricing_timestamp: DateTime<Utc>,

    pub model_parameters: ModelParameters,
}

/// Solar futures pricer
///
/// Holds only the validated request, so one pricer can serve concurrent
/// callers. Every call draws from its own random generator.
#[derive(Debug, Clone)]
pub struct FuturesPricer {
    request: FuturesRequest,
    contract_year: Option<i32>,
}

impl FuturesPricer {
    /// Create a new pricer
    pub fn new(request: FuturesRequest) -> Result<Self> {
        request.validate()?;
        Ok(Self {
            request,
            contract_year: None,
        })
    }

    /// Fix the contract year instead of using the current calendar year
    pub fn with_contract_year(mut self, year: i32) -> Self {
        self.contract_year = Some(year);
        self
    }

    pub fn request(&self) -> &FuturesRequest {
        &self.request
    }

    /// Simulation parameters for a given starting spot price
    pub fn simulation_parameters(&self, spot_price: f64) -> SimulationParameters {
        SimulationParameters {
            spot_price0: spot_price,
            reversion_speed: self.request.mean_reversion_speed,
            long_run_mean: self.request.long_term_price_mean,
            volatility: self.request.price_volatility,
            horizon_years: self.request.horizon_years(),
            step_count: self.request.contract_months,
            path_count: self.request.monte_carlo_paths,
        }
    }

    /// Price against a system, fetching its forecast and (optionally) the spot price
    ///
    /// Without a spot source the request's `current_spot_price` is used.
    pub fn price_system(
        &self,
        system: &SolarSystem,
        generation_source: &dyn GenerationSource,
        spot_source: Option<&dyn SpotPriceSource>,
    ) -> Result<FuturesPricingResult> {
        system.validate()?;

        let generation = generation_source.monthly_output(system)?;
        generation.validate()?;

        let spot = match spot_source {
            Some(source) => SpotInput::Quote(source.current_spot()?),
            None => SpotInput::Supplied(self.request.current_spot_price),
        };

        let mut result = self.price(&generation.monthly_mwh(), spot)?;
        result.capacity_factor = Some(generation.capacity_factor);
        Ok(result)
    }

    /// Price from a monthly generation profile (MWh) and a spot input
    pub fn price(&self, profile_mwh: &[f64], spot: SpotInput) -> Result<FuturesPricingResult> {
        let mut rng = match self.request.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.price_with_rng(profile_mwh, spot, &mut rng)
    }

    /// Price with a caller-owned random generator
    pub fn price_with_rng<R: Rng + ?Sized>(
        &self,
        profile_mwh: &[f64],
        spot: SpotInput,
        rng: &mut R,
    ) -> Result<FuturesPricingResult> {
        let spot_price = spot.resolve()?;
        let months = self.request.contract_months;
        let time_to_delivery = self.request.time_to_delivery();

        let forecast = GenerationForecast::from_profile(profile_mwh, months)
            .map_err(|e| Error::in_stage("generation forecast", e))?;

        let params = self.simulation_parameters(spot_price);
        let paths = simulate(&params, rng).map_err(|e| Error::in_stage("price simulation", e))?;

        let FairValues {
            fair_prices,
            volatilities,
        } = price_futures(
            &paths,
            &forecast,
            self.request.risk_free_rate,
            &time_to_delivery,
        )
        .map_err(|e| Error::in_stage("futures valuation", e))?;

        let contract_count = months.min(MAX_CONTRACTS);
        let year = self.contract_year.unwrap_or_else(|| Utc::now().year());
        let generation = forecast.as_slice();

        let futures_contracts: Vec<FuturesContract> = (0..contract_count)
            .map(|m| {
                let sensitivities = greeks(
                    fair_prices[m],
                    spot_price,
                    volatilities[m],
                    time_to_delivery[m],
                );
                FuturesContract::new(
                    m,
                    year,
                    generation[m],
                    fair_prices[m],
                    volatilities[m],
                    sensitivities,
                )
            })
            .collect();

        // Column per month, then transposed into one revenue row per path
        let monthly_prices: Vec<Vec<f64>> = (0..contract_count)
            .map(|m| match self.request.revenue_basis {
                RevenueBasis::Realized => {
                    path_settlement_prices(&paths, &forecast, time_to_delivery[m], m)
                }
                RevenueBasis::Fair => vec![fair_prices[m]; paths.path_count()],
            })
            .collect();

        let revenue_simulations: Vec<Vec<f64>> = (0..paths.path_count())
            .map(|p| {
                (0..contract_count)
                    .map(|m| generation[m] * monthly_prices[m][p])
                    .collect()
            })
            .collect();

        let risk_metrics = aggregate(&revenue_simulations);
        debug!(
            "Aggregated {} revenue paths over {} months",
            revenue_simulations.len(),
            contract_count
        );

        let seasonal = months.min(12);
        let correlation_solar_price =
            utils::pearson_correlation(&generation[..seasonal], &fair_prices[..seasonal]);

        let total_portfolio_value: f64 =
            futures_contracts.iter().map(|c| c.expected_revenue).sum();

        info!(
            "Priced {} contracts: value={:.2}, vol={:.2}, VaR95={:.2}, corr={:.3}",
            futures_contracts.len(),
            total_portfolio_value,
            risk_metrics.revenue_volatility,
            risk_metrics.value_at_risk_95,
            correlation_solar_price
        );

        Ok(FuturesPricingResult {
            monthly_solar_output_mwh: profile_mwh.to_vec(),
            annual_generation_mwh: profile_mwh.iter().sum(),
            capacity_factor: None,
            spot_price,
            futures_contracts,
            total_portfolio_value,
            risk_metrics,
            correlation_solar_price,
            pricing_timestamp: Utc::now(),
            model_parameters: ModelParameters {
                kappa: self.request.mean_reversion_speed,
                theta: self.request.long_term_price_mean,
                sigma: self.request.price_volatility,
                monte_carlo_paths: self.request.monte_carlo_paths,
                contract_months: months,
                risk_free_rate: self.request.risk_free_rate,
                seed: self.request.seed,
            },
        })
    }
}
