//! # Solar Futures
//!
//! Monte Carlo pricing and risk engine for solar-backed electricity futures.
//!
//! ## Features
//!
//! - Exact-transition Ornstein-Uhlenbeck price simulation
//! - Generation-weighted fair values with a linear term premium
//! - Heuristic futures Greeks
//! - Portfolio risk metrics (volatility, Sharpe, VaR, Expected Shortfall, seasonality)
//! - Pluggable generation-forecast and spot-price sources
//!
//! ## Quick Start
//!
//! ```
//! use solar_futures::*;
//!
//! let request = FuturesRequest {
//!     current_spot_price: 48.0,
//!     long_term_price_mean: 50.0,
//!     monte_carlo_paths: 1_000,
//!     seed: Some(42),
//!     ..Default::default()
//! };
//! let pricer = FuturesPricer::new(request)?;
//! let result = pricer.price(&[100.0; 12], SpotInput::Supplied(48.0))?;
//! assert_eq!(result.futures_contracts.len(), 12);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod market_data;
pub mod pricing;
pub mod utils;

// Re-exports
pub use market_data::{
    CachedGenerationSource, CachedSpotSource, FallbackSpotSource, FixedSpotPrice,
    GenerationSource, MonthlyGeneration, SolarSystem, SpotInput, SpotPriceSource, SpotQuote,
    StaticGenerationSource,
};
pub use pricing::{
    FairValues, FuturesContract, FuturesPricer, FuturesPricingResult, FuturesRequest,
    GenerationForecast, Greeks, ModelParameters, PortfolioRiskMetrics, PricePathEnsemble,
    RevenueBasis, SimulationParameters,
};

/// Common result type
pub type Result<T> = std::result::Result<T, Error>;

/// Error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A request or model parameter violates its declared bound
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A forecast or spot-price collaborator returned malformed or missing data
    #[error("Upstream data error: {0}")]
    UpstreamData(String),

    /// A pricing stage failed; wraps the stage-level error
    #[error("{stage} failed: {source}")]
    Stage {
        stage: &'static str,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wrap an error with the name of the pricing stage that raised it
    pub fn in_stage(stage: &'static str, source: Error) -> Self {
        Error::Stage {
            stage,
            source: Box::new(source),
        }
    }
}
