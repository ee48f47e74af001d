//! Price simulation, futures valuation and portfolio risk

mod config;
mod contract;
mod engine;
mod greeks;
mod risk;
mod simulator;
mod valuation;

pub use config::{FuturesRequest, RevenueBasis};
pub use contract::{
    ContractSpecification, FuturesContract, MONTH_CODES, contract_specifications, contract_symbol,
    delivery_month,
};
pub use engine::{FuturesPricer, FuturesPricingResult, MAX_CONTRACTS, ModelParameters};
pub use greeks::{Greeks, greeks};
pub use risk::{PortfolioRiskMetrics, SEASONAL_MONTHS, TAIL_PROBABILITY, aggregate};
pub use simulator::{PRICE_FLOOR, PricePathEnsemble, SimulationParameters, simulate};
pub use valuation::{
    FairValues, GenerationForecast, HORIZON_FALLBACK_VOLATILITY, TERM_PREMIUM_RATE,
    path_settlement_prices, price_futures,
};
