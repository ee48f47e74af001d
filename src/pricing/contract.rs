use crate::pricing::Greeks;
use serde::{Deserialize, Serialize};

/// Month codes used in contract symbols
pub const MONTH_CODES: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

/// Symbol prefix for solar-backed contracts
pub const SYMBOL_PREFIX: &str = "SOLAR";

/// Monthly solar-backed electricity futures contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuturesContract {
    /// Contract symbol (e.g. SOLAR-JAN26)
    pub symbol: String,

    /// Delivery month (YYYY-MM)
    pub delivery_month: String,

    /// Expected solar generation (MWh)
    pub generation_mwh: f64,

    /// Fair value futures price ($/MWh)
    pub fair_price: f64,

    /// Expected revenue ($) = generation × fair price
    pub expected_revenue: f64,

    /// Simulated price volatility
    pub volatility: f64,

    /// Sensitivity to spot price changes
    pub delta: f64,

    /// Rate of change of delta per unit spot move
    pub gamma: f64,

    /// Value decay per year to delivery
    pub theta: f64,

    /// Sensitivity to volatility
    pub vega: f64,

    /// Contract size (MWh), equal to the expected generation
    pub contract_size: f64,
}

impl FuturesContract {
    /// Build the contract for zero-based `month_index` of `year`
    pub fn new(
        month_index: usize,
        year: i32,
        generation_mwh: f64,
        fair_price: f64,
        volatility: f64,
        greeks: Greeks,
    ) -> Self {
        Self {
            symbol: contract_symbol(month_index, year),
            delivery_month: delivery_month(month_index, year),
            generation_mwh,
            fair_price,
            expected_revenue: generation_mwh * fair_price,
            volatility,
            delta: greeks.delta,
            gamma: greeks.gamma,
            theta: greeks.theta,
            vega: greeks.vega,
            contract_size: generation_mwh,
        }
    }

    /// Risk sensitivities as a single value
    pub fn greeks(&self) -> Greeks {
        Greeks {
            delta: self.delta,
            gamma: self.gamma,
            theta: self.theta,
            vega: self.vega,
        }
    }
}

/// Contract symbol, e.g. `SOLAR-MAR26` for index 2 of 2026
///
/// Indices past December roll into the following year.
pub fn contract_symbol(month_index: usize, year: i32) -> String {
    let (year, month) = roll(month_index, year);
    format!(
        "{}-{}{:02}",
        SYMBOL_PREFIX,
        MONTH_CODES[month],
        year.rem_euclid(100)
    )
}

/// Delivery month in `YYYY-MM` form
pub fn delivery_month(month_index: usize, year: i32) -> String {
    let (year, month) = roll(month_index, year);
    format!("{}-{:02}", year, month + 1)
}

fn roll(month_index: usize, year: i32) -> (i32, usize) {
    (year + (month_index / 12) as i32, month_index % 12)
}

/// Static exchange specification for the contract year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractSpecification {
    pub contract_year: i32,
    pub delivery_months: Vec<String>,
    pub contract_symbols: Vec<String>,
    pub trading_unit: String,
    pub price_currency: String,
    pub settlement: String,
    pub minimum_contract_size_mwh: f64,
    pub tick_size: f64,
    pub daily_price_limit: f64,
}

/// Contract listing for the twelve delivery months of `year`
pub fn contract_specifications(year: i32) -> ContractSpecification {
    ContractSpecification {
        contract_year: year,
        delivery_months: (0..12).map(|m| delivery_month(m, year)).collect(),
        contract_symbols: (0..12).map(|m| contract_symbol(m, year)).collect(),
        trading_unit: "MWh".to_string(),
        price_currency: "USD".to_string(),
        settlement: "Physical delivery".to_string(),
        minimum_contract_size_mwh: 1.0,
        tick_size: 0.01,
        daily_price_limit: 50.0,
    }
}
