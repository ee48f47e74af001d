use serde::{Deserialize, Serialize};

/// Futures risk sensitivities
///
/// Closed-form heuristics rather than derivatives of an option model:
///
/// ```text
/// delta = 0.7 + 0.3·e^(-2·ttd)
/// gamma = 0.1·e^(-ttd) / spot        (0 if spot <= 0)
/// theta = -0.05 · fair_price · ttd
/// vega  = 0.4 · fair_price · √ttd
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Greeks {
    pub delta: f64,
    pub gamma: f64,
    pub theta: f64,
    pub vega: f64,
}

/// Compute Greeks for one contract
///
/// `volatility` is carried for interface symmetry; none of the heuristics
/// depend on it.
#[inline]
pub fn greeks(fair_price: f64, spot_price: f64, _volatility: f64, time_to_delivery: f64) -> Greeks {
    let ttd = time_to_delivery.max(0.0);

    let gamma = if spot_price > 0.0 {
        0.1 * (-ttd).exp() / spot_price
    } else {
        0.0
    };

    Greeks {
        delta: 0.7 + 0.3 * (-2.0 * ttd).exp(),
        gamma,
        theta: -0.05 * fair_price * ttd,
        vega: fair_price * ttd.sqrt() * 0.4,
    }
}
