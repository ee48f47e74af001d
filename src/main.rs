//! Solar futures pricing binary
//!
//! Usage: `solar-futures [request.json]`
//!
//! Without an argument a demo request is priced. Three volatility scenarios
//! run concurrently, each with its own seeded generator.

use anyhow::Context;
use solar_futures::*;
use std::sync::Arc;

/// Specific yield (kWh per kW) of a south-facing fixed array at mid latitude
const DEMO_YIELD_KWH_PER_KW: [f64; 12] = [
    78.0, 92.0, 125.0, 143.0, 160.0, 166.0, 170.0, 158.0, 134.0, 108.0, 80.0, 70.0,
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logger
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let request: FuturesRequest = match std::env::args().nth(1) {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading request from {}", path))?;
            serde_json::from_str(&raw).with_context(|| format!("parsing request {}", path))?
        }
        None => FuturesRequest {
            current_spot_price: 48.0,
            long_term_price_mean: 52.0,
            seed: Some(42),
            revenue_basis: RevenueBasis::Realized,
            ..Default::default()
        },
    };

    println!("╔════════════════════════════════════════════════╗");
    println!("║   Solar-Backed Electricity Futures Pricer      ║");
    println!("╚════════════════════════════════════════════════╝\n");

    let system = SolarSystem::new(39.74, -105.18, 5_000.0);
    let generation = Arc::new(CachedGenerationSource::new(StaticGenerationSource::new(
        DEMO_YIELD_KWH_PER_KW,
    )));
    let spot = Arc::new(CachedSpotSource::new(FallbackSpotSource::new(
        FixedSpotPrice::new(request.current_spot_price),
    )));

    let scenarios = [
        ("low vol", request.price_volatility * 0.5),
        ("base", request.price_volatility),
        ("high vol", (request.price_volatility * 2.0).min(2.0)),
    ];

    let mut handles = Vec::with_capacity(scenarios.len());
    for (i, (label, sigma)) in scenarios.into_iter().enumerate() {
        let scenario = FuturesRequest {
            price_volatility: sigma,
            seed: request.seed.map(|s| s + i as u64),
            ..request.clone()
        };
        let system = system.clone();
        let generation = Arc::clone(&generation);
        let spot = Arc::clone(&spot);

        handles.push(tokio::task::spawn_blocking(move || {
            let pricer = FuturesPricer::new(scenario)?;
            let result = pricer.price_system(&system, generation.as_ref(), Some(spot.as_ref()))?;
            Ok::<_, Error>((label, result))
        }));
    }

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        let (label, result) = handle.await.context("pricing task panicked")??;
        results.push((label, result));
    }

    println!(
        "{:<10} {:>14} {:>12} {:>14} {:>14} {:>8}",
        "Scenario", "Value ($)", "Vol ($)", "VaR95 ($)", "ES95 ($)", "Sharpe"
    );
    for (label, result) in &results {
        let risk = &result.risk_metrics;
        println!(
            "{:<10} {:>14.0} {:>12.0} {:>14.0} {:>14.0} {:>8.2}",
            label,
            result.total_portfolio_value,
            risk.revenue_volatility,
            risk.value_at_risk_95,
            risk.expected_shortfall_95,
            risk.sharpe_ratio
        );
    }

    if let Some((_, base)) = results.iter().find(|(label, _)| *label == "base") {
        println!("\nBase scenario contracts:");
        for contract in &base.futures_contracts {
            println!(
                "  {:<12} {} {:>8.1} MWh @ ${:>6.2}  delta={:.3}",
                contract.symbol,
                contract.delivery_month,
                contract.generation_mwh,
                contract.fair_price,
                contract.delta
            );
        }

        println!("\n{}", serde_json::to_string_pretty(base)?);
    }

    Ok(())
}
