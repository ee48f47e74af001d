//! Integration tests

use approx::assert_relative_eq;
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use solar_futures::pricing::{
    PRICE_FLOOR, aggregate, contract_specifications, greeks, price_futures, simulate,
};
use solar_futures::*;
use std::sync::Arc;
use std::thread::JoinHandle;

fn scenario_request() -> FuturesRequest {
    FuturesRequest {
        current_spot_price: 50.0,
        long_term_price_mean: 50.0,
        price_volatility: 0.25,
        mean_reversion_speed: 1.5,
        contract_months: 12,
        monte_carlo_paths: 10_000,
        seed: Some(7),
        ..Default::default()
    }
}

#[test]
fn test_full_pricing_workflow() {
    let pricer: FuturesPricer = FuturesPricer::new(scenario_request())
        .unwrap()
        .with_contract_year(2026);

    let result: FuturesPricingResult = pricer
        .price(&[100.0; 12], SpotInput::Supplied(50.0))
        .unwrap();

    assert_eq!(result.futures_contracts.len(), 12);

    for contract in &result.futures_contracts {
        // Within the term premium band around θ = 50
        assert!(
            contract.fair_price > 49.9 && contract.fair_price < 51.1,
            "{} priced at {}",
            contract.symbol,
            contract.fair_price
        );
        assert_eq!(contract.contract_size, 100.0);
        assert_relative_eq!(contract.expected_revenue, 100.0 * contract.fair_price);
    }

    let expected: f64 = result
        .futures_contracts
        .iter()
        .map(|c| 100.0 * c.fair_price)
        .sum();
    assert_relative_eq!(result.total_portfolio_value, expected, max_relative = 1e-12);

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["futures_contracts"][0]["symbol"], "SOLAR-JAN26");
    assert_eq!(
        json["risk_metrics"]["seasonal_premium"]
            .as_array()
            .unwrap()
            .len(),
        12
    );
}

#[test]
fn test_pricing_with_sources() {
    let pricer = FuturesPricer::new(FuturesRequest {
        monte_carlo_paths: 1_000,
        ..scenario_request()
    })
    .unwrap();

    let generation = CachedGenerationSource::new(StaticGenerationSource::new([
        80.0, 95.0, 125.0, 140.0, 160.0, 165.0, 170.0, 155.0, 130.0, 105.0, 80.0, 70.0,
    ]));
    let spot = CachedSpotSource::new(FallbackSpotSource::new(FixedSpotPrice::new(55.0)));
    let system = SolarSystem::new(39.7, -105.2, 2_000.0);

    let first = pricer
        .price_system(&system, &generation, Some(&spot))
        .unwrap();
    let second = pricer
        .price_system(&system, &generation, Some(&spot))
        .unwrap();

    assert_eq!(generation.len(), 1);
    assert_eq!(first.futures_contracts, second.futures_contracts);
    assert_relative_eq!(first.spot_price, 55.0, epsilon = 1e-9);
    assert_relative_eq!(first.annual_generation_mwh, 2_000.0 * 1_475.0 / 1000.0);

    let capacity_factor = first.capacity_factor.unwrap();
    assert!(capacity_factor > 10.0 && capacity_factor < 25.0);
    assert!(first.correlation_solar_price > 0.9);
}

#[test]
fn test_spot_source_fallback_feeds_pricer() {
    struct Offline;

    impl SpotPriceSource for Offline {
        fn current_spot(&self) -> Result<SpotQuote> {
            Err(Error::UpstreamData("no snapshot table".to_string()))
        }

        fn name(&self) -> &str {
            "offline"
        }
    }

    let pricer = FuturesPricer::new(FuturesRequest {
        monte_carlo_paths: 1_000,
        ..scenario_request()
    })
    .unwrap();
    let generation = StaticGenerationSource::new([100.0; 12]);
    let system = SolarSystem::new(20.0, 78.0, 100.0);

    let strict = pricer.price_system(&system, &generation, Some(&Offline));
    assert!(matches!(strict, Err(Error::UpstreamData(_))));

    let fallback = FallbackSpotSource::new(Offline);
    let result = pricer
        .price_system(&system, &generation, Some(&fallback))
        .unwrap();
    assert_relative_eq!(result.spot_price, 3000.0 / 83.0);
}

#[test]
fn test_invalid_system_rejected() {
    let pricer = FuturesPricer::new(scenario_request()).unwrap();
    let generation = StaticGenerationSource::new([100.0; 12]);
    let system = SolarSystem::new(40.0, -105.0, -10.0);

    let result = pricer.price_system(&system, &generation, None);
    assert!(matches!(result, Err(Error::InvalidParameter(_))));
}

#[test]
fn test_concurrent_pricing_is_independent() {
    let pricer: Arc<FuturesPricer> = Arc::new(
        FuturesPricer::new(FuturesRequest {
            monte_carlo_paths: 2_000,
            price_volatility: 1.0,
            ..scenario_request()
        })
        .unwrap(),
    );
    let profile: Vec<f64> = (1..=12).map(|m| 50.0 + m as f64 * 5.0).collect();

    let sequential = pricer.price(&profile, SpotInput::Supplied(50.0)).unwrap();

    let mut handles: Vec<JoinHandle<FuturesPricingResult>> = vec![];
    for _ in 0..4 {
        let pricer = Arc::clone(&pricer);
        let profile = profile.clone();
        handles.push(std::thread::spawn(move || {
            pricer.price(&profile, SpotInput::Supplied(50.0)).unwrap()
        }));
    }

    for handle in handles {
        let result = handle.join().unwrap();
        assert_eq!(result.futures_contracts, sequential.futures_contracts);
        assert_eq!(result.risk_metrics, sequential.risk_metrics);
    }
}

#[test]
fn test_one_step_mean_matches_ou_moment() {
    let params = SimulationParameters {
        spot_price0: 80.0,
        reversion_speed: 2.0,
        long_run_mean: 50.0,
        volatility: 8.0,
        horizon_years: 1.0,
        step_count: 4,
        path_count: 40_000,
    };
    let paths = simulate(&params, &mut StdRng::seed_from_u64(99)).unwrap();
    let first = paths.step_prices(1).unwrap();
    let mean = first.iter().sum::<f64>() / first.len() as f64;

    // e^(-0.5) pull from 80 towards 50, standard error ~0.02
    assert!((mean - params.one_step_mean()).abs() < 0.1);
    let decay = (-0.5f64).exp();
    assert_relative_eq!(
        params.one_step_mean(),
        80.0 * decay + 50.0 * (1.0 - decay),
        epsilon = 1e-12
    );
}

#[test]
fn test_horizon_fallback_through_valuation() {
    let params = SimulationParameters {
        spot_price0: 40.0,
        reversion_speed: 1.5,
        long_run_mean: 50.0,
        volatility: 5.0,
        horizon_years: 0.25,
        step_count: 3,
        path_count: 100,
    };
    let paths = simulate(&params, &mut StdRng::seed_from_u64(3)).unwrap();
    let forecast = GenerationForecast::new(vec![10.0; 6]).unwrap();
    let ttd: Vec<f64> = (1..=6).map(|m| m as f64 / 12.0).collect();

    let values = price_futures(&paths, &forecast, 0.04, &ttd).unwrap();
    assert_eq!(values.fair_prices.len(), 6);
    assert_eq!(&values.fair_prices[3..], &[40.0, 40.0, 40.0]);
    assert_eq!(values.volatilities[5], 10.0);
}

#[test]
fn test_greeks_limits() {
    assert_eq!(greeks(50.0, 50.0, 3.0, 0.0).delta, 1.0);
    assert!((greeks(50.0, 50.0, 3.0, 100.0).delta - 0.7).abs() < 1e-12);
    assert!(greeks(50.0, 50.0, 3.0, 0.5).theta < 0.0);
}

#[test]
fn test_degenerate_aggregation() {
    let empty = aggregate(&[]);
    let no_months = aggregate(&[vec![]]);

    for metrics in [empty, no_months] {
        assert_eq!(metrics.mean_revenue, 0.0);
        assert_eq!(metrics.revenue_volatility, 0.0);
        assert_eq!(metrics.sharpe_ratio, 0.0);
        assert_eq!(metrics.value_at_risk_95, 0.0);
        assert_eq!(metrics.expected_shortfall_95, 0.0);
        assert_eq!(metrics.seasonal_premium, [0.0; 12]);
    }
}

#[test]
fn test_contract_specifications() {
    let spec = contract_specifications(2027);
    assert_eq!(spec.contract_symbols[0], "SOLAR-JAN27");
    assert_eq!(spec.delivery_months[11], "2027-12");
    assert_eq!(spec.trading_unit, "MWh");
}

#[test]
fn test_error_handling() {
    // Invalid request should fail before any simulation
    let request = FuturesRequest {
        mean_reversion_speed: 0.0,
        ..Default::default()
    };

    let result: Result<FuturesPricer> = FuturesPricer::new(request);
    assert!(matches!(result, Err(Error::InvalidParameter(_))));

    let err = Error::in_stage("price simulation", Error::InvalidParameter("κ".to_string()));
    assert_eq!(err.to_string(), "price simulation failed: Invalid parameter: κ");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_paths_respect_floor_and_initial_column(
        spot in 0.5f64..200.0,
        kappa in 0.1f64..5.0,
        theta in 0.5f64..200.0,
        sigma in 0.01f64..100.0,
        steps in 1usize..24,
        paths in 1usize..64,
        seed in any::<u64>(),
    ) {
        let params = SimulationParameters {
            spot_price0: spot,
            reversion_speed: kappa,
            long_run_mean: theta,
            volatility: sigma,
            horizon_years: steps as f64 / 12.0,
            step_count: steps,
            path_count: paths,
        };
        let ensemble = simulate(&params, &mut StdRng::seed_from_u64(seed)).unwrap();

        prop_assert_eq!(ensemble.path_count(), paths);
        prop_assert_eq!(ensemble.step_count(), steps);
        prop_assert!(ensemble.step_prices(0).unwrap().iter().all(|&p| p == spot));
        prop_assert!(ensemble.as_matrix().iter().skip(paths).all(|&p| p >= PRICE_FLOOR));
    }

    #[test]
    fn prop_expected_shortfall_not_above_var(
        revenues in prop::collection::vec(prop::collection::vec(-1e6f64..1e6, 1..12), 1..200),
    ) {
        let months = revenues[0].len();
        let rows: Vec<Vec<f64>> = revenues
            .into_iter()
            .map(|mut row| { row.resize(months, 0.0); row })
            .collect();

        let metrics = aggregate(&rows);
        let slack = 1e-9 * metrics.value_at_risk_95.abs().max(1.0);
        prop_assert!(metrics.expected_shortfall_95 <= metrics.value_at_risk_95 + slack);
        prop_assert_eq!(metrics.seasonal_premium.len(), 12);
        prop_assert!(metrics.revenue_volatility >= 0.0);
    }

    #[test]
    fn prop_identical_paths_have_zero_sharpe(
        row in prop::collection::vec(0.0f64..1e5, 1..12),
        copies in 1usize..50,
    ) {
        let metrics = aggregate(&vec![row; copies]);
        prop_assert_eq!(metrics.revenue_volatility, 0.0);
        prop_assert_eq!(metrics.sharpe_ratio, 0.0);
    }

    #[test]
    fn prop_delta_between_floor_and_one(ttd in 0.0f64..10.0, price in 0.01f64..500.0) {
        let g = greeks(price, 50.0, 1.0, ttd);
        prop_assert!(g.delta >= 0.7 && g.delta <= 1.0);
        prop_assert!(g.theta <= 0.0);
        prop_assert!(g.vega >= 0.0);
    }
}
