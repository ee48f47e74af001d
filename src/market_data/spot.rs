//! Electricity spot price inputs
//!
//! Spot prices arrive either directly from the caller or as a quote from a
//! market-data source. Quotes carry the local clearing price alongside its
//! reference-currency conversion; the engine only ever uses the reference
//! price per MWh.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Local currency units per reference currency unit
pub const DEFAULT_FX_RATE: f64 = 83.0;

/// Local clearing price (per MWh) assumed when the market source is down
pub const FALLBACK_PRICE_LOCAL_MWH: f64 = 3000.0;

/// Spot price quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotQuote {
    /// Clearing price in local currency per MWh
    pub price_local_mwh: f64,

    /// Price in reference currency per MWh
    pub price_reference_mwh: f64,

    /// Where the quote came from
    pub source: String,

    /// When the quote was taken
    pub timestamp: DateTime<Utc>,
}

impl SpotQuote {
    /// Quote from a local clearing price and an FX rate (local per reference)
    pub fn from_local(
        price_local_mwh: f64,
        fx_rate: f64,
        source: impl Into<String>,
    ) -> Result<Self> {
        if !(fx_rate.is_finite() && fx_rate > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "fx_rate must be positive, got {}",
                fx_rate
            )));
        }

        let quote = Self {
            price_local_mwh,
            price_reference_mwh: price_local_mwh / fx_rate,
            source: source.into(),
            timestamp: Utc::now(),
        };
        quote.validate()?;
        Ok(quote)
    }

    /// Reject non-positive or non-finite prices
    pub fn validate(&self) -> Result<()> {
        if !(self.price_reference_mwh.is_finite() && self.price_reference_mwh > 0.0) {
            return Err(Error::UpstreamData(format!(
                "spot quote from {} has invalid price {}",
                self.source, self.price_reference_mwh
            )));
        }
        Ok(())
    }

    pub fn price_local_kwh(&self) -> f64 {
        self.price_local_mwh / 1000.0
    }

    pub fn price_reference_kwh(&self) -> f64 {
        self.price_reference_mwh / 1000.0
    }
}

/// Spot price as supplied to the pricer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpotInput {
    /// Reference-currency price per MWh given by the caller
    Supplied(f64),
    /// Quote fetched from a market-data source
    Quote(SpotQuote),
}

impl SpotInput {
    /// Reduce to a single reference-currency price per MWh
    pub fn resolve(&self) -> Result<f64> {
        match self {
            SpotInput::Supplied(price) if price.is_finite() && *price > 0.0 => Ok(*price),
            SpotInput::Supplied(price) => Err(Error::InvalidParameter(format!(
                "spot price must be positive, got {}",
                price
            ))),
            SpotInput::Quote(quote) => {
                quote.validate()?;
                Ok(quote.price_reference_mwh)
            }
        }
    }
}

/// Source of current spot prices
pub trait SpotPriceSource: Send + Sync {
    /// Fetch the current spot quote
    fn current_spot(&self) -> Result<SpotQuote>;

    /// Get a source name
    fn name(&self) -> &str;
}

/// Caller-supplied price wrapped as a source
#[derive(Debug, Clone)]
pub struct FixedSpotPrice {
    price_reference_mwh: f64,
    fx_rate: f64,
}

impl FixedSpotPrice {
    pub fn new(price_reference_mwh: f64) -> Self {
        Self {
            price_reference_mwh,
            fx_rate: DEFAULT_FX_RATE,
        }
    }

    pub fn with_fx_rate(mut self, fx_rate: f64) -> Self {
        self.fx_rate = fx_rate;
        self
    }
}

impl SpotPriceSource for FixedSpotPrice {
    fn current_spot(&self) -> Result<SpotQuote> {
        SpotQuote::from_local(
            self.price_reference_mwh * self.fx_rate,
            self.fx_rate,
            self.name(),
        )
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Falls back to a fixed local price when the primary source fails
pub struct FallbackSpotSource<S> {
    primary: S,
    fallback_local_mwh: f64,
    fx_rate: f64,
}

impl<S: SpotPriceSource> FallbackSpotSource<S> {
    pub fn new(primary: S) -> Self {
        Self {
            primary,
            fallback_local_mwh: FALLBACK_PRICE_LOCAL_MWH,
            fx_rate: DEFAULT_FX_RATE,
        }
    }

    pub fn with_fallback(mut self, fallback_local_mwh: f64, fx_rate: f64) -> Self {
        self.fallback_local_mwh = fallback_local_mwh;
        self.fx_rate = fx_rate;
        self
    }
}

impl<S: SpotPriceSource> SpotPriceSource for FallbackSpotSource<S> {
    fn current_spot(&self) -> Result<SpotQuote> {
        match self.primary.current_spot() {
            Ok(quote) => Ok(quote),
            Err(e) => {
                warn!(
                    "Spot source {} failed ({}), using fallback price {:.2}/MWh",
                    self.primary.name(),
                    e,
                    self.fallback_local_mwh
                );
                SpotQuote::from_local(
                    self.fallback_local_mwh,
                    self.fx_rate,
                    format!("{} (fallback)", self.primary.name()),
                )
            }
        }
    }

    fn name(&self) -> &str {
        self.primary.name()
    }
}

/// Caches the last quote for `ttl`
pub struct CachedSpotSource<S> {
    inner: S,
    ttl: Duration,
    cached: RwLock<Option<(Instant, SpotQuote)>>,
}

impl<S: SpotPriceSource> CachedSpotSource<S> {
    pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

    pub fn new(inner: S) -> Self {
        Self::with_ttl(inner, Self::DEFAULT_TTL)
    }

    pub fn with_ttl(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            cached: RwLock::new(None),
        }
    }

    /// Forget the cached quote
    pub fn invalidate(&self) {
        *self.cached.write() = None;
    }
}

impl<S: SpotPriceSource> SpotPriceSource for CachedSpotSource<S> {
    fn current_spot(&self) -> Result<SpotQuote> {
        if let Some((fetched_at, quote)) = self.cached.read().as_ref()
            && fetched_at.elapsed() < self.ttl
        {
            debug!("Spot cache hit ({})", self.inner.name());
            return Ok(quote.clone());
        }

        let quote = self.inner.current_spot()?;
        *self.cached.write() = Some((Instant::now(), quote.clone()));
        Ok(quote)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingSource;

    impl SpotPriceSource for FailingSource {
        fn current_spot(&self) -> Result<SpotQuote> {
            Err(Error::UpstreamData("market snapshot unavailable".to_string()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    struct CountingSource {
        calls: AtomicUsize,
    }

    impl SpotPriceSource for CountingSource {
        fn current_spot(&self) -> Result<SpotQuote> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) as f64;
            SpotQuote::from_local(4000.0 + n, 80.0, "counting")
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    #[test]
    fn test_quote_conversion() {
        let quote = SpotQuote::from_local(4150.0, 83.0, "test").unwrap();
        assert_relative_eq!(quote.price_reference_mwh, 50.0, epsilon = 1e-12);
        assert_relative_eq!(quote.price_local_kwh(), 4.15, epsilon = 1e-12);
        assert_relative_eq!(quote.price_reference_kwh(), 0.05, epsilon = 1e-12);

        assert!(SpotQuote::from_local(4150.0, 0.0, "test").is_err());
        assert!(SpotQuote::from_local(-1.0, 83.0, "test").is_err());
    }

    #[test]
    fn test_spot_input_resolves_uniformly() {
        let quote = FixedSpotPrice::new(47.5).current_spot().unwrap();
        assert_relative_eq!(
            SpotInput::Quote(quote).resolve().unwrap(),
            47.5,
            epsilon = 1e-12
        );
        assert_eq!(SpotInput::Supplied(47.5).resolve().unwrap(), 47.5);
        assert!(SpotInput::Supplied(0.0).resolve().is_err());
    }

    #[test]
    fn test_fallback_on_failure() {
        let source = FallbackSpotSource::new(FailingSource);
        let quote = source.current_spot().unwrap();

        assert_eq!(quote.price_local_mwh, FALLBACK_PRICE_LOCAL_MWH);
        assert_relative_eq!(quote.price_reference_mwh, 3000.0 / 83.0);
        assert!(quote.source.contains("fallback"));
    }

    #[test]
    fn test_fixed_price_with_fx_rate() {
        let quote = FixedSpotPrice::new(50.0)
            .with_fx_rate(90.0)
            .current_spot()
            .unwrap();
        assert_relative_eq!(quote.price_local_mwh, 4500.0, epsilon = 1e-9);
        assert_relative_eq!(quote.price_reference_mwh, 50.0, epsilon = 1e-12);
    }

    #[test]
    fn test_custom_fallback_price() {
        let source = FallbackSpotSource::new(FailingSource).with_fallback(4000.0, 80.0);
        let quote = source.current_spot().unwrap();

        assert_eq!(quote.price_local_mwh, 4000.0);
        assert_eq!(quote.price_reference_mwh, 50.0);
    }

    #[test]
    fn test_fallback_passes_through_success() {
        let source = FallbackSpotSource::new(FixedSpotPrice::new(60.0));
        let quote = source.current_spot().unwrap();
        assert_relative_eq!(quote.price_reference_mwh, 60.0, epsilon = 1e-12);
        assert_eq!(quote.source, "fixed");
    }

    #[test]
    fn test_cached_spot_source() {
        let cached = CachedSpotSource::new(CountingSource {
            calls: AtomicUsize::new(0),
        });

        let a = cached.current_spot().unwrap();
        let b = cached.current_spot().unwrap();
        assert_eq!(a, b);
        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 1);

        cached.invalidate();
        let c = cached.current_spot().unwrap();
        assert_eq!(c.price_local_mwh, 4001.0);
    }
}
