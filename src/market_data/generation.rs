//! Solar generation forecasts
//!
//! The engine consumes a twelve-month AC output profile for a PV system. Where
//! it comes from (a PV modelling service, a stored profile) is up to the
//! [`GenerationSource`] implementation.

use crate::{Error, Result};
use ahash::AHashMap;
use log::debug;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Hours in a non-leap year, used for capacity factors
pub const HOURS_PER_YEAR: f64 = 8760.0;

/// PV system description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolarSystem {
    /// Latitude (decimal degrees)
    pub latitude: f64,

    /// Longitude (decimal degrees)
    pub longitude: f64,

    /// DC nameplate capacity (kW)
    pub system_capacity_kw: f64,

    /// 0 = standard, 1 = premium, 2 = thin film
    pub module_type: u8,

    /// 0 = fixed open rack, 1 = fixed roof mount, 2 = 1-axis,
    /// 3 = 1-axis backtracked, 4 = 2-axis
    pub array_type: u8,

    /// Tilt angle (degrees)
    pub tilt: f64,

    /// Azimuth (degrees in [0, 360), 180 = south)
    pub azimuth: f64,

    /// System losses (%)
    pub losses: f64,
}

impl SolarSystem {
    /// System at a location with default module and mounting parameters
    pub fn new(latitude: f64, longitude: f64, system_capacity_kw: f64) -> Self {
        Self {
            latitude,
            longitude,
            system_capacity_kw,
            module_type: 1,
            array_type: 1,
            tilt: 20.0,
            azimuth: 180.0,
            losses: 14.0,
        }
    }

    /// Validate system parameters
    pub fn validate(&self) -> Result<()> {
        check_range("latitude", self.latitude, -90.0, 90.0)?;
        check_range("longitude", self.longitude, -180.0, 180.0)?;
        check_range("tilt", self.tilt, 0.0, 90.0)?;
        check_range("losses", self.losses, -5.0, 99.0)?;

        if !(0.0..360.0).contains(&self.azimuth) {
            return Err(Error::InvalidParameter(format!(
                "azimuth must be in [0, 360), got {}",
                self.azimuth
            )));
        }

        if !(self.system_capacity_kw.is_finite() && self.system_capacity_kw > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "system_capacity_kw must be positive, got {}",
                self.system_capacity_kw
            )));
        }

        if self.module_type > 2 {
            return Err(Error::InvalidParameter(format!(
                "module_type must be 0..=2, got {}",
                self.module_type
            )));
        }

        if self.array_type > 4 {
            return Err(Error::InvalidParameter(format!(
                "array_type must be 0..=4, got {}",
                self.array_type
            )));
        }

        Ok(())
    }

    fn cache_key(&self) -> SystemKey {
        SystemKey {
            coordinates: [
                self.latitude.to_bits(),
                self.longitude.to_bits(),
                self.system_capacity_kw.to_bits(),
                self.tilt.to_bits(),
                self.azimuth.to_bits(),
                self.losses.to_bits(),
            ],
            module_type: self.module_type,
            array_type: self.array_type,
        }
    }
}

fn check_range(name: &str, value: f64, min: f64, max: f64) -> Result<()> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidParameter(format!(
            "{name} must be in [{min}, {max}], got {value}"
        )))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct SystemKey {
    coordinates: [u64; 6],
    module_type: u8,
    array_type: u8,
}

/// Twelve-month AC output of a PV system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyGeneration {
    /// Monthly AC output (kWh), January first
    pub ac_monthly_kwh: Vec<f64>,

    /// Annual AC output (kWh)
    pub ac_annual_kwh: f64,

    /// Capacity factor (%)
    pub capacity_factor: f64,
}

impl MonthlyGeneration {
    /// Build from monthly kWh and the system's DC capacity
    pub fn from_monthly_kwh(ac_monthly_kwh: Vec<f64>, system_capacity_kw: f64) -> Result<Self> {
        let ac_annual_kwh: f64 = ac_monthly_kwh.iter().sum();
        let capacity_factor = if system_capacity_kw > 0.0 {
            ac_annual_kwh / (system_capacity_kw * HOURS_PER_YEAR) * 100.0
        } else {
            0.0
        };

        let generation = Self {
            ac_monthly_kwh,
            ac_annual_kwh,
            capacity_factor,
        };
        generation.validate()?;
        Ok(generation)
    }

    /// Reject anything other than twelve finite, non-negative months
    pub fn validate(&self) -> Result<()> {
        if self.ac_monthly_kwh.len() != 12 {
            return Err(Error::UpstreamData(format!(
                "expected 12 monthly generation values, got {}",
                self.ac_monthly_kwh.len()
            )));
        }

        if let Some((month, value)) = self
            .ac_monthly_kwh
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite() || **v < 0.0)
        {
            return Err(Error::UpstreamData(format!(
                "monthly generation for month {} is invalid: {}",
                month + 1,
                value
            )));
        }

        if !self.capacity_factor.is_finite() || self.capacity_factor < 0.0 {
            return Err(Error::UpstreamData(format!(
                "capacity factor is invalid: {}",
                self.capacity_factor
            )));
        }

        Ok(())
    }

    /// Monthly output converted to MWh
    pub fn monthly_mwh(&self) -> Vec<f64> {
        self.ac_monthly_kwh.iter().map(|kwh| kwh / 1000.0).collect()
    }

    /// Annual output in MWh
    pub fn annual_mwh(&self) -> f64 {
        self.ac_annual_kwh / 1000.0
    }
}

/// Source of monthly generation forecasts
///
/// Implementations should be idempotent for identical systems and report
/// malformed upstream data as [`Error::UpstreamData`].
pub trait GenerationSource: Send + Sync {
    /// Forecast twelve months of AC output for `system`
    fn monthly_output(&self, system: &SolarSystem) -> Result<MonthlyGeneration>;

    /// Get a source name
    fn name(&self) -> &str;
}

/// Fixed specific-yield profile scaled by system capacity
#[derive(Debug, Clone)]
pub struct StaticGenerationSource {
    kwh_per_kw: [f64; 12],
}

impl StaticGenerationSource {
    /// Profile of monthly kWh produced per kW of capacity
    pub fn new(kwh_per_kw: [f64; 12]) -> Self {
        Self { kwh_per_kw }
    }
}

impl GenerationSource for StaticGenerationSource {
    fn monthly_output(&self, system: &SolarSystem) -> Result<MonthlyGeneration> {
        system.validate()?;

        let monthly = self
            .kwh_per_kw
            .iter()
            .map(|yield_kwh| yield_kwh * system.system_capacity_kw)
            .collect();

        MonthlyGeneration::from_monthly_kwh(monthly, system.system_capacity_kw)
    }

    fn name(&self) -> &str {
        "static-profile"
    }
}

/// Read-through cache in front of another generation source
///
/// Entries are keyed by the full system description and expire after `ttl`.
pub struct CachedGenerationSource<S> {
    inner: S,
    ttl: Duration,
    entries: RwLock<AHashMap<SystemKey, (Instant, MonthlyGeneration)>>,
}

impl<S: GenerationSource> CachedGenerationSource<S> {
    pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

    pub fn new(inner: S) -> Self {
        Self::with_ttl(inner, Self::DEFAULT_TTL)
    }

    pub fn with_ttl(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: RwLock::new(AHashMap::new()),
        }
    }

    /// Number of cached systems (including expired entries not yet replaced)
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drop all cached forecasts
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl<S: GenerationSource> GenerationSource for CachedGenerationSource<S> {
    fn monthly_output(&self, system: &SolarSystem) -> Result<MonthlyGeneration> {
        let key = system.cache_key();

        if let Some((fetched_at, generation)) = self.entries.read().get(&key)
            && fetched_at.elapsed() < self.ttl
        {
            debug!("Generation cache hit ({})", self.inner.name());
            return Ok(generation.clone());
        }

        debug!("Generation cache miss ({})", self.inner.name());
        let generation = self.inner.monthly_output(system)?;
        self.entries
            .write()
            .insert(key, (Instant::now(), generation.clone()));

        Ok(generation)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        calls: AtomicUsize,
    }

    impl GenerationSource for CountingSource {
        fn monthly_output(&self, system: &SolarSystem) -> Result<MonthlyGeneration> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            MonthlyGeneration::from_monthly_kwh(vec![1000.0; 12], system.system_capacity_kw)
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    #[test]
    fn test_system_validation() {
        assert!(SolarSystem::new(40.0, -105.0, 100.0).validate().is_ok());
        assert!(SolarSystem::new(95.0, -105.0, 100.0).validate().is_err());
        assert!(SolarSystem::new(40.0, -181.0, 100.0).validate().is_err());
        assert!(SolarSystem::new(40.0, -105.0, 0.0).validate().is_err());

        let mut system = SolarSystem::new(40.0, -105.0, 100.0);
        system.module_type = 3;
        assert!(system.validate().is_err());
    }

    #[test]
    fn test_azimuth_range() {
        let mut system = SolarSystem::new(40.0, -105.0, 100.0);
        system.azimuth = 0.0;
        assert!(system.validate().is_ok());
        system.azimuth = 359.9;
        assert!(system.validate().is_ok());

        for azimuth in [360.0, 370.0, -90.0, f64::NAN] {
            system.azimuth = azimuth;
            assert!(
                matches!(system.validate(), Err(Error::InvalidParameter(_))),
                "azimuth {azimuth} accepted"
            );
        }
    }

    #[test]
    fn test_monthly_generation_conversion() {
        let generation = MonthlyGeneration::from_monthly_kwh(vec![730.0; 12], 1.0).unwrap();

        assert_eq!(generation.monthly_mwh(), vec![0.73; 12]);
        assert_eq!(generation.ac_annual_kwh, 8760.0);
        assert!((generation.capacity_factor - 100.0).abs() < 1e-9);
        assert!((generation.annual_mwh() - 8.76).abs() < 1e-12);
    }

    #[test]
    fn test_malformed_generation_rejected() {
        assert!(matches!(
            MonthlyGeneration::from_monthly_kwh(vec![1.0; 11], 1.0),
            Err(Error::UpstreamData(_))
        ));
        let mut values = vec![1.0; 12];
        values[3] = -1.0;
        assert!(matches!(
            MonthlyGeneration::from_monthly_kwh(values, 1.0),
            Err(Error::UpstreamData(_))
        ));
    }

    #[test]
    fn test_static_source_scales_with_capacity() {
        let source = StaticGenerationSource::new([100.0; 12]);
        let generation = source
            .monthly_output(&SolarSystem::new(40.0, -105.0, 250.0))
            .unwrap();

        assert_eq!(generation.ac_monthly_kwh[0], 25_000.0);
        assert_eq!(generation.ac_annual_kwh, 300_000.0);
    }

    #[test]
    fn test_cache_reuses_forecast() {
        let cached = CachedGenerationSource::new(CountingSource {
            calls: AtomicUsize::new(0),
        });
        let system = SolarSystem::new(40.0, -105.0, 100.0);

        let first = cached.monthly_output(&system).unwrap();
        let second = cached.monthly_output(&system).unwrap();
        assert_eq!(first, second);
        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 1);

        let other = SolarSystem::new(41.0, -105.0, 100.0);
        cached.monthly_output(&other).unwrap();
        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cached.len(), 2);

        cached.clear();
        assert!(cached.is_empty());
        cached.monthly_output(&system).unwrap();
        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_cache_expiry() {
        let cached = CachedGenerationSource::with_ttl(
            CountingSource {
                calls: AtomicUsize::new(0),
            },
            Duration::ZERO,
        );
        let system = SolarSystem::new(40.0, -105.0, 100.0);

        cached.monthly_output(&system).unwrap();
        cached.monthly_output(&system).unwrap();
        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 2);
    }
}
