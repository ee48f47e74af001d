//! Generation forecasts and spot prices consumed by the pricer

mod generation;
mod spot;

pub use generation::{
    CachedGenerationSource, GenerationSource, HOURS_PER_YEAR, MonthlyGeneration, SolarSystem,
    StaticGenerationSource,
};
pub use spot::{
    CachedSpotSource, DEFAULT_FX_RATE, FALLBACK_PRICE_LOCAL_MWH, FallbackSpotSource,
    FixedSpotPrice, SpotInput, SpotPriceSource, SpotQuote,
};
