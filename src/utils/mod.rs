//! Utility functions and helpers

mod stats;

pub use stats::{is_constant, mean, pearson_correlation, population_std_dev};
