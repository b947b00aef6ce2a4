use std::fmt::{Debug, Formatter};
use std::ops::Range;
use std::sync::Arc;

use rand::Rng;

use crate::error::{CatalogError, Result};

pub const DEFAULT_MULTIPLIER_MIN: f64 = 1000.0;
pub const DEFAULT_MULTIPLIER_MAX: f64 = 2000.0;

/// Source of the per-record GDP multiplier.
pub trait MultiplierSource: Send + Sync + 'static {
    /// Draws a value from `range` (half-open).
    fn sample(&self, range: Range<f64>) -> f64;
}

/// Draws uniformly from the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngMultiplier;

impl MultiplierSource for ThreadRngMultiplier {
    fn sample(&self, range: Range<f64>) -> f64 {
        rand::rng().random_range(range)
    }
}

/// Always returns the same multiplier, ignoring the configured range.
#[derive(Debug, Clone, Copy)]
pub struct FixedMultiplier(pub f64);

impl MultiplierSource for FixedMultiplier {
    fn sample(&self, _range: Range<f64>) -> f64 {
        self.0
    }
}

/// Computes `population * multiplier / rate`, the illustrative GDP figure.
///
/// The multiplier is drawn fresh for every record, so two refreshes over
/// identical data produce different estimates.
#[derive(Clone)]
pub struct GdpEstimator {
    range: Range<f64>,
    source: Arc<dyn MultiplierSource>,
}

impl GdpEstimator {
    pub fn new(min: f64, max: f64) -> Result<Self> {
        Self::with_source(min, max, ThreadRngMultiplier)
    }

    pub fn with_source(min: f64, max: f64, source: impl MultiplierSource) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() || min <= 0.0 || min >= max {
            return Err(CatalogError::InvalidConfig(format!(
                "gdp multiplier range must satisfy 0 < min < max, got [{min}, {max})"
            )));
        }

        Ok(Self {
            range: min..max,
            source: Arc::new(source),
        })
    }

    pub fn range(&self) -> Range<f64> {
        self.range.clone()
    }

    /// `rate` must be finite and strictly positive.
    pub fn estimate(&self, population: u64, rate: f64) -> f64 {
        let multiplier = self.source.sample(self.range.clone());
        population as f64 * multiplier / rate
    }
}

impl Default for GdpEstimator {
    fn default() -> Self {
        Self {
            range: DEFAULT_MULTIPLIER_MIN..DEFAULT_MULTIPLIER_MAX,
            source: Arc::new(ThreadRngMultiplier),
        }
    }
}

impl Debug for GdpEstimator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GdpEstimator")
            .field("range", &self.range)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_estimate_stays_within_range() {
        let estimator = GdpEstimator::default();

        for _ in 0..1_000 {
            let gdp = estimator.estimate(1_000_000, 10.0);
            assert!((1e8..2e8).contains(&gdp), "{gdp} out of range");
        }
    }

    #[test]
    fn fixed_multiplier_is_deterministic() {
        let estimator = GdpEstimator::with_source(1000.0, 2000.0, FixedMultiplier(1500.0)).unwrap();

        assert_eq!(estimator.estimate(1_000, 2.0), 750_000.0);
        assert_eq!(estimator.estimate(1_000, 2.0), 750_000.0);
    }

    #[test]
    fn rejects_invalid_ranges() {
        for (min, max) in [(2000.0, 1000.0), (1000.0, 1000.0), (0.0, 10.0), (1.0, f64::NAN)] {
            assert!(
                matches!(GdpEstimator::new(min, max), Err(CatalogError::InvalidConfig(_))),
                "[{min}, {max}) should be rejected"
            );
        }
    }
}
