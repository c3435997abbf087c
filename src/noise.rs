//! Preset inter-spike interval laws used as stochastic pre-synaptic input.
//!
//! Every preset returns a [`Distribution`] over interval lengths (in seconds) which are
//! multiples of a time resolution. Presets tuned to an exact mean are expensive to
//! build, hence they go through an explicit [`DistributionCache`].
use std::collections::HashMap;

use crate::distribution::Distribution;
use crate::error::SimError;
use crate::utils::snap;

/// The maximum number of bisection iterations when tuning a preset to an exact mean.
pub const MAX_BISECTION_ITER: usize = 256;
/// Slack added before flooring a ratio of times, e.g., 0.5 / 0.001.
const ROUNDING_SLACK: f64 = 1e-9;

/// A law concentrated on a single interval.
pub fn point(value: f64) -> Result<Distribution<f64>, SimError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(SimError::InvalidParameter(format!(
            "A point interval must be finite and positive, got {}",
            value
        )));
    }
    Distribution::build(vec![(value, 1.0)])
}

/// Equally likely intervals `low, low + resolution, ...` up to `high`.
pub fn uniform(low: f64, high: f64, resolution: f64) -> Result<Distribution<f64>, SimError> {
    check_resolution(resolution)?;
    if !(low > 0.0 && low <= high) {
        return Err(SimError::InvalidParameter(format!(
            "Uniform intervals need 0 < low <= high, got [{}, {}]",
            low, high
        )));
    }
    let num_events = ((high - low) / resolution + ROUNDING_SLACK).floor() as usize + 1;
    Distribution::build((0..num_events).map(|k| (low + k as f64 * resolution, 1.0)))
}

/// Discretized exponential intervals with time constant `tau`, truncated at `max_isi`.
/// This is the interval law of a Poisson process observed at the given resolution.
pub fn poisson(tau: f64, resolution: f64, max_isi: f64) -> Result<Distribution<f64>, SimError> {
    check_resolution(resolution)?;
    if !(tau > 0.0) {
        return Err(SimError::InvalidParameter(format!(
            "The time constant must be positive, got {}",
            tau
        )));
    }
    if !(max_isi >= resolution) {
        return Err(SimError::InvalidParameter(format!(
            "The maximum interval {} is shorter than the resolution {}",
            max_isi, resolution
        )));
    }
    let num_events = (max_isi / resolution + ROUNDING_SLACK).floor() as usize;
    // Weights relative to the first interval so that a small tau never underflows to zero
    Distribution::build((1..=num_events).map(|k| {
        let isi = k as f64 * resolution;
        (isi, (-(isi - resolution) / tau).exp())
    }))
}

/// Discretized normal intervals, truncated at four standard deviations and to positive values.
pub fn gaussian(mean: f64, std: f64, resolution: f64) -> Result<Distribution<f64>, SimError> {
    check_resolution(resolution)?;
    if !(mean >= resolution) || !(std >= 0.0) {
        return Err(SimError::InvalidParameter(format!(
            "Gaussian intervals need mean >= resolution and std >= 0, got {} and {}",
            mean, std
        )));
    }
    if std == 0.0 {
        return point(snap(mean, resolution));
    }
    let first = ((mean - 4.0 * std) / resolution).floor().max(1.0) as usize;
    let last = ((mean + 4.0 * std) / resolution).ceil() as usize;
    Distribution::build((first..=last).map(|k| {
        let isi = k as f64 * resolution;
        (isi, (-(isi - mean).powi(2) / (2.0 * std * std)).exp())
    }))
}

/// Poisson intervals whose discretized mean is within `tolerance` of the target.
/// The time constant is found by bisection; the function returns a convergence error if the
/// search interval collapses before reaching the tolerance, e.g., for unreachable means.
pub fn tune_poisson_mean(
    mean: f64,
    resolution: f64,
    max_isi: f64,
    tolerance: f64,
) -> Result<Distribution<f64>, SimError> {
    if !(tolerance > 0.0) || !mean.is_finite() {
        return Err(SimError::InvalidParameter(format!(
            "Invalid target mean {} or tolerance {}",
            mean, tolerance
        )));
    }

    let mut lo = resolution * 1e-3;
    let mut hi = max_isi * 1e3;
    for iter in 0..MAX_BISECTION_ITER {
        let tau = 0.5 * (lo + hi);
        let distribution = poisson(tau, resolution, max_isi)?;
        let error = distribution.mean() - mean;
        log::trace!("Iter {}: tau is {} and mean error is {}", iter, tau, error);

        if error.abs() <= tolerance {
            log::debug!(
                "Poisson intervals tuned to mean {} (tau = {}) in {} iterations",
                mean,
                tau,
                iter + 1
            );
            return Ok(distribution);
        }

        if error < 0.0 {
            lo = tau;
        } else {
            hi = tau;
        }

        if hi - lo <= f64::EPSILON * hi {
            break;
        }
    }

    Err(SimError::ConvergenceError(format!(
        "Could not reach the mean interval {} within {} (resolution {}, maximum interval {})",
        mean, tolerance, resolution, max_isi
    )))
}

/// Cached version of [`tune_poisson_mean`].
pub fn poisson_with_mean(
    mean: f64,
    resolution: f64,
    max_isi: f64,
    tolerance: f64,
    cache: &mut DistributionCache,
) -> Result<Distribution<f64>, SimError> {
    let key = format!(
        "poisson_with_mean:{}:{}:{}:{}",
        mean, resolution, max_isi, tolerance
    );
    cache.get_or_try_insert_with(&key, || {
        tune_poisson_mean(mean, resolution, max_isi, tolerance)
    })
}

fn check_resolution(resolution: f64) -> Result<(), SimError> {
    if !resolution.is_finite() || resolution <= 0.0 {
        return Err(SimError::InvalidParameter(format!(
            "The resolution must be finite and positive, got {}",
            resolution
        )));
    }
    Ok(())
}

/// A cache of expensive preset distributions, keyed by preset name and parameters.
/// Entries are never evicted.
#[derive(Debug, Clone, Default)]
pub struct DistributionCache {
    entries: HashMap<String, Distribution<f64>>,
}

impl DistributionCache {
    pub fn new() -> Self {
        DistributionCache {
            entries: HashMap::new(),
        }
    }

    /// Returns a copy of the cached distribution for the key, building and caching it on a miss.
    /// Failed builds are not cached.
    pub fn get_or_try_insert_with<F>(&mut self, key: &str, build: F) -> Result<Distribution<f64>, SimError>
    where
        F: FnOnce() -> Result<Distribution<f64>, SimError>,
    {
        if let Some(distribution) = self.entries.get(key) {
            log::trace!("Cache hit for {}", key);
            return Ok(distribution.clone());
        }
        let distribution = build()?;
        self.entries.insert(key.to_string(), distribution.clone());
        Ok(distribution)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
