//! Module implementing stochastic spike trains.
//!
//! A spike train draws its inter-spike intervals from a [`Distribution`] and emits
//! spikes on the simulation time grid.
use itertools::Itertools;

use crate::distribution::Distribution;

/// Represents a stochastic pre-synaptic spike source.
#[derive(Debug, Clone)]
pub struct SpikeTrain {
    /// The law of the inter-spike intervals (s).
    distribution: Distribution<f64>,
    /// The emitted spike times, in non-decreasing order.
    spikes: Vec<f64>,
    /// The scheduled time of the next spike, off the time grid in general.
    next_spike: f64,
    /// The time at which the train was primed.
    start: f64,
}

impl SpikeTrain {
    /// Create a spike train whose first spike is scheduled one interval after `start`.
    pub fn new(mut distribution: Distribution<f64>, start: f64) -> Self {
        let next_spike = start + distribution.next_event();
        SpikeTrain {
            distribution,
            spikes: vec![],
            next_spike,
            start,
        }
    }

    /// Advance the train from `t` to `t + dt`.
    /// Returns true if the scheduled spike is closest to `t + dt` on the time grid, in which
    /// case the spike is recorded at `t + dt` and the next one is scheduled one freshly sampled
    /// interval after the scheduled time.
    pub fn on_time_step(&mut self, t: f64, dt: f64) -> bool {
        let now = t + dt;
        if self.next_spike - now >= 0.5 * dt {
            return false;
        }
        self.spikes.push(now);
        self.next_spike += self.distribution.next_event();
        log::trace!("Spike train fired at {}, next spike at {}", now, self.next_spike);
        true
    }

    /// Returns the emitted spike times.
    pub fn spikes(&self) -> &[f64] {
        &self.spikes
    }

    pub fn num_spikes(&self) -> usize {
        self.spikes.len()
    }

    pub fn next_spike(&self) -> f64 {
        self.next_spike
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn distribution(&self) -> &Distribution<f64> {
        &self.distribution
    }

    /// Returns the intervals between consecutive emitted spikes.
    pub fn inter_spike_intervals(&self) -> Vec<f64> {
        self.spikes
            .iter()
            .tuple_windows()
            .map(|(a, b)| b - a)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::noise;

    #[test]
    fn test_primed_at_construction() {
        let train = SpikeTrain::new(noise::point(0.01).unwrap(), 0.5);
        assert_relative_eq!(train.next_spike(), 0.51);
        assert!(train.spikes().is_empty());
    }

    #[test]
    fn test_point_mass_is_periodic() {
        let dt = 0.001;
        let mut train = SpikeTrain::new(noise::point(0.01).unwrap(), 0.0);
        let fired: Vec<usize> = (0..100)
            .filter(|&k| train.on_time_step(k as f64 * dt, dt))
            .collect();

        assert_eq!(fired, vec![9, 19, 29, 39, 49, 59, 69, 79, 89, 99]);
        for (i, &spike) in train.spikes().iter().enumerate() {
            assert_relative_eq!(spike, 0.01 * (i + 1) as f64, epsilon = 1e-12);
        }
        for isi in train.inter_spike_intervals() {
            assert_relative_eq!(isi, 0.01, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_off_grid_point_mass_does_not_drift() {
        let dt = 0.001;
        let mut train = SpikeTrain::new(noise::point(0.0104).unwrap(), 0.0);
        for k in 0..100 {
            train.on_time_step(k as f64 * dt, dt);
        }

        let expected = [0.010, 0.021, 0.031, 0.042, 0.052, 0.062, 0.073, 0.083, 0.094];
        assert_eq!(train.num_spikes(), expected.len());
        for (&spike, &time) in train.spikes().iter().zip(expected.iter()) {
            assert_relative_eq!(spike, time, epsilon = 1e-12);
        }
        assert_relative_eq!(train.next_spike(), 0.104, epsilon = 1e-12);
    }

    #[test]
    fn test_no_spike_no_state_change() {
        let mut train = SpikeTrain::new(noise::point(0.01).unwrap(), 0.0);
        let next = train.next_spike();
        assert!(!train.on_time_step(0.0, 0.001));
        assert_eq!(train.next_spike(), next);
        assert_eq!(train.num_spikes(), 0);
    }

    #[test]
    fn test_spikes_are_non_decreasing() {
        let distribution = noise::poisson(0.005, 0.001, 0.1).unwrap().with_seed(42);
        let mut train = SpikeTrain::new(distribution, 0.0);
        for k in 0..1_000 {
            train.on_time_step(k as f64 * 0.001, 0.001);
        }
        assert!(train.num_spikes() > 100);
        assert!(train.inter_spike_intervals().iter().all(|&isi| isi > 0.0));
    }

    #[test]
    fn test_degenerate_never_fires() {
        let distribution = Distribution::<f64>::build(vec![]).unwrap();
        let mut train = SpikeTrain::new(distribution, 0.0);
        for k in 0..100 {
            assert!(!train.on_time_step(k as f64, 1.0));
        }
    }
}
