//! Read-only summaries of a simulation, for reporting and plotting collaborators.
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use itertools::Itertools;

use crate::distribution::Distribution;
use crate::error::SimError;
use crate::simulation::Simulation;

/// Descriptive statistics of a spike sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpikeStatistics {
    pub num_spikes: usize,
    /// Average number of spikes per second over the observed duration.
    pub rate: f64,
    /// Mean inter-spike interval, if at least two spikes were emitted.
    pub mean_isi: Option<f64>,
    /// Coefficient of variation of the inter-spike intervals, if defined.
    pub cv_isi: Option<f64>,
}

impl SpikeStatistics {
    /// Compute the statistics of spikes observed during `duration` seconds.
    pub fn from_spikes(spikes: &[f64], duration: f64) -> Self {
        let rate = if duration > 0.0 {
            spikes.len() as f64 / duration
        } else {
            0.0
        };

        let isis = spikes
            .iter()
            .tuple_windows()
            .map(|(a, b)| (b - a, 1.0))
            .collect::<Vec<_>>();
        let (mean_isi, cv_isi) = match Distribution::build(isis) {
            Ok(distribution) if !distribution.is_degenerate() => {
                let finite = |x: f64| if x.is_finite() { Some(x) } else { None };
                (
                    finite(distribution.mean()),
                    finite(distribution.coefficient_of_variation()),
                )
            }
            _ => (None, None),
        };

        SpikeStatistics {
            num_spikes: spikes.len(),
            rate,
            mean_isi,
            cv_isi,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpikeReport {
    pub spikes: Vec<f64>,
    pub statistics: SpikeStatistics,
}

impl SpikeReport {
    fn new(spikes: &[f64], duration: f64) -> Self {
        SpikeReport {
            spikes: spikes.to_vec(),
            statistics: SpikeStatistics::from_spikes(spikes, duration),
        }
    }
}

/// The spikes emitted by every neuron and every train of a simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub start: f64,
    pub dt: f64,
    /// The simulated time so far, i.e., the duration over which rates are computed.
    pub duration: f64,
    pub neurons: Vec<SpikeReport>,
    pub exc_trains: Vec<SpikeReport>,
    pub inh_trains: Vec<SpikeReport>,
}

impl SimulationReport {
    pub fn new(simulation: &Simulation) -> Self {
        let start = simulation.config().start();
        let duration = simulation.time() - start;
        SimulationReport {
            start,
            dt: simulation.config().dt(),
            duration,
            neurons: simulation
                .neurons()
                .iter()
                .map(|neuron| SpikeReport::new(neuron.spikes(), duration))
                .collect(),
            exc_trains: simulation
                .exc_trains()
                .iter()
                .map(|train| SpikeReport::new(train.spikes(), duration))
                .collect(),
            inh_trains: simulation
                .inh_trains()
                .iter()
                .map(|train| SpikeReport::new(train.spikes(), duration))
                .collect(),
        }
    }

    /// Save the report to a JSON file.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), SimError> {
        let file = File::create(path).map_err(|e| SimError::IOError(e.to_string()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)
            .map_err(|e| SimError::IOError(e.to_string()))?;
        writer.flush().map_err(|e| SimError::IOError(e.to_string()))
    }

    /// Load a report from a JSON file.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, SimError> {
        let file = File::open(path).map_err(|e| SimError::IOError(e.to_string()))?;
        serde_json::from_reader(file).map_err(|e| SimError::IOError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_regular_spikes() {
        let statistics = SpikeStatistics::from_spikes(&[0.1, 0.2, 0.3, 0.4], 1.0);
        assert_eq!(statistics.num_spikes, 4);
        assert_relative_eq!(statistics.rate, 4.0);
        assert_relative_eq!(statistics.mean_isi.unwrap(), 0.1, epsilon = 1e-12);
        assert!(statistics.cv_isi.unwrap() < 1e-6);
    }

    #[test]
    fn test_too_few_spikes() {
        let statistics = SpikeStatistics::from_spikes(&[0.5], 2.0);
        assert_relative_eq!(statistics.rate, 0.5);
        assert_eq!(statistics.mean_isi, None);
        assert_eq!(statistics.cv_isi, None);

        let statistics = SpikeStatistics::from_spikes(&[], 0.0);
        assert_eq!(statistics.rate, 0.0);
        assert_eq!(statistics.mean_isi, None);
    }

    #[test]
    fn test_irregular_spikes() {
        let statistics = SpikeStatistics::from_spikes(&[0.0, 0.1, 0.4], 1.0);
        assert_relative_eq!(statistics.mean_isi.unwrap(), 0.2, epsilon = 1e-12);
        // intervals 0.1 and 0.3: std 0.1
        assert_relative_eq!(statistics.cv_isi.unwrap(), 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_save_and_load_keeps_exact_times() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let spikes = vec![0.030000000000000002, 0.051000000000000004, 0.1 + 0.2];
        let report = SimulationReport {
            start: 0.0,
            dt: 0.001,
            duration: 0.1,
            neurons: vec![SpikeReport::new(&spikes, 0.1)],
            exc_trains: vec![],
            inh_trains: vec![],
        };
        report.save_to(&path).unwrap();

        let loaded = SimulationReport::load_from(&path).unwrap();
        assert_eq!(loaded.neurons[0].spikes, spikes);
        assert_eq!(loaded, report);
    }
}
