//! Serializable description of an experiment, from which a [`Simulation`] is built.
//!
//! # Example
//!
//! ```rust
//! use rusty_soma::config::ExperimentConfig;
//!
//! let config: ExperimentConfig = serde_json::from_str(r#"{
//!     "dt": 0.0001,
//!     "num_steps": 1000,
//!     "seed": 7,
//!     "exc_noise": [{ "type": "poisson", "tau": 0.01, "resolution": 0.0001, "max_isi": 0.2 }],
//!     "neurons": [{ "soma": "izhikevich_rs", "exc_weights": [1.0], "inh_weights": [] }]
//! }"#).unwrap();
//!
//! let mut simulation = config.build().unwrap();
//! simulation.run().unwrap();
//! assert_eq!(simulation.neurons()[0].soma_traces().get("v").unwrap().len(), 1001);
//! ```
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::distribution::Distribution;
use crate::error::SimError;
use crate::neuron::Neuron;
use crate::noise::{self, DistributionCache};
use crate::simulation::{Simulation, SimulationConfig};
use crate::soma::Soma;
use crate::spike_train::SpikeTrain;
use crate::synapse::Synapse;

/// The inter-spike interval law of a spike train.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DistributionConfig {
    Point {
        value: f64,
    },
    Uniform {
        low: f64,
        high: f64,
        resolution: f64,
    },
    Poisson {
        tau: f64,
        resolution: f64,
        max_isi: f64,
    },
    PoissonWithMean {
        mean: f64,
        resolution: f64,
        max_isi: f64,
        tolerance: f64,
    },
    Gaussian {
        mean: f64,
        std: f64,
        resolution: f64,
    },
    /// Explicit (interval, weight) pairs.
    Histogram {
        histogram: Vec<(f64, f64)>,
    },
}

impl DistributionConfig {
    pub fn build(&self, cache: &mut DistributionCache) -> Result<Distribution<f64>, SimError> {
        match self {
            DistributionConfig::Point { value } => noise::point(*value),
            DistributionConfig::Uniform {
                low,
                high,
                resolution,
            } => noise::uniform(*low, *high, *resolution),
            DistributionConfig::Poisson {
                tau,
                resolution,
                max_isi,
            } => noise::poisson(*tau, *resolution, *max_isi),
            DistributionConfig::PoissonWithMean {
                mean,
                resolution,
                max_isi,
                tolerance,
            } => noise::poisson_with_mean(*mean, *resolution, *max_isi, *tolerance, cache),
            DistributionConfig::Gaussian {
                mean,
                std,
                resolution,
            } => noise::gaussian(*mean, *std, *resolution),
            DistributionConfig::Histogram { histogram } => {
                Distribution::build(histogram.iter().copied())
            }
        }
    }
}

/// A neuron given by preset names and connection weights.
///
/// The weights (and synapse presets) list the connections to the shared trains of the
/// experiment first, then to the private trains of the neuron.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeuronConfig {
    /// Soma preset name.
    pub soma: String,
    pub exc_weights: Vec<f64>,
    pub inh_weights: Vec<f64>,
    /// Synapse preset names of the excitatory connections, constant synapses by default.
    #[serde(default)]
    pub exc_synapses: Option<Vec<String>>,
    /// Synapse preset names of the inhibitory connections, constant synapses by default.
    #[serde(default)]
    pub inh_synapses: Option<Vec<String>>,
    /// Excitatory trains feeding this neuron only.
    #[serde(default)]
    pub exc_noise: Vec<DistributionConfig>,
    /// Inhibitory trains feeding this neuron only.
    #[serde(default)]
    pub inh_noise: Vec<DistributionConfig>,
    #[serde(default)]
    pub record_synapses: bool,
}

/// The number of private trains of other neurons placed before and after those of a neuron.
type Padding = (usize, usize);

impl NeuronConfig {
    /// A neuron whose connections all use constant synapses.
    pub fn new(soma: &str, exc_weights: Vec<f64>, inh_weights: Vec<f64>) -> Self {
        NeuronConfig {
            soma: soma.to_string(),
            exc_weights,
            inh_weights,
            exc_synapses: None,
            inh_synapses: None,
            exc_noise: vec![],
            inh_noise: vec![],
            record_synapses: false,
        }
    }

    /// Use the same synapse preset for all connections.
    pub fn with_synapses(mut self, preset: &str) -> Self {
        self.exc_synapses = Some(vec![preset.to_string(); self.exc_weights.len()]);
        self.inh_synapses = Some(vec![preset.to_string(); self.inh_weights.len()]);
        self
    }

    /// Feed the neuron with private trains, on top of the shared ones.
    /// Their weights must be appended to the weights of the shared trains.
    pub fn with_noise(
        mut self,
        exc_noise: Vec<DistributionConfig>,
        inh_noise: Vec<DistributionConfig>,
    ) -> Self {
        self.exc_noise = exc_noise;
        self.inh_noise = inh_noise;
        self
    }

    pub fn with_synapse_recording(mut self) -> Self {
        self.record_synapses = true;
        self
    }

    /// Build the neuron alone, i.e., as if no other neuron had private trains.
    pub fn build(&self) -> Result<Neuron, SimError> {
        self.build_padded((0, 0), (0, 0))
    }

    /// Build the neuron, connecting the private trains of the other neurons through
    /// constant synapses of zero weight.
    fn build_padded(&self, exc: Padding, inh: Padding) -> Result<Neuron, SimError> {
        let (exc_synapses, exc_weights) = connections(
            "excitatory",
            &self.exc_weights,
            &self.exc_synapses,
            self.exc_noise.len(),
            exc,
        )?;
        let (inh_synapses, inh_weights) = connections(
            "inhibitory",
            &self.inh_weights,
            &self.inh_synapses,
            self.inh_noise.len(),
            inh,
        )?;
        let neuron = Neuron::build(
            Soma::from_preset(&self.soma)?,
            exc_synapses,
            inh_synapses,
            exc_weights,
            inh_weights,
        )?;
        Ok(if self.record_synapses {
            neuron.with_synapse_recording()
        } else {
            neuron
        })
    }
}

fn connections(
    kind: &str,
    weights: &[f64],
    presets: &Option<Vec<String>>,
    num_private: usize,
    (before, after): Padding,
) -> Result<(Vec<Synapse>, Vec<f64>), SimError> {
    if weights.len() < num_private {
        return Err(SimError::LengthMismatch {
            what: format!("{} weights (private trains)", kind),
            expected: num_private,
            found: weights.len(),
        });
    }
    let mut synapses = match presets {
        Some(presets) => {
            if presets.len() != weights.len() {
                return Err(SimError::LengthMismatch {
                    what: format!("{} synapse presets", kind),
                    expected: weights.len(),
                    found: presets.len(),
                });
            }
            presets
                .iter()
                .map(|name| Synapse::from_preset(name))
                .collect::<Result<Vec<_>, _>>()?
        }
        None => (0..weights.len())
            .map(|_| Synapse::from_preset("constant"))
            .collect::<Result<Vec<_>, _>>()?,
    };
    let mut weights = weights.to_vec();

    let shared = weights.len() - num_private;
    let padding = |n: usize| (0..n).map(|_| Synapse::from_preset("constant"));
    let private_synapses = synapses.split_off(shared);
    let private_weights = weights.split_off(shared);
    synapses.extend(padding(before).collect::<Result<Vec<_>, _>>()?);
    synapses.extend(private_synapses);
    synapses.extend(padding(after).collect::<Result<Vec<_>, _>>()?);
    weights.extend(std::iter::repeat(0.0).take(before));
    weights.extend(private_weights);
    weights.extend(std::iter::repeat(0.0).take(after));
    Ok((synapses, weights))
}

/// A complete experiment: the time grid, the input trains and the neurons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    #[serde(default)]
    pub start: f64,
    pub dt: f64,
    pub num_steps: i64,
    /// Seed from which the seed of every train is derived.
    #[serde(default)]
    pub seed: u64,
    /// Excitatory trains shared by all neurons.
    #[serde(default)]
    pub exc_noise: Vec<DistributionConfig>,
    /// Inhibitory trains shared by all neurons.
    #[serde(default)]
    pub inh_noise: Vec<DistributionConfig>,
    pub neurons: Vec<NeuronConfig>,
}

impl ExperimentConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Build the simulation, with a fresh cache for the tuned interval laws.
    pub fn build(&self) -> Result<Simulation, SimError> {
        self.build_with_cache(&mut DistributionCache::new())
    }

    /// Build the simulation. Every train is primed at the start time and seeded from the
    /// experiment seed: shared excitatory trains first, then the private excitatory trains
    /// neuron by neuron, and likewise for the inhibitory trains.
    pub fn build_with_cache(&self, cache: &mut DistributionCache) -> Result<Simulation, SimError> {
        let config = SimulationConfig::build(self.start, self.dt, self.num_steps)?;

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut trains = |noise: &[DistributionConfig]| -> Result<Vec<SpikeTrain>, SimError> {
            noise
                .iter()
                .map(|distribution| {
                    let distribution = distribution.build(cache)?.with_seed(rng.gen());
                    Ok(SpikeTrain::new(distribution, config.start()))
                })
                .collect()
        };
        let mut exc_trains = trains(&self.exc_noise)?;
        for neuron in self.neurons.iter() {
            exc_trains.extend(trains(&neuron.exc_noise)?);
        }
        let mut inh_trains = trains(&self.inh_noise)?;
        for neuron in self.neurons.iter() {
            inh_trains.extend(trains(&neuron.inh_noise)?);
        }

        let num_exc: usize = self.neurons.iter().map(|n| n.exc_noise.len()).sum();
        let num_inh: usize = self.neurons.iter().map(|n| n.inh_noise.len()).sum();
        let (mut exc_before, mut inh_before) = (0, 0);
        let mut neurons = Vec::with_capacity(self.neurons.len());
        for neuron in self.neurons.iter() {
            let exc_after = num_exc - exc_before - neuron.exc_noise.len();
            let inh_after = num_inh - inh_before - neuron.inh_noise.len();
            neurons.push(neuron.build_padded((exc_before, exc_after), (inh_before, inh_after))?);
            exc_before += neuron.exc_noise.len();
            inh_before += neuron.inh_noise.len();
        }

        log::debug!(
            "Experiment built with {} neurons, {} excitatory and {} inhibitory trains",
            neurons.len(),
            exc_trains.len(),
            inh_trains.len()
        );
        Simulation::build(config, neurons, exc_trains, inh_trains)
    }

    /// Save the experiment to a JSON file.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), SimError> {
        let file = File::create(path).map_err(|e| SimError::IOError(e.to_string()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)
            .map_err(|e| SimError::IOError(e.to_string()))?;
        writer.flush().map_err(|e| SimError::IOError(e.to_string()))
    }

    /// Load an experiment from a JSON file.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, SimError> {
        let file = File::open(path).map_err(|e| SimError::IOError(e.to_string()))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).map_err(|e| SimError::IOError(e.to_string()))
    }
}
