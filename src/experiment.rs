//! Registry of named experiments.
//!
//! The registry maps a name to a factory producing the [`ExperimentConfig`] of the
//! experiment for a given seed. It is built once with [`Registry::standard`] and never
//! modified afterwards.
use std::collections::BTreeMap;

use crate::config::{DistributionConfig, ExperimentConfig, NeuronConfig};
use crate::error::SimError;
use crate::soma::SOMA_PRESETS;

/// A function producing an experiment from a seed.
pub type Factory = Box<dyn Fn(u64) -> ExperimentConfig + Send + Sync>;

struct Entry {
    description: &'static str,
    factory: Factory,
}

/// The table of available experiments.
pub struct Registry {
    entries: BTreeMap<&'static str, Entry>,
}

/// Time step of the registered experiments (s).
const DT: f64 = 1e-4;

/// Excitatory weight giving each soma family a comparable drive from Poisson input.
fn drive_weight(soma: &str) -> f64 {
    match soma {
        "lif" => 1.5,
        "hodgkin_huxley" => 2.0,
        s if s.starts_with("wilson") => 10.0,
        _ => 1.0,
    }
}

fn poisson_noise(mean: f64) -> DistributionConfig {
    DistributionConfig::PoissonWithMean {
        mean,
        resolution: DT,
        max_isi: 0.5,
        tolerance: 1e-6,
    }
}

fn soma_comparison(seed: u64) -> ExperimentConfig {
    ExperimentConfig {
        start: 0.0,
        dt: DT,
        num_steps: 10_000,
        seed,
        exc_noise: vec![poisson_noise(0.02); 5],
        inh_noise: vec![poisson_noise(0.05); 2],
        neurons: SOMA_PRESETS
            .iter()
            .map(|&soma| {
                let w = drive_weight(soma);
                NeuronConfig::new(soma, vec![w; 5], vec![0.5 * w; 2])
            })
            .collect(),
    }
}

fn regular_input(seed: u64) -> ExperimentConfig {
    ExperimentConfig {
        start: 0.0,
        dt: 1e-3,
        num_steps: 1_000,
        seed,
        exc_noise: vec![DistributionConfig::Point { value: 0.01 }],
        inh_noise: vec![],
        neurons: vec![NeuronConfig::new("lif", vec![5.0], vec![])],
    }
}

fn plasticity(seed: u64) -> ExperimentConfig {
    ExperimentConfig {
        start: 0.0,
        dt: DT,
        num_steps: 20_000,
        seed,
        exc_noise: vec![poisson_noise(0.025); 8],
        inh_noise: vec![poisson_noise(0.05); 2],
        neurons: vec![NeuronConfig::new("izhikevich_rs", vec![0.8; 8], vec![0.5; 2])
            .with_synapses("plastic")
            .with_synapse_recording()],
    }
}

fn noise_statistics(seed: u64) -> ExperimentConfig {
    let noise = vec![
        DistributionConfig::Poisson {
            tau: 0.02,
            resolution: DT,
            max_isi: 0.5,
        },
        DistributionConfig::Gaussian {
            mean: 0.02,
            std: 0.005,
            resolution: DT,
        },
        DistributionConfig::Uniform {
            low: 0.01,
            high: 0.03,
            resolution: DT,
        },
    ];
    ExperimentConfig {
        start: 0.0,
        dt: DT,
        num_steps: 10_000,
        seed,
        neurons: (0..3)
            .map(|_| NeuronConfig::new("izhikevich", vec![2.0, 2.0, 2.0], vec![]))
            .collect(),
        exc_noise: noise,
        inh_noise: vec![],
    }
}

fn wilson_family(seed: u64) -> ExperimentConfig {
    ExperimentConfig {
        start: 0.0,
        dt: DT,
        num_steps: 10_000,
        seed,
        exc_noise: vec![poisson_noise(0.01); 4],
        inh_noise: vec![],
        neurons: ["wilson_rs", "wilson_fs", "wilson_bursting"]
            .iter()
            .map(|&soma| NeuronConfig::new(soma, vec![drive_weight(soma); 4], vec![]))
            .collect(),
    }
}

impl Registry {
    /// The registry of all built-in experiments.
    pub fn standard() -> Self {
        let mut registry = Registry {
            entries: BTreeMap::new(),
        };
        registry.register(
            "soma_comparison",
            "Every soma preset under the same excitatory and inhibitory Poisson input",
            Box::new(soma_comparison),
        );
        registry.register(
            "regular_input",
            "A leaky integrate-and-fire neuron driven by a periodic train",
            Box::new(regular_input),
        );
        registry.register(
            "plasticity",
            "An Izhikevich neuron whose plastic synapses adapt to Poisson input",
            Box::new(plasticity),
        );
        registry.register(
            "noise_statistics",
            "Izhikevich neurons driven by Poisson, Gaussian and uniform intervals",
            Box::new(noise_statistics),
        );
        registry.register(
            "wilson_family",
            "The Wilson regular-spiking, fast-spiking and bursting presets",
            Box::new(wilson_family),
        );
        registry
    }

    fn register(&mut self, name: &'static str, description: &'static str, factory: Factory) {
        self.entries.insert(
            name,
            Entry {
                description,
                factory,
            },
        );
    }

    /// Returns the names of the registered experiments, in alphabetical order.
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.keys().copied().collect()
    }

    pub fn description(&self, name: &str) -> Option<&'static str> {
        self.entries.get(name).map(|entry| entry.description)
    }

    /// Produce the experiment with the given name and seed.
    /// The function returns an error if no experiment has this name.
    pub fn experiment(&self, name: &str, seed: u64) -> Result<ExperimentConfig, SimError> {
        let entry = self.entries.get(name).ok_or_else(|| {
            SimError::UnknownPreset(format!(
                "No experiment named '{}' (available: {})",
                name,
                self.names().join(", ")
            ))
        })?;
        Ok((entry.factory)(seed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::DistributionCache;

    #[test]
    fn test_registry() {
        let registry = Registry::standard();
        assert_eq!(
            registry.names(),
            vec![
                "noise_statistics",
                "plasticity",
                "regular_input",
                "soma_comparison",
                "wilson_family"
            ]
        );
        assert!(registry.description("plasticity").is_some());
        assert_eq!(registry.experiment("regular_input", 9).unwrap().seed, 9);
        assert!(matches!(
            registry.experiment("unknown", 0),
            Err(SimError::UnknownPreset(_))
        ));
    }

    #[test]
    fn test_every_experiment_builds() {
        let registry = Registry::standard();
        let mut cache = DistributionCache::new();
        for name in registry.names() {
            let config = registry.experiment(name, 0).unwrap();
            let simulation = config.build_with_cache(&mut cache).unwrap();
            assert_eq!(simulation.neurons().len(), config.neurons.len());
        }
        // the tuned Poisson laws are shared between experiments
        assert_eq!(cache.len(), 4);
    }

    #[test]
    fn test_regular_input_fires() {
        let mut simulation = Registry::standard()
            .experiment("regular_input", 0)
            .unwrap()
            .build()
            .unwrap();
        simulation.run().unwrap();
        assert_eq!(simulation.exc_trains()[0].num_spikes(), 100);
        assert!(!simulation.neurons()[0].spikes().is_empty());
    }
}
