//! Fixed-step simulation of neurons driven by stochastic spike trains.
//!
//! Every step from `t` to `t + dt` runs in a fixed order:
//! 1. every neuron integrates its soma (recording a spike on a rising edge), then its
//!    synapses, which receive the post-synaptic event if the soma fired;
//! 2. the excitatory then the inhibitory spike trains advance;
//! 3. the spike of every train that fired is delivered to the matching synapse and to
//!    the soma of every neuron, so that it only affects the next step.
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::neuron::Neuron;
use crate::spike_train::SpikeTrain;
use crate::summary::SimulationReport;

/// Minimum number of neurons to integrate them in parallel.
pub const MIN_NEURONS_PAR: usize = 10;

/// The time grid of a simulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    start: f64,
    dt: f64,
    num_steps: usize,
}

impl SimulationConfig {
    /// Create a time grid of `num_steps` steps of length `dt` from `start`.
    /// The function returns an error for a non-positive or non-finite step, a non-finite
    /// start, or a negative number of steps.
    pub fn build(start: f64, dt: f64, num_steps: i64) -> Result<Self, SimError> {
        if !start.is_finite() {
            return Err(SimError::InvalidParameter(format!(
                "The start time must be finite, got {}",
                start
            )));
        }
        if !dt.is_finite() || dt <= 0.0 {
            return Err(SimError::InvalidParameter(format!(
                "The time step must be finite and positive, got {}",
                dt
            )));
        }
        let num_steps = usize::try_from(num_steps).map_err(|_| {
            SimError::InvalidParameter(format!(
                "The number of steps must be non-negative, got {}",
                num_steps
            ))
        })?;
        Ok(SimulationConfig {
            start,
            dt,
            num_steps,
        })
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn num_steps(&self) -> usize {
        self.num_steps
    }

    /// The time at the beginning of the k-th step.
    pub fn time_at(&self, k: usize) -> f64 {
        self.start + k as f64 * self.dt
    }

    pub fn end(&self) -> f64 {
        self.time_at(self.num_steps)
    }
}

#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimulationConfig,
    neurons: Vec<Neuron>,
    exc_trains: Vec<SpikeTrain>,
    inh_trains: Vec<SpikeTrain>,
    /// Number of steps already run.
    steps_done: usize,
}

impl Simulation {
    /// Create a simulation and record the initial state of every neuron at the start time.
    /// The function returns an error if a neuron does not have exactly one excitatory
    /// (inhibitory) synapse per excitatory (inhibitory) train, or if a train was not
    /// primed at the start time or already fired.
    pub fn build(
        config: SimulationConfig,
        mut neurons: Vec<Neuron>,
        exc_trains: Vec<SpikeTrain>,
        inh_trains: Vec<SpikeTrain>,
    ) -> Result<Self, SimError> {
        for neuron in neurons.iter() {
            if neuron.exc_synapses().len() != exc_trains.len() {
                return Err(SimError::LengthMismatch {
                    what: "excitatory synapses".to_string(),
                    expected: exc_trains.len(),
                    found: neuron.exc_synapses().len(),
                });
            }
            if neuron.inh_synapses().len() != inh_trains.len() {
                return Err(SimError::LengthMismatch {
                    what: "inhibitory synapses".to_string(),
                    expected: inh_trains.len(),
                    found: neuron.inh_synapses().len(),
                });
            }
        }

        if let Some(train) = exc_trains
            .iter()
            .chain(inh_trains.iter())
            .find(|train| train.start() != config.start() || train.num_spikes() > 0)
        {
            return Err(SimError::InvalidParameter(format!(
                "Every spike train must be freshly primed at the start time {}, got one primed at {} with {} spikes",
                config.start(),
                train.start(),
                train.num_spikes()
            )));
        }

        for neuron in neurons.iter_mut() {
            neuron.start_recording(config.start());
        }

        Ok(Simulation {
            config,
            neurons,
            exc_trains,
            inh_trains,
            steps_done: 0,
        })
    }

    /// Run all the remaining steps.
    pub fn run(&mut self) -> Result<(), SimError> {
        log::info!(
            "Starting simulation of {} neurons over {} steps...",
            self.neurons.len(),
            self.config.num_steps()
        );

        let num_steps = self.config.num_steps();
        let log_interval = (num_steps / 10).max(1);
        while self.steps_done < num_steps {
            let t = self.config.time_at(self.steps_done);
            self.step(t, self.config.dt())?;
            self.steps_done += 1;

            if self.steps_done % log_interval == 0 {
                log::debug!(
                    "Simulation progress: {:.0}% (Time: {:.4}/{:.4})",
                    100.0 * self.steps_done as f64 / num_steps as f64,
                    self.time(),
                    self.config.end()
                );
            }
        }

        log::info!("Simulation completed successfully!");
        Ok(())
    }

    fn step(&mut self, t: f64, dt: f64) -> Result<(), SimError> {
        if self.neurons.len() > MIN_NEURONS_PAR {
            self.neurons.par_iter_mut().for_each(|neuron| {
                neuron.step(t, dt);
            });
        } else {
            self.neurons.iter_mut().for_each(|neuron| {
                neuron.step(t, dt);
            });
        }

        let exc_fired = fired_trains(&mut self.exc_trains, t, dt);
        let inh_fired = fired_trains(&mut self.inh_trains, t, dt);

        for neuron in self.neurons.iter_mut() {
            for &i in exc_fired.iter() {
                neuron.on_excitatory_spike(i)?;
            }
            for &i in inh_fired.iter() {
                neuron.on_inhibitory_spike(i)?;
            }
        }
        Ok(())
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// The current simulation time.
    pub fn time(&self) -> f64 {
        self.config.time_at(self.steps_done)
    }

    pub fn is_finished(&self) -> bool {
        self.steps_done == self.config.num_steps()
    }

    pub fn neurons(&self) -> &[Neuron] {
        &self.neurons
    }

    pub fn neuron(&self, id: usize) -> Option<&Neuron> {
        self.neurons.get(id)
    }

    pub fn exc_trains(&self) -> &[SpikeTrain] {
        &self.exc_trains
    }

    pub fn inh_trains(&self) -> &[SpikeTrain] {
        &self.inh_trains
    }

    /// Summarize the emitted spikes of the neurons and the trains.
    pub fn report(&self) -> SimulationReport {
        SimulationReport::new(self)
    }
}

/// Advance every train and return the indices of those which fired.
fn fired_trains(trains: &mut [SpikeTrain], t: f64, dt: f64) -> Vec<usize> {
    trains
        .iter_mut()
        .enumerate()
        .filter_map(|(i, train)| train.on_time_step(t, dt).then_some(i))
        .collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::noise;

    #[test]
    fn test_config_build() {
        let config = SimulationConfig::build(0.5, 0.001, 1_000).unwrap();
        assert_eq!(config.num_steps(), 1_000);
        assert_relative_eq!(config.end(), 1.5);

        for dt in [0.0, -0.001, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                SimulationConfig::build(0.0, dt, 10),
                Err(SimError::InvalidParameter(_))
            ));
        }
        assert!(matches!(
            SimulationConfig::build(0.0, 0.001, -1),
            Err(SimError::InvalidParameter(_))
        ));
        assert!(SimulationConfig::build(0.0, 0.001, 0).is_ok());
    }

    #[test]
    fn test_build_checks_train_counts() {
        let config = SimulationConfig::build(0.0, 0.001, 10).unwrap();
        let neuron = Neuron::from_presets("lif", "constant", vec![1.0, 1.0], vec![]).unwrap();
        let trains = vec![SpikeTrain::new(noise::point(0.01).unwrap(), 0.0)];

        let result = Simulation::build(config, vec![neuron], trains, vec![]);
        assert!(matches!(
            result,
            Err(SimError::LengthMismatch {
                expected: 1,
                found: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_build_checks_train_priming() {
        let config = SimulationConfig::build(0.5, 0.001, 10).unwrap();
        let trains = vec![SpikeTrain::new(noise::point(0.01).unwrap(), 0.0)];
        assert!(matches!(
            Simulation::build(config, vec![], trains, vec![]),
            Err(SimError::InvalidParameter(_))
        ));

        let mut train = SpikeTrain::new(noise::point(0.001).unwrap(), 0.5);
        assert!(train.on_time_step(0.5, 0.001));
        assert!(matches!(
            Simulation::build(config, vec![], vec![], vec![train]),
            Err(SimError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_time_is_computed_from_start() {
        let config = SimulationConfig::build(0.1, 0.001, 1_000).unwrap();
        let mut simulation = Simulation::build(config, vec![], vec![], vec![]).unwrap();
        simulation.run().unwrap();
        assert!(simulation.is_finished());
        assert_eq!(simulation.time(), 0.1 + 1_000.0 * 0.001);

        // running again is a no-op
        simulation.run().unwrap();
        assert_eq!(simulation.time(), 0.1 + 1_000.0 * 0.001);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let run = |num_neurons: usize| {
            let config = SimulationConfig::build(0.0, 1e-4, 2_000).unwrap();
            let neurons = (0..num_neurons)
                .map(|_| Neuron::from_presets("izhikevich_rs", "plastic", vec![1.0], vec![0.5]))
                .collect::<Result<Vec<_>, _>>()
                .unwrap();
            let exc = noise::poisson(0.005, 1e-4, 0.1).unwrap().with_seed(1);
            let inh = noise::poisson(0.01, 1e-4, 0.1).unwrap().with_seed(2);
            let mut simulation = Simulation::build(
                config,
                neurons,
                vec![SpikeTrain::new(exc, 0.0)],
                vec![SpikeTrain::new(inh, 0.0)],
            )
            .unwrap();
            simulation.run().unwrap();
            simulation.neurons()[0].clone()
        };
        assert_eq!(run(1), run(12));
    }
}
