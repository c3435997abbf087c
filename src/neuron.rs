//! This module provides the `Neuron` structure composing a soma with its input synapses.
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::soma::Soma;
use crate::synapse::Synapse;
use crate::utils::Traces;

/// Represents a spiking neuron.
///
/// The i-th excitatory (inhibitory) synapse and weight belong to the connection from the
/// i-th excitatory (inhibitory) spike train of the simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neuron {
    soma: Soma,
    exc_synapses: Vec<Synapse>,
    inh_synapses: Vec<Synapse>,
    exc_weights: Vec<f64>,
    inh_weights: Vec<f64>,
    /// The emitted spike times.
    spikes: Vec<f64>,
    /// The recorded soma variables.
    soma_traces: Traces,
    /// The recorded synapse variables, excitatory then inhibitory, if enabled.
    synapse_traces: Option<Vec<Traces>>,
}

impl Neuron {
    /// Create a neuron from its soma, its synapses and the weights of its connections.
    /// The function returns an error if the number of synapses and weights differ, or if
    /// a weight is negative or not finite.
    pub fn build(
        soma: Soma,
        exc_synapses: Vec<Synapse>,
        inh_synapses: Vec<Synapse>,
        exc_weights: Vec<f64>,
        inh_weights: Vec<f64>,
    ) -> Result<Self, SimError> {
        if exc_weights.len() != exc_synapses.len() {
            return Err(SimError::LengthMismatch {
                what: "excitatory weights".to_string(),
                expected: exc_synapses.len(),
                found: exc_weights.len(),
            });
        }
        if inh_weights.len() != inh_synapses.len() {
            return Err(SimError::LengthMismatch {
                what: "inhibitory weights".to_string(),
                expected: inh_synapses.len(),
                found: inh_weights.len(),
            });
        }
        if let Some(w) = exc_weights
            .iter()
            .chain(inh_weights.iter())
            .find(|w| !w.is_finite() || **w < 0.0)
        {
            return Err(SimError::InvalidParameter(format!(
                "Connection weights must be finite and non-negative, got {}",
                w
            )));
        }

        Ok(Neuron {
            soma,
            exc_synapses,
            inh_synapses,
            exc_weights,
            inh_weights,
            spikes: vec![],
            soma_traces: Traces::new(),
            synapse_traces: None,
        })
    }

    /// Create a neuron whose connections all use the same synapse preset.
    pub fn from_presets(
        soma: &str,
        synapse: &str,
        exc_weights: Vec<f64>,
        inh_weights: Vec<f64>,
    ) -> Result<Self, SimError> {
        let exc_synapses = (0..exc_weights.len())
            .map(|_| Synapse::from_preset(synapse))
            .collect::<Result<Vec<_>, _>>()?;
        let inh_synapses = (0..inh_weights.len())
            .map(|_| Synapse::from_preset(synapse))
            .collect::<Result<Vec<_>, _>>()?;
        Neuron::build(
            Soma::from_preset(soma)?,
            exc_synapses,
            inh_synapses,
            exc_weights,
            inh_weights,
        )
    }

    /// Also record the variables of every synapse.
    pub fn with_synapse_recording(mut self) -> Self {
        self.synapse_traces = Some(vec![Traces::new(); self.num_synapses()]);
        self
    }

    /// Reset the recordings and record the current state at time `t`.
    pub fn start_recording(&mut self, t: f64) {
        self.soma_traces.clear();
        self.soma_traces.record(t, &self.soma.variables());
        if self.synapse_traces.is_some() {
            self.synapse_traces = Some(vec![Traces::new(); self.num_synapses()]);
            self.record_synapses(t);
        }
    }

    /// Advance the soma from `t` to `t + dt` and record its variables.
    /// Returns true if the soma started spiking, in which case the spike is recorded at `t + dt`.
    pub fn integrate(&mut self, t: f64, dt: f64) -> bool {
        let was_spiking = self.soma.is_spiking();
        self.soma.integrate(dt);
        let fired = !was_spiking && self.soma.is_spiking();
        if fired {
            self.spikes.push(t + dt);
        }
        self.soma_traces.record(t + dt, &self.soma.variables());
        fired
    }

    /// Advance every synapse from `t` to `t + dt`.
    pub fn integrate_synapses(&mut self, t: f64, dt: f64) {
        for synapse in self
            .exc_synapses
            .iter_mut()
            .chain(self.inh_synapses.iter_mut())
        {
            synapse.integrate(dt);
        }
        self.record_synapses(t + dt);
    }

    /// Advance the soma and the synapses by one step, informing the synapses if the soma fired.
    pub fn step(&mut self, t: f64, dt: f64) -> bool {
        let fired = self.integrate(t, dt);
        self.integrate_synapses(t, dt);
        if fired {
            self.on_post_synaptic_spike();
        }
        fired
    }

    pub fn on_post_synaptic_spike(&mut self) {
        for synapse in self
            .exc_synapses
            .iter_mut()
            .chain(self.inh_synapses.iter_mut())
        {
            synapse.on_post_synaptic_spike();
        }
    }

    /// Deliver a spike from the i-th excitatory train.
    pub fn on_excitatory_spike(&mut self, i: usize) -> Result<(), SimError> {
        let synapse = self.exc_synapses.get_mut(i).ok_or_else(|| {
            SimError::InvalidParameter(format!("No excitatory synapse with index {}", i))
        })?;
        synapse.on_pre_synaptic_spike();
        self.soma
            .on_excitatory_spike(self.exc_weights[i] * synapse.weight())
    }

    /// Deliver a spike from the i-th inhibitory train.
    pub fn on_inhibitory_spike(&mut self, i: usize) -> Result<(), SimError> {
        let synapse = self.inh_synapses.get_mut(i).ok_or_else(|| {
            SimError::InvalidParameter(format!("No inhibitory synapse with index {}", i))
        })?;
        synapse.on_pre_synaptic_spike();
        self.soma
            .on_inhibitory_spike(self.inh_weights[i] * synapse.weight())
    }

    fn record_synapses(&mut self, t: f64) {
        if let Some(traces) = self.synapse_traces.as_mut() {
            for (traces, synapse) in traces
                .iter_mut()
                .zip(self.exc_synapses.iter().chain(self.inh_synapses.iter()))
            {
                traces.record(t, &synapse.variables());
            }
        }
    }

    pub fn soma(&self) -> &Soma {
        &self.soma
    }

    pub fn exc_synapses(&self) -> &[Synapse] {
        &self.exc_synapses
    }

    pub fn inh_synapses(&self) -> &[Synapse] {
        &self.inh_synapses
    }

    pub fn exc_weights(&self) -> &[f64] {
        &self.exc_weights
    }

    pub fn inh_weights(&self) -> &[f64] {
        &self.inh_weights
    }

    pub fn num_synapses(&self) -> usize {
        self.exc_synapses.len() + self.inh_synapses.len()
    }

    /// Returns a slice of emitted spike times.
    pub fn spikes(&self) -> &[f64] {
        &self.spikes
    }

    /// Returns the recorded soma variables.
    pub fn soma_traces(&self) -> &Traces {
        &self.soma_traces
    }

    /// Returns the recorded variables of the synapses (excitatory first), if enabled.
    pub fn synapse_traces(&self) -> Option<&[Traces]> {
        self.synapse_traces.as_deref()
    }
}
