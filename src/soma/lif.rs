//! Leaky integrate-and-fire membrane.
//!
//! ```text
//! dv/dt = (v_rest - v + i) / tau_m
//! di/dt = -i / tau_i
//! if v >= v_threshold: v = v_saturation, i = 0
//! ```
//! Potentials are in volts and times in seconds.
use serde::{Deserialize, Serialize};

use super::{input_range, SomaModel};
use crate::integrator::{Integrator, State};
use crate::state_record;

state_record! {
    /// The state of a leaky integrate-and-fire membrane.
    pub struct LifVariables {
        /// Membrane potential (V)
        v,
        /// Synaptic input (V)
        i,
    }
}

/// The constants of a leaky integrate-and-fire membrane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LifParams {
    /// Resting potential (V)
    pub v_rest: f64,
    /// Firing threshold (V)
    pub v_threshold: f64,
    /// Post-spike potential (V)
    pub v_saturation: f64,
    /// Membrane time constant (s)
    pub tau_m: f64,
    /// Input time constant (s)
    pub tau_i: f64,
    /// Input increment per unit of excitatory weight (V)
    pub gain_exc: f64,
    /// Input decrement per unit of inhibitory weight (V)
    pub gain_inh: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifSoma {
    state: LifVariables,
    params: LifParams,
    integrator: Integrator,
}

impl LifSoma {
    fn from_params(params: LifParams) -> Self {
        LifSoma {
            state: LifVariables {
                v: params.v_rest,
                i: 0.0,
            },
            params,
            integrator: Integrator::Euler,
        }
    }

    /// A cortical pyramidal cell.
    pub fn cortical() -> Self {
        Self::from_params(LifParams {
            v_rest: -0.065,
            v_threshold: -0.050,
            v_saturation: -0.070,
            tau_m: 0.020,
            tau_i: 0.005,
            gain_exc: 0.01,
            gain_inh: 0.01,
        })
    }

    pub fn with_gains(mut self, gain_exc: f64, gain_inh: f64) -> Self {
        self.params.gain_exc = gain_exc;
        self.params.gain_inh = gain_inh;
        self
    }

    pub fn with_integrator(mut self, integrator: Integrator) -> Self {
        self.integrator = integrator;
        self
    }

    /// Set the membrane potential, e.g., to start away from rest.
    pub fn with_potential(mut self, v: f64) -> Self {
        self.state.v = v;
        self
    }

    pub fn state(&self) -> &LifVariables {
        &self.state
    }

    pub fn params(&self) -> &LifParams {
        &self.params
    }

    fn derivative(params: &LifParams, s: &LifVariables) -> LifVariables {
        LifVariables {
            v: (params.v_rest - s.v + s.i) / params.tau_m,
            i: -s.i / params.tau_i,
        }
    }
}

impl SomaModel for LifSoma {
    fn integrate(&mut self, dt: f64) {
        if self.is_spiking() {
            self.state.v = self.params.v_saturation;
            self.state.i = 0.0;
            return;
        }
        let params = self.params;
        self.integrator
            .step(&mut self.state, dt, |s| Self::derivative(&params, s));
    }

    fn is_spiking(&self) -> bool {
        self.state.v >= self.params.v_threshold
    }

    fn on_excitatory_spike(&mut self, weight: f64) {
        self.state.i += weight * self.params.gain_exc;
    }

    fn on_inhibitory_spike(&mut self, weight: f64) {
        self.state.i -= weight * self.params.gain_inh;
    }

    fn variables(&self) -> Vec<(&'static str, f64)> {
        self.state.named_values()
    }

    fn key_variable(&self) -> &'static str {
        "v"
    }

    fn ranges_of_variables(&self, num_trains: usize) -> Vec<(&'static str, (f64, f64))> {
        vec![
            ("v", (self.params.v_saturation, self.params.v_threshold)),
            (
                "i",
                input_range(num_trains, self.params.gain_exc, self.params.gain_inh),
            ),
        ]
    }
}
