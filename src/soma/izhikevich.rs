//! Izhikevich membrane models.
//!
//! ```text
//! dv/dt = 0.04v² + 5v + 140 - u + i
//! du/dt = a(bv - u)
//! di/dt = -i / tau_i
//! if v >= v_peak: v = c, u = u + d, i = 0
//! ```
//! Potentials are in millivolts and times in milliseconds.
use serde::{Deserialize, Serialize};

use super::{input_range, SomaModel, MS_PER_S};
use crate::integrator::{Integrator, State};
use crate::state_record;

state_record! {
    /// The state of an Izhikevich membrane.
    pub struct IzhikevichVariables {
        /// Membrane potential (mV)
        v,
        /// Recovery variable
        u,
        /// Synaptic input
        i,
    }
}

/// The constants of an Izhikevich membrane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IzhikevichParams {
    /// Time scale of the recovery variable
    pub a: f64,
    /// Sensitivity of the recovery variable to the potential
    pub b: f64,
    /// Post-spike potential (mV)
    pub c: f64,
    /// Post-spike increment of the recovery variable
    pub d: f64,
    /// Spike peak, also the upper bound of the potential (mV)
    pub v_peak: f64,
    /// Input time constant (ms)
    pub tau_i: f64,
    pub gain_exc: f64,
    pub gain_inh: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IzhikevichSoma {
    state: IzhikevichVariables,
    params: IzhikevichParams,
    integrator: Integrator,
}

impl IzhikevichSoma {
    /// Resting potential all presets start from (mV).
    const V_REST: f64 = -65.0;

    fn from_abcd(a: f64, b: f64, c: f64, d: f64) -> Self {
        IzhikevichSoma {
            state: IzhikevichVariables {
                v: Self::V_REST,
                u: b * Self::V_REST,
                i: 0.0,
            },
            params: IzhikevichParams {
                a,
                b,
                c,
                d,
                v_peak: 30.0,
                tau_i: 5.0,
                gain_exc: 10.0,
                gain_inh: 10.0,
            },
            integrator: Integrator::Euler,
        }
    }

    /// Tonic spiking, the default parameter set.
    pub fn tonic() -> Self {
        Self::from_abcd(0.02, 0.2, -65.0, 6.0)
    }

    pub fn regular_spiking() -> Self {
        Self::from_abcd(0.02, 0.2, -65.0, 8.0)
    }

    pub fn fast_spiking() -> Self {
        Self::from_abcd(0.1, 0.2, -65.0, 2.0)
    }

    pub fn chattering() -> Self {
        Self::from_abcd(0.02, 0.2, -50.0, 2.0)
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

    pub fn state(&self) -> &IzhikevichVariables {
        &self.state
    }

    pub fn params(&self) -> &IzhikevichParams {
        &self.params
    }

    fn derivative(params: &IzhikevichParams, s: &IzhikevichVariables) -> IzhikevichVariables {
        IzhikevichVariables {
            v: 0.04 * s.v * s.v + 5.0 * s.v + 140.0 - s.u + s.i,
            u: params.a * (params.b * s.v - s.u),
            i: -s.i / params.tau_i,
        }
    }
}

impl SomaModel for IzhikevichSoma {
    fn integrate(&mut self, dt: f64) {
        if self.is_spiking() {
            self.state.v = self.params.c;
            self.state.u += self.params.d;
            self.state.i = 0.0;
            return;
        }
        let params = self.params;
        self.integrator
            .step(&mut self.state, dt * MS_PER_S, |s| Self::derivative(&params, s));
        self.state.v = self.state.v.min(params.v_peak);
    }

    fn is_spiking(&self) -> bool {
        self.state.v >= self.params.v_peak
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
            ("v", (-90.0, self.params.v_peak)),
            ("u", (-20.0, 20.0)),
            (
                "i",
                input_range(num_trains, self.params.gain_exc, self.params.gain_inh),
            ),
        ]
    }
}
