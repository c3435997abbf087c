//! Hodgkin-Huxley sodium/potassium conductance model of the squid giant axon.
//!
//! Potentials are in millivolts, conductances in mS/cm², currents in µA/cm² and times in
//! milliseconds. The model has no artificial reset: once the potential crosses the
//! threshold, the pending synaptic input is cleared and the dynamics produce the spike
//! and the repolarization themselves.
use serde::{Deserialize, Serialize};

use super::{input_range, SomaModel, MS_PER_S};
use crate::integrator::{Integrator, State};
use crate::state_record;

state_record! {
    /// The state of a Hodgkin-Huxley membrane.
    pub struct HodgkinHuxleyVariables {
        /// Membrane potential (mV)
        v,
        /// Potassium activation
        n,
        /// Sodium activation
        m,
        /// Sodium inactivation
        h,
        /// Synaptic input current (µA/cm²)
        i,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HodgkinHuxleyParams {
    /// Membrane capacitance (µF/cm²)
    pub c_m: f64,
    pub g_na: f64,
    pub g_k: f64,
    pub g_l: f64,
    pub e_na: f64,
    pub e_k: f64,
    pub e_l: f64,
    /// Potential above which the membrane is spiking (mV)
    pub v_threshold: f64,
    /// Input time constant (ms)
    pub tau_i: f64,
    pub gain_exc: f64,
    pub gain_inh: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HodgkinHuxleySoma {
    state: HodgkinHuxleyVariables,
    params: HodgkinHuxleyParams,
    integrator: Integrator,
}

/// `x / (exp(x / y) - 1)`, continuous at `x = 0`.
fn vtrap(x: f64, y: f64) -> f64 {
    if (x / y).abs() < 1e-6 {
        y * (1.0 - x / y / 2.0)
    } else {
        x / ((x / y).exp() - 1.0)
    }
}

/// Opening and closing rates (1/ms) of the gates, in the order n, m, h.
fn gate_rates(v: f64) -> [(f64, f64); 3] {
    [
        (
            0.01 * vtrap(-(v + 55.0), 10.0),
            0.125 * (-(v + 65.0) / 80.0).exp(),
        ),
        (
            0.1 * vtrap(-(v + 40.0), 10.0),
            4.0 * (-(v + 65.0) / 18.0).exp(),
        ),
        (
            0.07 * (-(v + 65.0) / 20.0).exp(),
            1.0 / (1.0 + (-(v + 35.0) / 10.0).exp()),
        ),
    ]
}

impl HodgkinHuxleySoma {
    const V_REST: f64 = -65.0;

    /// The original squid axon constants, starting at rest with steady-state gates.
    pub fn squid_axon() -> Self {
        let [n, m, h] = gate_rates(Self::V_REST).map(|(alpha, beta)| alpha / (alpha + beta));
        HodgkinHuxleySoma {
            state: HodgkinHuxleyVariables {
                v: Self::V_REST,
                n,
                m,
                h,
                i: 0.0,
            },
            params: HodgkinHuxleyParams {
                c_m: 1.0,
                g_na: 120.0,
                g_k: 36.0,
                g_l: 0.3,
                e_na: 50.0,
                e_k: -77.0,
                e_l: -54.387,
                v_threshold: 0.0,
                tau_i: 2.0,
                gain_exc: 10.0,
                gain_inh: 10.0,
            },
            integrator: Integrator::Midpoint,
        }
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

    pub fn state(&self) -> &HodgkinHuxleyVariables {
        &self.state
    }

    pub fn params(&self) -> &HodgkinHuxleyParams {
        &self.params
    }

    fn derivative(p: &HodgkinHuxleyParams, s: &HodgkinHuxleyVariables) -> HodgkinHuxleyVariables {
        let [(an, bn), (am, bm), (ah, bh)] = gate_rates(s.v);
        let i_na = p.g_na * s.m.powi(3) * s.h * (s.v - p.e_na);
        let i_k = p.g_k * s.n.powi(4) * (s.v - p.e_k);
        let i_l = p.g_l * (s.v - p.e_l);
        HodgkinHuxleyVariables {
            v: (s.i - i_na - i_k - i_l) / p.c_m,
            n: an * (1.0 - s.n) - bn * s.n,
            m: am * (1.0 - s.m) - bm * s.m,
            h: ah * (1.0 - s.h) - bh * s.h,
            i: -s.i / p.tau_i,
        }
    }
}

impl SomaModel for HodgkinHuxleySoma {
    fn integrate(&mut self, dt: f64) {
        if self.is_spiking() {
            self.state.i = 0.0;
        }
        let params = self.params;
        self.integrator
            .step(&mut self.state, dt * MS_PER_S, |s| Self::derivative(&params, s));
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
            ("v", (self.params.e_k, self.params.e_na)),
            ("n", (0.0, 1.0)),
            ("m", (0.0, 1.0)),
            ("h", (0.0, 1.0)),
            (
                "i",
                input_range(num_trains, self.params.gain_exc, self.params.gain_inh),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_vtrap_is_continuous() {
        assert_relative_eq!(vtrap(0.0, 10.0), 10.0);
        assert_relative_eq!(vtrap(1e-9, 10.0), 10.0, epsilon = 1e-8);
        assert_relative_eq!(vtrap(-1e-9, 10.0), 10.0, epsilon = 1e-8);
        assert_relative_eq!(vtrap(1e-3, 10.0), 1e-3 / (1e-4_f64.exp() - 1.0), epsilon = 1e-9);
    }

    #[test]
    fn test_gates_start_at_steady_state() {
        let soma = HodgkinHuxleySoma::squid_axon();
        let rate = HodgkinHuxleySoma::derivative(soma.params(), soma.state());
        assert_relative_eq!(rate.n, 0.0, epsilon = 1e-12);
        assert_relative_eq!(rate.m, 0.0, epsilon = 1e-12);
        assert_relative_eq!(rate.h, 0.0, epsilon = 1e-12);
        assert!(rate.v.abs() < 0.01);
    }

    #[test]
    fn test_action_potential_repolarizes() {
        let mut soma = HodgkinHuxleySoma::squid_axon();
        soma.on_excitatory_spike(5.0);

        let mut peak = f64::NEG_INFINITY;
        let mut spiked = false;
        for _ in 0..2_000 {
            spiked |= soma.is_spiking();
            soma.integrate(1e-5);
            peak = peak.max(soma.state().v);
        }
        assert!(spiked);
        assert!(peak > 20.0 && peak < soma.params().e_na);
        // input was cleared at the spike and the potential fell back below threshold
        assert_eq!(soma.state().i, 0.0);
        assert!(!soma.is_spiking());
    }
}
