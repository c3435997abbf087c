//! Wilson polynomial model of neocortical neurons.
//!
//! Potentials are in units of 100 mV and times in milliseconds. The sodium activation
//! is a quadratic in the potential; `r` lumps the potassium recovery, `t` the calcium
//! (T-type) current and `h` the calcium-dependent after-hyperpolarization.
//!
//! ```text
//! C dv/dt = -(17.81 + 47.71v + 32.63v²)(v - 0.55) - 26r(v + 0.92) - g_t t (v - 1.2) - g_h h (v + 0.92) + i
//! dr/dt = (-r + 1.35v + 1.03) / tau_r
//! dt/dt = (-t + 8(v + 0.725)²) / 14
//! dh/dt = (-h + 3t) / 45
//! ```
use serde::{Deserialize, Serialize};

use super::{input_range, SomaModel, MS_PER_S};
use crate::integrator::{Integrator, State};
use crate::state_record;

const E_NA: f64 = 0.55;
const E_K: f64 = -0.92;
const E_CA: f64 = 1.2;
const G_K: f64 = 26.0;
const TAU_T: f64 = 14.0;
const TAU_H: f64 = 45.0;

state_record! {
    pub struct WilsonVariables {
        v,
        r,
        t,
        h,
        i,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WilsonParams {
    /// Capacitance
    pub c: f64,
    /// Calcium conductance
    pub g_t: f64,
    /// After-hyperpolarization conductance
    pub g_h: f64,
    /// Recovery time constant (ms)
    pub tau_r: f64,
    pub v_threshold: f64,
    /// Input time constant (ms)
    pub tau_i: f64,
    pub gain_exc: f64,
    pub gain_inh: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WilsonSoma {
    state: WilsonVariables,
    params: WilsonParams,
    integrator: Integrator,
}

fn r_inf(v: f64) -> f64 {
    1.35 * v + 1.03
}

fn t_inf(v: f64) -> f64 {
    8.0 * (v + 0.725).powi(2)
}

fn membrane_current(params: &WilsonParams, v: f64, r: f64, t: f64, h: f64) -> f64 {
    -(17.81 + 47.71 * v + 32.63 * v * v) * (v - E_NA)
        - G_K * r * (v - E_K)
        - params.g_t * t * (v - E_CA)
        - params.g_h * h * (v - E_K)
}

/// Resting state without input, found by bisection on the steady-state current.
fn resting_state(params: &WilsonParams) -> WilsonVariables {
    let steady = |v: f64| {
        let t = t_inf(v);
        membrane_current(params, v, r_inf(v), t, 3.0 * t)
    };
    let (mut lo, mut hi) = (-0.85, -0.6);
    for _ in 0..64 {
        let mid = 0.5 * (lo + hi);
        if steady(mid) > 0.0 {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    let v = 0.5 * (lo + hi);
    WilsonVariables {
        v,
        r: r_inf(v),
        t: t_inf(v),
        h: 3.0 * t_inf(v),
        i: 0.0,
    }
}

impl WilsonSoma {
    fn from_params(params: WilsonParams) -> Self {
        WilsonSoma {
            state: resting_state(&params),
            params,
            integrator: Integrator::Euler,
        }
    }

    fn cortical(g_t: f64, g_h: f64, tau_r: f64) -> Self {
        Self::from_params(WilsonParams {
            c: 1.0,
            g_t,
            g_h,
            tau_r,
            v_threshold: 0.0,
            tau_i: 2.0,
            gain_exc: 0.1,
            gain_inh: 0.1,
        })
    }

    /// Adapting regular-spiking pyramidal cell.
    pub fn regular_spiking() -> Self {
        Self::cortical(0.1, 5.0, 1.9)
    }

    /// Non-adapting fast-spiking interneuron.
    pub fn fast_spiking() -> Self {
        Self::cortical(0.0, 0.0, 2.1)
    }

    /// Intrinsically bursting cell.
    pub fn bursting() -> Self {
        Self::cortical(2.25, 9.5, 1.9)
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

    pub fn state(&self) -> &WilsonVariables {
        &self.state
    }

    pub fn params(&self) -> &WilsonParams {
        &self.params
    }

    fn derivative(p: &WilsonParams, s: &WilsonVariables) -> WilsonVariables {
        WilsonVariables {
            v: (membrane_current(p, s.v, s.r, s.t, s.h) + s.i) / p.c,
            r: (-s.r + r_inf(s.v)) / p.tau_r,
            t: (-s.t + t_inf(s.v)) / TAU_T,
            h: (-s.h + 3.0 * s.t) / TAU_H,
            i: -s.i / p.tau_i,
        }
    }
}

impl SomaModel for WilsonSoma {
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
            ("v", (E_K, E_NA)),
            ("r", (0.0, r_inf(E_NA))),
            ("t", (0.0, 1.0)),
            ("h", (0.0, 3.0)),
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
    fn test_resting_state_is_an_equilibrium() {
        for soma in [
            WilsonSoma::regular_spiking(),
            WilsonSoma::fast_spiking(),
            WilsonSoma::bursting(),
        ] {
            assert_relative_eq!(soma.state().v, -0.70, epsilon = 5e-3);
            let rate = WilsonSoma::derivative(soma.params(), soma.state());
            for value in rate.values() {
                assert!(value.abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_regular_spiking_adapts() {
        let mut soma = WilsonSoma::regular_spiking();
        let mut onsets = Vec::new();
        let mut was_spiking = false;
        for step in 0..20_000 {
            if step % 100 == 0 {
                soma.on_excitatory_spike(10.0);
            }
            soma.integrate(1e-5);
            if soma.is_spiking() && !was_spiking {
                onsets.push(step);
            }
            was_spiking = soma.is_spiking();
        }
        assert!(onsets.len() >= 3);
        // the after-hyperpolarization lengthens the intervals
        let first = onsets[1] - onsets[0];
        let last = onsets[onsets.len() - 1] - onsets[onsets.len() - 2];
        assert!(last > first);
    }
}
