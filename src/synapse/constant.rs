//! Fixed-efficacy synapse.
use serde::{Deserialize, Serialize};

use super::{SynapseModel, SynapseVariables};
use crate::integrator::{Integrator, State};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConstantParams {
    /// Decay time constant of both traces (s)
    pub tau_trace: f64,
    /// Trace increment per spike
    pub impulse: f64,
}

/// A synapse whose weight never changes; its traces only reflect recent activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantSynapse {
    state: SynapseVariables,
    params: ConstantParams,
    integrator: Integrator,
}

impl Default for ConstantSynapse {
    fn default() -> Self {
        ConstantSynapse {
            state: SynapseVariables {
                pre: 0.0,
                post: 0.0,
                weight: 1.0,
            },
            params: ConstantParams {
                tau_trace: 0.001,
                impulse: 1.0,
            },
            integrator: Integrator::Euler,
        }
    }
}

impl ConstantSynapse {
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.state.weight = weight;
        self
    }

    pub fn state(&self) -> &SynapseVariables {
        &self.state
    }
}

impl SynapseModel for ConstantSynapse {
    fn integrate(&mut self, dt: f64) {
        let tau = self.params.tau_trace;
        self.integrator.step(&mut self.state, dt, |s| SynapseVariables {
            pre: -s.pre / tau,
            post: -s.post / tau,
            weight: 0.0,
        });
        // Euler overshoots below zero when dt > tau_trace
        self.state.pre = self.state.pre.max(0.0);
        self.state.post = self.state.post.max(0.0);
    }

    fn on_pre_synaptic_spike(&mut self) {
        self.state.pre += self.params.impulse;
    }

    fn on_post_synaptic_spike(&mut self) {
        self.state.post += self.params.impulse;
    }

    fn weight(&self) -> f64 {
        self.state.weight
    }

    fn variables(&self) -> Vec<(&'static str, f64)> {
        self.state.named_values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_traces_decay_quickly() {
        let mut synapse = ConstantSynapse::default().with_weight(0.5);
        synapse.on_pre_synaptic_spike();
        synapse.on_post_synaptic_spike();
        synapse.on_post_synaptic_spike();
        assert_eq!(synapse.state().pre, 1.0);
        assert_eq!(synapse.state().post, 2.0);

        for _ in 0..100 {
            synapse.integrate(1e-4);
        }
        assert!(synapse.state().pre < 1e-4);
        assert!(synapse.state().post < 2e-4);
        assert_eq!(synapse.weight(), 0.5);
    }

    #[test]
    fn test_traces_stay_non_negative() {
        let mut synapse = ConstantSynapse::default();
        synapse.on_pre_synaptic_spike();
        synapse.integrate(0.01);
        assert_eq!(synapse.state().pre, 0.0);
    }
}
