//! Spike-timing dependent synapse.
//!
//! ```text
//! dpre/dt  = -pre / tau_pre
//! dpost/dt = -post / tau_post
//! dw/dt    = sign(post - pre) rate pre post exp(-|post - pre| / separation) (1 - |w - neutral| / epsilon)^power
//!            - cooling (w - neutral)
//! ```
//! A post-synaptic spike shortly after a pre-synaptic one leaves `post > pre` and
//! potentiates the connection, the reverse order depresses it. The weight stays
//! within `neutral ± epsilon`.
use serde::{Deserialize, Serialize};

use super::{SynapseModel, SynapseVariables};
use crate::error::SimError;
use crate::integrator::{Integrator, State};

/// Trace differences below this magnitude produce no plasticity.
const NEGLIGIBLE_DIFFERENCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlasticParams {
    /// Pre-synaptic trace time constant (s)
    pub tau_pre: f64,
    /// Post-synaptic trace time constant (s)
    pub tau_post: f64,
    /// Trace increment per spike
    pub impulse: f64,
    /// Learning rate (1/s)
    pub rate: f64,
    /// Trace difference scale beyond which plasticity fades
    pub separation: f64,
    /// Weight the synapse relaxes to
    pub neutral: f64,
    /// Maximum deviation of the weight from neutral
    pub epsilon: f64,
    /// Saturation exponent near the bounds
    pub power: f64,
    /// Relaxation rate toward neutral (1/s)
    pub cooling: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlasticSynapse {
    state: SynapseVariables,
    params: PlasticParams,
    integrator: Integrator,
}

impl Default for PlasticSynapse {
    fn default() -> Self {
        let params = PlasticParams {
            tau_pre: 0.02,
            tau_post: 0.02,
            impulse: 1.0,
            rate: 5.0,
            separation: 1.0,
            neutral: 1.0,
            epsilon: 0.5,
            power: 2.0,
            cooling: 0.1,
        };
        PlasticSynapse {
            state: SynapseVariables {
                pre: 0.0,
                post: 0.0,
                weight: params.neutral,
            },
            params,
            integrator: Integrator::Euler,
        }
    }
}

impl PlasticSynapse {
    /// Create a plastic synapse at its neutral weight.
    /// The function returns an error if a parameter is not finite, if a time constant, the
    /// separation or epsilon is not positive, or if any other parameter but the neutral weight is negative.
    pub fn build(params: PlasticParams) -> Result<Self, SimError> {
        let positive = [
            ("tau_pre", params.tau_pre),
            ("tau_post", params.tau_post),
            ("separation", params.separation),
            ("epsilon", params.epsilon),
        ];
        if let Some((name, value)) = positive.iter().find(|(_, x)| !(x.is_finite() && *x > 0.0)) {
            return Err(SimError::InvalidParameter(format!(
                "The plastic synapse {} must be finite and positive, got {}",
                name, value
            )));
        }
        let non_negative = [
            ("impulse", params.impulse),
            ("rate", params.rate),
            ("power", params.power),
            ("cooling", params.cooling),
        ];
        if let Some((name, value)) = non_negative
            .iter()
            .find(|(_, x)| !(x.is_finite() && *x >= 0.0))
        {
            return Err(SimError::InvalidParameter(format!(
                "The plastic synapse {} must be finite and non-negative, got {}",
                name, value
            )));
        }
        if !params.neutral.is_finite() {
            return Err(SimError::InvalidParameter(format!(
                "The plastic synapse neutral weight must be finite, got {}",
                params.neutral
            )));
        }

        Ok(PlasticSynapse {
            state: SynapseVariables {
                pre: 0.0,
                post: 0.0,
                weight: params.neutral,
            },
            params,
            integrator: Integrator::Euler,
        })
    }

    pub fn with_integrator(mut self, integrator: Integrator) -> Self {
        self.integrator = integrator;
        self
    }

    pub fn state(&self) -> &SynapseVariables {
        &self.state
    }

    pub fn params(&self) -> &PlasticParams {
        &self.params
    }

    fn clamp_weight(&self, weight: f64) -> f64 {
        weight.clamp(
            self.params.neutral - self.params.epsilon,
            self.params.neutral + self.params.epsilon,
        )
    }

    /// The timing-dependent part of the weight derivative.
    fn plasticity(p: &PlasticParams, s: &SynapseVariables) -> f64 {
        let difference = s.post - s.pre;
        if difference.abs() < NEGLIGIBLE_DIFFERENCE {
            return 0.0;
        }
        let saturation = (1.0 - (s.weight - p.neutral).abs() / p.epsilon).clamp(0.0, 1.0);
        difference.signum()
            * p.rate
            * s.pre
            * s.post
            * (-difference.abs() / p.separation).exp()
            * saturation.powf(p.power)
    }

    fn derivative(p: &PlasticParams, s: &SynapseVariables) -> SynapseVariables {
        SynapseVariables {
            pre: -s.pre / p.tau_pre,
            post: -s.post / p.tau_post,
            weight: Self::plasticity(p, s) - p.cooling * (s.weight - p.neutral),
        }
    }
}

impl SynapseModel for PlasticSynapse {
    fn integrate(&mut self, dt: f64) {
        let params = self.params;
        self.integrator
            .step(&mut self.state, dt, |s| Self::derivative(&params, s));
        self.state.pre = self.state.pre.max(0.0);
        self.state.post = self.state.post.max(0.0);
        self.state.weight = self.clamp_weight(self.state.weight);
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
