//! Connections weighting the spikes delivered to a soma.
//!
//! Both synapse families track a pre-synaptic and a post-synaptic trace, incremented on
//! the corresponding spike events and decaying exponentially otherwise:
//!
//! - [`constant`]: the weight never changes
//! - [`plastic`]: the weight follows the relative timing of pre- and post-synaptic spikes
pub mod constant;
pub mod plastic;

use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::state_record;
use constant::ConstantSynapse;
use plastic::PlasticSynapse;

state_record! {
    /// The state shared by all synapse models.
    pub struct SynapseVariables {
        /// Pre-synaptic trace
        pre,
        /// Post-synaptic trace
        post,
        weight,
    }
}

/// The names of the available synapse presets.
pub const SYNAPSE_PRESETS: [&str; 2] = ["constant", "plastic"];

/// The common contract of all synapse models.
pub trait SynapseModel {
    /// Advance the traces and the weight by `dt` seconds.
    fn integrate(&mut self, dt: f64);

    fn on_pre_synaptic_spike(&mut self);

    fn on_post_synaptic_spike(&mut self);

    /// The current efficacy multiplier of the connection.
    fn weight(&self) -> f64;

    /// The (name, value) pairs of the state variables, in declaration order.
    fn variables(&self) -> Vec<(&'static str, f64)>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Synapse {
    Constant(ConstantSynapse),
    Plastic(PlasticSynapse),
}

impl Synapse {
    /// Create a synapse from a preset name (see [`SYNAPSE_PRESETS`]).
    pub fn from_preset(name: &str) -> Result<Self, SimError> {
        match name {
            "constant" => Ok(Synapse::Constant(ConstantSynapse::default())),
            "plastic" => Ok(Synapse::Plastic(PlasticSynapse::default())),
            _ => Err(SimError::UnknownPreset(format!(
                "No synapse preset named '{}' (available: {})",
                name,
                SYNAPSE_PRESETS.join(", ")
            ))),
        }
    }

    fn model(&self) -> &dyn SynapseModel {
        match self {
            Synapse::Constant(synapse) => synapse,
            Synapse::Plastic(synapse) => synapse,
        }
    }

    fn model_mut(&mut self) -> &mut dyn SynapseModel {
        match self {
            Synapse::Constant(synapse) => synapse,
            Synapse::Plastic(synapse) => synapse,
        }
    }

    pub fn integrate(&mut self, dt: f64) {
        self.model_mut().integrate(dt)
    }

    pub fn on_pre_synaptic_spike(&mut self) {
        self.model_mut().on_pre_synaptic_spike()
    }

    pub fn on_post_synaptic_spike(&mut self) {
        self.model_mut().on_post_synaptic_spike()
    }

    pub fn weight(&self) -> f64 {
        self.model().weight()
    }

    pub fn variables(&self) -> Vec<(&'static str, f64)> {
        self.model().variables()
    }

    pub fn is_plastic(&self) -> bool {
        matches!(self, Synapse::Plastic(_))
    }
}
