//! Membrane models producing spikes.
//!
//! This module provides four families of stateful membrane models sharing one
//! contract, the [`SomaModel`] trait:
//!
//! - [`lif`]: leaky integrate-and-fire
//! - [`izhikevich`]: Izhikevich quadratic model (regular-spiking, fast-spiking, chattering)
//! - [`hodgkin_huxley`]: Hodgkin-Huxley sodium/potassium conductance model
//! - [`wilson`]: Wilson polynomial cortical model (regular-spiking, fast-spiking, bursting)
//!
//! Every model accumulates synaptic input in a decaying input variable. If the model is
//! spiking when `integrate` is called, it is reset to its post-spike state instead of
//! being integrated normally.
//!
//! # Example
//!
//! ```rust
//! use rusty_soma::soma::Soma;
//!
//! let mut soma = Soma::from_preset("izhikevich_rs").unwrap();
//! soma.on_excitatory_spike(1.0).unwrap();
//! for _ in 0..100 {
//!     soma.integrate(1e-4);
//! }
//! assert_eq!(soma.key_variable(), "v");
//! ```
pub mod hodgkin_huxley;
pub mod izhikevich;
pub mod lif;
pub mod wilson;

use serde::{Deserialize, Serialize};

use crate::error::SimError;
use hodgkin_huxley::HodgkinHuxleySoma;
use izhikevich::IzhikevichSoma;
use lif::LifSoma;
use wilson::WilsonSoma;

/// Conversion factor from seconds to milliseconds, the time base of the conductance models.
pub const MS_PER_S: f64 = 1000.0;

/// The names of the available soma presets.
pub const SOMA_PRESETS: [&str; 9] = [
    "lif",
    "izhikevich",
    "izhikevich_rs",
    "izhikevich_fs",
    "izhikevich_ch",
    "hodgkin_huxley",
    "wilson_rs",
    "wilson_fs",
    "wilson_bursting",
];

/// The common contract of all membrane models.
pub trait SomaModel {
    /// Advance the model by `dt` seconds, or reset it if it is spiking.
    fn integrate(&mut self, dt: f64);

    /// Whether the model is currently emitting a spike.
    fn is_spiking(&self) -> bool;

    /// Inject an excitatory input of the given (non-negative) weight.
    fn on_excitatory_spike(&mut self, weight: f64);

    /// Inject an inhibitory input of the given (non-negative) weight.
    fn on_inhibitory_spike(&mut self, weight: f64);

    /// The (name, value) pairs of the state variables, in declaration order.
    fn variables(&self) -> Vec<(&'static str, f64)>;

    /// The name of the variable best describing the model, i.e., its membrane potential.
    fn key_variable(&self) -> &'static str;

    /// Display ranges of the state variables when driven by `num_trains` input trains.
    fn ranges_of_variables(&self, num_trains: usize) -> Vec<(&'static str, (f64, f64))>;
}

/// A membrane model of any family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Soma {
    Lif(LifSoma),
    Izhikevich(IzhikevichSoma),
    HodgkinHuxley(HodgkinHuxleySoma),
    Wilson(WilsonSoma),
}

impl Soma {
    /// Create a soma from a preset name (see [`SOMA_PRESETS`]).
    pub fn from_preset(name: &str) -> Result<Self, SimError> {
        match name {
            "lif" => Ok(Soma::Lif(LifSoma::cortical())),
            "izhikevich" => Ok(Soma::Izhikevich(IzhikevichSoma::tonic())),
            "izhikevich_rs" => Ok(Soma::Izhikevich(IzhikevichSoma::regular_spiking())),
            "izhikevich_fs" => Ok(Soma::Izhikevich(IzhikevichSoma::fast_spiking())),
            "izhikevich_ch" => Ok(Soma::Izhikevich(IzhikevichSoma::chattering())),
            "hodgkin_huxley" => Ok(Soma::HodgkinHuxley(HodgkinHuxleySoma::squid_axon())),
            "wilson_rs" => Ok(Soma::Wilson(WilsonSoma::regular_spiking())),
            "wilson_fs" => Ok(Soma::Wilson(WilsonSoma::fast_spiking())),
            "wilson_bursting" => Ok(Soma::Wilson(WilsonSoma::bursting())),
            _ => Err(SimError::UnknownPreset(format!(
                "No soma preset named '{}' (available: {})",
                name,
                SOMA_PRESETS.join(", ")
            ))),
        }
    }

    fn model(&self) -> &dyn SomaModel {
        match self {
            Soma::Lif(soma) => soma,
            Soma::Izhikevich(soma) => soma,
            Soma::HodgkinHuxley(soma) => soma,
            Soma::Wilson(soma) => soma,
        }
    }

    fn model_mut(&mut self) -> &mut dyn SomaModel {
        match self {
            Soma::Lif(soma) => soma,
            Soma::Izhikevich(soma) => soma,
            Soma::HodgkinHuxley(soma) => soma,
            Soma::Wilson(soma) => soma,
        }
    }

    pub fn integrate(&mut self, dt: f64) {
        self.model_mut().integrate(dt)
    }

    pub fn is_spiking(&self) -> bool {
        self.model().is_spiking()
    }

    /// Inject an excitatory input.
    /// The function returns an error for negative or non-finite weights.
    pub fn on_excitatory_spike(&mut self, weight: f64) -> Result<(), SimError> {
        check_weight(weight)?;
        self.model_mut().on_excitatory_spike(weight);
        Ok(())
    }

    /// Inject an inhibitory input.
    /// The function returns an error for negative or non-finite weights.
    pub fn on_inhibitory_spike(&mut self, weight: f64) -> Result<(), SimError> {
        check_weight(weight)?;
        self.model_mut().on_inhibitory_spike(weight);
        Ok(())
    }

    pub fn variables(&self) -> Vec<(&'static str, f64)> {
        self.model().variables()
    }

    /// Returns the current value of the variable with the given name, if any.
    pub fn variable(&self, name: &str) -> Option<f64> {
        self.variables()
            .into_iter()
            .find(|(n, _)| *n == name)
            .map(|(_, value)| value)
    }

    pub fn key_variable(&self) -> &'static str {
        self.model().key_variable()
    }

    pub fn ranges_of_variables(&self, num_trains: usize) -> Vec<(&'static str, (f64, f64))> {
        self.model().ranges_of_variables(num_trains)
    }
}

fn check_weight(weight: f64) -> Result<(), SimError> {
    if !weight.is_finite() || weight < 0.0 {
        return Err(SimError::InvalidParameter(format!(
            "Injected weights must be finite and non-negative, got {}",
            weight
        )));
    }
    Ok(())
}

/// Display range of a decaying input variable fed by `num_trains` trains.
fn input_range(num_trains: usize, gain_exc: f64, gain_inh: f64) -> (f64, f64) {
    let n = num_trains.max(1) as f64;
    (-n * gain_inh, n * gain_exc)
}
