//! This crate provides tools for simulating spiking neuron models driven by stochastic input in Rust.
//!
//! A [`Simulation`](simulation::Simulation) advances neurons and spike trains on a fixed time
//! grid. Each neuron combines a soma (leaky integrate-and-fire, Izhikevich, Hodgkin-Huxley or
//! Wilson) with one synapse per input train, either constant or plastic. Each spike train draws
//! its inter-spike intervals from an empirical [`Distribution`](distribution::Distribution).
//!
//! # Simulating Neurons
//!
//! ```rust
//! use rusty_soma::neuron::Neuron;
//! use rusty_soma::noise;
//! use rusty_soma::simulation::{Simulation, SimulationConfig};
//! use rusty_soma::spike_train::SpikeTrain;
//!
//! // 1000 steps of 0.1 ms
//! let config = SimulationConfig::build(0.0, 1e-4, 1000).unwrap();
//!
//! // Two excitatory Poisson trains and one inhibitory
//! let exc_trains = (0..2)
//!     .map(|seed| {
//!         let isi = noise::poisson(0.01, 1e-4, 0.2).unwrap().with_seed(seed);
//!         SpikeTrain::new(isi, 0.0)
//!     })
//!     .collect();
//! let inh_trains = vec![SpikeTrain::new(noise::point(0.02).unwrap(), 0.0)];
//!
//! let neuron = Neuron::from_presets("izhikevich_rs", "constant", vec![1.0, 1.0], vec![0.5]).unwrap();
//! let mut simulation = Simulation::build(config, vec![neuron], exc_trains, inh_trains).unwrap();
//! simulation.run().unwrap();
//!
//! let v = simulation.neurons()[0].soma_traces().get("v").unwrap();
//! assert_eq!(v.len(), 1001);
//! ```
//!
//! # Sampling Distributions
//!
//! ```rust
//! use rusty_soma::distribution::Distribution;
//!
//! let mut distribution = Distribution::build(vec![(0.01, 1.0), (0.02, 3.0)]).unwrap().with_seed(42);
//! assert_eq!(distribution.sample(0.0), 0.01);
//! assert_eq!(distribution.sample(1.0), 0.02);
//! assert!((distribution.mean() - 0.0175).abs() < 1e-12);
//! assert_eq!(distribution.generate(10).len(), 10);
//! ```

pub mod config;
pub mod distribution;
pub mod error;
pub mod experiment;
pub mod integrator;
pub mod neuron;
pub mod noise;
pub mod simulation;
pub mod soma;
pub mod spike_train;
pub mod summary;
pub mod synapse;
pub mod utils;
