//! Fixed-step numeric integration of model states.
//!
//! A model state is a record of named `f64` variables implementing [`State`], usually
//! declared with the [`state_record!`](crate::state_record) macro. The derivative
//! function maps a state to a record of the same type holding the rate of change of
//! every variable, so that the variable sets always agree.
//!
//! # Example
//!
//! ```rust
//! use rusty_soma::integrator::Integrator;
//! use rusty_soma::state_record;
//!
//! state_record! {
//!     /// Exponential decay.
//!     pub struct Decay { x }
//! }
//!
//! let mut state = Decay { x: 1.0 };
//! Integrator::Midpoint.step(&mut state, 0.1, |s| Decay { x: -s.x });
//! assert!((state.x - 0.905).abs() < 1e-12);
//! ```
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::SimError;

/// A record of named continuous variables.
pub trait State: Clone {
    /// The variable names, in field-declaration order.
    const NAMES: &'static [&'static str];

    /// The variable values, in field-declaration order.
    fn values(&self) -> Vec<f64>;

    /// Add `h * rate` to every variable.
    fn add_scaled(&mut self, rate: &Self, h: f64);

    /// The (name, value) pairs of the record.
    fn named_values(&self) -> Vec<(&'static str, f64)> {
        Self::NAMES.iter().copied().zip(self.values()).collect()
    }
}

/// Declare a fixed-schema state record whose fields are all `f64`.
#[macro_export]
macro_rules! state_record {
    ($(#[$meta:meta])* $vis:vis struct $name:ident { $($(#[$fmeta:meta])* $field:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
        $vis struct $name {
            $($(#[$fmeta])* pub $field: f64,)+
        }

        impl $crate::integrator::State for $name {
            const NAMES: &'static [&'static str] = &[$(stringify!($field)),+];

            fn values(&self) -> Vec<f64> {
                vec![$(self.$field),+]
            }

            fn add_scaled(&mut self, rate: &Self, h: f64) {
                $(self.$field += h * rate.$field;)+
            }
        }
    };
}

/// The numeric step strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Integrator {
    /// Explicit Euler.
    #[default]
    Euler,
    /// Explicit midpoint, i.e., second order Runge-Kutta.
    Midpoint,
}

impl Integrator {
    /// Advance the state by `dt` using the derivative function.
    pub fn step<S, F>(&self, state: &mut S, dt: f64, derivative: F)
    where
        S: State,
        F: Fn(&S) -> S,
    {
        match self {
            Integrator::Euler => euler(state, dt, &derivative),
            Integrator::Midpoint => midpoint(state, dt, &derivative),
        }
    }

    /// Advance a keyed state by `dt`.
    /// The function returns an error if the derivative does not return exactly the keys of the state,
    /// in which case the state is left untouched.
    pub fn step_keyed<F>(
        &self,
        state: &mut BTreeMap<String, f64>,
        dt: f64,
        derivative: F,
    ) -> Result<(), SimError>
    where
        F: Fn(&BTreeMap<String, f64>) -> BTreeMap<String, f64>,
    {
        match self {
            Integrator::Euler => {
                let rate = checked_rate(state, &derivative)?;
                apply_keyed(state, &rate, dt);
            }
            Integrator::Midpoint => {
                let mut mid = state.clone();
                let rate = checked_rate(&mid, &derivative)?;
                apply_keyed(&mut mid, &rate, dt / 2.0);
                let rate = checked_rate(&mid, &derivative)?;
                apply_keyed(state, &rate, dt);
            }
        }
        Ok(())
    }
}

fn euler<S: State, F: Fn(&S) -> S>(state: &mut S, dt: f64, derivative: &F) {
    let rate = derivative(state);
    state.add_scaled(&rate, dt);
}

fn midpoint<S: State, F: Fn(&S) -> S>(state: &mut S, dt: f64, derivative: &F) {
    let mut mid = state.clone();
    euler(&mut mid, dt / 2.0, derivative);
    let rate = derivative(&mid);
    state.add_scaled(&rate, dt);
}

fn checked_rate<F>(state: &BTreeMap<String, f64>, derivative: &F) -> Result<BTreeMap<String, f64>, SimError>
where
    F: Fn(&BTreeMap<String, f64>) -> BTreeMap<String, f64>,
{
    let rate = derivative(state);
    if rate.len() != state.len() || !rate.keys().eq(state.keys()) {
        return Err(SimError::MismatchedVariables(format!(
            "state has variables {:?} but the derivative returned {:?}",
            state.keys().collect::<Vec<_>>(),
            rate.keys().collect::<Vec<_>>()
        )));
    }
    Ok(rate)
}

fn apply_keyed(state: &mut BTreeMap<String, f64>, rate: &BTreeMap<String, f64>, h: f64) {
    for (value, r) in state.values_mut().zip(rate.values()) {
        *value += h * r;
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    crate::state_record! {
        struct Oscillator { x, y }
    }

    #[test]
    fn test_names_and_values() {
        let state = Oscillator { x: 1.0, y: 2.0 };
        assert_eq!(Oscillator::NAMES, &["x", "y"]);
        assert_eq!(state.named_values(), vec![("x", 1.0), ("y", 2.0)]);
    }

    #[test]
    fn test_zero_derivative() {
        for integrator in [Integrator::Euler, Integrator::Midpoint] {
            let mut state = Oscillator { x: 0.3, y: -7.0 };
            for dt in [1e-6, 0.1, 10.0] {
                integrator.step(&mut state, dt, |_| Oscillator::default());
            }
            assert_eq!(state, Oscillator { x: 0.3, y: -7.0 });
        }
    }

    #[test]
    fn test_euler_is_synchronous() {
        // dx = y, dy = -x: a sequential update would use the new x for y
        let mut state = Oscillator { x: 1.0, y: 0.0 };
        Integrator::Euler.step(&mut state, 0.5, |s| Oscillator { x: s.y, y: -s.x });
        assert_eq!(state, Oscillator { x: 1.0, y: -0.5 });
    }

    #[test]
    fn test_midpoint() {
        let mut state = Oscillator { x: 1.0, y: 0.0 };
        Integrator::Midpoint.step(&mut state, 0.5, |s| Oscillator { x: s.y, y: -s.x });
        // midpoint state is (1.0, -0.25)
        assert_relative_eq!(state.x, 0.875);
        assert_relative_eq!(state.y, -0.5);
    }

    #[test]
    fn test_midpoint_more_accurate_than_euler() {
        let exact = (-1.0_f64).exp();
        let mut euler = Oscillator { x: 1.0, y: 0.0 };
        let mut midpoint = euler;
        for _ in 0..10 {
            Integrator::Euler.step(&mut euler, 0.1, |s| Oscillator { x: -s.x, y: 0.0 });
            Integrator::Midpoint.step(&mut midpoint, 0.1, |s| Oscillator { x: -s.x, y: 0.0 });
        }
        assert!((midpoint.x - exact).abs() < (euler.x - exact).abs());
    }

    #[test]
    fn test_step_keyed() {
        let mut state = BTreeMap::from([("a".to_string(), 1.0), ("b".to_string(), 2.0)]);
        Integrator::Euler
            .step_keyed(&mut state, 0.5, |s| {
                s.iter().map(|(k, v)| (k.clone(), -v)).collect()
            })
            .unwrap();
        assert_eq!(state["a"], 0.5);
        assert_eq!(state["b"], 1.0);

        let result = Integrator::Midpoint.step_keyed(&mut state, 0.5, |_| {
            BTreeMap::from([("a".to_string(), 0.0)])
        });
        assert!(matches!(result, Err(SimError::MismatchedVariables(_))));
        assert_eq!(state["a"], 0.5);
    }
}
