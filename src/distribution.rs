//! Empirical discrete probability laws built from histograms.
//!
//! A [`Distribution`] is constructed once from a histogram mapping events to
//! non-negative weights. Events are sorted (numeric events ascending, symbolic events
//! in insertion order) and a cumulative partition of [0, 1] is built, so that sampling
//! amounts to a binary search (inverse-CDF sampling).
//!
//! # Example
//!
//! ```rust
//! use rusty_soma::distribution::Distribution;
//!
//! let mut isi = Distribution::build(vec![(0.02, 1.0), (0.01, 3.0)]).unwrap().with_seed(42);
//! assert_eq!(isi.events(), &[0.01, 0.02]);
//! assert_eq!(isi.sample(0.0), 0.01);
//! assert_eq!(isi.sample(1.0), 0.02);
//! assert!((isi.mean() - 0.0125).abs() < 1e-12);
//!
//! let times = isi.generate_incremental(10);
//! assert!(times.windows(2).all(|w| w[0] < w[1]));
//! ```
use derivative::Derivative;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::Debug;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::SimError;

/// The default seed of the private random number generator of a distribution.
pub const DEFAULT_SEED: u64 = 0;
/// The largest cumulative probability of any bar but the last one.
const MAX_INNER_BAR: f64 = 1.0 - f64::EPSILON;

/// An event of a distribution.
pub trait Event: Clone + PartialEq + Debug {
    /// The total order used to sort events. Symbolic events compare equal, which keeps
    /// them in insertion order.
    fn order(&self, other: &Self) -> Ordering;

    /// The event standing for an empty histogram.
    fn sentinel() -> Self;
}

/// An event with a numeric value, for which statistics are defined.
pub trait NumericEvent: Event + Copy {
    fn value(self) -> f64;
}

impl Event for f64 {
    fn order(&self, other: &Self) -> Ordering {
        self.total_cmp(other)
    }

    fn sentinel() -> Self {
        f64::MAX
    }
}

impl NumericEvent for f64 {
    fn value(self) -> f64 {
        self
    }
}

impl Event for i64 {
    fn order(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }

    fn sentinel() -> Self {
        i64::MAX
    }
}

impl NumericEvent for i64 {
    fn value(self) -> f64 {
        self as f64
    }
}

impl Event for String {
    fn order(&self, _other: &Self) -> Ordering {
        Ordering::Equal
    }

    fn sentinel() -> Self {
        String::new()
    }
}

/// An empirical discrete probability law.
#[derive(Derivative, Clone)]
#[derivative(Debug, PartialEq)]
pub struct Distribution<E: Event> {
    /// The sorted events.
    events: Vec<E>,
    /// The (unnormalized) weight of each event.
    counts: Vec<f64>,
    /// The probability of each event.
    probabilities: Vec<f64>,
    /// The cumulative probabilities, the last one being exactly 1.
    bars: Vec<f64>,
    #[derivative(Debug = "ignore", PartialEq = "ignore")]
    rng: ChaCha8Rng,
}

impl<E: Event> Distribution<E> {
    /// Create a distribution from a histogram, i.e., (event, weight) pairs.
    /// Repeated events have their weights summed up.
    /// An empty or all-zero histogram yields the sentinel event with probability one.
    /// The function returns an error for negative or non-finite weights.
    pub fn build<I>(histogram: I) -> Result<Self, SimError>
    where
        I: IntoIterator<Item = (E, f64)>,
    {
        let mut histogram: Vec<(E, f64)> = histogram.into_iter().collect();
        if let Some((event, weight)) = histogram
            .iter()
            .find(|(_, w)| !w.is_finite() || *w < 0.0)
        {
            return Err(SimError::InvalidParameter(format!(
                "Histogram weights must be finite and non-negative, got {} for {:?}",
                weight, event
            )));
        }

        // Stable sort, symbolic events keep their insertion order
        histogram.sort_by(|(e1, _), (e2, _)| e1.order(e2));

        // Repeated events can only hide among the events of the same rank
        let mut merged: Vec<(E, f64)> = Vec::with_capacity(histogram.len());
        for (event, weight) in histogram {
            match merged
                .iter_mut()
                .rev()
                .take_while(|(e, _)| e.order(&event) == Ordering::Equal)
                .find(|(e, _)| *e == event)
            {
                Some((_, w)) => *w += weight,
                None => merged.push((event, weight)),
            }
        }

        let total: f64 = merged.iter().map(|(_, w)| w).sum();
        if merged.is_empty() || total <= 0.0 {
            log::debug!("Degenerate histogram, falling back to the sentinel event");
            merged = vec![(E::sentinel(), 1.0)];
        }

        let total: f64 = merged.iter().map(|(_, w)| w).sum();
        let (events, counts): (Vec<E>, Vec<f64>) = merged.into_iter().unzip();
        let probabilities: Vec<f64> = counts.iter().map(|w| w / total).collect();

        let mut bars: Vec<f64> = probabilities
            .iter()
            .scan(0.0, |acc, p| {
                *acc += p;
                Some(acc.min(MAX_INNER_BAR))
            })
            .collect();
        if let Some(last) = bars.last_mut() {
            *last = 1.0;
        }

        Ok(Distribution {
            events,
            counts,
            probabilities,
            bars,
            rng: ChaCha8Rng::seed_from_u64(DEFAULT_SEED),
        })
    }

    /// Create a distribution from parallel events and probabilities.
    /// The function returns an error if the lengths differ.
    pub fn build_from_parts(events: Vec<E>, probabilities: Vec<f64>) -> Result<Self, SimError> {
        if events.len() != probabilities.len() {
            return Err(SimError::LengthMismatch {
                what: "distribution probabilities".to_string(),
                expected: events.len(),
                found: probabilities.len(),
            });
        }
        Self::build(events.into_iter().zip(probabilities))
    }

    /// Returns the distribution with its random number generator seeded.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.reseed(seed);
        self
    }

    /// Reset the random number generator with the given seed.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    /// Returns the event at the first bar greater than or equal to `p`.
    /// Probabilities outside [0, 1] are clamped.
    pub fn sample(&self, p: f64) -> E {
        let p = p.clamp(0.0, 1.0);
        let pos = self.bars.partition_point(|&bar| bar < p);
        self.events[pos.min(self.events.len() - 1)].clone()
    }

    /// Draw an event using the private random number generator.
    pub fn next_event(&mut self) -> E {
        let p: f64 = self.rng.gen();
        self.sample(p)
    }

    /// Draw `n` independent events.
    pub fn generate(&mut self, n: usize) -> Vec<E> {
        (0..n).map(|_| self.next_event()).collect()
    }

    /// The median event.
    pub fn median(&self) -> E {
        self.sample(0.5)
    }

    /// Returns the sorted events.
    pub fn events(&self) -> &[E] {
        &self.events
    }

    /// Returns the weights of the sorted events.
    pub fn counts(&self) -> &[f64] {
        &self.counts
    }

    /// Returns the probabilities of the sorted events.
    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    /// Returns the cumulative probabilities of the sorted events.
    pub fn bars(&self) -> &[f64] {
        &self.bars
    }

    /// Returns the histogram as (event, weight) pairs in sorted order.
    pub fn histogram(&self) -> Vec<(E, f64)> {
        self.events
            .iter()
            .cloned()
            .zip(self.counts.iter().copied())
            .collect()
    }

    /// Returns the number of distinct events.
    pub fn num_events(&self) -> usize {
        self.events.len()
    }

    /// Returns true if the histogram was degenerate and replaced by the sentinel event.
    pub fn is_degenerate(&self) -> bool {
        self.events.len() == 1 && self.events[0] == E::sentinel()
    }
}

impl<E: Event + DeserializeOwned> Distribution<E> {
    /// Create a distribution from a record, using either its histogram or its events and probabilities.
    pub fn from_record(record: DistributionRecord<E>) -> Result<Self, SimError> {
        match (record.histogram, record.events, record.probabilities) {
            (Some(histogram), _, _) => Self::build(histogram),
            (None, Some(events), Some(probabilities)) => {
                Self::build_from_parts(events, probabilities)
            }
            _ => Err(SimError::InvalidParameter(
                "A distribution record needs a histogram or events with probabilities".to_string(),
            )),
        }
    }

    /// Load a distribution from a JSON record file.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, SimError> {
        let file = File::open(path).map_err(|e| SimError::IOError(e.to_string()))?;
        let reader = BufReader::new(file);
        let record: DistributionRecord<E> =
            serde_json::from_reader(reader).map_err(|e| SimError::IOError(e.to_string()))?;
        Self::from_record(record)
    }
}

impl<E: NumericEvent> Distribution<E> {
    /// Draw `n` events and return their running sum.
    pub fn generate_incremental(&mut self, n: usize) -> Vec<f64> {
        self.generate(n)
            .into_iter()
            .scan(0.0, |acc, event| {
                *acc += event.value();
                Some(*acc)
            })
            .collect()
    }

    pub fn mean(&self) -> f64 {
        self.events
            .iter()
            .zip(self.probabilities.iter())
            .map(|(e, p)| e.value() * p)
            .sum()
    }

    pub fn variance(&self) -> f64 {
        let mean = self.mean();
        self.events
            .iter()
            .zip(self.probabilities.iter())
            .map(|(e, p)| p * (e.value() - mean).powi(2))
            .sum()
    }

    pub fn standard_deviation(&self) -> f64 {
        self.variance().sqrt()
    }

    /// The ratio of the standard deviation to the mean, NaN for a zero mean.
    pub fn coefficient_of_variation(&self) -> f64 {
        let mean = self.mean();
        if mean == 0.0 {
            return f64::NAN;
        }
        self.standard_deviation() / mean
    }
}

impl<E: NumericEvent + Serialize> Distribution<E> {
    /// Export the distribution and its statistics.
    pub fn to_record(&self) -> DistributionRecord<E> {
        let finite = |x: f64| if x.is_finite() { Some(x) } else { None };
        DistributionRecord {
            histogram: Some(self.histogram()),
            events: Some(self.events.clone()),
            counts: Some(self.counts.clone()),
            probabilities: Some(self.probabilities.clone()),
            median: Some(self.median()),
            mean: finite(self.mean()),
            variance: finite(self.variance()),
            standard_deviation: finite(self.standard_deviation()),
            coefficient_of_variation: finite(self.coefficient_of_variation()),
        }
    }

    /// Save the distribution record to a JSON file.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), SimError> {
        let file = File::create(path).map_err(|e| SimError::IOError(e.to_string()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &self.to_record())
            .map_err(|e| SimError::IOError(e.to_string()))?;
        writer.flush().map_err(|e| SimError::IOError(e.to_string()))
    }
}

/// The serialized form of a distribution.
/// The histogram is a list of (event, weight) pairs so that numeric events can be used as keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionRecord<E> {
    pub histogram: Option<Vec<(E, f64)>>,
    pub events: Option<Vec<E>>,
    pub counts: Option<Vec<f64>>,
    pub probabilities: Option<Vec<f64>>,
    pub median: Option<E>,
    pub mean: Option<f64>,
    pub variance: Option<f64>,
    pub standard_deviation: Option<f64>,
    pub coefficient_of_variation: Option<f64>,
}
