use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use rusty_soma::distribution::Distribution;
use rusty_soma::integrator::Integrator;
use rusty_soma::noise::{self, DistributionCache};
use rusty_soma::synapse::Synapse;

fn random_histogram(rng: &mut ChaCha8Rng) -> Vec<(f64, f64)> {
    let num_events = rng.gen_range(1..50);
    (0..num_events)
        .map(|_| (rng.gen_range(1..1000) as f64 * 1e-4, rng.gen_range(0.01..10.0)))
        .collect()
}

#[test]
fn test_sample_bounds() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    for _ in 0..100 {
        let histogram = random_histogram(&mut rng);
        let smallest = histogram.iter().map(|(e, _)| *e).fold(f64::INFINITY, f64::min);
        let largest = histogram.iter().map(|(e, _)| *e).fold(f64::NEG_INFINITY, f64::max);

        let distribution = Distribution::build(histogram).unwrap();
        assert_eq!(distribution.sample(0.0), smallest);
        assert_eq!(distribution.sample(1.0), largest);
    }
}

#[test]
fn test_generated_events_belong_to_histogram() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    for n in [0, 1, 10, 1000] {
        let histogram = random_histogram(&mut rng);
        let mut distribution = Distribution::build(histogram.clone()).unwrap().with_seed(n as u64);
        let events = distribution.generate(n);
        assert_eq!(events.len(), n);
        assert!(events
            .iter()
            .all(|event| histogram.iter().any(|(e, _)| e == event)));
    }
}

#[test]
fn test_probabilities_sum_to_one() {
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    for _ in 0..100 {
        let distribution = Distribution::build(random_histogram(&mut rng)).unwrap();
        let total: f64 = distribution.probabilities().iter().sum();
        assert!((total - 1.0).abs() < 1e-3);
    }

    let mut cache = DistributionCache::new();
    for distribution in [
        noise::poisson(0.02, 1e-4, 0.5).unwrap(),
        noise::gaussian(0.02, 0.005, 1e-4).unwrap(),
        noise::uniform(0.01, 0.03, 1e-4).unwrap(),
        noise::poisson_with_mean(0.02, 1e-4, 0.5, 1e-6, &mut cache).unwrap(),
    ] {
        let total: f64 = distribution.probabilities().iter().sum();
        assert!((total - 1.0).abs() < 1e-3);
    }
}

#[test]
fn test_same_seed_same_draws() {
    let mut first = noise::poisson(0.01, 1e-4, 0.2).unwrap().with_seed(99);
    let mut second = noise::poisson(0.01, 1e-4, 0.2).unwrap().with_seed(99);
    assert_eq!(first.generate(500), second.generate(500));
}

#[test]
fn test_euler_zero_derivative() {
    let mut synapse = Synapse::from_preset("plastic").unwrap();
    synapse.on_pre_synaptic_spike();
    let variables = synapse.variables();

    let mut state = variables
        .iter()
        .map(|&(name, value)| (name.to_string(), value))
        .collect::<std::collections::BTreeMap<_, _>>();
    let before = state.clone();
    for dt in [1e-6, 1e-3, 1.0, 100.0] {
        Integrator::Euler
            .step_keyed(&mut state, dt, |s| {
                s.keys().map(|name| (name.clone(), 0.0)).collect()
            })
            .unwrap();
        assert_eq!(state, before);
    }
}

#[test]
fn test_constant_weight_under_any_sequence() {
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let mut synapse = Synapse::from_preset("constant").unwrap();
    let weight = synapse.weight();
    for _ in 0..10_000 {
        match rng.gen_range(0..3) {
            0 => synapse.on_pre_synaptic_spike(),
            1 => synapse.on_post_synaptic_spike(),
            _ => synapse.integrate(rng.gen_range(1e-5..1e-2)),
        }
        assert_eq!(synapse.weight(), weight);
    }
}
