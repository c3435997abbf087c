use approx::assert_relative_eq;

use rusty_soma::config::{DistributionConfig, ExperimentConfig, NeuronConfig};
use rusty_soma::error::SimError;
use rusty_soma::neuron::Neuron;
use rusty_soma::noise;
use rusty_soma::simulation::{Simulation, SimulationConfig};
use rusty_soma::soma::lif::LifSoma;
use rusty_soma::soma::{Soma, SOMA_PRESETS};
use rusty_soma::spike_train::SpikeTrain;
use rusty_soma::summary::SimulationReport;
use rusty_soma::synapse::Synapse;
use tempfile::tempdir;

fn strong_lif_simulation(seed: u64, num_steps: i64) -> Simulation {
    let config = SimulationConfig::build(0.0, 0.001, num_steps).unwrap();
    let neuron = Neuron::build(
        Soma::Lif(LifSoma::cortical().with_gains(1.0, 1.0)),
        vec![Synapse::from_preset("constant").unwrap()],
        vec![],
        vec![1.0],
        vec![],
    )
    .unwrap();
    let train = SpikeTrain::new(noise::point(0.01).unwrap().with_seed(seed), 0.0);
    Simulation::build(config, vec![neuron], vec![train], vec![]).unwrap()
}

#[test]
fn test_zero_steps_records_initial_state() {
    let config = SimulationConfig::build(0.25, 0.001, 0).unwrap();
    let neurons = SOMA_PRESETS
        .iter()
        .map(|soma| Neuron::from_presets(soma, "plastic", vec![1.0], vec![]))
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    let trains = vec![SpikeTrain::new(noise::point(0.001).unwrap(), 0.25)];
    let mut simulation = Simulation::build(config, neurons, trains, vec![]).unwrap();
    simulation.run().unwrap();

    for neuron in simulation.neurons() {
        assert!(neuron.spikes().is_empty());
        let traces = neuron.soma_traces();
        assert_eq!(traces.names().len(), neuron.soma().variables().len());
        for (trace, (name, value)) in traces.iter().zip(neuron.soma().variables()) {
            assert_eq!(trace.name, name);
            assert_eq!(trace.pairs().collect::<Vec<_>>(), vec![(0.25, value)]);
        }
    }
    assert_eq!(simulation.exc_trains()[0].num_spikes(), 0);
}

#[test]
fn test_strong_lif_spikes_after_first_input() {
    let mut simulation = strong_lif_simulation(42, 20);
    simulation.run().unwrap();

    // the train fires at 0.01, the input is integrated during the next step
    let spikes = simulation.neurons()[0].spikes();
    assert_eq!(spikes.len(), 1);
    assert_relative_eq!(spikes[0], 0.011, epsilon = 1e-12);
    assert!(spikes[0] <= 0.012);

    let mut again = strong_lif_simulation(42, 20);
    again.run().unwrap();
    assert_eq!(again.neurons()[0].spikes(), spikes);
}

#[test]
fn test_input_affects_the_next_step_only() {
    let mut simulation = strong_lif_simulation(0, 10);
    simulation.run().unwrap();

    // the train fired at the end of the last step, the soma has not integrated the input yet
    assert_eq!(simulation.exc_trains()[0].spikes().len(), 1);
    assert!(simulation.neurons()[0].spikes().is_empty());
    assert_eq!(simulation.neurons()[0].soma().variable("i"), Some(1.0));
    let v = simulation.neurons()[0].soma_traces().get("v").unwrap();
    assert!(v.values().iter().all(|&v| v == -0.065));
}

#[test]
fn test_trains_are_arithmetic_progressions() {
    let dt = 0.0005;
    // 0.0104 is not a multiple of the time step
    let isis = [0.01_f64, 0.0104, 0.0125, 0.05];
    let config = SimulationConfig::build(1.0, dt, 1_000).unwrap();
    let trains = isis
        .iter()
        .map(|&isi| SpikeTrain::new(noise::point(isi).unwrap(), 1.0))
        .collect::<Vec<_>>();
    let mut simulation = Simulation::build(config, vec![], trains, vec![]).unwrap();
    simulation.run().unwrap();

    for (train, isi) in simulation.exc_trains().iter().zip(isis) {
        assert_eq!(train.num_spikes(), (0.5 / isi + 1e-9).floor() as usize);
        for (k, &spike) in train.spikes().iter().enumerate() {
            let scheduled = (k + 1) as f64 * isi;
            assert_relative_eq!(spike, 1.0 + (scheduled / dt).round() * dt, epsilon = 1e-9);
        }
    }
}

#[test]
fn test_constant_synapses_keep_their_weight() {
    let mut simulation = ExperimentConfig {
        start: 0.0,
        dt: 1e-4,
        num_steps: 5_000,
        seed: 11,
        exc_noise: vec![DistributionConfig::Poisson {
            tau: 0.005,
            resolution: 1e-4,
            max_isi: 0.1,
        }],
        inh_noise: vec![DistributionConfig::Point { value: 0.003 }],
        neurons: vec![NeuronConfig::new("izhikevich_ch", vec![3.0], vec![0.5]).with_synapse_recording()],
    }
    .build()
    .unwrap();
    simulation.run().unwrap();

    let neuron = &simulation.neurons()[0];
    assert!(!neuron.spikes().is_empty());
    for traces in neuron.synapse_traces().unwrap() {
        assert!(traces.get("weight").unwrap().values().iter().all(|&w| w == 1.0));
        assert!(traces.get("pre").unwrap().values().iter().any(|&pre| pre > 0.0));
    }
}

#[test]
fn test_plastic_synapses_move_within_bounds() {
    let mut simulation = ExperimentConfig {
        start: 0.0,
        dt: 1e-4,
        num_steps: 10_000,
        seed: 5,
        exc_noise: vec![
            DistributionConfig::Poisson {
                tau: 0.01,
                resolution: 1e-4,
                max_isi: 0.2,
            };
            4
        ],
        inh_noise: vec![],
        neurons: vec![NeuronConfig::new("izhikevich_rs", vec![1.0; 4], vec![])
            .with_synapses("plastic")
            .with_synapse_recording()],
    }
    .build()
    .unwrap();
    simulation.run().unwrap();

    let neuron = &simulation.neurons()[0];
    assert!(!neuron.spikes().is_empty());
    for synapse in neuron.exc_synapses() {
        assert!(synapse.weight() >= 0.5 && synapse.weight() <= 1.5);
    }
    assert!(neuron
        .exc_synapses()
        .iter()
        .any(|synapse| synapse.weight() != 1.0));
}

#[test]
fn test_mismatched_configuration() {
    let config = SimulationConfig::build(0.0, 0.001, 10).unwrap();
    let neuron = Neuron::from_presets("hodgkin_huxley", "constant", vec![], vec![1.0]).unwrap();
    assert!(matches!(
        Simulation::build(config, vec![neuron], vec![], vec![]),
        Err(SimError::LengthMismatch { .. })
    ));
    assert!(SimulationConfig::build(0.0, 0.0, 10)
        .unwrap_err()
        .is_configuration_error());
}

#[test]
fn test_report_round_trip() {
    let mut simulation = strong_lif_simulation(1, 100);
    simulation.run().unwrap();
    let report = simulation.report();

    assert_relative_eq!(report.duration, 0.1, epsilon = 1e-12);
    assert_eq!(report.exc_trains[0].statistics.num_spikes, 10);
    assert_relative_eq!(report.exc_trains[0].statistics.rate, 100.0, epsilon = 1e-9);
    assert_relative_eq!(
        report.exc_trains[0].statistics.mean_isi.unwrap(),
        0.01,
        epsilon = 1e-9
    );

    let dir = tempdir().unwrap();
    let path = dir.path().join("report.json");
    report.save_to(&path).unwrap();
    assert_eq!(SimulationReport::load_from(&path).unwrap(), report);
}
