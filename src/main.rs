use clap::Parser;
use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

use rusty_soma::config::ExperimentConfig;
use rusty_soma::error::SimError;
use rusty_soma::experiment::Registry;

#[derive(Parser, Debug)]
#[command(about = "Run a stochastic spiking-neuron experiment and save its spike report")]
struct Args {
    /// The name of a registered experiment
    #[arg(short, long, conflicts_with = "config")]
    experiment: Option<String>,
    /// The path to a JSON experiment file
    #[arg(short, long)]
    config: Option<String>,
    /// The seed of the input spike trains, overriding the one of the experiment file
    #[arg(long)]
    seed: Option<u64>,
    /// The path of the JSON report
    #[arg(short, long, default_value = "report.json")]
    output: String,
    /// An optional log file, logs go to the console otherwise
    #[arg(long)]
    log_file: Option<String>,
    /// The log level, one of: off, error, warn, info, debug, trace
    #[arg(long, default_value = "info")]
    log_level: String,
    /// List the registered experiments and exit
    #[arg(long)]
    list: bool,
}

fn init_logging(args: &Args) -> Result<(), SimError> {
    let level: LevelFilter = args
        .log_level
        .parse()
        .map_err(|_| SimError::InvalidParameter(format!("Unknown log level {}", args.log_level)))?;
    let encoder = Box::new(PatternEncoder::new("{d(%H:%M:%S)} {l} - {m}\n"));
    let appender = match &args.log_file {
        Some(path) => Appender::builder().build(
            "main",
            Box::new(
                FileAppender::builder()
                    .encoder(encoder)
                    .build(path)
                    .map_err(|e| SimError::IOError(e.to_string()))?,
            ),
        ),
        None => Appender::builder().build(
            "main",
            Box::new(ConsoleAppender::builder().encoder(encoder).build()),
        ),
    };

    let config = Config::builder()
        .appender(appender)
        .build(Root::builder().appender("main").build(level))
        .map_err(|e| SimError::IOError(e.to_string()))?;

    log4rs::init_config(config).map_err(|e| SimError::IOError(e.to_string()))?;
    Ok(())
}

fn main() -> Result<(), SimError> {
    let args = Args::parse();
    let registry = Registry::standard();

    if args.list {
        for name in registry.names() {
            println!("{:<20}{}", name, registry.description(name).unwrap_or_default());
        }
        return Ok(());
    }

    init_logging(&args)?;
    log::info!("{:?}", args);

    let mut experiment = match (&args.experiment, &args.config) {
        (Some(name), _) => registry.experiment(name, args.seed.unwrap_or_default())?,
        (None, Some(path)) => ExperimentConfig::load_from(path)?,
        (None, None) => {
            return Err(SimError::InvalidParameter(
                "An experiment name or a config file is required (see --list)".to_string(),
            ))
        }
    };
    if let Some(seed) = args.seed {
        experiment = experiment.with_seed(seed);
    }

    let mut simulation = experiment.build()?;
    log::info!("Experiment building: done!");

    simulation.run()?;

    let report = simulation.report();
    for (id, neuron) in report.neurons.iter().enumerate() {
        log::info!(
            "Neuron {} ({}): {} spikes, {:.2} Hz",
            id,
            experiment.neurons[id].soma,
            neuron.statistics.num_spikes,
            neuron.statistics.rate
        );
    }

    report.save_to(&args.output)?;
    log::info!("Report saving: done! Saved to {}", args.output);
    Ok(())
}
