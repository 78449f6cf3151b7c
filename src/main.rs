use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use snn::codec::{NestedList, TWO_LEVEL};
use snn::mnist::{digit_network, MnistDataset};
use snn::server::{self, ServerState};
use snn::train::{accuracy, train_loop, TrainConfig};
use snn::{EngineConfig, Network};

/// MNIST runs decay the learning rate by this much after every epoch.
const MNIST_EPSILON_DECAY: f64 = 0.9;

#[derive(Parser)]
#[command(name = "snn")]
#[command(about = "Layered feed-forward neural network with online back-propagation")]
struct Cli {
    /// File for storing the network; loaded when it exists
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Network definition, e.g. "3;10,Sigmoid;1" (ignored when --file exists)
    #[arg(short, long)]
    network: Option<String>,

    /// Input groups, e.g. "1,1,1;2,2,2;3,3,3"
    #[arg(short, long)]
    input: Option<String>,

    /// Expected output groups, e.g. "3;6;9"
    #[arg(short, long)]
    expected: Option<String>,

    /// Learning rate (overrides the config file)
    #[arg(short = 'p', long)]
    epsilon: Option<f64>,

    /// Engine configuration (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for weight initialisation (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,

    /// Train on the MNIST files in this directory (requires --file)
    #[arg(short, long)]
    mnist: Option<PathBuf>,

    /// Epochs for --mnist
    #[arg(long, default_value_t = 10)]
    epochs: usize,

    /// Serve the network over HTTP on this port
    #[arg(short, long)]
    server: Option<u16>,

    /// Log level: trace, debug, info, warn, error
    #[arg(
        long,
        default_value = "info",
        value_parser = ["trace", "debug", "info", "warn", "error"]
    )]
    log_level: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level: Level = cli.log_level.parse()?;
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match &cli.config {
        Some(path) => EngineConfig::load_json(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(epsilon) = cli.epsilon {
        config.epsilon = epsilon;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }

    if let Some(root) = &cli.mnist {
        let Some(file) = &cli.file else {
            bail!("you have to provide --file together with --mnist");
        };
        return run_mnist(root, file, cli.epochs, &config);
    }

    let network = open_network(&cli, &config)?;

    if let Some(port) = cli.server {
        let addr = format!("0.0.0.0:{port}");
        let state = ServerState::new(network, config).shared();
        server::serve(&addr, state)?;
        return Ok(());
    }

    run_checks(&cli, network, &config)
}

/// Loads `--file` when it exists, otherwise builds `--network` (and stores it
/// to `--file` if one was given).
fn open_network(cli: &Cli, config: &EngineConfig) -> Result<Network> {
    let mut network = Network::new();
    network.set_numeric_policy(config.numeric_policy);

    match (&cli.file, &cli.network) {
        (Some(file), _) if file.exists() => {
            network
                .load(file)
                .with_context(|| format!("loading network {}", file.display()))?;
        }
        (file, Some(definition)) => {
            network
                .load_short(definition, &mut config.rng())
                .with_context(|| format!("building network \"{definition}\""))?;
            if let Some(file) = file {
                network.store(file)?;
            }
        }
        _ => bail!("you have to provide --file or --network"),
    }
    Ok(network)
}

/// Processes every `--input` group (training on the matching `--expected`
/// group when present), prints `input...,expected...,output...` per group
/// and stores the network back to `--file`.
fn run_checks(cli: &Cli, mut network: Network, config: &EngineConfig) -> Result<()> {
    let groups = |text: &Option<String>| -> Result<Vec<Vec<f64>>> {
        let Some(text) = text else {
            return Ok(Vec::new());
        };
        NestedList::decode(text, &TWO_LEVEL)
            .children()
            .iter()
            .map(|group| group.to_f64s_with(config.numeric_policy).map_err(Into::into))
            .collect()
    };
    let inputs = groups(&cli.input)?;
    let expected = groups(&cli.expected)?;

    for (i, input) in inputs.iter().enumerate() {
        let expected = expected.get(i).map(Vec::as_slice).unwrap_or(&[]);
        let output = network.process(input, expected, config.epsilon);
        let line: Vec<String> = input
            .iter()
            .chain(expected)
            .chain(&output)
            .map(f64::to_string)
            .collect();
        println!("{}", line.join(","));
    }

    if let (false, Some(file)) = (inputs.is_empty(), &cli.file) {
        network.store(file)?;
    }
    Ok(())
}

fn run_mnist(root: &Path, file: &Path, epochs: usize, config: &EngineConfig) -> Result<()> {
    let dataset = MnistDataset::load(root)
        .with_context(|| format!("loading MNIST from {}", root.display()))?;

    let mut rng = config.rng();
    let mut network = if file.exists() {
        let mut network = Network::new();
        network.set_numeric_policy(config.numeric_policy);
        network.load(file)?;
        network
    } else {
        digit_network(&mut rng)?
    };

    let train_config = TrainConfig::new(epochs, config.epsilon).with_decay(MNIST_EPSILON_DECAY);
    train_loop(
        &mut network,
        &dataset.train_inputs,
        &dataset.train_labels,
        &train_config,
        &mut rng,
        |network, stats| {
            network.store(file)?;
            info!(epoch = stats.epoch, "checkpoint stored");
            Ok(())
        },
    )?;

    let acc = accuracy(&mut network, &dataset.test_inputs, &dataset.test_labels);
    info!(accuracy = acc, "test accuracy");
    println!("result: {acc}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_accepts_known_names() {
        let cli = Cli::try_parse_from(["snn", "--log-level", "debug"]).unwrap();
        assert_eq!(cli.log_level.parse::<Level>().unwrap(), Level::DEBUG);
        let cli = Cli::try_parse_from(["snn"]).unwrap();
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        assert!(Cli::try_parse_from(["snn", "--log-level", "verbose"]).is_err());
        assert!(Cli::try_parse_from(["snn", "--log-level", "INFO"]).is_err());
    }
}
