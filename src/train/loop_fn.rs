use std::time::Instant;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::info;

use crate::error::Result;
use crate::network::network::Network;
use crate::train::epoch_stats::EpochStats;
use crate::train::train_config::TrainConfig;
use crate::train::trainer::train_network;

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Trains `network` online for `config.epochs` epochs and returns the stats
/// of every completed epoch.
///
/// After each epoch epsilon is multiplied by `config.epsilon_decay` and
/// `on_epoch` is called, e.g. to checkpoint the network. An error from
/// `on_epoch` stops training and is returned.
///
/// # Panics
/// Panics if `inputs` and `labels` differ in length.
pub fn train_loop<R, F>(
    network: &mut Network,
    inputs: &[Vec<f64>],
    labels: &[Vec<f64>],
    config: &TrainConfig,
    rng: &mut R,
    mut on_epoch: F,
) -> Result<Vec<EpochStats>>
where
    R: Rng + ?Sized,
    F: FnMut(&Network, &EpochStats) -> Result<()>,
{
    assert_eq!(
        inputs.len(),
        labels.len(),
        "inputs and labels must have equal length"
    );

    let mut history = Vec::with_capacity(config.epochs);
    let mut epsilon = config.epsilon;
    let mut order: Vec<usize> = (0..inputs.len()).collect();

    for epoch in 1..=config.epochs {
        let t_start = Instant::now();

        if config.shuffle {
            order.shuffle(rng);
        }
        let train_loss = train_network(network, inputs, labels, &order, epsilon);

        let stats = EpochStats {
            epoch,
            total_epochs: config.epochs,
            epsilon,
            train_loss,
            elapsed_ms: t_start.elapsed().as_millis() as u64,
        };
        info!(
            epoch,
            total = config.epochs,
            epsilon,
            loss = train_loss,
            elapsed_ms = stats.elapsed_ms,
            "epoch finished"
        );

        on_epoch(network, &stats)?;
        history.push(stats);
        epsilon *= config.epsilon_decay;
    }

    Ok(history)
}

/// Fraction of samples whose largest output sits where the label's largest
/// entry does. Runs forward passes only.
pub fn accuracy(network: &mut Network, inputs: &[Vec<f64>], labels: &[Vec<f64>]) -> f64 {
    let n = inputs.len();
    if n == 0 {
        return 0.0;
    }
    let correct = inputs
        .iter()
        .zip(labels)
        .filter(|(input, label)| argmax(&network.predict(input)) == argmax(label))
        .count();
    correct as f64 / n as f64
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// Index of the maximum element in a slice.
fn argmax(v: &[f64]) -> usize {
    v.iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0)
}
