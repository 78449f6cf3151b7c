use serde::{Deserialize, Serialize};

use crate::network::network::DEFAULT_EPSILON;

/// Configuration for a `train_loop` run.
///
/// # Fields
/// - `epochs`        — full online passes over the training data
/// - `epsilon`       — learning rate of the first epoch
/// - `epsilon_decay` — factor applied to epsilon after every epoch
/// - `shuffle`       — visit samples in a fresh random order each epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub epochs: usize,
    pub epsilon: f64,
    pub epsilon_decay: f64,
    pub shuffle: bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            epochs: 1,
            epsilon: DEFAULT_EPSILON,
            epsilon_decay: 1.0,
            shuffle: true,
        }
    }
}

impl TrainConfig {
    pub fn new(epochs: usize, epsilon: f64) -> Self {
        TrainConfig { epochs, epsilon, ..TrainConfig::default() }
    }

    pub fn with_decay(mut self, epsilon_decay: f64) -> Self {
        self.epsilon_decay = epsilon_decay;
        self
    }

    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }
}
