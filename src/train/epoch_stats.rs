use serde::{Deserialize, Serialize};

/// Per-epoch statistics emitted by `train_loop`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// 1-based epoch number.
    pub epoch: usize,
    pub total_epochs: usize,
    /// Learning rate used during this epoch.
    pub epsilon: f64,
    /// Mean squared error of the outputs seen during the epoch, each taken
    /// before that sample's weight update.
    pub train_loss: f64,
    pub elapsed_ms: u64,
}
