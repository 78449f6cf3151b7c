pub mod dataset;
pub mod idx;

pub use dataset::{digit_network, MnistDataset};
pub use idx::parse_idx_pair;
