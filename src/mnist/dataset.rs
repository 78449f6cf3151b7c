use std::fs;
use std::path::Path;

use rand::Rng;
use tracing::info;

use crate::activation::activation::{IDENTITY_ID, SIGMOID_ID};
use crate::error::{Result, SnnError};
use crate::mnist::idx::parse_idx_pair;
use crate::network::network::Network;

pub const TRAIN_IMAGES: &str = "train-images.idx3-ubyte";
pub const TRAIN_LABELS: &str = "train-labels.idx1-ubyte";
pub const TEST_IMAGES: &str = "t10k-images.idx3-ubyte";
pub const TEST_LABELS: &str = "t10k-labels.idx1-ubyte";

pub const DIGITS: usize = 10;
pub const PIXELS: usize = 28 * 28;

/// The four MNIST files of a directory, decoded.
#[derive(Debug, Clone)]
pub struct MnistDataset {
    pub train_inputs: Vec<Vec<f64>>,
    pub train_labels: Vec<Vec<f64>>,
    pub test_inputs: Vec<Vec<f64>>,
    pub test_labels: Vec<Vec<f64>>,
}

impl MnistDataset {
    pub fn load(root: impl AsRef<Path>) -> Result<MnistDataset> {
        let root = root.as_ref();
        let (train_inputs, train_labels) = load_pair(root, TRAIN_IMAGES, TRAIN_LABELS)?;
        let (test_inputs, test_labels) = load_pair(root, TEST_IMAGES, TEST_LABELS)?;
        info!(
            root = %root.display(),
            train = train_inputs.len(),
            test = test_inputs.len(),
            "loaded MNIST"
        );
        Ok(MnistDataset { train_inputs, train_labels, test_inputs, test_labels })
    }
}

fn load_pair(root: &Path, images: &str, labels: &str) -> Result<(Vec<Vec<f64>>, Vec<Vec<f64>>)> {
    let read = |name: &str| {
        let path = root.join(name);
        fs::read(&path).map_err(|e| SnnError::file_access(path, e))
    };
    parse_idx_pair(&read(images)?, &read(labels)?, DIGITS)
}

/// Single-layer digit classifier: one Identity input per pixel and one
/// Sigmoid output per digit.
pub fn digit_network<R: Rng + ?Sized>(rng: &mut R) -> Result<Network> {
    let mut network = Network::new();
    network.add_layer(PIXELS, IDENTITY_ID)?;
    network.add_layer(DIGITS, SIGMOID_ID)?;
    network.create_synapses(rng);
    Ok(network)
}
