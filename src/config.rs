use std::path::Path;

use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};

use crate::codec::nested::NumericPolicy;
use crate::error::{Result, SnnError};
use crate::network::network::DEFAULT_EPSILON;

/// Engine settings shared by the command line and the server.
///
/// Every field has a default, so a partial JSON file (or `{}`) is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Learning rate applied when a request does not carry its own.
    pub epsilon: f64,
    /// Seed for weight initialisation and sample shuffling; entropy if unset.
    pub seed: Option<u64>,
    /// How malformed numeric text in persisted networks and inputs is treated.
    pub numeric_policy: NumericPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            epsilon: DEFAULT_EPSILON,
            seed: None,
            numeric_policy: NumericPolicy::Lenient,
        }
    }
}

impl EngineConfig {
    /// The pseudo-random source threaded through weight initialisation.
    pub fn rng(&self) -> ChaCha12Rng {
        match self.seed {
            Some(seed) => ChaCha12Rng::seed_from_u64(seed),
            None => ChaCha12Rng::from_entropy(),
        }
    }

    /// Serializes the config to a pretty-printed JSON file.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| SnnError::InvalidConfig(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| SnnError::file_access(path, e))
    }

    /// Deserializes a config from a JSON file previously written by `save_json`.
    pub fn load_json(path: impl AsRef<Path>) -> Result<EngineConfig> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| SnnError::file_access(path, e))?;
        let reader = std::io::BufReader::new(file);
        serde_json::from_reader(reader)
            .map_err(|e| SnnError::InvalidConfig(format!("{}: {e}", path.display())))
    }
}
