use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Everything the engine can fail with.
///
/// Failures are fatal to the operation that raised them; nothing is retried
/// and a failed `load` may leave the network partially rebuilt.
#[derive(Debug, Error)]
pub enum SnnError {
    #[error("unregistered activation function id \"{0}\"")]
    UnknownActivationFunction(String),

    #[error("could not find neuron \"{0}\"")]
    NeuronNotFound(String),

    #[error("cannot access file {}: {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed network definition: {0}")]
    MalformedDefinition(String),

    #[error("malformed persisted record: {0}")]
    MalformedRecord(String),

    #[error("malformed number \"{0}\"")]
    MalformedNumber(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("malformed dataset: {0}")]
    MalformedDataset(String),

    #[error("server error: {0}")]
    Server(String),
}

impl SnnError {
    pub(crate) fn file_access(path: impl Into<PathBuf>, source: io::Error) -> SnnError {
        SnnError::FileAccess { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, SnnError>;
