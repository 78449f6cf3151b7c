pub mod activation;
pub mod codec;
pub mod config;
pub mod error;
pub mod mnist;
pub mod network;
pub mod server;
pub mod train;

// Convenience re-exports
pub use activation::{ActivationFunction, ActivationFunctionRegistry};
pub use codec::{NestedList, NumericPolicy};
pub use config::EngineConfig;
pub use error::{Result, SnnError};
pub use network::{Network, NetworkSummary, DEFAULT_EPSILON};
pub use train::{train_loop, EpochStats, TrainConfig};
