pub mod network;
pub mod neuron;
pub mod persist;
pub mod short;
pub mod synapse;

pub use network::{Network, NetworkSummary, DEFAULT_EPSILON};
pub use neuron::{Neuron, NeuronIndex};
pub use short::{parse_definition, LayerSpec};
pub use synapse::{Synapse, SynapseIndex};
