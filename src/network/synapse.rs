use crate::network::neuron::NeuronIndex;

/// Stable position of a synapse in the network's synapse arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SynapseIndex(pub usize);

/// Directed weighted edge between two neurons.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Synapse {
    pub source: NeuronIndex,
    pub target: NeuronIndex,
    pub weight: f64,
    /// Weight as it was right before the last update. Hidden neurons read
    /// this, not `weight`, when collecting downstream error.
    pub previous_weight: f64,
}

impl Synapse {
    pub fn new(source: NeuronIndex, target: NeuronIndex, weight: f64) -> Synapse {
        Synapse { source, target, weight, previous_weight: 0.0 }
    }

    pub(crate) fn apply_delta(&mut self, delta: f64) {
        self.previous_weight = self.weight;
        self.weight += delta;
    }
}
