use crate::activation::activation::ActivationFunction;
use crate::network::synapse::SynapseIndex;

const NEURON_PREFIX: &str = "N";
const BIAS_PREFIX: &str = "B";
const ID_DELIMITER: char = '-';

/// Stable position of a neuron in the network's neuron arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NeuronIndex(pub usize);

/// `N-<layer>-<position>`; bias neurons use the `B` prefix instead.
pub fn neuron_id(layer: usize, position: usize, is_bias: bool) -> String {
    let prefix = if is_bias { BIAS_PREFIX } else { NEURON_PREFIX };
    format!("{prefix}{ID_DELIMITER}{layer}{ID_DELIMITER}{position}")
}

pub fn is_bias_id(id: &str) -> bool {
    id.strip_prefix(BIAS_PREFIX)
        .is_some_and(|rest| rest.starts_with(ID_DELIMITER))
}

#[derive(Debug, Clone)]
pub struct Neuron {
    pub id: String,
    pub layer: usize,
    /// `None` means raw pass-through.
    pub activation: Option<ActivationFunction>,
    pub is_bias: bool,
    pub(crate) value: f64,
    pub(crate) has_cached_value: bool,
    pub(crate) pending_error: f64,
    pub(crate) inputs: Vec<SynapseIndex>,
    pub(crate) outputs: Vec<SynapseIndex>,
}

impl Neuron {
    pub fn new(
        id: String,
        layer: usize,
        activation: Option<ActivationFunction>,
        is_bias: bool,
    ) -> Neuron {
        Neuron {
            id,
            layer,
            activation,
            is_bias,
            value: 0.0,
            has_cached_value: false,
            pending_error: 0.0,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Clears per-pass state: cached value, cache flag and error signal.
    pub fn reset(&mut self) {
        self.value = 0.0;
        self.has_cached_value = false;
        self.pending_error = 0.0;
    }

    pub fn is_input(&self) -> bool {
        self.inputs.is_empty()
    }

    pub fn is_output(&self) -> bool {
        self.outputs.is_empty()
    }

    pub fn inputs(&self) -> &[SynapseIndex] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[SynapseIndex] {
        &self.outputs
    }

    /// Value from the most recent forward pass.
    pub fn value(&self) -> f64 {
        if self.is_bias { 1.0 } else { self.value }
    }

    /// Error signal from the most recent backward pass.
    pub fn error_signal(&self) -> f64 {
        self.pending_error
    }

    pub fn activation_id(&self) -> &'static str {
        self.activation.map_or("", |f| f.id())
    }
}
