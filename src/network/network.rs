use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::activation::activation::{ActivationFunction, IDENTITY_ID};
use crate::activation::registry::ActivationFunctionRegistry;
use crate::codec::nested::NumericPolicy;
use crate::error::{Result, SnnError};
use crate::network::neuron::{neuron_id, Neuron, NeuronIndex};
use crate::network::synapse::{Synapse, SynapseIndex};

/// Learning rate used when the caller does not pick one.
pub const DEFAULT_EPSILON: f64 = 0.01;

/// Layer-by-layer shape of a network, as reported to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSummary {
    /// Non-bias neurons per layer.
    pub layers: Vec<usize>,
    /// Bias neurons per layer.
    pub bias: Vec<usize>,
    pub synapses: usize,
}

/// A strictly layered feed-forward network.
///
/// Neurons and synapses live in two arenas owned by the network; layers and
/// adjacency lists refer into them by index. Per-pass state (cached values,
/// error signals) is stored on the neurons, so a network must not run two
/// `process` calls at once.
#[derive(Debug, Clone)]
pub struct Network {
    registry: ActivationFunctionRegistry,
    layers: Vec<Vec<NeuronIndex>>,
    neurons: Vec<Neuron>,
    synapses: Vec<Synapse>,
    numeric_policy: NumericPolicy,
}

impl Default for Network {
    fn default() -> Self {
        Network::new()
    }
}

impl Network {
    /// Empty network backed by the default registry (Sigmoid, HTangent) plus
    /// Identity.
    pub fn new() -> Network {
        Network::with_registry(ActivationFunctionRegistry::default())
    }

    /// Empty network using `registry`. Identity is always added.
    pub fn with_registry(mut registry: ActivationFunctionRegistry) -> Network {
        registry.register(ActivationFunction::Identity);
        Network {
            registry,
            layers: Vec::new(),
            neurons: Vec::new(),
            synapses: Vec::new(),
            numeric_policy: NumericPolicy::default(),
        }
    }

    pub fn registry(&self) -> &ActivationFunctionRegistry {
        &self.registry
    }

    pub fn numeric_policy(&self) -> NumericPolicy {
        self.numeric_policy
    }

    /// How numeric fields are parsed when loading persisted networks.
    pub fn set_numeric_policy(&mut self, policy: NumericPolicy) {
        self.numeric_policy = policy;
    }

    /// Drops every layer, neuron and synapse.
    pub fn clear(&mut self) {
        self.layers.clear();
        self.neurons.clear();
        self.synapses.clear();
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn layer(&self, layer: usize) -> &[NeuronIndex] {
        self.layers.get(layer).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn layers(&self) -> &[Vec<NeuronIndex>] {
        &self.layers
    }

    pub fn neuron(&self, index: NeuronIndex) -> &Neuron {
        &self.neurons[index.0]
    }

    pub fn neurons(&self) -> &[Neuron] {
        &self.neurons
    }

    pub fn synapse(&self, index: SynapseIndex) -> &Synapse {
        &self.synapses[index.0]
    }

    pub fn synapses(&self) -> &[Synapse] {
        &self.synapses
    }

    /// Non-bias neurons of `layer`, in layer order.
    pub fn regular_neurons(&self, layer: usize) -> Vec<NeuronIndex> {
        self.layer(layer)
            .iter()
            .copied()
            .filter(|&n| !self.neurons[n.0].is_bias)
            .collect()
    }

    pub fn summary(&self) -> NetworkSummary {
        let count = |bias: bool| -> Vec<usize> {
            self.layers
                .iter()
                .map(|layer| layer.iter().filter(|n| self.neurons[n.0].is_bias == bias).count())
                .collect()
        };
        NetworkSummary {
            layers: count(false),
            bias: count(true),
            synapses: self.synapses.len(),
        }
    }

    // -----------------------------------------------------------------------
    // Topology construction
    // -----------------------------------------------------------------------

    fn init_layer_up_to(&mut self, layer: usize) {
        while self.layers.len() < layer + 1 {
            self.layers.push(Vec::new());
        }
    }

    /// Places a neuron with a caller-chosen id. Used by `load`.
    pub(crate) fn insert_neuron(
        &mut self,
        layer: usize,
        id: String,
        activation: Option<ActivationFunction>,
        is_bias: bool,
    ) -> NeuronIndex {
        self.init_layer_up_to(layer);
        let index = NeuronIndex(self.neurons.len());
        self.neurons.push(Neuron::new(id, layer, activation, is_bias));
        self.layers[layer].push(index);
        index
    }

    /// Appends a regular neuron to `layer`, creating layers up to it as
    /// needed. `None` gives a raw pass-through neuron.
    pub fn add_neuron(&mut self, layer: usize, activation_id: Option<&str>) -> Result<NeuronIndex> {
        let activation = activation_id.map(|id| self.registry.resolve(id)).transpose()?;
        let position = self.layer(layer).len();
        Ok(self.insert_neuron(layer, neuron_id(layer, position, false), activation, false))
    }

    fn add_bias_neuron(&mut self, layer: usize) -> NeuronIndex {
        let position = self.layer(layer).len();
        let activation = Some(ActivationFunction::Identity);
        self.insert_neuron(layer, neuron_id(layer, position, true), activation, true)
    }

    fn has_bias(&self, layer: usize) -> bool {
        self.layer(layer).iter().any(|n| self.neurons[n.0].is_bias)
    }

    /// Appends a layer of `count` neurons. The layer before it receives its
    /// bias neuron at this point, so only the last layer ends up without one.
    pub fn add_layer(&mut self, count: usize, activation_id: &str) -> Result<usize> {
        let layer = self.layers.len();
        if layer > 0 && !self.has_bias(layer - 1) {
            self.add_bias_neuron(layer - 1);
        }
        self.init_layer_up_to(layer);
        for _ in 0..count {
            self.add_neuron(layer, Some(activation_id))?;
        }
        debug!(layer, count, activation = activation_id, "added layer");
        Ok(layer)
    }

    /// Connects `from` to `to` and registers the synapse on both ends.
    pub fn add_synapse(&mut self, from: NeuronIndex, to: NeuronIndex, weight: f64) -> SynapseIndex {
        let index = SynapseIndex(self.synapses.len());
        self.synapses.push(Synapse::new(from, to, weight));
        self.neurons[from.0].outputs.push(index);
        self.neurons[to.0].inputs.push(index);
        index
    }

    /// Fully connects every consecutive pair of layers with weights drawn
    /// uniformly from `[0, 1)`. Bias neurons fan out but never receive
    /// synapses. Calling this twice duplicates every synapse.
    pub fn create_synapses<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for layer in 1..self.layers.len() {
            let sources = self.layers[layer - 1].clone();
            let targets = self.regular_neurons(layer);
            for &source in &sources {
                for &target in &targets {
                    self.add_synapse(source, target, rng.gen::<f64>());
                }
            }
        }
        debug!(synapses = self.synapses.len(), "created synapses");
    }

    /// Linear scan over all layers for the neuron with `id`.
    pub fn lookup_neuron(&self, id: &str) -> Result<NeuronIndex> {
        self.layers
            .iter()
            .flatten()
            .copied()
            .find(|n| self.neurons[n.0].id == id)
            .ok_or_else(|| SnnError::NeuronNotFound(id.to_owned()))
    }

    // -----------------------------------------------------------------------
    // Forward pass
    // -----------------------------------------------------------------------

    /// Activated value of `neuron` for the current pass, computed at most
    /// once per pass.
    pub fn evaluate(&mut self, neuron: NeuronIndex) -> f64 {
        let n = &self.neurons[neuron.0];
        if n.is_bias {
            return 1.0;
        }
        if n.is_input() || n.has_cached_value {
            return n.value;
        }

        let mut sum = 0.0;
        for k in 0..self.neurons[neuron.0].inputs.len() {
            let synapse = self.synapses[self.neurons[neuron.0].inputs[k].0];
            sum += synapse.weight * self.evaluate(synapse.source);
        }

        let n = &mut self.neurons[neuron.0];
        let value = match n.activation {
            Some(f) => f.activate(sum),
            None => sum,
        };
        n.value = value;
        n.has_cached_value = true;
        value
    }

    /// Runs one example through the network.
    ///
    /// Input values beyond `input.len()` are `0.0`. When `expected` is not
    /// empty the weights are updated in place with learning rate `epsilon`.
    /// The returned output is always the one computed before that update.
    pub fn process(&mut self, input: &[f64], expected: &[f64], epsilon: f64) -> Vec<f64> {
        if self.layers.is_empty() {
            return Vec::new();
        }

        for neuron in &mut self.neurons {
            neuron.reset();
        }

        for (i, n) in self.regular_neurons(0).into_iter().enumerate() {
            self.neurons[n.0].value = input.get(i).copied().unwrap_or(0.0);
        }

        let last = self.layers.len() - 1;
        let output: Vec<f64> = self
            .regular_neurons(last)
            .into_iter()
            .map(|n| self.evaluate(n))
            .collect();

        if !expected.is_empty() {
            self.backward(expected, epsilon);
        }

        output
    }

    /// Forward pass only.
    pub fn predict(&mut self, input: &[f64]) -> Vec<f64> {
        self.process(input, &[], DEFAULT_EPSILON)
    }

    // -----------------------------------------------------------------------
    // Backward pass
    // -----------------------------------------------------------------------

    fn backward(&mut self, expected: &[f64], epsilon: f64) {
        for layer in (0..self.layers.len()).rev() {
            let mut position = 0;
            for k in 0..self.layers[layer].len() {
                let n = self.layers[layer][k];
                if self.neurons[n.0].is_bias {
                    continue;
                }
                let index = position;
                position += 1;
                self.learn(n, expected.get(index).copied().unwrap_or(0.0), epsilon);
            }
        }
    }

    /// Delta rule for one neuron. Hidden neurons collect downstream error
    /// through `previous_weight`, which the downstream layer captured before
    /// overwriting `weight` earlier in this sweep.
    fn learn(&mut self, neuron: NeuronIndex, expected: f64, epsilon: f64) {
        let n = &self.neurons[neuron.0];
        if n.is_input() {
            return;
        }

        let error = if n.is_output() {
            expected - self.evaluate(neuron)
        } else {
            n.outputs
                .iter()
                .map(|s| {
                    let synapse = &self.synapses[s.0];
                    self.neurons[synapse.target.0].pending_error * synapse.previous_weight
                })
                .sum::<f64>()
        };
        self.neurons[neuron.0].pending_error = error;

        let activation = self.neurons[neuron.0].activation;
        let gradient_factor = match activation {
            Some(f) => f.derivative(self.evaluate(neuron)),
            None => 1.0,
        };

        for k in 0..self.neurons[neuron.0].inputs.len() {
            let s = self.neurons[neuron.0].inputs[k];
            let upstream = self.evaluate(self.synapses[s.0].source);
            let delta = gradient_factor * error * epsilon * upstream;
            self.synapses[s.0].apply_delta(delta);
        }
    }
}

/// Builds a network from `(size, activation id)` pairs and connects it.
pub fn build<R: Rng + ?Sized>(layers: &[(usize, &str)], rng: &mut R) -> Result<Network> {
    let mut network = Network::new();
    for &(size, activation_id) in layers {
        network.add_layer(size, activation_id)?;
    }
    network.create_synapses(rng);
    Ok(network)
}

/// Identity-only shorthand for tests and demos.
pub fn identity_layers(sizes: &[usize]) -> Vec<(usize, &'static str)> {
    sizes.iter().map(|&size| (size, IDENTITY_ID)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    fn rng() -> ChaCha12Rng {
        ChaCha12Rng::seed_from_u64(7)
    }

    /// 1 -> 1 -> 1 identity chain without bias synapses, both weights 0.5.
    fn chain() -> (Network, SynapseIndex, SynapseIndex) {
        let mut network = Network::new();
        network.add_layer(1, IDENTITY_ID).unwrap();
        network.add_layer(1, IDENTITY_ID).unwrap();
        network.add_layer(1, IDENTITY_ID).unwrap();
        let input = network.regular_neurons(0)[0];
        let hidden = network.regular_neurons(1)[0];
        let output = network.regular_neurons(2)[0];
        let first = network.add_synapse(input, hidden, 0.5);
        let second = network.add_synapse(hidden, output, 0.5);
        (network, first, second)
    }

    #[test]
    fn add_layer_appends_bias_to_previous_layer() {
        let mut network = Network::new();
        network.add_layer(2, IDENTITY_ID).unwrap();
        assert_eq!(network.summary().bias, vec![0]);
        network.add_layer(3, "Sigmoid").unwrap();
        assert_eq!(network.summary().bias, vec![1, 0]);

        let bias = *network.layer(0).last().unwrap();
        assert!(network.neuron(bias).is_bias);
        assert_eq!(network.neuron(bias).id, "B-0-2");
        assert_eq!(network.neuron(network.layer(1)[0]).id, "N-1-0");
    }

    #[test]
    fn add_layer_rejects_unknown_activation() {
        let mut network = Network::new();
        let err = network.add_layer(2, "NoSuchFunction").unwrap_err();
        assert!(matches!(err, SnnError::UnknownActivationFunction(_)));
    }

    #[test]
    fn boolean_is_not_registered_by_default() {
        let mut network = Network::new();
        assert!(network.add_layer(1, "Boolean").is_err());

        let mut registry = ActivationFunctionRegistry::default();
        registry.register(ActivationFunction::Boolean);
        let mut network = Network::with_registry(registry);
        assert!(network.add_layer(1, "Boolean").is_ok());
    }

    #[test]
    fn create_synapses_connects_bias_but_never_into_it() {
        let mut network = build(&identity_layers(&[2, 3, 1]), &mut rng()).unwrap();
        // (2 + bias) * 3 + (3 + bias) * 1
        assert_eq!(network.synapses().len(), 13);
        for synapse in network.synapses() {
            assert!(!network.neuron(synapse.target).is_bias);
            assert!((0.0..1.0).contains(&synapse.weight));
            assert_eq!(synapse.previous_weight, 0.0);
        }
        let output = network.predict(&[1.0, 1.0]);
        assert_eq!(output.len(), 1);
    }

    #[test]
    fn create_synapses_is_seed_deterministic() {
        let a = build(&identity_layers(&[3, 4, 2]), &mut rng()).unwrap();
        let b = build(&identity_layers(&[3, 4, 2]), &mut rng()).unwrap();
        assert_eq!(a.synapses(), b.synapses());
    }

    #[test]
    fn lookup_neuron_by_id() {
        let network = build(&identity_layers(&[2, 1]), &mut rng()).unwrap();
        let found = network.lookup_neuron("N-1-0").unwrap();
        assert_eq!(network.neuron(found).layer, 1);
        assert!(matches!(
            network.lookup_neuron("N-9-9"),
            Err(SnnError::NeuronNotFound(ref id)) if id == "N-9-9"
        ));
    }

    #[test]
    fn forward_pass_sums_weighted_inputs_plus_bias() {
        let mut network = Network::new();
        network.add_layer(2, IDENTITY_ID).unwrap();
        network.add_layer(1, "Sigmoid").unwrap();
        let [a, b, bias] = [network.layer(0)[0], network.layer(0)[1], network.layer(0)[2]];
        let out = network.layer(1)[0];
        network.add_synapse(a, out, 0.5);
        network.add_synapse(b, out, -1.0);
        network.add_synapse(bias, out, 0.25);

        let output = network.predict(&[2.0, 0.5]);
        let expected = ActivationFunction::Sigmoid.activate(2.0 * 0.5 - 0.5 + 0.25);
        assert_eq!(output, vec![expected]);
    }

    #[test]
    fn missing_inputs_default_to_zero() {
        let (mut network, _, _) = chain();
        assert_eq!(network.predict(&[]), vec![0.0]);
    }

    #[test]
    fn forward_is_deterministic_and_leaves_weights_alone() {
        let mut network = build(&[(3, IDENTITY_ID), (5, "Sigmoid"), (2, "HTangent")], &mut rng()).unwrap();
        let before = network.synapses().to_vec();
        let first = network.predict(&[0.2, -0.4, 1.0]);
        let second = network.process(&[0.2, -0.4, 1.0], &[], 0.5);
        assert_eq!(first, second);
        assert_eq!(network.synapses(), before.as_slice());
    }

    #[test]
    fn single_step_update_matches_hand_computation() {
        let (mut network, first, second) = chain();

        // hidden = 2 * 0.5 = 1, output = 1 * 0.5 = 0.5
        let output = network.process(&[2.0], &[3.0], 0.1);
        assert_eq!(output, vec![0.5]);

        // output error 3 - 0.5 = 2.5, delta = 1 * 2.5 * 0.1 * 1 = 0.25
        assert_eq!(network.synapse(second).weight, 0.75);
        assert_eq!(network.synapse(second).previous_weight, 0.5);

        // hidden error uses the pre-update weight: 2.5 * 0.5 = 1.25,
        // delta = 1 * 1.25 * 0.1 * 2 = 0.25
        let hidden = network.regular_neurons(1)[0];
        assert_eq!(network.neuron(hidden).error_signal(), 1.25);
        assert_eq!(network.synapse(first).weight, 0.75);
        assert_eq!(network.synapse(first).previous_weight, 0.5);
    }

    #[test]
    fn returned_output_precedes_the_update() {
        let (mut network, _, _) = chain();
        let trained = network.process(&[2.0], &[3.0], 0.1);
        let after = network.predict(&[2.0]);
        assert_eq!(trained, vec![0.5]);
        // 2 * 0.75 * 0.75
        assert_eq!(after, vec![1.125]);
    }

    #[test]
    fn bias_synapses_learn_with_upstream_value_one() {
        let mut network = Network::new();
        network.add_layer(1, IDENTITY_ID).unwrap();
        network.add_layer(1, IDENTITY_ID).unwrap();
        let input = network.layer(0)[0];
        let bias = network.layer(0)[1];
        let out = network.layer(1)[0];
        network.add_synapse(input, out, 0.0);
        let bias_synapse = network.add_synapse(bias, out, 0.0);

        let output = network.process(&[4.0], &[2.0], 0.5);
        assert_eq!(output, vec![0.0]);
        // error 2, delta = 2 * 0.5 * 1
        assert_eq!(network.synapse(bias_synapse).weight, 1.0);
    }

    #[test]
    fn sigmoid_gradient_factor_uses_evaluated_value() {
        let mut network = Network::new();
        network.add_layer(1, IDENTITY_ID).unwrap();
        network.add_layer(1, "Sigmoid").unwrap();
        let input = network.layer(0)[0];
        let out = network.layer(1)[0];
        let synapse = network.add_synapse(input, out, 0.0);

        let output = network.process(&[1.0], &[1.0], 1.0);
        assert_eq!(output, vec![0.5]);
        let factor = ActivationFunction::Sigmoid.derivative(0.5);
        assert_eq!(network.synapse(synapse).weight, factor * 0.5);
    }

    #[test]
    fn training_reduces_error_on_linear_target() {
        let mut network = build(&identity_layers(&[2, 1]), &mut rng()).unwrap();
        let samples = [([1.0, 2.0], 3.0), ([2.0, 1.0], 3.0), ([0.5, 0.5], 1.0), ([2.0, 2.0], 4.0)];
        let error = |network: &mut Network| -> f64 {
            samples
                .iter()
                .map(|(x, y)| (network.predict(x)[0] - y).powi(2))
                .sum()
        };
        let before = error(&mut network);
        for _ in 0..500 {
            for (x, y) in &samples {
                network.process(x, &[*y], 0.02);
            }
        }
        assert!(error(&mut network) < before / 100.0);
    }

    #[test]
    fn empty_network_returns_empty_output() {
        let mut network = Network::new();
        assert!(network.process(&[1.0], &[1.0], 0.1).is_empty());
    }

    #[test]
    fn htangent_layer_stays_finite_on_large_input() {
        let mut network = build(&[(1, IDENTITY_ID), (1, "HTangent"), (1, IDENTITY_ID)], &mut rng()).unwrap();
        let output = network.process(&[2000.0], &[1.0], 0.01);
        assert!(output[0].is_finite());
        assert!(network.synapses().iter().all(|s| s.weight.is_finite()));
        assert!(network.predict(&[1.0])[0].is_finite());
    }
}
