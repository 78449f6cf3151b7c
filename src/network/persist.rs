use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::activation::activation::ActivationFunction;
use crate::codec::nested::{parse_number, NestedList, TWO_LEVEL};
use crate::error::{Result, SnnError};
use crate::network::network::Network;
use crate::network::neuron::is_bias_id;

pub const ADD_NEURON: &str = "AN";
pub const ADD_SYNAPSE: &str = "AS";

impl Network {
    /// Encodes the network as a command stream: one `AN,<id>,<layer>,<activation>`
    /// per neuron in layer order, then one `AS,<source>,<target>,<weight>` per
    /// synapse in owning-neuron order.
    pub fn to_blob(&self) -> String {
        let mut neuron_commands = Vec::new();
        let mut synapse_commands = Vec::new();

        for &index in self.layers().iter().flatten() {
            let neuron = self.neuron(index);
            let mut command = NestedList::new();
            command.push_leaf(ADD_NEURON);
            command.push_leaf(neuron.id.as_str());
            command.push_leaf(neuron.layer.to_string());
            command.push_leaf(neuron.activation_id());
            neuron_commands.push(command);

            for &s in neuron.outputs() {
                let synapse = self.synapse(s);
                let mut command = NestedList::new();
                command.push_leaf(ADD_SYNAPSE);
                command.push_leaf(neuron.id.as_str());
                command.push_leaf(self.neuron(synapse.target).id.as_str());
                command.push_leaf(synapse.weight.to_string());
                synapse_commands.push(command);
            }
        }

        neuron_commands.extend(synapse_commands);
        NestedList::from(neuron_commands).encode(&TWO_LEVEL)
    }

    /// Clears the network and replays the commands in `blob` in order.
    /// Nothing is randomised.
    pub fn load_blob(&mut self, blob: &str) -> Result<()> {
        self.clear();
        let policy = self.numeric_policy();

        for command in NestedList::decode(blob, &TWO_LEVEL).children() {
            let fields = command.to_strings();
            let Some(tag) = fields.first() else {
                continue;
            };

            match tag.as_str() {
                ADD_NEURON => {
                    if fields.len() < 3 {
                        return Err(SnnError::MalformedRecord(command.encode(&TWO_LEVEL[1..])));
                    }
                    let id = fields[1].clone();
                    let layer: usize = fields[2].trim().parse().map_err(|_| {
                        SnnError::MalformedRecord(command.encode(&TWO_LEVEL[1..]))
                    })?;
                    if layer > self.layer_count() {
                        return Err(SnnError::MalformedRecord(command.encode(&TWO_LEVEL[1..])));
                    }
                    let activation: Option<ActivationFunction> = fields
                        .get(3)
                        .map(|activation_id| self.registry().resolve(activation_id))
                        .transpose()?;
                    let is_bias = is_bias_id(&id);
                    self.insert_neuron(layer, id, activation, is_bias);
                }
                ADD_SYNAPSE => {
                    if fields.len() < 4 {
                        return Err(SnnError::MalformedRecord(command.encode(&TWO_LEVEL[1..])));
                    }
                    let source = self.lookup_neuron(&fields[1])?;
                    let target = self.lookup_neuron(&fields[2])?;
                    let weight = parse_number(&fields[3], policy)?;
                    self.add_synapse(source, target, weight);
                }
                other => warn!(command = other, "skipping unknown persisted command"),
            }
        }
        Ok(())
    }

    /// Writes the network to `path` via a sibling temporary file that is
    /// renamed into place.
    pub fn store(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let tmp = tmp_path(path);
        fs::write(&tmp, self.to_blob()).map_err(|e| SnnError::file_access(&tmp, e))?;
        fs::rename(&tmp, path).map_err(|e| SnnError::file_access(path, e))?;
        info!(
            path = %path.display(),
            neurons = self.neurons().len(),
            synapses = self.synapses().len(),
            "stored network"
        );
        Ok(())
    }

    /// Replaces this network with the one persisted at `path`. A failure
    /// part-way leaves whatever was rebuilt so far.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let blob = fs::read_to_string(path).map_err(|e| SnnError::file_access(path, e))?;
        self.load_blob(blob.trim_end())?;
        info!(
            path = %path.display(),
            layers = self.layer_count(),
            synapses = self.synapses().len(),
            "loaded network"
        );
        Ok(())
    }

    /// A fresh network restored from `path`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Network> {
        let mut network = Network::new();
        network.load(path)?;
        Ok(network)
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::nested::NumericPolicy;

    fn two_by_one() -> Network {
        let mut network = Network::new();
        network.add_layer(2, "Identity").unwrap();
        network.add_layer(1, "Sigmoid").unwrap();
        let layer0 = network.layer(0).to_vec();
        let out = network.layer(1)[0];
        for (i, &n) in layer0.iter().enumerate() {
            network.add_synapse(n, out, 0.25 * (i as f64 + 1.0) - 0.5);
        }
        network
    }

    #[test]
    fn blob_lists_neurons_then_synapses() {
        assert_eq!(
            two_by_one().to_blob(),
            "AN,N-0-0,0,Identity;AN,N-0-1,0,Identity;AN,B-0-2,0,Identity;AN,N-1-0,1,Sigmoid;\
             AS,N-0-0,N-1-0,-0.25;AS,N-0-1,N-1-0,0;AS,B-0-2,N-1-0,0.25"
        );
    }

    #[test]
    fn blob_round_trip_restores_topology_and_weights() {
        let original = two_by_one();
        let mut restored = Network::new();
        restored.load_blob(&original.to_blob()).unwrap();

        assert_eq!(restored.summary(), original.summary());
        for (a, b) in original.neurons().iter().zip(restored.neurons()) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.activation, b.activation);
            assert_eq!(a.is_bias, b.is_bias);
        }
        let weights = |n: &Network| n.synapses().iter().map(|s| s.weight).collect::<Vec<_>>();
        assert_eq!(weights(&restored), weights(&original));
    }

    #[test]
    fn pass_through_neurons_keep_no_activation() {
        let mut network = Network::new();
        network.add_neuron(0, None).unwrap();
        let blob = network.to_blob();
        assert_eq!(blob, "AN,N-0-0,0,");

        let mut restored = Network::new();
        restored.load_blob(&blob).unwrap();
        assert_eq!(restored.neuron(restored.layer(0)[0]).activation, None);
    }

    #[test]
    fn unknown_activation_aborts_load() {
        let mut network = Network::new();
        let err = network.load_blob("AN,N-0-0,0,Softplus").unwrap_err();
        assert!(matches!(err, SnnError::UnknownActivationFunction(ref id) if id == "Softplus"));
    }

    #[test]
    fn dangling_synapse_aborts_load() {
        let mut network = Network::new();
        let err = network
            .load_blob("AN,N-0-0,0,Identity;AS,N-0-0,N-1-0,0.5")
            .unwrap_err();
        assert!(matches!(err, SnnError::NeuronNotFound(ref id) if id == "N-1-0"));
        // partially rebuilt
        assert_eq!(network.neurons().len(), 1);
    }

    #[test]
    fn short_record_is_malformed() {
        let mut network = Network::new();
        let err = network.load_blob("AN,N-0-0,0,Identity;AS,N-0-0").unwrap_err();
        assert!(matches!(err, SnnError::MalformedRecord(_)));
    }

    #[test]
    fn out_of_order_layer_is_malformed() {
        let mut network = Network::new();
        let err = network.load_blob("AN,N-0-0,100000000000,Identity").unwrap_err();
        assert!(matches!(err, SnnError::MalformedRecord(_)));

        let err = network.load_blob("AN,N-0-0,0,Identity;AN,N-2-0,2,Identity").unwrap_err();
        assert!(matches!(err, SnnError::MalformedRecord(_)));
    }

    #[test]
    fn non_integer_layer_is_malformed() {
        for blob in ["AN,N-0-0,-3,Identity", "AN,N-0-0,1.7,Identity", "AN,N-0-0,x,Identity"] {
            let mut network = Network::new();
            assert!(matches!(network.load_blob(blob), Err(SnnError::MalformedRecord(_))));
        }
    }

    #[test]
    fn unknown_commands_and_empty_groups_are_skipped() {
        let mut network = Network::new();
        network.load_blob("AN,N-0-0,0,Identity;;XX,1,2").unwrap();
        assert_eq!(network.neurons().len(), 1);
    }

    #[test]
    fn malformed_weight_is_zero_unless_strict() {
        let blob = "AN,N-0-0,0,Identity;AN,N-1-0,1,Identity;AS,N-0-0,N-1-0,oops";
        let mut network = Network::new();
        network.load_blob(blob).unwrap();
        assert_eq!(network.synapses()[0].weight, 0.0);

        network.set_numeric_policy(NumericPolicy::Strict);
        assert!(matches!(
            network.load_blob(blob),
            Err(SnnError::MalformedNumber(ref s)) if s == "oops"
        ));
    }

    #[test]
    fn load_replaces_existing_layers() {
        let mut network = two_by_one();
        network.load_blob("AN,N-0-0,0,Identity").unwrap();
        assert_eq!(network.summary().layers, vec![1]);
        assert!(network.synapses().is_empty());
    }

    #[test]
    fn missing_file_is_file_access_error() {
        let mut network = Network::new();
        let err = network.load("/nonexistent/dir/network.snn").unwrap_err();
        assert!(matches!(err, SnnError::FileAccess { .. }));
    }
}
