use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::activation::activation::IDENTITY_ID;
use crate::codec::nested::{NestedList, TWO_LEVEL};
use crate::error::{Result, SnnError};
use crate::network::network::Network;

/// One layer of a short-form definition such as `3;10,Sigmoid;1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub size: usize,
    pub activation_id: String,
}

impl Default for LayerSpec {
    fn default() -> Self {
        LayerSpec { size: 1, activation_id: IDENTITY_ID.to_owned() }
    }
}

/// Parses `size[,activation];size[,activation];...`. A missing size is 1 and
/// a missing activation is Identity.
pub fn parse_definition(definition: &str) -> Result<Vec<LayerSpec>> {
    NestedList::decode(definition.trim(), &TWO_LEVEL)
        .children()
        .iter()
        .map(|group| {
            let mut spec = LayerSpec::default();
            if let Some(size) = group.leaf(0) {
                spec.size = size.trim().parse().map_err(|_| {
                    SnnError::MalformedDefinition(format!(
                        "layer size \"{size}\" in \"{definition}\" is not a non-negative integer"
                    ))
                })?;
            }
            if let Some(activation_id) = group.leaf(1) {
                spec.activation_id = activation_id.trim().to_owned();
            }
            Ok(spec)
        })
        .collect()
}

impl Network {
    /// Rebuilds the network from a short-form definition and connects it with
    /// weights drawn from `rng`.
    pub fn load_short<R: Rng + ?Sized>(&mut self, definition: &str, rng: &mut R) -> Result<()> {
        let specs = parse_definition(definition)?;
        self.clear();
        for spec in &specs {
            self.add_layer(spec.size, &spec.activation_id)?;
        }
        self.create_synapses(rng);
        Ok(())
    }

    /// A fresh network built from a short-form definition.
    pub fn from_short<R: Rng + ?Sized>(definition: &str, rng: &mut R) -> Result<Network> {
        let mut network = Network::new();
        network.load_short(definition, rng)?;
        Ok(network)
    }
}
