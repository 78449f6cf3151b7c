use std::collections::HashMap;

use crate::activation::activation::ActivationFunction;
use crate::error::{Result, SnnError};

/// Maps activation ids to functions. Ids are unique; registering a function
/// under an id that is already present replaces the old entry.
#[derive(Debug, Clone)]
pub struct ActivationFunctionRegistry {
    functions: HashMap<String, ActivationFunction>,
}

impl ActivationFunctionRegistry {
    /// A registry with nothing in it.
    pub fn empty() -> ActivationFunctionRegistry {
        ActivationFunctionRegistry { functions: HashMap::new() }
    }

    pub fn register(&mut self, function: ActivationFunction) {
        self.functions.insert(function.id().to_owned(), function);
    }

    /// Looks up `id`. An unknown id is a hard failure; there is no fallback.
    pub fn resolve(&self, id: &str) -> Result<ActivationFunction> {
        self.functions
            .get(id)
            .copied()
            .ok_or_else(|| SnnError::UnknownActivationFunction(id.to_owned()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.functions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl Default for ActivationFunctionRegistry {
    /// Sigmoid and HyperbolicTangent. Identity is added by the network itself.
    fn default() -> Self {
        let mut registry = ActivationFunctionRegistry::empty();
        registry.register(ActivationFunction::Sigmoid);
        registry.register(ActivationFunction::HyperbolicTangent);
        registry
    }
}
