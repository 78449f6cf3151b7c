use serde::{Deserialize, Serialize};
use std::f64::consts::E;

pub const IDENTITY_ID: &str = "Identity";
pub const BOOLEAN_ID: &str = "Boolean";
pub const SIGMOID_ID: &str = "Sigmoid";
pub const HTANGENT_ID: &str = "HTangent";

/// Element-wise activation functions. Every variant is stateless and is
/// identified by a stable string id, used both as its registry key and in
/// persisted networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivationFunction {
    Identity,
    /// Step function with a straight-through derivative.
    Boolean,
    Sigmoid,
    HyperbolicTangent,
}

impl ActivationFunction {
    pub const ALL: [ActivationFunction; 4] = [
        ActivationFunction::Identity,
        ActivationFunction::Boolean,
        ActivationFunction::Sigmoid,
        ActivationFunction::HyperbolicTangent,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            ActivationFunction::Identity => IDENTITY_ID,
            ActivationFunction::Boolean => BOOLEAN_ID,
            ActivationFunction::Sigmoid => SIGMOID_ID,
            ActivationFunction::HyperbolicTangent => HTANGENT_ID,
        }
    }

    pub fn activate(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Identity => x,
            ActivationFunction::Boolean => if x < 0.0 { 0.0 } else { 1.0 },
            ActivationFunction::Sigmoid => 1.0 / (1.0 + E.powf(-x)),
            ActivationFunction::HyperbolicTangent => x.tanh(),
        }
    }

    /// Derivative evaluated at the value passed in, reusing `activate` for
    /// Sigmoid and HyperbolicTangent.
    pub fn derivative(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Identity => 1.0,
            ActivationFunction::Boolean => 1.0,
            ActivationFunction::Sigmoid => {
                let s = self.activate(x);
                s * (1.0 - s)
            }
            ActivationFunction::HyperbolicTangent => {
                let t = self.activate(x);
                1.0 - t * t
            }
        }
    }
}
