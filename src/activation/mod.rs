pub mod activation;
pub mod registry;

pub use activation::ActivationFunction;
pub use registry::ActivationFunctionRegistry;
