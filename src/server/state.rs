use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::EngineConfig;
use crate::network::network::Network;

/// What the listener serves: one network plus the settings requests fall
/// back on.
#[derive(Debug)]
pub struct ServerState {
    pub network: Network,
    pub config: EngineConfig,
    /// Requests that carried expected output and therefore trained.
    pub trained: u64,
}

impl ServerState {
    pub fn new(network: Network, config: EngineConfig) -> Self {
        ServerState { network, config, trained: 0 }
    }

    pub fn shared(self) -> SharedState {
        Arc::new(Mutex::new(self))
    }
}

/// One lock per network: `process` calls from concurrent requests run one
/// after another.
pub type SharedState = Arc<Mutex<ServerState>>;

/// Locks the state, recovering it if a previous holder panicked.
pub fn lock(state: &SharedState) -> MutexGuard<'_, ServerState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
