pub mod routes;
pub mod state;

use tiny_http::Server;
use tracing::info;

use crate::error::{Result, SnnError};

pub use routes::{dispatch, process_body, ProcessReply};
pub use state::{ServerState, SharedState};

/// Serves `state` on `addr` until the process exits.
///
/// Each request runs on its own thread; the network lock serialises the
/// actual `process` calls.
pub fn serve(addr: &str, state: SharedState) -> Result<()> {
    let server = Server::http(addr).map_err(|e| SnnError::Server(format!("cannot bind {addr}: {e}")))?;
    info!(addr, "listening");

    for request in server.incoming_requests() {
        let state = state.clone();
        std::thread::spawn(move || dispatch(request, state));
    }
    Ok(())
}
