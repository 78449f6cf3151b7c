use std::io::{Cursor, Read};

use serde::Serialize;
use tiny_http::{Header, Method, Request, Response, StatusCode};
use tracing::{debug, warn};

use crate::codec::nested::{parse_number, NestedList, TWO_LEVEL};
use crate::error::Result;
use crate::server::state::{lock, ServerState, SharedState};

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn response(status: u16, content_type: &[u8], body: String) -> Response<Cursor<Vec<u8>>> {
    let bytes = body.into_bytes();
    let len = bytes.len();
    let headers = Header::from_bytes(&b"Content-Type"[..], content_type)
        .map(|h| vec![h])
        .unwrap_or_default();
    Response::new(StatusCode(status), headers, Cursor::new(bytes), Some(len), None)
}

pub fn json_response<T: Serialize>(value: &T) -> Response<Cursor<Vec<u8>>> {
    match serde_json::to_string(value) {
        Ok(body) => response(200, b"application/json", body),
        Err(e) => text_response(500, format!("cannot encode response: {e}")),
    }
}

pub fn text_response(status: u16, body: String) -> Response<Cursor<Vec<u8>>> {
    response(status, b"text/plain; charset=utf-8", body)
}

pub fn not_found() -> Response<Cursor<Vec<u8>>> {
    text_response(404, "404 Not Found".to_owned())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessReply {
    pub output: Vec<f64>,
    pub trained: bool,
}

/// Runs one request body through the network.
///
/// The body is `in1,in2,...` or `in1,...;exp1,...`; with expected values the
/// network trains on the example. `epsilon` falls back to the configured one.
pub fn process_body(state: &mut ServerState, body: &str, epsilon: Option<f64>) -> Result<ProcessReply> {
    let policy = state.config.numeric_policy;
    let groups = NestedList::decode(body.trim(), &TWO_LEVEL);
    let input = match groups.get(0) {
        Some(group) => group.to_f64s_with(policy)?,
        None => Vec::new(),
    };
    let expected = match groups.get(1) {
        Some(group) => group.to_f64s_with(policy)?,
        None => Vec::new(),
    };

    let epsilon = epsilon.unwrap_or(state.config.epsilon);
    let output = state.network.process(&input, &expected, epsilon);
    let trained = !expected.is_empty();
    if trained {
        state.trained += 1;
    }
    Ok(ProcessReply { output, trained })
}

/// Value of `key` in a `a=1&b=2` query string.
pub fn query_param<'a>(query: &'a str, key: &str) -> Option<&'a str> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('=').or(Some((pair, ""))))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}

fn handle_process(request: &mut Request, query: &str, state: &SharedState) -> Response<Cursor<Vec<u8>>> {
    let mut body = String::new();
    if let Err(e) = request.as_reader().read_to_string(&mut body) {
        return text_response(400, format!("cannot read request body: {e}"));
    }

    let mut st = lock(state);
    let epsilon = match query_param(query, "epsilon")
        .map(|raw| parse_number(raw, st.config.numeric_policy))
        .transpose()
    {
        Ok(epsilon) => epsilon,
        Err(e) => return text_response(400, e.to_string()),
    };

    match process_body(&mut st, &body, epsilon) {
        Ok(reply) => json_response(&reply),
        Err(e) => text_response(400, e.to_string()),
    }
}

fn handle_network(state: &SharedState) -> Response<Cursor<Vec<u8>>> {
    let st = lock(state);
    json_response(&st.network.summary())
}

// ---------------------------------------------------------------------------
// Request dispatcher
// ---------------------------------------------------------------------------

/// Routes a request and responds to it.
pub fn dispatch(mut request: Request, state: SharedState) {
    let method = request.method().clone();
    let url = request.url().to_owned();
    let (path, query) = url.split_once('?').unwrap_or((url.as_str(), ""));
    debug!(%method, path, "request");

    let response = match (&method, path) {
        (Method::Post, "/process") => handle_process(&mut request, query, &state),
        (Method::Get, "/network") => handle_network(&state),
        _ => not_found(),
    };

    if let Err(e) = request.respond(response) {
        warn!(error = %e, "failed to send response");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::nested::NumericPolicy;
    use crate::config::EngineConfig;
    use crate::network::network::Network;

    fn identity_state() -> ServerState {
        let mut network = Network::new();
        network.add_layer(2, "Identity").unwrap();
        network.add_layer(1, "Identity").unwrap();
        let inputs = network.regular_neurons(0);
        let out = network.regular_neurons(1)[0];
        network.add_synapse(inputs[0], out, 1.0);
        network.add_synapse(inputs[1], out, 2.0);
        ServerState::new(network, EngineConfig::default())
    }

    #[test]
    fn inference_only_body() {
        let mut state = identity_state();
        let reply = process_body(&mut state, "1,2\n", None).unwrap();
        assert_eq!(reply, ProcessReply { output: vec![5.0], trained: false });
        assert_eq!(state.trained, 0);
    }

    #[test]
    fn expected_output_trains() {
        let mut state = identity_state();
        let reply = process_body(&mut state, "1,2;6", Some(0.5)).unwrap();
        assert_eq!(reply.output, vec![5.0]);
        assert!(reply.trained);
        assert_eq!(state.trained, 1);
        // error 1, first weight += 0.5 * 1 * 1
        assert_eq!(state.network.synapses()[0].weight, 1.5);
    }

    #[test]
    fn strict_policy_rejects_bad_numbers() {
        let mut state = identity_state();
        assert_eq!(process_body(&mut state, "1,x", None).unwrap().output, vec![1.0]);
        state.config.numeric_policy = NumericPolicy::Strict;
        assert!(process_body(&mut state, "1,x", None).is_err());
    }

    #[test]
    fn query_params() {
        assert_eq!(query_param("epsilon=0.5&x=1", "epsilon"), Some("0.5"));
        assert_eq!(query_param("flag&x=1", "flag"), Some(""));
        assert_eq!(query_param("", "epsilon"), None);
    }
}
