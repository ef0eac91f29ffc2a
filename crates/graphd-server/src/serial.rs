//! Single-threaded mode: one connection at a time, only the requested algorithm.
//!
//! Serial mode also answers adjacency-matrix requests with an Eulerian verdict
//! for the client-supplied graph.

use std::os::unix::net::{UnixListener, UnixStream};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use graphd_algorithms::run_guarded;
use graphd_core::protocol::{
    done_line, error_reply, graph_header, matrix_header, request_error_reply, section,
};
use graphd_core::{AlgorithmKind, Graph, GraphRequest, MatrixRequest};
use tracing::{debug, error, info, warn};

use crate::connection::{self, read_request};

const ACCEPT_BACKOFF: Duration = Duration::from_millis(10);

/// Builds the full reply for one request text. Only the graph the requested
/// algorithm reads is generated.
pub fn respond(text: &str) -> String {
    if MatrixRequest::looks_like(text) {
        return respond_to_matrix(text);
    }
    let request = match GraphRequest::parse(text) {
        Ok(request) => request,
        Err(err) => {
            debug!("rejected request {:?}: {}", text.trim(), err);
            return request_error_reply(&err);
        }
    };

    let kind = request.algorithm;
    let directed = kind.wants_directed();
    let graph = match Graph::random(request.vertices, request.edges, request.rng_seed(), directed) {
        Ok(graph) => graph,
        Err(err) => return error_reply(&err),
    };
    let label = if directed { "Directed" } else { "Undirected" };

    let mut reply = graph_header(&request, &[(label, &graph)]);
    reply.push_str(&section(kind, &run_guarded(kind, &graph)));
    reply.push_str(&done_line());
    reply
}

/// Eulerian verdict for a client-supplied adjacency matrix.
pub fn respond_to_matrix(text: &str) -> String {
    let graph = match MatrixRequest::parse(text).map(|request| request.graph()) {
        Ok(Ok(graph)) => graph,
        Ok(Err(err)) => return error_reply(&err),
        Err(err) => {
            debug!("rejected matrix request: {}", err);
            return error_reply(&err);
        }
    };

    let kind = AlgorithmKind::Eulerian;
    let mut reply = matrix_header(&graph);
    reply.push_str(&section(kind, &run_guarded(kind, &graph)));
    reply.push_str(&done_line());
    reply
}

pub fn handle_connection(mut stream: UnixStream) {
    let text = match read_request(&mut stream) {
        Ok(text) => text,
        Err(err) => {
            warn!("failed to read request: {}", err);
            return;
        }
    };
    let reply = respond(&text);
    if let Err(err) = connection::send(&mut stream, &reply) {
        warn!("failed to send reply: {}", err);
    }
}

pub fn serve(listener: UnixListener, shutdown: Arc<AtomicBool>, read_timeout: Duration) {
    info!("Serial server accepting connections");
    for incoming in listener.incoming() {
        if shutdown.load(Ordering::Acquire) {
            break;
        }
        match incoming {
            Ok(stream) => {
                let stream = connection::accepted(stream, read_timeout);
                if panic::catch_unwind(AssertUnwindSafe(|| handle_connection(stream))).is_err() {
                    error!("connection handler panicked");
                }
            }
            Err(err) => {
                warn!("accept failed: {}", err);
                thread::sleep(ACCEPT_BACKOFF);
            }
        }
    }
    debug!("serial acceptor exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_only_the_requested_algorithm() {
        let reply = respond("-a MST -v 4 -e 4 -s 2");
        assert!(reply.starts_with("=== Random Graphs (seed=2, V=4, E=4) ===\n--- Undirected ---\n"));
        assert!(reply.contains("[MST]\nMinimum Spanning Tree (Kruskal):\n"));
        assert!(!reply.contains("[SCC]"));
        assert!(!reply.contains("--- Directed ---"));
        assert!(reply.ends_with("=== DONE ===\n"));
    }

    #[test]
    fn scc_gets_the_directed_graph() {
        let reply = respond("-s 4 -e 5 -a scc -v 4");
        assert!(reply.contains("--- Directed ---\n"));
        assert!(reply.contains("[SCC]\nStrongly Connected Components ("));
    }

    #[test]
    fn eulerian_is_available() {
        let reply = respond("-a EULERIAN -v 3 -e 3 -s 1");
        // a triangle is the only 3-edge simple graph on 3 vertices
        assert!(reply.contains("[EULERIAN]\nEulerian: YES\n"));
    }

    #[test]
    fn bad_requests_replace_the_reply() {
        let reply = respond("-a DIJKSTRA -v 4 -e 4 -s 2");
        assert_eq!(
            reply,
            "ERROR: unknown algorithm 'DIJKSTRA'\nUsage: -a <ALGO> -v <V> -e <E> -s <S>\n"
        );

        let reply = respond("-a MST -v 3 -e 9 -s 2");
        assert!(reply.starts_with("ERROR: too many edges"));
        assert!(!reply.contains("=== DONE ==="));

        let reply = respond("-a MST -v 1000000000000000000 -e 0 -s 1");
        assert!(reply.starts_with("ERROR: V cannot exceed 10000"), "{}", reply);
    }

    #[test]
    fn matrix_request_gets_an_eulerian_verdict() {
        let reply = respond("3\nundirected\n0 1 1\n1 0 1\n1 1 0\n");
        assert!(reply.starts_with("=== Adjacency Matrix (V=3, undirected) ===\n--- Undirected ---\n"));
        assert!(reply.contains("Vertex 0: 1(weight 1) 2(weight 1)"), "{}", reply);
        assert!(reply.contains("[EULERIAN]\nEulerian: YES\n"));
        assert!(reply.ends_with("=== DONE ===\n"));

        // a path has two odd-degree vertices
        let reply = respond("3\nundirected\n0 1 0\n1 0 1\n0 1 0\n");
        assert!(reply.contains("[EULERIAN]\nEulerian: NO\n"));
    }

    #[test]
    fn malformed_matrix_is_a_single_error() {
        let reply = respond("2\nundirected\n0 1\n1\n");
        assert!(reply.starts_with("ERROR: malformed adjacency matrix"), "{}", reply);
        assert!(!reply.contains("=== DONE ==="));

        let reply = respond("2\nsideways\n0 1\n1 0\n");
        assert_eq!(reply, "ERROR: expected 'directed' or 'undirected', got 'sideways'\n");
    }
}
