//! Graph analyses served by graphd
//!
//! - `euler`: Eulerian circuit (Hierholzer)
//! - `mst`: Minimum spanning tree (Kruskal + union-find)
//! - `scc`: Strongly connected components (Kosaraju)
//! - `hamilton`: Hamiltonian circuit (backtracking)
//! - `max_clique`: Maximum clique (Bron–Kerbosch with pivoting)
//!
//! Every analysis renders a plain-text report body; [`run_guarded`] never
//! fails and turns errors and panics into an `ERROR:` body.

pub mod error;
pub mod euler;
pub mod hamilton;
pub mod max_clique;
pub mod mst;
pub mod scc;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use graphd_core::{Graph, Vertex};
use tracing::{debug, error, warn};

pub use error::{AlgorithmError, Inapplicable};
pub use graphd_core::AlgorithmKind;

pub(crate) fn join_path(path: &[Vertex]) -> String {
    path.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Runs `kind` against `graph` and returns its report body.
pub fn run(kind: AlgorithmKind, graph: &Graph) -> Result<String, AlgorithmError> {
    if graph.vertex_count() == 0 {
        return Err(AlgorithmError::EmptyGraph);
    }
    debug!(
        algorithm = %kind,
        vertices = graph.vertex_count(),
        edges = graph.edge_count(),
        "running analysis"
    );
    match kind {
        AlgorithmKind::Eulerian => euler::report(graph),
        AlgorithmKind::Mst => Ok(mst::report(graph)),
        AlgorithmKind::Scc => Ok(scc::report(graph)),
        AlgorithmKind::Hamilton => Ok(hamilton::report(graph)),
        AlgorithmKind::MaxClique => Ok(max_clique::report(graph)),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "analysis panicked".to_string()
    }
}

/// Runs `f`, converting an error or a panic into an `ERROR: <message>` body.
pub fn catch_failure<F>(f: F) -> String
where
    F: FnOnce() -> Result<String, AlgorithmError>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(body)) => body,
        Ok(Err(err)) => {
            warn!("analysis failed: {}", err);
            format!("ERROR: {}\n", err)
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!("analysis panicked: {}", message);
            format!("ERROR: {}\n", message)
        }
    }
}

pub fn run_guarded(kind: AlgorithmKind, graph: &Graph) -> String {
    catch_failure(|| run(kind, graph))
}
