//! One client request on its way through a worker pool or the pipeline.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

use graphd_concurrent::CompletionLatch;
use graphd_core::protocol::{done_line, graph_header, section};
use graphd_core::{AlgorithmKind, Graph, GraphError, GraphRequest};
use tracing::warn;

use crate::error::JobError;

const SLOTS: usize = AlgorithmKind::ALL.len();

static NEXT_JOB_ID: AtomicU64 = AtomicU64::new(1);

pub type JobId = u64;

/// Undirected and directed twins generated from one request's V, E and seed.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphPair {
    pub undirected: Graph,
    pub directed: Graph,
}

impl GraphPair {
    pub fn generate(request: &GraphRequest) -> Result<Self, GraphError> {
        let seed = request.rng_seed();
        Ok(Self {
            undirected: Graph::random(request.vertices, request.edges, seed, false)?,
            directed: Graph::random(request.vertices, request.edges, seed, true)?,
        })
    }

    /// The twin `kind` runs against.
    pub fn for_kind(&self, kind: AlgorithmKind) -> &Graph {
        if kind.wants_directed() {
            &self.directed
        } else {
            &self.undirected
        }
    }
}

/// Each result slot has a single writer: the task or stage owning that
/// algorithm. The reply latch is the only point a reader synchronises on.
pub struct Job {
    id: JobId,
    request: GraphRequest,
    graphs: GraphPair,
    results: [OnceLock<String>; SLOTS],
    reply: CompletionLatch<String>,
}

impl Job {
    pub fn new(request: GraphRequest, graphs: GraphPair) -> Self {
        Self {
            id: NEXT_JOB_ID.fetch_add(1, Ordering::Relaxed),
            request,
            graphs,
            results: std::array::from_fn(|_| OnceLock::new()),
            reply: CompletionLatch::new(),
        }
    }

    /// Parses the raw request text and generates both graphs.
    pub fn from_request_text(text: &str) -> Result<Self, JobError> {
        let request = GraphRequest::parse(text)?;
        let graphs = GraphPair::generate(&request)?;
        Ok(Self::new(request, graphs))
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn request(&self) -> &GraphRequest {
        &self.request
    }

    pub fn graphs(&self) -> &GraphPair {
        &self.graphs
    }

    pub fn graph(&self, kind: AlgorithmKind) -> &Graph {
        self.graphs.for_kind(kind)
    }

    /// Stores `kind`'s result. A second write for the same slot is refused.
    pub fn record(&self, kind: AlgorithmKind, body: String) -> bool {
        let stored = self.results[kind.index()].set(body).is_ok();
        if !stored {
            warn!(job_id = self.id, algorithm = %kind, "result slot written twice");
        }
        stored
    }

    pub fn result(&self, kind: AlgorithmKind) -> Option<&str> {
        self.results[kind.index()].get().map(String::as_str)
    }

    pub fn header(&self) -> String {
        graph_header(
            &self.request,
            &[
                ("Undirected", &self.graphs.undirected),
                ("Directed", &self.graphs.directed),
            ],
        )
    }

    /// Header, one section per `kinds` entry in that order, then the sentinel.
    pub fn assemble_reply(&self, kinds: &[AlgorithmKind]) -> String {
        let mut out = self.header();
        out.push_str("=== Results ===\n");
        for &kind in kinds {
            let body = self.result(kind).unwrap_or("ERROR: no result recorded\n");
            out.push_str(&section(kind, body));
        }
        out.push_str(&done_line());
        out
    }

    /// Returns `false` if the job was already completed.
    pub fn complete(&self, reply: String) -> bool {
        self.reply.complete(reply)
    }

    pub fn is_complete(&self) -> bool {
        self.reply.is_complete()
    }

    /// Blocks until the job completes and takes its reply.
    pub fn wait_reply(&self) -> Option<String> {
        self.reply.wait()
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let recorded: Vec<AlgorithmKind> = AlgorithmKind::ALL
            .into_iter()
            .filter(|kind| self.result(*kind).is_some())
            .collect();
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("request", &self.request)
            .field("recorded", &recorded)
            .field("complete", &self.is_complete())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(text: &str) -> Job {
        Job::from_request_text(text).unwrap()
    }

    #[test]
    fn twins_share_parameters() {
        let job = job("-a MST -v 6 -e 7 -s 11");
        let pair = job.graphs();
        assert!(!pair.undirected.is_directed());
        assert!(pair.directed.is_directed());
        assert_eq!(pair.undirected.edge_count(), 7);
        assert_eq!(pair.directed.edge_count(), 7);
        assert!(job.graph(AlgorithmKind::Scc).is_directed());
        assert!(!job.graph(AlgorithmKind::MaxClique).is_directed());
    }

    #[test]
    fn ids_are_unique() {
        let a = job("-a MST -v 2 -e 1 -s 1");
        let b = job("-a MST -v 2 -e 1 -s 1");
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn slots_are_written_once() {
        let job = job("-a MST -v 3 -e 2 -s 1");
        assert!(job.record(AlgorithmKind::Mst, "first\n".into()));
        assert!(!job.record(AlgorithmKind::Mst, "second\n".into()));
        assert_eq!(job.result(AlgorithmKind::Mst), Some("first\n"));
        assert_eq!(job.result(AlgorithmKind::Scc), None);
    }

    #[test]
    fn reply_lists_sections_in_order() {
        let job = job("-a MST -v 3 -e 2 -s 5");
        job.record(AlgorithmKind::Scc, "scc body".into());
        job.record(AlgorithmKind::Mst, "mst body\n".into());
        let reply = job.assemble_reply(&[AlgorithmKind::Mst, AlgorithmKind::Scc]);

        assert!(reply.starts_with("=== Random Graphs (seed=5, V=3, E=2) ===\n--- Undirected ---\n"));
        assert!(reply.contains("--- Directed ---\n"));
        assert!(reply.contains("=== Results ===\n[MST]\nmst body\n[SCC]\nscc body\n=== DONE ===\n"));
    }

    #[test]
    fn missing_result_is_an_error_section() {
        let job = job("-a MST -v 3 -e 2 -s 5");
        let reply = job.assemble_reply(&[AlgorithmKind::Hamilton]);
        assert!(reply.contains("[HAMILTON]\nERROR: no result recorded\n"));
    }

    #[test]
    fn rejected_requests_carry_their_reply() {
        let err = Job::from_request_text("-v 3 -e 2 -s 1").unwrap_err();
        assert!(matches!(err, JobError::Request(_)));
        assert!(err.reply().starts_with("ERROR: missing -a <algorithm>\nUsage:"));

        let err = Job::from_request_text("-a MST -v 3 -e 4 -s 1").unwrap_err();
        assert!(matches!(err, JobError::Graph(GraphError::TooManyEdges { .. })));
        assert!(err.reply().starts_with("ERROR: "));
    }

    #[test]
    fn completion_hands_over_reply() {
        let job = job("-a MST -v 2 -e 1 -s 1");
        assert!(!job.is_complete());
        assert!(job.complete("done".into()));
        assert!(!job.complete("again".into()));
        assert_eq!(job.wait_reply().as_deref(), Some("done"));
    }
}
