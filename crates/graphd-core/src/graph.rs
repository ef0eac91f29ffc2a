use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::warn;

use crate::error::{GraphError, Result};

pub type Vertex = usize;
pub type Weight = i64;

/// Weights drawn by [`Graph::random`] fall in this inclusive range.
pub const MIN_RANDOM_WEIGHT: Weight = 1;
pub const MAX_RANDOM_WEIGHT: Weight = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Neighbor {
    pub vertex: Vertex,
    pub weight: Weight,
}

/// Weighted adjacency-list graph, directed or undirected.
///
/// Invariants held by every mutation path:
/// - vertex ids are in `[0, vertex_count)`
/// - no self-loops and no duplicate arc for the same ordered pair
/// - weights are non-negative
/// - an undirected edge is stored as two mirrored arcs
///
/// Algorithms only ever read a `Graph`; the ones that consume edges work on a
/// private copy of [`Graph::adjacency`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Graph {
    vertex_count: usize,
    directed: bool,
    adjacency: Vec<Vec<Neighbor>>,
}

/// Largest edge count a request may ask for; shared by both twins so they always agree on E.
pub fn max_edges(vertex_count: usize) -> usize {
    vertex_count.saturating_mul(vertex_count.saturating_sub(1)) / 2
}

impl Graph {
    pub fn new(vertex_count: usize, directed: bool) -> Self {
        Self {
            vertex_count,
            directed,
            adjacency: vec![Vec::new(); vertex_count],
        }
    }

    /// Like [`Graph::new`], but reports an allocation failure instead of aborting.
    pub fn try_new(vertex_count: usize, directed: bool) -> Result<Self> {
        let mut adjacency = Vec::new();
        adjacency
            .try_reserve_exact(vertex_count)
            .map_err(|_| GraphError::Allocation {
                vertices: vertex_count,
            })?;
        adjacency.resize_with(vertex_count, Vec::new);
        Ok(Self {
            vertex_count,
            directed,
            adjacency,
        })
    }

    /// Seeded random graph with exactly `edge_count` edges.
    ///
    /// Endpoints are drawn uniformly; a draw is kept only if it is not a
    /// self-loop and the arc does not exist yet. The directed and undirected
    /// twins of one request use the same seed and therefore the same draw
    /// sequence.
    pub fn random(vertex_count: usize, edge_count: usize, seed: u64, directed: bool) -> Result<Self> {
        let max = max_edges(vertex_count);
        if edge_count > max {
            return Err(GraphError::TooManyEdges {
                requested: edge_count,
                max,
                vertices: vertex_count,
            });
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut graph = Self::try_new(vertex_count, directed)?;
        let mut added = 0;
        while added < edge_count {
            let u = rng.random_range(0..vertex_count);
            let v = rng.random_range(0..vertex_count);
            let weight = rng.random_range(MIN_RANDOM_WEIGHT..=MAX_RANDOM_WEIGHT);
            if u != v && !graph.has_arc(u, v) {
                graph.push_edge(u, v, weight);
                added += 1;
            }
        }
        Ok(graph)
    }

    /// Parses a whitespace separated square matrix. `0` means no edge, a
    /// positive entry is the edge weight and negative entries are rejected.
    /// The diagonal is ignored.
    pub fn from_adjacency_matrix(text: &str, directed: bool) -> Result<Self> {
        let mut rows: Vec<Vec<Weight>> = Vec::new();
        for (line_no, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let row = line
                .split_whitespace()
                .map(|token| {
                    token.parse::<Weight>().map_err(|_| {
                        GraphError::MalformedMatrix(format!(
                            "line {}: '{}' is not an integer",
                            line_no + 1,
                            token
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            rows.push(row);
        }

        if rows.is_empty() {
            return Err(GraphError::MalformedMatrix("matrix is empty".into()));
        }
        let n = rows.len();
        if let Some(bad) = rows.iter().position(|row| row.len() != n) {
            return Err(GraphError::MalformedMatrix(format!(
                "row {} has {} entries, expected {}",
                bad,
                rows[bad].len(),
                n
            )));
        }

        let mut graph = Self::try_new(n, directed)?;
        for (u, row) in rows.iter().enumerate() {
            for (v, &weight) in row.iter().enumerate() {
                if weight < 0 {
                    return Err(GraphError::MalformedMatrix(format!(
                        "negative entry {} at ({}, {})",
                        weight, u, v
                    )));
                }
                if weight == 0 || u == v || graph.has_arc(u, v) {
                    continue;
                }
                graph.push_edge(u, v, weight);
            }
        }
        Ok(graph)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn is_directed(&self) -> bool {
        self.directed
    }

    /// Number of edges; an undirected edge counts once.
    pub fn edge_count(&self) -> usize {
        let arcs: usize = self.adjacency.iter().map(Vec::len).sum();
        if self.directed {
            arcs
        } else {
            arcs / 2
        }
    }

    pub fn adjacency(&self) -> &[Vec<Neighbor>] {
        &self.adjacency
    }

    /// The `Vertex i: ...` listing sent in reply headers.
    pub fn render(&self) -> String {
        self.to_string()
    }

    /// Adds `u -> v` (and the mirror for undirected graphs).
    ///
    /// An invalid edge is reported and leaves the graph untouched.
    pub fn add_edge(&mut self, u: Vertex, v: Vertex, weight: Weight) -> Result<()> {
        let outcome = self.check_new_edge(u, v, weight);
        match outcome {
            Ok(()) => {
                self.push_edge(u, v, weight);
                Ok(())
            }
            Err(err) => {
                warn!("add_edge({}, {}, {}) rejected: {}", u, v, weight, err);
                Err(err)
            }
        }
    }

    /// Neighbors of `v`; empty (and reported) when `v` is out of range.
    pub fn neighbors(&self, v: Vertex) -> &[Neighbor] {
        match self.adjacency.get(v) {
            Some(list) => list,
            None => {
                self.report_out_of_range("neighbors", v);
                &[]
            }
        }
    }

    pub fn out_degree(&self, v: Vertex) -> Option<usize> {
        if !self.contains(v) {
            self.report_out_of_range("out_degree", v);
            return None;
        }
        Some(self.adjacency[v].len())
    }

    pub fn in_degree(&self, v: Vertex) -> Option<usize> {
        if !self.contains(v) {
            self.report_out_of_range("in_degree", v);
            return None;
        }
        if !self.directed {
            return Some(self.adjacency[v].len());
        }
        Some(
            self.adjacency
                .iter()
                .flatten()
                .filter(|neighbor| neighbor.vertex == v)
                .count(),
        )
    }

    /// Undirected: number of incident edges. Directed: in-degree plus out-degree.
    pub fn degree(&self, v: Vertex) -> Option<usize> {
        if self.directed {
            Some(self.in_degree(v)? + self.out_degree(v)?)
        } else {
            self.out_degree(v)
        }
    }

    /// Whether the arc `u -> v` exists. Out-of-range ids are reported and yield `false`.
    pub fn is_edge_connected(&self, u: Vertex, v: Vertex) -> bool {
        if !self.contains(u) || !self.contains(v) {
            self.report_out_of_range("is_edge_connected", if self.contains(u) { v } else { u });
            return false;
        }
        self.has_arc(u, v)
    }

    pub fn edge_weight(&self, u: Vertex, v: Vertex) -> Option<Weight> {
        self.adjacency
            .get(u)?
            .iter()
            .find(|neighbor| neighbor.vertex == v)
            .map(|neighbor| neighbor.weight)
    }

    fn contains(&self, v: Vertex) -> bool {
        v < self.vertex_count
    }

    fn has_arc(&self, u: Vertex, v: Vertex) -> bool {
        self.adjacency[u].iter().any(|neighbor| neighbor.vertex == v)
    }

    fn check_new_edge(&self, u: Vertex, v: Vertex, weight: Weight) -> Result<()> {
        for vertex in [u, v] {
            if !self.contains(vertex) {
                return Err(GraphError::VertexOutOfRange {
                    vertex,
                    vertex_count: self.vertex_count,
                });
            }
        }
        if weight < 0 {
            return Err(GraphError::NegativeWeight(weight));
        }
        if u == v {
            return Err(GraphError::SelfLoop(u));
        }
        if self.has_arc(u, v) {
            return Err(GraphError::DuplicateEdge(u, v));
        }
        Ok(())
    }

    fn push_edge(&mut self, u: Vertex, v: Vertex, weight: Weight) {
        self.adjacency[u].push(Neighbor { vertex: v, weight });
        if !self.directed {
            self.adjacency[v].push(Neighbor { vertex: u, weight });
        }
    }

    fn report_out_of_range(&self, operation: &str, vertex: Vertex) {
        warn!(
            "{}: vertex {} out of bounds (graph has {} vertices)",
            operation, vertex, self.vertex_count
        );
    }
}

/// One `Vertex i: n(weight w) ...` line per vertex.
impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (vertex, neighbors) in self.adjacency.iter().enumerate() {
            write!(f, "Vertex {}:", vertex)?;
            for neighbor in neighbors {
                write!(f, " {}(weight {})", neighbor.vertex, neighbor.weight)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
