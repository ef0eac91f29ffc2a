use thiserror::Error;

use crate::graph::{Vertex, Weight};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("vertex out of bounds: {vertex} (graph has {vertex_count} vertices)")]
    VertexOutOfRange { vertex: Vertex, vertex_count: usize },

    #[error("no self-loops allowed: {0} -> {0}")]
    SelfLoop(Vertex),

    #[error("negative weight not allowed: {0}")]
    NegativeWeight(Weight),

    #[error("edge already exists: {0} -> {1}")]
    DuplicateEdge(Vertex, Vertex),

    #[error("too many edges: {requested} requested, at most {max} fit in {vertices} vertices")]
    TooManyEdges {
        requested: usize,
        max: usize,
        vertices: usize,
    },

    #[error("malformed adjacency matrix: {0}")]
    MalformedMatrix(String),

    #[error("cannot allocate a graph with {vertices} vertices")]
    Allocation { vertices: usize },
}

/// Request-format errors. The whole request is rejected before any graph work.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("empty request")]
    Empty,

    #[error("missing -a <algorithm>")]
    MissingAlgorithm,

    #[error("missing one of -v/-e/-s")]
    MissingGraphParameters,

    #[error("invalid value for {flag}: '{value}'")]
    InvalidInteger { flag: &'static str, value: String },

    #[error("V must be positive")]
    NonPositiveVertices,

    #[error("E cannot be negative")]
    NegativeEdges,

    #[error("V cannot exceed {max} (got {requested})")]
    TooManyVertices { requested: i64, max: usize },

    #[error("E cannot exceed {max} (got {requested})")]
    TooManyEdges { requested: i64, max: usize },

    #[error("expected 'directed' or 'undirected', got '{0}'")]
    InvalidOrientation(String),

    #[error("unknown option '{0}'")]
    UnknownOption(String),

    #[error("unknown algorithm '{0}'")]
    UnknownAlgorithm(String),
}

pub type Result<T> = std::result::Result<T, GraphError>;
