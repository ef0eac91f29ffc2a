use std::fmt;

use graphd_core::{AlgorithmKind, Vertex};
use thiserror::Error;

/// Failures that abort an algorithm run. Rendered as an `ERROR:` line in the
/// algorithm's own section.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AlgorithmError {
    #[error("graph has no vertices")]
    EmptyGraph,

    #[error("inconsistent adjacency: arc {0} -> {1} has no mirror")]
    MissingMirror(Vertex, Vertex),

    #[error("circuit walk used {used} of {total} edges")]
    IncompleteCircuit { used: usize, total: usize },
}

/// The algorithm does not apply to the graph's directedness. This is a normal
/// result, not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inapplicable {
    pub algorithm: AlgorithmKind,
    pub requires_directed: bool,
}

impl Inapplicable {
    pub(crate) fn needs_undirected(algorithm: AlgorithmKind) -> Self {
        Self {
            algorithm,
            requires_directed: false,
        }
    }

    pub(crate) fn needs_directed(algorithm: AlgorithmKind) -> Self {
        Self {
            algorithm,
            requires_directed: true,
        }
    }
}

impl fmt::Display for Inapplicable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.requires_directed {
            "a directed"
        } else {
            "an undirected"
        };
        write!(f, "NOT APPLICABLE: {} requires {} graph", self.algorithm, kind)
    }
}

impl std::error::Error for Inapplicable {}
