use std::fmt;
use std::str::FromStr;

use crate::error::RequestError;

/// The fixed set of analyses a request can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AlgorithmKind {
    Eulerian,
    Mst,
    Scc,
    Hamilton,
    MaxClique,
}

impl AlgorithmKind {
    pub const ALL: [AlgorithmKind; 5] = [
        AlgorithmKind::Eulerian,
        AlgorithmKind::Mst,
        AlgorithmKind::Scc,
        AlgorithmKind::Hamilton,
        AlgorithmKind::MaxClique,
    ];

    /// The four algorithms run per job by the concurrent servers, in pipeline stage order.
    pub const SUITE: [AlgorithmKind; 4] = [
        AlgorithmKind::Mst,
        AlgorithmKind::Scc,
        AlgorithmKind::Hamilton,
        AlgorithmKind::MaxClique,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            AlgorithmKind::Eulerian => "EULERIAN",
            AlgorithmKind::Mst => "MST",
            AlgorithmKind::Scc => "SCC",
            AlgorithmKind::Hamilton => "HAMILTON",
            AlgorithmKind::MaxClique => "MAXCLIQUE",
        }
    }

    /// Which twin this algorithm reads: SCC runs on the directed graph, everything else on the undirected one.
    pub fn wants_directed(self) -> bool {
        matches!(self, AlgorithmKind::Scc)
    }

    /// Dense index for per-algorithm slot arrays.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for AlgorithmKind {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        AlgorithmKind::ALL
            .into_iter()
            .find(|kind| kind.tag() == upper)
            .ok_or_else(|| RequestError::UnknownAlgorithm(s.to_string()))
    }
}
