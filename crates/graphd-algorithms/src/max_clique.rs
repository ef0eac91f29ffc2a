//! Maximum clique by Bron–Kerbosch with pivoting.
//!
//! Undirected graphs only. A graph with vertices but no edges has a maximum
//! clique of size 1 (vertex 0); an empty graph has none.

use graphd_core::{AlgorithmKind, Graph, Vertex};
use rustc_hash::FxHashSet;

use crate::error::Inapplicable;

type VertexSet = FxHashSet<Vertex>;

struct BronKerbosch {
    neighbors: Vec<VertexSet>,
    best: Vec<Vertex>,
}

impl BronKerbosch {
    fn new(graph: &Graph) -> Self {
        let neighbors = graph
            .adjacency()
            .iter()
            .map(|list| list.iter().map(|neighbor| neighbor.vertex).collect())
            .collect();
        Self {
            neighbors,
            best: Vec::new(),
        }
    }

    fn pivot(&self, candidates: &VertexSet, excluded: &VertexSet) -> Option<Vertex> {
        candidates
            .iter()
            .chain(excluded.iter())
            .copied()
            .max_by_key(|&u| self.neighbors[u].intersection(candidates).count())
    }

    fn expand(&mut self, clique: &mut Vec<Vertex>, mut candidates: VertexSet, mut excluded: VertexSet) {
        if candidates.is_empty() {
            if excluded.is_empty() && clique.len() > self.best.len() {
                self.best = clique.clone();
            }
            return;
        }

        let Some(pivot) = self.pivot(&candidates, &excluded) else {
            return;
        };
        let branches: Vec<Vertex> = candidates
            .iter()
            .copied()
            .filter(|v| !self.neighbors[pivot].contains(v))
            .collect();

        for v in branches {
            let next_candidates = candidates
                .intersection(&self.neighbors[v])
                .copied()
                .collect();
            let next_excluded = excluded.intersection(&self.neighbors[v]).copied().collect();
            clique.push(v);
            self.expand(clique, next_candidates, next_excluded);
            clique.pop();
            candidates.remove(&v);
            excluded.insert(v);
        }
    }
}

/// Largest clique, sorted ascending.
pub fn maximum_clique(graph: &Graph) -> Result<Vec<Vertex>, Inapplicable> {
    if graph.is_directed() {
        return Err(Inapplicable::needs_undirected(AlgorithmKind::MaxClique));
    }

    let mut search = BronKerbosch::new(graph);
    let all: VertexSet = (0..graph.vertex_count()).collect();
    search.expand(&mut Vec::new(), all, VertexSet::default());

    let mut best = search.best;
    best.sort_unstable();
    // every isolated vertex is a maximal clique; report the lowest one
    if best.len() == 1 {
        best[0] = 0;
    }
    Ok(best)
}

pub fn report(graph: &Graph) -> String {
    match maximum_clique(graph) {
        Ok(clique) => {
            let members: Vec<String> = clique.iter().map(ToString::to_string).collect();
            format!(
                "Maximum clique size: {}\nMaximum clique vertices: {{{}}}\n",
                clique.len(),
                members.join(", ")
            )
        }
        Err(inapplicable) => format!("{}\n", inapplicable),
    }
}
