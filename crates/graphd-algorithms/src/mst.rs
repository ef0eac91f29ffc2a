//! Kruskal's minimum spanning tree over undirected graphs.

use graphd_core::{AlgorithmKind, Graph, Vertex, Weight};

use crate::error::Inapplicable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightedEdge {
    pub u: Vertex,
    pub v: Vertex,
    pub weight: Weight,
}

/// Disjoint-set forest with union by rank and path compression.
#[derive(Debug, Clone)]
pub struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    pub fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        // path compression
        let mut node = x;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }
        root
    }

    /// Merges the sets of `x` and `y`; `false` if they were already joined.
    pub fn union(&mut self, x: usize, y: usize) -> bool {
        let (root_x, root_y) = (self.find(x), self.find(y));
        if root_x == root_y {
            return false;
        }
        match self.rank[root_x].cmp(&self.rank[root_y]) {
            std::cmp::Ordering::Less => self.parent[root_x] = root_y,
            std::cmp::Ordering::Greater => self.parent[root_y] = root_x,
            std::cmp::Ordering::Equal => {
                self.parent[root_y] = root_x;
                self.rank[root_x] += 1;
            }
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanningForest {
    pub edges: Vec<WeightedEdge>,
    pub total_weight: Weight,
    pub vertex_count: usize,
}

impl SpanningForest {
    /// `true` when the forest is a single tree covering every vertex.
    pub fn is_spanning_tree(&self) -> bool {
        self.edges.len() + 1 >= self.vertex_count
    }
}

pub fn kruskal(graph: &Graph) -> Result<SpanningForest, Inapplicable> {
    if graph.is_directed() {
        return Err(Inapplicable::needs_undirected(AlgorithmKind::Mst));
    }

    let n = graph.vertex_count();
    let mut candidates: Vec<WeightedEdge> = graph
        .adjacency()
        .iter()
        .enumerate()
        .flat_map(|(u, list)| {
            list.iter()
                .filter(move |neighbor| u < neighbor.vertex)
                .map(move |neighbor| WeightedEdge {
                    u,
                    v: neighbor.vertex,
                    weight: neighbor.weight,
                })
        })
        .collect();
    candidates.sort_by_key(|edge| edge.weight);

    let target = n.saturating_sub(1);
    let mut sets = UnionFind::new(n);
    let mut edges = Vec::with_capacity(target);
    for edge in candidates {
        if edges.len() == target {
            break;
        }
        if sets.union(edge.u, edge.v) {
            edges.push(edge);
        }
    }

    Ok(SpanningForest {
        total_weight: edges.iter().map(|edge| edge.weight).sum(),
        edges,
        vertex_count: n,
    })
}

pub fn report(graph: &Graph) -> String {
    let forest = match kruskal(graph) {
        Ok(forest) => forest,
        Err(inapplicable) => return format!("{}\n", inapplicable),
    };

    let mut out = String::from("Minimum Spanning Tree (Kruskal):\n");
    for edge in &forest.edges {
        out.push_str(&format!("({} -- {}) weight: {}\n", edge.u, edge.v, edge.weight));
    }
    out.push_str(&format!("Total weight: {}\n", forest.total_weight));
    out.push_str(&format!("Number of edges: {}\n", forest.edges.len()));
    if !forest.is_spanning_tree() {
        out.push_str(&format!(
            "Graph is disconnected: spanning forest has {} of {} edges\n",
            forest.edges.len(),
            forest.vertex_count.saturating_sub(1)
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn undirected(n: usize, edges: &[(usize, usize, Weight)]) -> Graph {
        let mut g = Graph::new(n, false);
        for &(u, v, w) in edges {
            g.add_edge(u, v, w).unwrap();
        }
        g
    }

    #[test]
    fn union_find_merges_once() {
        let mut uf = UnionFind::new(4);
        assert!(uf.union(0, 1));
        assert!(uf.union(2, 3));
        assert!(uf.union(1, 3));
        assert!(!uf.union(0, 2));
        assert_eq!(uf.find(0), uf.find(3));
    }

    #[test]
    fn four_cycle_keeps_three_edges() {
        let g = undirected(4, &[(0, 1, 1), (1, 2, 1), (2, 3, 1), (3, 0, 1)]);
        let forest = kruskal(&g).unwrap();
        assert_eq!(forest.edges.len(), 3);
        assert!(forest.is_spanning_tree());
        assert_eq!(forest.total_weight, 3);
    }

    #[test]
    fn picks_the_lightest_edges() {
        let g = undirected(
            4,
            &[(0, 1, 4), (0, 2, 1), (1, 2, 2), (1, 3, 7), (2, 3, 3), (0, 3, 9)],
        );
        let forest = kruskal(&g).unwrap();
        assert_eq!(forest.total_weight, 6);

        // the result is acyclic: re-playing it through a fresh union-find never rejects an edge
        let mut uf = UnionFind::new(4);
        assert!(forest.edges.iter().all(|e| uf.union(e.u, e.v)));
    }

    #[test]
    fn disconnected_graph_yields_forest() {
        let g = undirected(5, &[(0, 1, 2), (2, 3, 1)]);
        let forest = kruskal(&g).unwrap();
        assert_eq!(forest.edges.len(), 2);
        assert!(!forest.is_spanning_tree());
        assert!(report(&g).contains("Graph is disconnected"));
    }

    #[test]
    fn single_vertex_is_a_tree() {
        let forest = kruskal(&Graph::new(1, false)).unwrap();
        assert!(forest.edges.is_empty());
        assert!(forest.is_spanning_tree());
    }

    #[test]
    fn directed_input_is_inapplicable() {
        let g = Graph::new(3, true);
        assert_eq!(
            kruskal(&g),
            Err(Inapplicable {
                algorithm: AlgorithmKind::Mst,
                requires_directed: false
            })
        );
        assert!(report(&g).starts_with("NOT APPLICABLE"));
    }
}
