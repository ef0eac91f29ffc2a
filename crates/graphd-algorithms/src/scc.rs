//! Kosaraju's strongly connected components.

use graphd_core::{AlgorithmKind, Graph, Vertex};

use crate::error::Inapplicable;

/// Components in discovery order of the second pass; each component sorted ascending.
pub fn kosaraju(graph: &Graph) -> Result<Vec<Vec<Vertex>>, Inapplicable> {
    if !graph.is_directed() {
        return Err(Inapplicable::needs_directed(AlgorithmKind::Scc));
    }

    let n = graph.vertex_count();
    let adjacency = graph.adjacency();

    // first pass: finishing order
    let mut visited = vec![false; n];
    let mut finished = Vec::with_capacity(n);
    for root in 0..n {
        if visited[root] {
            continue;
        }
        visited[root] = true;
        let mut stack = vec![(root, 0usize)];
        while let Some(top) = stack.last_mut() {
            let (v, next) = *top;
            match adjacency[v].get(next) {
                Some(neighbor) => {
                    top.1 += 1;
                    let w = neighbor.vertex;
                    if !visited[w] {
                        visited[w] = true;
                        stack.push((w, 0));
                    }
                }
                None => {
                    finished.push(v);
                    stack.pop();
                }
            }
        }
    }

    let mut reverse: Vec<Vec<Vertex>> = vec![Vec::new(); n];
    for (u, list) in adjacency.iter().enumerate() {
        for neighbor in list {
            reverse[neighbor.vertex].push(u);
        }
    }

    // second pass: reverse graph, latest finisher first
    visited.fill(false);
    let mut components = Vec::new();
    while let Some(root) = finished.pop() {
        if visited[root] {
            continue;
        }
        visited[root] = true;
        let mut component = Vec::new();
        let mut stack = vec![root];
        while let Some(v) = stack.pop() {
            component.push(v);
            for &w in &reverse[v] {
                if !visited[w] {
                    visited[w] = true;
                    stack.push(w);
                }
            }
        }
        component.sort_unstable();
        components.push(component);
    }
    Ok(components)
}

pub fn report(graph: &Graph) -> String {
    match kosaraju(graph) {
        Ok(components) => {
            let mut out = format!("Strongly Connected Components ({}):\n", components.len());
            for (i, component) in components.iter().enumerate() {
                let members: Vec<String> = component.iter().map(ToString::to_string).collect();
                out.push_str(&format!("Component {}: {{{}}}\n", i + 1, members.join(", ")));
            }
            out
        }
        Err(inapplicable) => format!("{}\n", inapplicable),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directed(n: usize, edges: &[(usize, usize)]) -> Graph {
        let mut g = Graph::new(n, true);
        for &(u, v) in edges {
            g.add_edge(u, v, 1).unwrap();
        }
        g
    }

    fn reachable(g: &Graph, from: Vertex) -> Vec<bool> {
        let mut seen = vec![false; g.vertex_count()];
        let mut stack = vec![from];
        seen[from] = true;
        while let Some(v) = stack.pop() {
            for n in g.neighbors(v) {
                if !seen[n.vertex] {
                    seen[n.vertex] = true;
                    stack.push(n.vertex);
                }
            }
        }
        seen
    }

    fn assert_valid_partition(g: &Graph, components: &[Vec<Vertex>]) {
        let mut owner = vec![None; g.vertex_count()];
        for (i, component) in components.iter().enumerate() {
            for &v in component {
                assert!(owner[v].is_none(), "vertex {} in two components", v);
                owner[v] = Some(i);
            }
        }
        assert!(owner.iter().all(Option::is_some), "components must cover every vertex");

        let reach: Vec<Vec<bool>> = (0..g.vertex_count()).map(|v| reachable(g, v)).collect();
        for u in 0..g.vertex_count() {
            for v in 0..g.vertex_count() {
                let same = owner[u] == owner[v];
                let mutual = reach[u][v] && reach[v][u];
                assert_eq!(same, mutual, "vertices {} and {}", u, v);
            }
        }
    }

    #[test]
    fn finds_classic_components() {
        let g = directed(
            8,
            &[
                (0, 1),
                (1, 2),
                (2, 0),
                (2, 3),
                (3, 4),
                (4, 5),
                (5, 3),
                (6, 5),
                (6, 7),
                (7, 6),
            ],
        );
        let components = kosaraju(&g).unwrap();
        assert_eq!(components.len(), 3);
        assert!(components.contains(&vec![0, 1, 2]));
        assert!(components.contains(&vec![3, 4, 5]));
        assert!(components.contains(&vec![6, 7]));
        assert_valid_partition(&g, &components);
    }

    #[test]
    fn random_graphs_partition_correctly() {
        for seed in 0..20 {
            let g = Graph::random(9, 14, seed, true).unwrap();
            let components = kosaraju(&g).unwrap();
            assert_valid_partition(&g, &components);
        }
    }

    #[test]
    fn edgeless_graph_has_singletons() {
        let components = kosaraju(&Graph::new(3, true)).unwrap();
        assert_eq!(components.len(), 3);
        assert!(components.iter().all(|c| c.len() == 1));
    }

    #[test]
    fn undirected_input_is_inapplicable() {
        let g = Graph::new(2, false);
        assert!(kosaraju(&g).is_err());
        assert!(report(&g).starts_with("NOT APPLICABLE"));
    }
}
