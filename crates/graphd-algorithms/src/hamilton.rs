//! Hamiltonian circuit by exhaustive backtracking from vertex 0.

use graphd_core::{Graph, Vertex, Weight};

const START: Vertex = 0;

struct Search<'g> {
    graph: &'g Graph,
    path: Vec<Vertex>,
    used: Vec<bool>,
}

impl Search<'_> {
    fn extend(&mut self) -> bool {
        let n = self.graph.vertex_count();
        if self.path.len() == n {
            return true;
        }
        let Some(&previous) = self.path.last() else {
            return false;
        };
        let closing = self.path.len() + 1 == n;

        for candidate in 0..n {
            if self.used[candidate] || !self.graph.is_edge_connected(previous, candidate) {
                continue;
            }
            if closing && !self.graph.is_edge_connected(candidate, START) {
                continue;
            }
            self.used[candidate] = true;
            self.path.push(candidate);
            if self.extend() {
                return true;
            }
            self.path.pop();
            self.used[candidate] = false;
        }
        false
    }
}

/// First circuit found, as `0 -> ... -> 0`. Needs at least 3 vertices.
pub fn hamiltonian_circuit(graph: &Graph) -> Option<Vec<Vertex>> {
    let n = graph.vertex_count();
    if n < 3 {
        return None;
    }

    let mut search = Search {
        graph,
        path: Vec::with_capacity(n + 1),
        used: vec![false; n],
    };
    search.used[START] = true;
    search.path.push(START);
    if !search.extend() {
        return None;
    }
    let mut circuit = search.path;
    circuit.push(START);
    Some(circuit)
}

fn circuit_weight(graph: &Graph, circuit: &[Vertex]) -> Weight {
    circuit
        .windows(2)
        .filter_map(|step| graph.edge_weight(step[0], step[1]))
        .sum()
}

pub fn report(graph: &Graph) -> String {
    match hamiltonian_circuit(graph) {
        Some(circuit) => format!(
            "Hamilton circuit found:\nPath: {}\nTotal weight: {}\n",
            crate::join_path(&circuit),
            circuit_weight(graph, &circuit)
        ),
        None => "No Hamilton circuit found\n".to_string(),
    }
}
