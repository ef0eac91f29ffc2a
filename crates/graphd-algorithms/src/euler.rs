//! Eulerian circuit detection and construction (Hierholzer's walk).

use std::fmt;

use graphd_core::{Graph, Neighbor, Vertex};

use crate::error::AlgorithmError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Obstacle {
    OddDegree {
        vertex: Vertex,
        degree: usize,
    },
    Unbalanced {
        vertex: Vertex,
        in_degree: usize,
        out_degree: usize,
    },
    /// `vertex` has edges but is not reachable from the rest of the edge set.
    Disconnected { vertex: Vertex },
}

impl fmt::Display for Obstacle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Obstacle::OddDegree { vertex, degree } => {
                write!(f, "vertex {} has odd degree {}", vertex, degree)
            }
            Obstacle::Unbalanced {
                vertex,
                in_degree,
                out_degree,
            } => write!(
                f,
                "vertex {} has in-degree {} but out-degree {}",
                vertex, in_degree, out_degree
            ),
            Obstacle::Disconnected { vertex } => write!(
                f,
                "vertex {} is not connected to the other edges",
                vertex
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EulerianOutcome {
    /// Closed walk using every edge exactly once; empty for an edgeless graph.
    Circuit(Vec<Vertex>),
    NotEulerian(Obstacle),
}

/// Feasibility check. Returns the walk's start vertex, or `None` when the
/// graph has no edges at all.
pub fn check(graph: &Graph) -> Result<Option<Vertex>, Obstacle> {
    let n = graph.vertex_count();
    let mut in_degree = vec![0usize; n];
    for neighbor in graph.adjacency().iter().flatten() {
        in_degree[neighbor.vertex] += 1;
    }
    let out_degree: Vec<usize> = graph.adjacency().iter().map(Vec::len).collect();

    for vertex in 0..n {
        if graph.is_directed() {
            if in_degree[vertex] != out_degree[vertex] {
                return Err(Obstacle::Unbalanced {
                    vertex,
                    in_degree: in_degree[vertex],
                    out_degree: out_degree[vertex],
                });
            }
        } else if out_degree[vertex] % 2 != 0 {
            return Err(Obstacle::OddDegree {
                vertex,
                degree: out_degree[vertex],
            });
        }
    }

    let Some(start) = (0..n).find(|&v| out_degree[v] > 0) else {
        return Ok(None);
    };

    // weak connectivity: arcs are followed in both directions
    let mut links: Vec<Vec<Vertex>> = graph
        .adjacency()
        .iter()
        .map(|list| list.iter().map(|neighbor| neighbor.vertex).collect())
        .collect();
    if graph.is_directed() {
        for (u, list) in graph.adjacency().iter().enumerate() {
            for neighbor in list {
                links[neighbor.vertex].push(u);
            }
        }
    }

    let mut visited = vec![false; n];
    let mut stack = vec![start];
    visited[start] = true;
    while let Some(v) = stack.pop() {
        for &w in &links[v] {
            if !visited[w] {
                visited[w] = true;
                stack.push(w);
            }
        }
    }

    match (0..n).find(|&v| out_degree[v] + in_degree[v] > 0 && !visited[v]) {
        Some(vertex) => Err(Obstacle::Disconnected { vertex }),
        None => Ok(Some(start)),
    }
}

pub fn eulerian_circuit(graph: &Graph) -> Result<EulerianOutcome, AlgorithmError> {
    let start = match check(graph) {
        Ok(Some(start)) => start,
        Ok(None) => return Ok(EulerianOutcome::Circuit(Vec::new())),
        Err(obstacle) => return Ok(EulerianOutcome::NotEulerian(obstacle)),
    };

    // private copy; edges are consumed as they are walked
    let mut remaining: Vec<Vec<Neighbor>> = graph.adjacency().to_vec();
    let mut path = vec![start];
    let mut circuit = Vec::with_capacity(graph.edge_count() + 1);

    while let Some(&current) = path.last() {
        match remaining[current].pop() {
            Some(next) => {
                if !graph.is_directed() {
                    let mirror = remaining[next.vertex]
                        .iter()
                        .position(|neighbor| neighbor.vertex == current)
                        .ok_or(AlgorithmError::MissingMirror(current, next.vertex))?;
                    remaining[next.vertex].swap_remove(mirror);
                }
                path.push(next.vertex);
            }
            None => {
                circuit.push(current);
                path.pop();
            }
        }
    }

    let used = circuit.len().saturating_sub(1);
    if used != graph.edge_count() {
        return Err(AlgorithmError::IncompleteCircuit {
            used,
            total: graph.edge_count(),
        });
    }
    circuit.reverse();
    Ok(EulerianOutcome::Circuit(circuit))
}

pub fn report(graph: &Graph) -> Result<String, AlgorithmError> {
    Ok(match eulerian_circuit(graph)? {
        EulerianOutcome::Circuit(circuit) if circuit.is_empty() => {
            "Eulerian: YES\nEulerian circuit: (empty, graph has no edges)\n".to_string()
        }
        EulerianOutcome::Circuit(circuit) => format!(
            "Eulerian: YES\nEulerian circuit: {}\n",
            crate::join_path(&circuit)
        ),
        EulerianOutcome::NotEulerian(obstacle) => {
            format!("Eulerian: NO\nReason: {}\n", obstacle)
        }
    })
}
