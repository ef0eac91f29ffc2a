//! Wire format shared by the server modes and the client.
//!
//! Request: one line of space separated flags, `-a <ALGO> -v <V> -e <E> -s <S>`,
//! in any order, terminated by the client half-closing its write side.
//!
//! Response: a graph header, one `[TAG]` section per algorithm and the
//! [`DONE_SENTINEL`] line; a rejected request gets a single `ERROR:` reply instead.
//!
//! Serial mode also accepts a [`MatrixRequest`]: a vertex-count line, a
//! `directed`/`undirected` line and the adjacency matrix rows.

use std::fmt;
use std::str::FromStr;

use crate::algorithm::AlgorithmKind;
use crate::error::{GraphError, RequestError};
use crate::graph::Graph;

pub const DONE_SENTINEL: &str = "=== DONE ===";
pub const USAGE: &str = "Usage: -a <ALGO> -v <V> -e <E> -s <S>";

/// Upper bounds on a generated graph; both twins of a request must fit in memory.
pub const MAX_VERTICES: usize = 10_000;
pub const MAX_EDGES: usize = 1_000_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphRequest {
    pub algorithm: AlgorithmKind,
    pub vertices: usize,
    pub edges: usize,
    pub seed: i64,
}

impl GraphRequest {
    pub fn parse(text: &str) -> Result<Self, RequestError> {
        let mut tokens = text.split_whitespace().peekable();
        if tokens.peek().is_none() {
            return Err(RequestError::Empty);
        }

        let mut algorithm = None;
        let (mut vertices, mut edges, mut seed) = (None, None, None);
        while let Some(token) = tokens.next() {
            match token {
                "-a" => algorithm = tokens.next(),
                "-v" => vertices = tokens.next().map(|v| parse_int("-v", v)).transpose()?,
                "-e" => edges = tokens.next().map(|v| parse_int("-e", v)).transpose()?,
                "-s" => seed = tokens.next().map(|v| parse_int("-s", v)).transpose()?,
                flag if flag.starts_with('-') => {
                    return Err(RequestError::UnknownOption(flag.to_string()))
                }
                // stray words are ignored
                _ => {}
            }
        }

        let algorithm = algorithm.ok_or(RequestError::MissingAlgorithm)?;
        let (Some(vertices), Some(edges), Some(seed)) = (vertices, edges, seed) else {
            return Err(RequestError::MissingGraphParameters);
        };
        if vertices <= 0 {
            return Err(RequestError::NonPositiveVertices);
        }
        if edges < 0 {
            return Err(RequestError::NegativeEdges);
        }
        if vertices > MAX_VERTICES as i64 {
            return Err(RequestError::TooManyVertices {
                requested: vertices,
                max: MAX_VERTICES,
            });
        }
        if edges > MAX_EDGES as i64 {
            return Err(RequestError::TooManyEdges {
                requested: edges,
                max: MAX_EDGES,
            });
        }

        Ok(Self {
            algorithm: algorithm.parse()?,
            vertices: usize::try_from(vertices).map_err(|_| RequestError::InvalidInteger {
                flag: "-v",
                value: vertices.to_string(),
            })?,
            edges: usize::try_from(edges).map_err(|_| RequestError::InvalidInteger {
                flag: "-e",
                value: edges.to_string(),
            })?,
            seed,
        })
    }

    /// Seed handed to the graph generator. Negative request seeds wrap.
    pub fn rng_seed(&self) -> u64 {
        self.seed as u64
    }

    pub fn to_request_line(&self) -> String {
        format!(
            "-a {} -v {} -e {} -s {}\n",
            self.algorithm, self.vertices, self.edges, self.seed
        )
    }
}

impl FromStr for GraphRequest {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A client-supplied graph: `<V>\n(directed|undirected)\n` followed by V
/// rows of V weights, `0` meaning no edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixRequest {
    pub vertices: usize,
    pub directed: bool,
    pub rows: String,
}

impl MatrixRequest {
    /// Builds a request from matrix rows; V is the number of non-blank rows.
    pub fn new(rows: impl Into<String>, directed: bool) -> Self {
        let rows = rows.into();
        let vertices = rows.lines().filter(|line| !line.trim().is_empty()).count();
        Self {
            vertices,
            directed,
            rows,
        }
    }

    /// A matrix request starts with a bare integer instead of a flag.
    pub fn looks_like(text: &str) -> bool {
        text.split_whitespace()
            .next()
            .is_some_and(|first| first.parse::<i64>().is_ok() && !first.starts_with('-'))
    }

    pub fn parse(text: &str) -> Result<Self, RequestError> {
        let mut lines = text.lines().skip_while(|line| line.trim().is_empty());
        let count = lines.next().ok_or(RequestError::Empty)?.trim();
        let vertices = parse_int("V", count)?;
        if vertices <= 0 {
            return Err(RequestError::NonPositiveVertices);
        }
        if vertices > MAX_VERTICES as i64 {
            return Err(RequestError::TooManyVertices {
                requested: vertices,
                max: MAX_VERTICES,
            });
        }

        let directed = match lines.next().map(str::trim) {
            Some("directed") => true,
            Some("undirected") => false,
            other => {
                return Err(RequestError::InvalidOrientation(
                    other.unwrap_or_default().to_string(),
                ))
            }
        };

        Ok(Self {
            vertices: vertices as usize,
            directed,
            rows: lines.collect::<Vec<_>>().join("\n"),
        })
    }

    /// Parses the rows and checks they describe exactly `vertices` vertices.
    pub fn graph(&self) -> Result<Graph, GraphError> {
        let graph = Graph::from_adjacency_matrix(&self.rows, self.directed)?;
        if graph.vertex_count() != self.vertices {
            return Err(GraphError::MalformedMatrix(format!(
                "expected {} rows, got {}",
                self.vertices,
                graph.vertex_count()
            )));
        }
        Ok(graph)
    }

    pub fn to_request_text(&self) -> String {
        let orientation = if self.directed { "directed" } else { "undirected" };
        let mut text = format!("{}\n{}\n{}", self.vertices, orientation, self.rows);
        if !text.ends_with('\n') {
            text.push('\n');
        }
        text
    }
}

fn parse_int(flag: &'static str, value: &str) -> Result<i64, RequestError> {
    value.parse().map_err(|_| RequestError::InvalidInteger {
        flag,
        value: value.to_string(),
    })
}

/// `[TAG]\n<body>` with the body forced to end in a newline.
pub fn section(kind: AlgorithmKind, body: &str) -> String {
    let mut out = format!("[{}]\n{}", kind, body);
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// Reply for a request rejected before any graph work.
pub fn request_error_reply(err: &RequestError) -> String {
    format!("ERROR: {}\n{}\n", err, USAGE)
}

pub fn error_reply(err: &dyn fmt::Display) -> String {
    format!("ERROR: {}\n", err)
}

pub fn done_line() -> String {
    format!("{}\n", DONE_SENTINEL)
}

/// Header describing a client-supplied graph.
pub fn matrix_header(graph: &Graph) -> String {
    let (label, orientation) = if graph.is_directed() {
        ("Directed", "directed")
    } else {
        ("Undirected", "undirected")
    };
    format!(
        "=== Adjacency Matrix (V={}, {}) ===\n--- {} ---\n{}",
        graph.vertex_count(),
        orientation,
        label,
        graph.render()
    )
}

/// Header describing the generated graph(s) of a request.
pub fn graph_header(request: &GraphRequest, graphs: &[(&str, &Graph)]) -> String {
    let mut out = format!(
        "=== Random Graphs (seed={}, V={}, E={}) ===\n",
        request.seed, request.vertices, request.edges
    );
    for (label, graph) in graphs {
        out.push_str(&format!("--- {} ---\n", label));
        out.push_str(&graph.render());
    }
    out
}
