//! Problem instances parsed from edge-list text files.
//!
//! The format is a DIMACS-flavored edge list:
//!
//! ```text
//! c optional comment
//! p <vertices> <edges>
//! e <u> <v> [weight]
//! ```
//!
//! Vertex indices are 1-based in the file and 0-based in memory. Edges
//! default to weight 1.0 when the third token is absent. The `p` line must
//! appear exactly once, before any `e` line, and must agree with the number
//! of edge lines that follow.

use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read instance file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed instance at line {line}: {reason}")]
    Malformed { line: usize, reason: String },
    #[error("malformed instance: {0}")]
    Invalid(String),
}

/// One undirected edge, endpoints 0-based.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub u: usize,
    pub v: usize,
    pub weight: f64,
}

/// An immutable undirected weighted graph. Once constructed it is read-only;
/// algorithms may share a reference but never mutate it.
#[derive(Debug, Clone)]
pub struct ProblemInstance {
    name: String,
    vertices: usize,
    edges: Vec<Edge>,
    adjacency: Vec<Vec<(usize, f64)>>,
}

impl ProblemInstance {
    /// Parses edge-list text into an instance named `name`.
    pub fn parse(name: impl Into<String>, text: &str) -> Result<Self, LoadError> {
        let mut declared: Option<(usize, usize)> = None;
        let mut edges: Vec<Edge> = Vec::new();

        for (idx, raw) in text.lines().enumerate() {
            let line = idx + 1;
            let mut tokens = raw.split_whitespace();
            let Some(kind) = tokens.next() else { continue };
            match kind {
                "c" => continue,
                "p" => {
                    if declared.is_some() {
                        return Err(malformed(line, "duplicate problem line"));
                    }
                    let vertices = parse_token(tokens.next(), line, "vertex count")?;
                    let edge_count = parse_token(tokens.next(), line, "edge count")?;
                    if tokens.next().is_some() {
                        return Err(malformed(line, "trailing tokens on problem line"));
                    }
                    declared = Some((vertices, edge_count));
                }
                "e" => {
                    let Some((vertices, _)) = declared else {
                        return Err(malformed(line, "edge line before problem line"));
                    };
                    let u: usize = parse_token(tokens.next(), line, "edge endpoint")?;
                    let v: usize = parse_token(tokens.next(), line, "edge endpoint")?;
                    let weight = match tokens.next() {
                        Some(tok) => tok
                            .parse::<f64>()
                            .map_err(|_| malformed(line, format!("invalid edge weight '{tok}'")))?,
                        None => 1.0,
                    };
                    if tokens.next().is_some() {
                        return Err(malformed(line, "trailing tokens on edge line"));
                    }
                    if u == 0 || v == 0 || u > vertices || v > vertices {
                        return Err(malformed(
                            line,
                            format!("vertex index out of range (1..={vertices})"),
                        ));
                    }
                    if u == v {
                        return Err(malformed(line, "self-loop"));
                    }
                    edges.push(Edge {
                        u: u - 1,
                        v: v - 1,
                        weight,
                    });
                }
                other => {
                    return Err(malformed(line, format!("unrecognized line kind '{other}'")));
                }
            }
        }

        let Some((vertices, declared_edges)) = declared else {
            return Err(LoadError::Invalid("missing problem line".into()));
        };
        if edges.len() != declared_edges {
            return Err(LoadError::Invalid(format!(
                "problem line declares {declared_edges} edges, found {}",
                edges.len()
            )));
        }

        let mut adjacency = vec![Vec::new(); vertices];
        for edge in &edges {
            adjacency[edge.u].push((edge.v, edge.weight));
            adjacency[edge.v].push((edge.u, edge.weight));
        }

        Ok(Self {
            name: name.into(),
            vertices,
            edges,
            adjacency,
        })
    }

    /// Display name used in result rows, typically the source file stem.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Neighbors of `v` as `(vertex, weight)` pairs.
    pub fn neighbors(&self, v: usize) -> &[(usize, f64)] {
        &self.adjacency[v]
    }

    /// Total weight of edges crossing the cut described by `assignment`,
    /// where `assignment[v]` names the side of vertex `v`.
    pub fn cut_weight(&self, assignment: &[bool]) -> f64 {
        debug_assert_eq!(assignment.len(), self.vertices);
        self.edges
            .iter()
            .filter(|e| assignment[e.u] != assignment[e.v])
            .map(|e| e.weight)
            .sum()
    }
}

fn malformed(line: usize, reason: impl Into<String>) -> LoadError {
    LoadError::Malformed {
        line,
        reason: reason.into(),
    }
}

fn parse_token<T: FromStr>(token: Option<&str>, line: usize, what: &str) -> Result<T, LoadError> {
    let tok = token.ok_or_else(|| malformed(line, format!("missing {what}")))?;
    tok.parse()
        .map_err(|_| malformed(line, format!("invalid {what} '{tok}'")))
}
