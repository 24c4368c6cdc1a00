//! Edge-list input
//!
//! One edge per line: `src dst [weight]`. Node ids are contiguous in
//! `[0, N)`. Blank lines and `#` comments are ignored.

use anyhow::{bail, Context};
use ruvector_gcn_prep::{Scalar, SparseOperator};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeList {
    pub edges: Vec<(usize, usize, f64)>,
}

impl EdgeList {
    /// Smallest node count covering every endpoint
    pub fn node_count(&self) -> usize {
        self.edges
            .iter()
            .map(|&(u, v, _)| u.max(v) + 1)
            .max()
            .unwrap_or(0)
    }

    /// Raw adjacency with `nodes` rows, or just enough rows for every endpoint
    pub fn to_operator<T: Scalar>(&self, nodes: Option<usize>) -> anyhow::Result<SparseOperator<T>> {
        let n = nodes.unwrap_or_else(|| self.node_count());
        let edges: Vec<_> = self
            .edges
            .iter()
            .map(|&(u, v, w)| (u, v, T::from_config(w)))
            .collect();
        SparseOperator::from_weighted_edges(n, &edges)
            .with_context(|| format!("edge list does not fit {n} nodes"))
    }
}

pub fn parse_edge_list(text: &str) -> anyhow::Result<EdgeList> {
    let mut edges = Vec::new();

    for (lineno, line) in text.lines().enumerate() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        let (src, dst, weight) = match fields.as_slice() {
            [src, dst] => (*src, *dst, None),
            [src, dst, weight] => (*src, *dst, Some(*weight)),
            _ => bail!(
                "line {}: expected `src dst [weight]`, got {} fields",
                lineno + 1,
                fields.len()
            ),
        };

        let src: usize = src
            .parse()
            .with_context(|| format!("line {}: invalid source node {src:?}", lineno + 1))?;
        let dst: usize = dst
            .parse()
            .with_context(|| format!("line {}: invalid target node {dst:?}", lineno + 1))?;
        let weight = match weight {
            Some(w) => w
                .parse::<f64>()
                .with_context(|| format!("line {}: invalid weight {w:?}", lineno + 1))?,
            None => 1.0,
        };
        if !weight.is_finite() {
            bail!("line {}: weight must be finite", lineno + 1);
        }

        edges.push((src, dst, weight));
    }

    Ok(EdgeList { edges })
}

pub fn read_edge_list(path: &Path) -> anyhow::Result<EdgeList> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read edge list {}", path.display()))?;
    let list = parse_edge_list(&text)?;
    tracing::info!(
        path = %path.display(),
        edges = list.edges.len(),
        nodes = list.node_count(),
        "loaded edge list"
    );
    Ok(list)
}
