pub mod builder;
pub mod node_space;

pub use builder::{build_global_graph, GraphBuilder, HOPS};
pub use node_space::infer_num_nodes;

use crate::error::{GraphError, Result};

/// Raw value of a session slot. Non-positive values are padding and never become nodes.
pub type ItemId = i64;
/// Co-occurrence count of a pair of items.
pub type Weight = u64;
pub type Session = Vec<ItemId>;

/// Capped, frequency ranked neighbor lists indexed by node id.
///
/// `adjacency[node]` and `weights[node]` are parallel: the i-th neighbor of `node`
/// co-occurred `weights[node][i]` times with it. Index 0 is never a real node and
/// always holds empty lists.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GlobalGraph {
    pub adjacency: Vec<Vec<ItemId>>,
    pub weights: Vec<Vec<Weight>>,
}

impl GlobalGraph {
    pub fn num_nodes(&self) -> usize {
        self.adjacency.len()
    }

    pub fn neighbors(&self, node: usize) -> &[ItemId] {
        self.adjacency.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn neighbor_weights(&self, node: usize) -> &[Weight] {
        self.weights.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of retained (node, neighbor) entries over all nodes.
    pub fn qty_edges(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum()
    }

    /// Iterates `(node, neighbor, weight)` over retained entries, nodes ascending.
    pub fn edges(&self) -> impl Iterator<Item = (usize, ItemId, Weight)> + '_ {
        self.adjacency
            .iter()
            .zip(self.weights.iter())
            .enumerate()
            .flat_map(|(node, (neighbors, weights))| {
                neighbors
                    .iter()
                    .zip(weights.iter())
                    .map(move |(neighbor, weight)| (node, *neighbor, *weight))
            })
    }
}

/// Turns a configured neighbor cap into a usable one. Zero or negative caps are rejected.
pub fn validate_sample_num(sample_num: i64) -> Result<usize> {
    if sample_num <= 0 {
        return Err(GraphError::Configuration(format!(
            "sample_num must be positive, got {}",
            sample_num
        )));
    }
    usize::try_from(sample_num).map_err(|_| {
        GraphError::Configuration(format!("sample_num {} does not fit in memory", sample_num))
    })
}

#[cfg(test)]
mod graph_test {
    use super::*;

    #[test]
    fn should_reject_non_positive_sample_num() {
        assert!(matches!(
            validate_sample_num(0),
            Err(GraphError::Configuration(_))
        ));
        assert!(matches!(
            validate_sample_num(-3),
            Err(GraphError::Configuration(_))
        ));
        assert_eq!(12, validate_sample_num(12).unwrap());
    }

    #[test]
    fn should_iterate_edges_in_node_order() {
        let graph = GlobalGraph {
            adjacency: vec![vec![], vec![2, 3], vec![1]],
            weights: vec![vec![], vec![4, 1], vec![4]],
        };
        let edges: Vec<_> = graph.edges().collect();
        assert_eq!(vec![(1, 2, 4), (1, 3, 1), (2, 1, 4)], edges);
        assert_eq!(3, graph.qty_edges());
        assert!(graph.neighbors(7).is_empty());
    }
}
