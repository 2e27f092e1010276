use hashbrown::hash_map::Entry;
use hashbrown::HashMap;
use indicatif::ProgressBar;
use rayon::prelude::*;
use tracing::debug;

use crate::error::{GraphError, Result};
use crate::graph::{GlobalGraph, ItemId, Session, Weight};

/// Positional distances at which two items of one session count as co-occurring,
/// in the order they are scanned.
pub const HOPS: [usize; 3] = [1, 2, 3];

/// Co-occurrence counts of one node, keyed by neighbor and kept in first-insertion order.
#[derive(Default, Debug, Clone)]
pub(crate) struct NeighborCounts {
    positions: HashMap<ItemId, usize>,
    counts: Vec<(ItemId, Weight)>,
}

impl NeighborCounts {
    fn increment(&mut self, neighbor: ItemId) {
        match self.positions.entry(neighbor) {
            Entry::Occupied(position) => self.counts[*position.get()].1 += 1,
            Entry::Vacant(position) => {
                position.insert(self.counts.len());
                self.counts.push((neighbor, 1));
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn count(&self, neighbor: ItemId) -> Weight {
        self.positions
            .get(&neighbor)
            .map(|position| self.counts[*position].1)
            .unwrap_or(0)
    }

    pub(crate) fn len(&self) -> usize {
        self.counts.len()
    }

    #[cfg(test)]
    pub(crate) fn iter(&self) -> impl Iterator<Item = &(ItemId, Weight)> {
        self.counts.iter()
    }

    /// Highest counts first, at most `sample_num` of them. `sort_by` is stable, so equal
    /// counts keep the order in which the neighbors were first seen.
    fn into_ranked(self, sample_num: usize) -> (Vec<ItemId>, Vec<Weight>) {
        let mut counts = self.counts;
        counts.sort_by(|(_, count_a), (_, count_b)| count_b.cmp(count_a));
        counts.truncate(sample_num);
        counts.into_iter().unzip()
    }
}

/// Builds the global co-occurrence graph over a fixed node space.
pub struct GraphBuilder {
    num_nodes: usize,
    sample_num: usize,
    show_progress: bool,
}

impl GraphBuilder {
    pub fn new(num_nodes: usize, sample_num: usize) -> Result<Self> {
        if sample_num == 0 {
            return Err(GraphError::Configuration(
                "sample_num must be positive, got 0".to_string(),
            ));
        }
        Ok(GraphBuilder {
            num_nodes,
            sample_num,
            show_progress: false,
        })
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn build(&self, sessions: &[Session]) -> Result<GlobalGraph> {
        let accumulators = self.accumulate(sessions)?;
        let sample_num = self.sample_num;
        let qty_pairs: usize = accumulators.iter().map(NeighborCounts::len).sum();
        debug!(qty_pairs, "accumulated co-occurrence counts");

        // Nodes are independent once accumulation is done; indexed collection keeps node order.
        let (adjacency, weights): (Vec<Vec<ItemId>>, Vec<Vec<Weight>>) = accumulators
            .into_par_iter()
            .map(|neighbors| neighbors.into_ranked(sample_num))
            .unzip();

        let graph = GlobalGraph { adjacency, weights };
        debug!(
            num_nodes = graph.num_nodes(),
            qty_edges = graph.qty_edges(),
            sample_num,
            "ranked and truncated neighbor lists"
        );
        Ok(graph)
    }

    /// Single ordered pass over all sessions. The order in which pairs are visited here
    /// decides tie-breaks during ranking, so this must stay sequential.
    pub(crate) fn accumulate(&self, sessions: &[Session]) -> Result<Vec<NeighborCounts>> {
        let mut accumulators = vec![NeighborCounts::default(); self.num_nodes];

        let progress_bar = if self.show_progress {
            ProgressBar::new(sessions.len() as u64)
        } else {
            ProgressBar::hidden()
        };

        for session in sessions {
            progress_bar.inc(1);
            for hop in HOPS {
                // Longer hops cannot fit either once one hop does not.
                if session.len() <= hop {
                    break;
                }
                for (src, dst) in session.iter().zip(&session[hop..]) {
                    if *src <= 0 || *dst <= 0 {
                        continue;
                    }
                    let src_slot = self.slot(*src)?;
                    let dst_slot = self.slot(*dst)?;
                    accumulators[src_slot].increment(*dst);
                    accumulators[dst_slot].increment(*src);
                }
            }
        }
        progress_bar.finish_and_clear();

        Ok(accumulators)
    }

    fn slot(&self, item: ItemId) -> Result<usize> {
        usize::try_from(item)
            .ok()
            .filter(|slot| *slot < self.num_nodes)
            .ok_or_else(|| {
                GraphError::InvalidInput(format!(
                    "item id {} lies outside the node space of size {}",
                    item, self.num_nodes
                ))
            })
    }
}

/// Builds the capped graph for `sessions` without progress reporting.
pub fn build_global_graph(
    sessions: &[Session],
    num_nodes: usize,
    sample_num: usize,
) -> Result<GlobalGraph> {
    GraphBuilder::new(num_nodes, sample_num)?.build(sessions)
}
