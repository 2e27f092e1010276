use hashbrown::HashSet;
use tdigest::TDigest;
use tracing::{info, warn};

use crate::graph::Session;

pub struct CorpusStats {
    pub descriptive_name: String,
    pub qty_sessions: usize,
    pub qty_events: usize,
    pub qty_padding_events: usize,
    pub qty_unique_item_ids: usize,
    pub qty_sessions_without_pairs: usize,
    pub session_length_p50: u64,
    pub session_length_p90: u64,
    pub session_length_p99: u64,
    pub session_length_p100: u64,
}

pub fn determine_corpus_statistics(descriptive_name: &str, sessions: &[Session]) -> CorpusStats {
    let qty_sessions = sessions.len();
    let qty_events: usize = sessions.iter().map(Vec::len).sum();
    let qty_padding_events = sessions
        .iter()
        .flat_map(|session| session.iter())
        .filter(|item_id| **item_id <= 0)
        .count();
    let qty_unique_item_ids = sessions
        .iter()
        .flat_map(|session| session.iter())
        .filter(|item_id| **item_id > 0)
        .collect::<HashSet<_>>()
        .len();
    let qty_sessions_without_pairs = sessions.iter().filter(|session| session.len() < 2).count();

    let session_lengths = sessions
        .iter()
        .map(|session| session.len() as f64)
        .collect::<Vec<_>>();
    let session_length_digest = TDigest::new_with_size(100).merge_unsorted(session_lengths);

    let session_length_p50 = session_length_digest.estimate_quantile(0.50).round() as u64;
    let session_length_p90 = session_length_digest.estimate_quantile(0.90).round() as u64;
    let session_length_p99 = session_length_digest.estimate_quantile(0.99).round() as u64;
    let session_length_p100 = sessions.iter().map(Vec::len).max().unwrap_or(0) as u64;

    let stats = CorpusStats {
        descriptive_name: descriptive_name.to_string(),
        qty_sessions,
        qty_events,
        qty_padding_events,
        qty_unique_item_ids,
        qty_sessions_without_pairs,
        session_length_p50,
        session_length_p90,
        session_length_p99,
        session_length_p100,
    };
    stats.log();
    stats
}

impl CorpusStats {
    fn log(&self) {
        info!(
            corpus = %self.descriptive_name,
            sessions = self.qty_sessions,
            events = self.qty_events,
            items = self.qty_unique_item_ids,
            "loaded corpus"
        );
        info!(
            p50 = self.session_length_p50,
            p90 = self.session_length_p90,
            p99 = self.session_length_p99,
            p100 = self.session_length_p100,
            "session length percentiles"
        );
        if self.qty_sessions_without_pairs > 0 {
            info!(
                qty = self.qty_sessions_without_pairs,
                "sessions too short to contribute edges"
            );
        }
        if self.qty_padding_events > 0 {
            warn!(
                qty = self.qty_padding_events,
                "non-positive item ids are treated as padding"
            );
        }
    }
}

#[cfg(test)]
mod dataframeutils_test {
    use super::*;

    #[test]
    fn should_count_sessions_events_and_items() {
        let sessions = vec![vec![1, 2, 2], vec![0, 3], vec![4], vec![]];
        let stats = determine_corpus_statistics("unit", &sessions);
        assert_eq!(4, stats.qty_sessions);
        assert_eq!(6, stats.qty_events);
        assert_eq!(1, stats.qty_padding_events);
        assert_eq!(4, stats.qty_unique_item_ids);
        assert_eq!(2, stats.qty_sessions_without_pairs);
        assert_eq!(3, stats.session_length_p100);
    }

    #[test]
    fn should_estimate_length_percentiles() {
        let sessions = vec![vec![1, 2]; 10];
        let stats = determine_corpus_statistics("uniform", &sessions);
        assert_eq!(2, stats.session_length_p50);
        assert_eq!(2, stats.session_length_p99);
    }
}
