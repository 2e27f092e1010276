use tracing::debug;

use crate::error::{GraphError, Result};
use crate::graph::{ItemId, Session};

/// Turns the flattened supervised split back into full sessions.
///
/// Every prefix gets its next-item label appended. Empty prefixes are dropped rather than
/// turned into single-item sessions. Fails if the two sides differ in length or if no
/// session survives.
pub fn rebuild_sessions(prefixes: &[Session], labels: &[ItemId]) -> Result<Vec<Session>> {
    if prefixes.len() != labels.len() {
        return Err(GraphError::InvalidInput(format!(
            "mismatch between number of sequences ({}) and labels ({})",
            prefixes.len(),
            labels.len()
        )));
    }

    let sessions: Vec<Session> = prefixes
        .iter()
        .zip(labels.iter())
        .filter(|(prefix, _label)| !prefix.is_empty())
        .map(|(prefix, label)| {
            let mut session = Vec::with_capacity(prefix.len() + 1);
            session.extend_from_slice(prefix);
            session.push(*label);
            session
        })
        .collect();

    debug!(
        qty_prefixes = prefixes.len(),
        qty_sessions = sessions.len(),
        "rebuilt sessions from train split"
    );

    if sessions.is_empty() {
        return Err(GraphError::InvalidInput(
            "no sessions were rebuilt; check the train file format".to_string(),
        ));
    }
    Ok(sessions)
}

#[cfg(test)]
mod sessions_test {
    use super::*;

    #[test]
    fn should_append_labels_to_prefixes() {
        let prefixes = vec![vec![1, 2], vec![3]];
        let labels = vec![4, 5];
        let sessions = rebuild_sessions(&prefixes, &labels).unwrap();
        assert_eq!(vec![vec![1, 2, 4], vec![3, 5]], sessions);
    }

    #[test]
    fn should_drop_empty_prefixes() {
        let prefixes = vec![vec![], vec![7, 8], vec![]];
        let labels = vec![1, 9, 2];
        let sessions = rebuild_sessions(&prefixes, &labels).unwrap();
        assert_eq!(vec![vec![7, 8, 9]], sessions);
    }

    #[test]
    fn should_fail_on_count_mismatch() {
        let result = rebuild_sessions(&[vec![1]], &[2, 3]);
        assert!(matches!(result, Err(GraphError::InvalidInput(_))));
    }

    #[test]
    fn should_fail_when_nothing_survives() {
        let result = rebuild_sessions(&[vec![], vec![]], &[1, 2]);
        assert!(matches!(result, Err(GraphError::InvalidInput(_))));
        assert!(matches!(
            rebuild_sessions(&[], &[]),
            Err(GraphError::InvalidInput(_))
        ));
    }
}
