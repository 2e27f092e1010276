use crate::error::{GraphError, Result};
use crate::graph::{ItemId, Session};

/// Size of the node id space for `sessions`: the largest item id plus one, so the
/// largest id can index node arrays directly. Ids do not need to be contiguous.
pub fn infer_num_nodes(sessions: &[Session]) -> Result<usize> {
    let max_item_id: ItemId = sessions
        .iter()
        .flat_map(|session| session.iter().copied())
        .max()
        .unwrap_or(0);

    if max_item_id <= 0 {
        return Err(GraphError::InvalidInput(
            "could not infer a positive item id from the sessions".to_string(),
        ));
    }

    usize::try_from(max_item_id)
        .ok()
        .and_then(|max_item_id| max_item_id.checked_add(1))
        .ok_or_else(|| {
            GraphError::InvalidInput(format!(
                "item id {} is too large to index a node array",
                max_item_id
            ))
        })
}

#[cfg(test)]
mod node_space_test {
    use super::*;

    #[test]
    fn should_allocate_one_slot_past_the_largest_id() {
        let sessions = vec![vec![3, 1], vec![7], vec![2, 5, 2]];
        assert_eq!(8, infer_num_nodes(&sessions).unwrap());
    }

    #[test]
    fn should_tolerate_gaps_and_padding() {
        let sessions = vec![vec![0, 0, 40], vec![-1, 2]];
        assert_eq!(41, infer_num_nodes(&sessions).unwrap());
    }

    #[test]
    fn should_fail_on_empty_corpus() {
        let sessions: Vec<Session> = vec![];
        assert!(matches!(
            infer_num_nodes(&sessions),
            Err(GraphError::InvalidInput(_))
        ));
        assert!(matches!(
            infer_num_nodes(&[vec![], vec![]]),
            Err(GraphError::InvalidInput(_))
        ));
    }

    #[test]
    fn should_fail_when_only_padding_is_present() {
        let sessions = vec![vec![0, 0], vec![-4]];
        assert!(matches!(
            infer_num_nodes(&sessions),
            Err(GraphError::InvalidInput(_))
        ));
    }
}
