//! Response merging.
//!
//! Combines all per-creator responses from one fan-out iteration into a
//! single [`MergeAccumulator`]. The reduce is commutative and associative:
//! responses are unioned into ordered maps, resolved wins over unresolved
//! within the same pass, and the two defect cases — two creators claiming the
//! same node id as resolved, or two responses carrying different content for
//! the same node id — are hard errors rather than order-dependent
//! last-write-wins.

use std::collections::BTreeMap;

use resolution::{
    CreatorName, CreatorResponse, FilterMap, Fragments, NodeId, PlanNode, ResolutionError,
};
use serde_json::Value;
use tracing::warn;

/// The combined outcome of one fan-out iteration, across all creators.
#[derive(Debug, Default)]
pub struct MergeAccumulator {
    /// Node ids newly classified this iteration, with their content.
    pub resolved: BTreeMap<NodeId, Value>,

    /// Node ids still awaiting classification after this iteration,
    /// including newly discovered children of freshly resolved nodes.
    pub unresolved: BTreeMap<NodeId, Value>,

    /// Plan nodes produced this iteration, in creator-name order.
    pub plan_fragments: Vec<PlanNode>,

    /// Filter text produced this iteration, one entry per contributing creator.
    pub filters: FilterMap,

    /// Which creator resolved each node id; kept for conflict diagnostics.
    resolved_by: BTreeMap<NodeId, CreatorName>,
}

/// Merges the successful responses of one iteration.
///
/// `responses` must hold at most one entry per creator (the fan-out
/// coordinator guarantees this). Arrival order does not affect the merged
/// maps; callers pass responses sorted by creator name so that the plan
/// fragment *sequence* is deterministic as well.
pub fn merge(
    responses: Vec<(CreatorName, CreatorResponse)>,
) -> Result<MergeAccumulator, ResolutionError> {
    let mut resolved: BTreeMap<NodeId, Value> = BTreeMap::new();
    let mut resolved_by: BTreeMap<NodeId, CreatorName> = BTreeMap::new();
    let mut unresolved: BTreeMap<NodeId, Value> = BTreeMap::new();
    let mut plan_fragments: Vec<PlanNode> = Vec::new();
    let mut filters = FilterMap::new();

    for (creator, response) in responses {
        for (node_id, content) in response.resolved {
            if let Some(first) = resolved_by.get(&node_id) {
                // Overlapping ownership of a node type means the federation
                // is misconfigured; an arbitrary winner must not be picked.
                return Err(ResolutionError::ConflictingResolution {
                    node_id,
                    first: first.clone(),
                    second: creator.clone(),
                });
            }
            resolved_by.insert(node_id.clone(), creator.clone());
            resolved.insert(node_id, content);
        }

        for (node_id, content) in response.still_unresolved {
            if resolved_by.get(&node_id) == Some(&creator) {
                warn!(
                    creator = %creator,
                    node_id = %node_id,
                    "creator reported a node id as both resolved and unresolved; resolved wins"
                );
                continue;
            }
            match unresolved.get(&node_id) {
                Some(existing) if *existing != content => {
                    return Err(ResolutionError::DependencyContentChanged { node_id });
                }
                _ => {
                    unresolved.insert(node_id, content);
                }
            }
        }

        match response.fragments {
            Fragments::Plan(nodes) => plan_fragments.extend(nodes),
            Fragments::Filter(text) if !text.is_empty() => {
                filters.insert(creator, text);
            }
            Fragments::Filter(_) => {}
        }
    }

    // Resolved wins over unresolved within the same merge pass, but only
    // when both copies carry the same content; a divergent copy must not be
    // discarded silently.
    for (node_id, content) in &unresolved {
        if let Some(resolved_content) = resolved.get(node_id) {
            if resolved_content != content {
                return Err(ResolutionError::DependencyContentChanged {
                    node_id: node_id.clone(),
                });
            }
        }
    }
    unresolved.retain(|node_id, _| !resolved.contains_key(node_id));

    Ok(MergeAccumulator {
        resolved,
        unresolved,
        plan_fragments,
        filters,
        resolved_by,
    })
}

impl MergeAccumulator {
    /// Returns the creator that resolved `node_id` this iteration, if any.
    pub fn resolved_by(&self, node_id: &NodeId) -> Option<&CreatorName> {
        self.resolved_by.get(node_id)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn node(id: &str) -> NodeId {
        NodeId::new(id).unwrap()
    }

    fn creator(name: &str) -> CreatorName {
        CreatorName::new(name).unwrap()
    }

    fn response(
        resolved: &[(&str, Value)],
        still_unresolved: &[(&str, Value)],
    ) -> CreatorResponse {
        CreatorResponse {
            resolved: resolved
                .iter()
                .map(|(id, content)| (node(id), content.clone()))
                .collect(),
            still_unresolved: still_unresolved
                .iter()
                .map(|(id, content)| (node(id), content.clone()))
                .collect(),
            fragments: Fragments::default(),
        }
    }

    #[test]
    fn merge_is_commutative_for_disjoint_resolutions() {
        let a = (creator("ci"), response(&[("n1", json!(1))], &[("n3", json!(3))]));
        let b = (creator("cd"), response(&[("n2", json!(2))], &[]));

        let forward = merge(vec![a.clone(), b.clone()]).unwrap();
        let backward = merge(vec![b, a]).unwrap();

        assert_eq!(forward.resolved, backward.resolved);
        assert_eq!(forward.unresolved, backward.unresolved);
    }

    #[test]
    fn resolved_wins_over_unresolved_across_creators() {
        let a = (creator("ci"), response(&[("n1", json!(1))], &[]));
        let b = (creator("cd"), response(&[], &[("n1", json!(1))]));

        let merged = merge(vec![a, b]).unwrap();
        assert!(merged.resolved.contains_key(&node("n1")));
        assert!(merged.unresolved.is_empty());
    }

    #[test]
    fn double_resolution_is_a_conflict() {
        let a = (creator("ci"), response(&[("n1", json!(1))], &[]));
        let b = (creator("cd"), response(&[("n1", json!(1))], &[]));

        let err = merge(vec![a, b]).unwrap_err();
        assert!(matches!(
            err,
            ResolutionError::ConflictingResolution { node_id, .. } if node_id == node("n1")
        ));
    }

    #[test]
    fn diverging_unresolved_content_is_rejected() {
        let a = (creator("ci"), response(&[], &[("n1", json!({"v": 1}))]));
        let b = (creator("cd"), response(&[], &[("n1", json!({"v": 2}))]));

        let err = merge(vec![a, b]).unwrap_err();
        assert!(matches!(
            err,
            ResolutionError::DependencyContentChanged { node_id } if node_id == node("n1")
        ));
    }

    #[test]
    fn divergent_unresolved_copy_of_a_resolved_id_is_rejected() {
        let a = (creator("ci"), response(&[("n1", json!({"v": 1}))], &[]));
        let b = (creator("cd"), response(&[], &[("n1", json!({"v": 2}))]));

        let err = merge(vec![a, b]).unwrap_err();
        assert!(matches!(
            err,
            ResolutionError::DependencyContentChanged { node_id } if node_id == node("n1")
        ));
    }

    #[test]
    fn empty_filter_contributions_are_dropped() {
        let mut with_filter = response(&[], &[]);
        with_filter.fragments = Fragments::Filter("stage:ci".into());
        let mut empty_filter = response(&[], &[]);
        empty_filter.fragments = Fragments::Filter(String::new());

        let merged = merge(vec![
            (creator("ci"), with_filter),
            (creator("cd"), empty_filter),
        ])
        .unwrap();

        assert_eq!(merged.filters.len(), 1);
        assert_eq!(merged.filters.get(&creator("ci")).map(String::as_str), Some("stage:ci"));
    }
}
