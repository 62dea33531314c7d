//! Per-request resolution state.
//!
//! One [`ResolutionState`] is created fresh per inbound request, owned
//! exclusively by the convergence loop driving that request, and discarded
//! once the validator returns or raises. Each iteration consumes the state
//! and produces the next one; nothing is shared across requests or mutated
//! concurrently.

use std::collections::BTreeMap;

use resolution::{
    DependencySet, FilterMap, NodeId, PlanNode, ResolutionError, ResolutionRunId,
};
use serde_json::Value;

use crate::merge::MergeAccumulator;

/// Where the convergence loop currently stands.
///
/// A fatal error (creator failure under the plan variant, conflicting
/// resolution, content divergence) ends the request by returning the error
/// itself; no state survives to report a failed transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Initial: the dependency set is seeded, no fan-out has run yet.
    Collecting,
    /// At least one fan-out/merge round has started.
    Iterating,
    /// The dependency set drained; every node is classified.
    Converged,
    /// The iteration cap was reached (or no creators were registered) with
    /// fragments still unresolved.
    DepthExceeded,
}

/// Accumulated output, shaped by the resolution variant.
#[derive(Debug)]
pub(crate) enum OutputAccumulator {
    /// Plan resolution: collected plan nodes and the starting node, once one
    /// is produced.
    Plan {
        nodes: Vec<PlanNode>,
        starting_node_id: Option<NodeId>,
    },
    /// Filter resolution: one filter string per contributing creator.
    Filters(FilterMap),
}

/// The working state of one resolution request.
#[derive(Debug)]
pub struct ResolutionState {
    /// Correlates all activity belonging to this request.
    pub run_id: ResolutionRunId,

    /// Fragments still awaiting classification.
    pub dependency_set: DependencySet,

    /// Every node id classified so far, with the content it was classified
    /// with. Grows monotonically; an entry is never mutated once added.
    pub resolved_so_far: BTreeMap<NodeId, Value>,

    /// Fan-out/merge rounds completed so far.
    pub iterations_used: u32,

    /// Loop progress, for logging and inspection.
    pub loop_state: LoopState,

    pub(crate) output: OutputAccumulator,
}

impl ResolutionState {
    /// Seeds plan-resolution state with the extracted root fragment.
    pub(crate) fn for_plan(run_id: ResolutionRunId, root_id: NodeId, root_content: Value) -> Self {
        Self::seeded(
            run_id,
            root_id,
            root_content,
            OutputAccumulator::Plan {
                nodes: Vec::new(),
                starting_node_id: None,
            },
        )
    }

    /// Seeds filter-resolution state with the extracted root fragment.
    pub(crate) fn for_filters(
        run_id: ResolutionRunId,
        root_id: NodeId,
        root_content: Value,
    ) -> Self {
        Self::seeded(
            run_id,
            root_id,
            root_content,
            OutputAccumulator::Filters(FilterMap::new()),
        )
    }

    fn seeded(
        run_id: ResolutionRunId,
        root_id: NodeId,
        root_content: Value,
        output: OutputAccumulator,
    ) -> Self {
        let mut dependency_set = DependencySet::new();
        dependency_set.insert(root_id, root_content);
        Self {
            run_id,
            dependency_set,
            resolved_so_far: BTreeMap::new(),
            iterations_used: 0,
            loop_state: LoopState::Collecting,
            output,
        }
    }

    /// Applies one iteration's merged outcome, producing the next state.
    ///
    /// Resolved ids leave the dependency set permanently and join
    /// `resolved_so_far`; unresolved ids stay (or, for newly discovered
    /// children, enter) the dependency set for the next iteration. A node id
    /// whose content differs from what was first observed for it is a defect
    /// and aborts the request.
    pub(crate) fn apply(
        mut self,
        accumulator: MergeAccumulator,
    ) -> Result<Self, ResolutionError> {
        for (node_id, content) in accumulator.resolved.iter().chain(accumulator.unresolved.iter())
        {
            let first_observed = self
                .dependency_set
                .get(node_id)
                .or_else(|| self.resolved_so_far.get(node_id));
            if let Some(observed) = first_observed {
                if observed != content {
                    return Err(ResolutionError::DependencyContentChanged {
                        node_id: node_id.clone(),
                    });
                }
            }
        }

        for (node_id, content) in accumulator.resolved {
            self.dependency_set.remove(&node_id);
            self.resolved_so_far.entry(node_id).or_insert(content);
        }

        for (node_id, content) in accumulator.unresolved {
            if !self.resolved_so_far.contains_key(&node_id) {
                self.dependency_set.insert(node_id, content);
            }
        }

        match &mut self.output {
            OutputAccumulator::Plan {
                nodes,
                starting_node_id,
            } => {
                for fragment in accumulator.plan_fragments {
                    if fragment.starting && starting_node_id.is_none() {
                        *starting_node_id = Some(fragment.node_id.clone());
                    }
                    nodes.push(fragment);
                }
            }
            OutputAccumulator::Filters(filters) => {
                for (creator, text) in accumulator.filters {
                    filters.insert(creator, text);
                }
            }
        }

        self.iterations_used += 1;
        Ok(self)
    }
}
