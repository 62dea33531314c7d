//! Post-loop validation.
//!
//! After the convergence loop ends, the validator asserts global convergence:
//! the dependency set must be empty, and plan resolution must additionally
//! have produced a starting node. On success it assembles the final output.

use resolution::{ExecutionPlan, FilterMap, ResolutionError, Timestamp};

use crate::state::{OutputAccumulator, ResolutionState};

/// Validates plan-resolution state and assembles the execution plan.
pub(crate) fn validate_plan(state: ResolutionState) -> Result<ExecutionPlan, ResolutionError> {
    ensure_converged(&state)?;
    match state.output {
        OutputAccumulator::Plan {
            nodes,
            starting_node_id,
        } => {
            let starting_node_id = starting_node_id.ok_or(ResolutionError::NoStartingNode)?;
            Ok(ExecutionPlan {
                run_id: state.run_id,
                starting_node_id,
                nodes,
                created_at: Timestamp::now(),
            })
        }
        OutputAccumulator::Filters(_) => {
            unreachable!("plan resolution always carries a plan accumulator")
        }
    }
}

/// Validates filter-resolution state and returns the per-creator filter map.
///
/// Filters have no notion of an entry point, so only convergence is checked.
pub(crate) fn validate_filters(state: ResolutionState) -> Result<FilterMap, ResolutionError> {
    ensure_converged(&state)?;
    match state.output {
        OutputAccumulator::Filters(filters) => Ok(filters),
        OutputAccumulator::Plan { .. } => {
            unreachable!("filter resolution always carries a filter accumulator")
        }
    }
}

fn ensure_converged(state: &ResolutionState) -> Result<(), ResolutionError> {
    if state.dependency_set.is_empty() {
        Ok(())
    } else {
        Err(ResolutionError::UnresolvedDependencies {
            node_ids: state.dependency_set.ids(),
        })
    }
}
