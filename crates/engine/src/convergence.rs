//! The convergence loop.
//!
//! Repeats fan-out + merge until the dependency set drains or the per-variant
//! iteration cap is reached. The loop itself runs sequentially: one
//! iteration's merge fully completes before the next iteration's fan-out
//! begins. The cap is a hard circuit-breaker, independent of correctness — a
//! document no creator understands must not spin forever.

use resolution::ResolutionError;
use tracing::{debug, info, Instrument};

use crate::config::EngineConfig;
use crate::fanout::dispatch;
use crate::merge::merge;
use crate::registry::CreatorRegistry;
use crate::state::{LoopState, ResolutionState};

/// Which of the two protocol variants a request runs under.
///
/// The variants differ in iteration cap and in failure policy: plan
/// correctness cannot tolerate a silently missing contribution, while filter
/// summaries are best-effort per creator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Variant {
    Plan,
    Filter,
}

impl Variant {
    fn max_depth(self, config: &EngineConfig) -> u32 {
        match self {
            Variant::Plan => config.plan_max_depth,
            Variant::Filter => config.filter_max_depth,
        }
    }

    fn aborts_on_creator_failure(self) -> bool {
        matches!(self, Variant::Plan)
    }
}

/// Drives one request from its seeded state to a terminal loop state.
///
/// Returns the final state for validation; the dependency set may still be
/// non-empty on return (depth exceeded, or no creators registered) — judging
/// that is the validator's job.
pub(crate) async fn run_to_convergence(
    mut state: ResolutionState,
    registry: &CreatorRegistry,
    variant: Variant,
    config: &EngineConfig,
) -> Result<ResolutionState, ResolutionError> {
    if registry.is_empty() {
        debug!(run_id = %state.run_id, "no creators registered; skipping fan-out");
        state.loop_state = LoopState::DepthExceeded;
        return Ok(state);
    }

    let max_depth = variant.max_depth(config);
    state.loop_state = LoopState::Iterating;

    for iteration in 1..=max_depth {
        let span = tracing::info_span!(
            "resolution_iteration",
            run_id = %state.run_id,
            iteration,
            pending = state.dependency_set.len(),
        );
        let results = dispatch(&state.dependency_set, registry, config.fanout_timeout)
            .instrument(span.clone())
            .await;

        let mut responses = Vec::with_capacity(results.len());
        for (creator, result) in results {
            match result {
                Ok(response) => responses.push((creator, response)),
                Err(source) => {
                    if variant.aborts_on_creator_failure() {
                        return Err(ResolutionError::UnexpectedResolutionFailure {
                            creator,
                            source,
                        });
                    }
                    span.in_scope(|| {
                        tracing::warn!(
                            creator = %creator,
                            error = %source,
                            "creator failed; treating as empty contribution"
                        );
                    });
                }
            }
        }

        let accumulator = merge(responses)?;
        state = state.apply(accumulator)?;

        if state.dependency_set.is_empty() {
            state.loop_state = LoopState::Converged;
            info!(
                run_id = %state.run_id,
                iterations = state.iterations_used,
                resolved = state.resolved_so_far.len(),
                "resolution converged"
            );
            return Ok(state);
        }
    }

    state.loop_state = LoopState::DepthExceeded;
    info!(
        run_id = %state.run_id,
        iterations = state.iterations_used,
        pending = state.dependency_set.len(),
        "iteration cap reached with fragments unresolved"
    );
    Ok(state)
}
