//! Fan-out coordination.
//!
//! One iteration dispatches the *entire current* dependency set to *every*
//! registered creator concurrently — never a partition; each creator
//! independently decides which fragments it can classify. The gather waits
//! for all tasks or for the configured wall-clock timeout, whichever comes
//! first. There is no active cancellation when the timeout fires: the gather
//! simply stops waiting, and an abandoned call may still complete on the
//! creator's side with no effect here.

use std::sync::Arc;
use std::time::Duration;

use resolution::{CreatorError, CreatorName, CreatorRequest, CreatorResponse, DependencySet};
use tokio::task::JoinSet;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, warn};

use crate::registry::CreatorRegistry;

/// Dispatches one iteration's dependency set to every registered creator.
///
/// Returns one entry per creator that answered before the timeout, sorted by
/// creator name so downstream merging is deterministic. Failed calls are
/// returned as `Err` entries; the convergence loop applies the per-variant
/// failure policy. Creators that did not answer in time contribute nothing
/// and are retried naturally on the next iteration, since their unresolved
/// fragments remain in the dependency set.
pub async fn dispatch(
    dependencies: &DependencySet,
    registry: &CreatorRegistry,
    timeout: Duration,
) -> Vec<(CreatorName, Result<CreatorResponse, CreatorError>)> {
    let mut tasks: JoinSet<(CreatorName, Result<CreatorResponse, CreatorError>)> = JoinSet::new();
    for descriptor in registry.values() {
        let client = Arc::clone(&descriptor.client);
        let name = descriptor.name.clone();
        let request = CreatorRequest {
            dependencies: dependencies.clone(),
        };
        debug!(creator = %name, fragments = request.dependencies.len(), "dispatching resolve call");
        tasks.spawn(async move { (name, client.resolve(request).await) });
    }

    let deadline = Instant::now() + timeout;
    let mut results = Vec::with_capacity(registry.len());
    loop {
        match timeout_at(deadline, tasks.join_next()).await {
            Ok(Some(Ok(entry))) => results.push(entry),
            Ok(Some(Err(join_error))) => {
                // Resolve tasks return Result rather than panicking; a join
                // failure is logged and the creator contributes nothing.
                warn!(error = %join_error, "resolve task aborted; contribution dropped");
            }
            Ok(None) => break,
            Err(_) => {
                warn!(
                    answered = results.len(),
                    registered = registry.len(),
                    "fan-out timeout elapsed; proceeding with completed responses"
                );
                break;
            }
        }
    }

    results.sort_by(|(a, _), (b, _)| a.cmp(b));
    results
}
