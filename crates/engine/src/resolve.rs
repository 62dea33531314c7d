//! Public entry points.
//!
//! Both variants share the same shape: preprocess, extract the root, seed the
//! dependency set, build the registry snapshot, run the convergence loop,
//! validate. Everything — state, registry, fan-out tasks — is scoped to the
//! one request and dropped when it returns.

use std::collections::BTreeMap;
use std::sync::Arc;

use resolution::{
    CreatorAdvertisement, CreatorClient, CreatorName, ExecutionPlan, FilterMap, ResolutionError,
    ResolutionRunId,
};
use tracing::Instrument;

use crate::config::EngineConfig;
use crate::convergence::{run_to_convergence, Variant};
use crate::document::{extract_root, inject_node_ids};
use crate::registry::build_registry;
use crate::state::ResolutionState;
use crate::validate::{validate_filters, validate_plan};

/// The live-client map: one RPC handle per reachable creator.
pub type CreatorClients = BTreeMap<CreatorName, Arc<dyn CreatorClient>>;

/// The polled advertisement table: one support declaration per known creator.
pub type Advertisements = BTreeMap<CreatorName, CreatorAdvertisement>;

/// Resolves a raw pipeline document into a full execution plan.
///
/// Any single creator failure aborts the whole request with
/// [`ResolutionError::UnexpectedResolutionFailure`]; no partial plan is ever
/// returned.
pub async fn create_execution_plan(
    raw_document: &str,
    advertisements: &Advertisements,
    clients: &CreatorClients,
    config: &EngineConfig,
) -> Result<ExecutionPlan, ResolutionError> {
    let run_id = ResolutionRunId::new_random();
    let span = tracing::info_span!("create_execution_plan", run_id = %run_id);
    async {
        let document = inject_node_ids(raw_document)?;
        let (root_id, root_content) = extract_root(&document)?;
        let registry = build_registry(advertisements, clients);
        let state = ResolutionState::for_plan(run_id, root_id, root_content);
        let state = run_to_convergence(state, &registry, Variant::Plan, config).await?;
        validate_plan(state)
    }
    .instrument(span)
    .await
}

/// Resolves a raw pipeline document into per-creator filter summaries.
///
/// Filter summaries are best-effort per creator: a failing creator's
/// contribution is logged and skipped, and one creator's outage never blocks
/// the others.
pub async fn create_filters(
    raw_document: &str,
    advertisements: &Advertisements,
    clients: &CreatorClients,
    config: &EngineConfig,
) -> Result<FilterMap, ResolutionError> {
    let run_id = ResolutionRunId::new_random();
    let span = tracing::info_span!("create_filters", run_id = %run_id);
    async {
        let document = inject_node_ids(raw_document)?;
        let (root_id, root_content) = extract_root(&document)?;
        let registry = build_registry(advertisements, clients);
        let state = ResolutionState::for_filters(run_id, root_id, root_content);
        let state = run_to_convergence(state, &registry, Variant::Filter, config).await?;
        validate_filters(state)
    }
    .instrument(span)
    .await
}
