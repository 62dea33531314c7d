//! Planweave resolution engine.
//!
//! Turns one tree-structured pipeline document into either a fully resolved
//! execution plan or a set of per-creator filter summaries by iteratively
//! delegating unresolved subtrees to a federation of independently owned
//! creator services, each understanding only a subset of node types.
//!
//! ## Architectural Layer
//!
//! **Orchestration.** This crate sequences calls between the domain types in
//! [`resolution`] and whatever transport implements
//! [`resolution::CreatorClient`]. It owns no transport and no domain rules of
//! its own.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`document`] | Node-id injection and pipeline-root extraction |
//! | [`registry`] | Per-request creator registry snapshot |
//! | [`fanout`] | Concurrent dispatch of one iteration to all creators |
//! | [`merge`] | Commutative merge of one iteration's responses |
//! | [`state`] | The owned per-request [`ResolutionState`] |
//! | [`convergence`] | The bounded fan-out/merge loop |
//! | [`validate`] | Post-loop convergence checks and output assembly |
//! | [`config`] | Timeouts and per-variant iteration caps |
//!
//! Control flow: preprocess → extract root → seed dependency set →
//! convergence loop (fan-out ⇄ merge) → validate → plan or filter map.

pub mod config;
pub mod convergence;
pub mod document;
pub mod fanout;
pub mod merge;
pub mod registry;
pub mod resolve;
pub mod state;
pub mod validate;

// Re-export the public surface at the crate root.
pub use config::{
    EngineConfig, DEFAULT_FANOUT_TIMEOUT, DEFAULT_FILTER_MAX_DEPTH, DEFAULT_PLAN_MAX_DEPTH,
};
pub use document::{extract_root, inject_node_ids, NODE_ID_KEY, ROOT_KEY};
pub use fanout::dispatch;
pub use merge::{merge, MergeAccumulator};
pub use registry::{build_registry, CreatorDescriptor, CreatorRegistry};
pub use resolve::{create_execution_plan, create_filters, Advertisements, CreatorClients};
pub use state::{LoopState, ResolutionState};
