//! Core resolution domain for Planweave.
//!
//! This crate contains every domain concept, newtype identifier, shared value
//! type, and cross-cutting error type used throughout the plan/filter
//! resolution protocol. Infrastructure crates implement the traits defined
//! here; they never add domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype domain identifiers (`NodeId`, `CreatorName`, etc.) |
//! | [`types`] | Shared value types (`DependencySet`, `CreatorResponse`, `ExecutionPlan`, etc.) |
//! | [`errors`] | Resolution and creator-client error taxonomies |
//! | [`client`] | The [`CreatorClient`] port trait implemented by transport adapters |

pub mod client;
pub mod errors;
pub mod identifiers;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use client::CreatorClient;
pub use errors::{CreatorError, ResolutionError};
pub use identifiers::{CreatorName, NodeId, NodeTypeName, ResolutionRunId, TypeCategory};
pub use types::{
    CreatorAdvertisement, CreatorRequest, CreatorResponse, DependencySet, ExecutionPlan,
    FilterMap, Fragments, PlanNode, SupportedTypes, Timestamp,
};
