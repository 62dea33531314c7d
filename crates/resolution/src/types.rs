//! Shared value types for the resolution domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! structured values that participate in the resolution protocol: the working
//! set of unresolved dependencies, the per-iteration creator responses, and
//! the two possible final outputs (an execution plan or per-creator filters).

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{CreatorName, NodeId, NodeTypeName, ResolutionRunId, TypeCategory};

// ---------------------------------------------------------------------------
// Dependency set
// ---------------------------------------------------------------------------

/// The mutable working set of node-id → content pairs still awaiting
/// classification by some creator.
///
/// Backed by an ordered map so that iteration order — and therefore every
/// serialised request body — is deterministic for a given set of entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencySet(BTreeMap<NodeId, Value>);

impl DependencySet {
    /// Creates an empty dependency set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a fragment, returning the previously stored content if the
    /// node id was already present.
    pub fn insert(&mut self, node_id: NodeId, content: Value) -> Option<Value> {
        self.0.insert(node_id, content)
    }

    /// Removes a fragment by node id, returning its content if present.
    pub fn remove(&mut self, node_id: &NodeId) -> Option<Value> {
        self.0.remove(node_id)
    }

    /// Returns the content stored for `node_id`, if any.
    pub fn get(&self, node_id: &NodeId) -> Option<&Value> {
        self.0.get(node_id)
    }

    /// Returns `true` if `node_id` is in the set.
    pub fn contains(&self, node_id: &NodeId) -> bool {
        self.0.contains_key(node_id)
    }

    /// Returns the node ids currently in the set, in sorted order.
    pub fn ids(&self) -> Vec<NodeId> {
        self.0.keys().cloned().collect()
    }

    /// Iterates over the fragments in sorted node-id order.
    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &Value)> {
        self.0.iter()
    }

    /// Returns the number of fragments in the set.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no fragments remain.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(NodeId, Value)> for DependencySet {
    fn from_iter<I: IntoIterator<Item = (NodeId, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ---------------------------------------------------------------------------
// Creator advertisement
// ---------------------------------------------------------------------------

/// The node types a creator claims to understand, keyed by category.
pub type SupportedTypes = BTreeMap<TypeCategory, BTreeSet<NodeTypeName>>;

/// One entry of the globally advertised "which types does each creator
/// support" table.
///
/// Advertisements are polled independently of resolution; the registry
/// intersects this table with the live-client map, so a stale advertisement
/// for an unreachable creator simply never receives fan-out calls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreatorAdvertisement {
    /// Supported node type names, keyed by category.
    #[serde(rename = "supportedTypes")]
    pub supported_types: SupportedTypes,
}

// ---------------------------------------------------------------------------
// Wire envelope: request
// ---------------------------------------------------------------------------

/// The request sent to every registered creator in one fan-out iteration.
///
/// Always carries the *full* current dependency set, never a partition: each
/// creator independently decides which fragments, if any, it can classify.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatorRequest {
    /// Every fragment still awaiting classification.
    pub dependencies: DependencySet,
}

// ---------------------------------------------------------------------------
// Wire envelope: response
// ---------------------------------------------------------------------------

/// The output portion of a creator's response.
///
/// Plan resolution accumulates plan nodes; filter resolution accumulates one
/// opaque filter string per creator. The wire representation is untagged: a
/// JSON array is a plan fragment list, a JSON string is a filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Fragments {
    /// Plan nodes produced by classifying one or more dependencies.
    Plan(Vec<PlanNode>),
    /// An opaque filter summary for the responding creator.
    Filter(String),
}

impl Fragments {
    /// Returns `true` if this value carries no plan nodes and no filter text.
    pub fn is_empty(&self) -> bool {
        match self {
            Fragments::Plan(nodes) => nodes.is_empty(),
            Fragments::Filter(text) => text.is_empty(),
        }
    }
}

impl Default for Fragments {
    fn default() -> Self {
        Fragments::Plan(Vec::new())
    }
}

/// One creator's response for one fan-out iteration.
///
/// Every node id the creator was sent must end up in exactly one of
/// `resolved` or `still_unresolved`; ids the creator does not mention simply
/// remain in the coordinator's dependency set. `still_unresolved` may also
/// carry *new* node ids discovered while classifying a fragment (resolving
/// one layer of a subtree can expose deeper, still-unclassified subtrees).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreatorResponse {
    /// Node ids this creator classified, with the content it classified.
    #[serde(rename = "resolvedDependencies", default)]
    pub resolved: BTreeMap<NodeId, Value>,

    /// Node ids still awaiting classification, including newly discovered
    /// children of freshly resolved nodes.
    #[serde(rename = "dependencies", default)]
    pub still_unresolved: BTreeMap<NodeId, Value>,

    /// Plan fragments or filter text produced this iteration.
    #[serde(rename = "outputFragments", default)]
    pub fragments: Fragments,
}

// ---------------------------------------------------------------------------
// Plan output
// ---------------------------------------------------------------------------

/// A single node of the assembled execution plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanNode {
    /// The document node this plan node was created from.
    pub node_id: NodeId,

    /// Human-readable node name for logs and downstream display.
    pub name: String,

    /// The node type the creator classified this fragment as.
    pub node_type: NodeTypeName,

    /// Whether execution of the plan begins at this node.
    ///
    /// Exactly one accepted plan node must set this for plan resolution to
    /// succeed; its absence after convergence raises `NoStartingNode`.
    #[serde(default)]
    pub starting: bool,

    /// Creator-defined node payload, passed through to the execution engine.
    #[serde(default)]
    pub content: Value,
}

/// The fully resolved execution plan returned by `create_execution_plan`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    /// The resolution request this plan was produced by.
    pub run_id: ResolutionRunId,

    /// The node id execution begins at.
    pub starting_node_id: NodeId,

    /// All plan nodes, in deterministic (creator-name, response) order.
    pub nodes: Vec<PlanNode>,

    /// When resolution completed.
    pub created_at: Timestamp,
}

/// The per-creator filter map returned by `create_filters`.
pub type FilterMap = BTreeMap<CreatorName, String>;

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly; the underlying representation can change without affecting the
/// domain API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a [`Timestamp`] from a [`DateTime<Utc>`].
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
