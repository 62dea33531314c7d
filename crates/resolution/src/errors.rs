//! Error taxonomies for the resolution protocol.
//!
//! [`ResolutionError`] covers conditions that terminate one resolution
//! request; every variant is terminal to the caller — this core performs no
//! retries of its own beyond the natural re-submission of still-unresolved
//! fragments on the next iteration.
//!
//! [`CreatorError`] is the failure type of the [`crate::CreatorClient`] port:
//! transport adapters map their concrete failures (connection loss, bad
//! payloads, service-reported errors) into it, and the fan-out coordinator
//! decides per variant whether such a failure aborts the request (plan) or is
//! logged and absorbed (filter).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{CreatorName, NodeId};

// ---------------------------------------------------------------------------
// Creator-client failures
// ---------------------------------------------------------------------------

/// A failure raised by a creator-client adapter during one resolve call.
///
/// The coordinator never inspects these beyond logging and (for plan
/// resolution) wrapping them into
/// [`ResolutionError::UnexpectedResolutionFailure`]; the distinction between
/// variants exists for diagnostics, not for control flow.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum CreatorError {
    /// The creator could not be reached or the connection broke mid-call.
    #[error("transport failure: {reason}")]
    Transport {
        /// Adapter-specific description of the transport failure.
        reason: String,
    },

    /// The creator answered, but its payload violated the resolve contract
    /// (undecodable body, wrong shape).
    #[error("protocol violation: {reason}")]
    Protocol {
        /// Description of the contract violation.
        reason: String,
    },

    /// The creator answered with an explicit error of its own.
    #[error("creator reported an error: {message}")]
    Service {
        /// The error message reported by the creator.
        message: String,
    },
}

// ---------------------------------------------------------------------------
// Resolution-level errors
// ---------------------------------------------------------------------------

/// Errors that terminate one resolution request.
#[derive(Debug, Error, Serialize, Deserialize)]
pub enum ResolutionError {
    /// The raw document could not be prepared for resolution: it failed to
    /// parse, its top level is not an object, or the expected top-level key
    /// is absent.
    ///
    /// Raised before any fan-out call is made; never retried.
    #[error("Malformed pipeline document: {reason}")]
    MalformedDocument {
        /// Description of what made the document unusable.
        reason: String,
    },

    /// The convergence loop exited — by depth exhaustion or because no
    /// creators were registered — with a non-empty dependency set.
    ///
    /// The node ids are enumerated so the caller can diagnose which subtree
    /// no registered creator claims to understand.
    #[error("Unresolved dependencies after resolution: [{}]", format_node_ids(.node_ids))]
    UnresolvedDependencies {
        /// The node ids left unclassified, in sorted order.
        node_ids: Vec<NodeId>,
    },

    /// Plan resolution completed with zero unresolved dependencies, but no
    /// accepted response ever produced a starting node.
    #[error("Resolution converged but no creator produced a starting node")]
    NoStartingNode,

    /// Plan resolution only: a participating creator's call failed.
    ///
    /// Plan correctness cannot tolerate a silently missing contribution, so
    /// the whole request aborts; no partial plan is ever returned.
    #[error("Creator '{creator}' failed during plan resolution")]
    UnexpectedResolutionFailure {
        /// The creator whose call failed.
        creator: CreatorName,
        /// The underlying client failure.
        #[source]
        source: CreatorError,
    },

    /// Two different creators both claimed the same node id as resolved
    /// within one iteration.
    ///
    /// Exactly one creator must own each node type; overlapping claims mean
    /// the federation is misconfigured, so the request aborts rather than
    /// letting an arbitrary contribution win.
    #[error("Node '{node_id}' resolved by both '{first}' and '{second}' in one iteration")]
    ConflictingResolution {
        /// The doubly claimed node id.
        node_id: NodeId,
        /// One of the claiming creators.
        first: CreatorName,
        /// The other claiming creator.
        second: CreatorName,
    },

    /// A node id re-entered the protocol with different serialized content
    /// than was first observed for it.
    ///
    /// Node content is immutable once observed; a mismatch means a creator
    /// rewrote a fragment in flight, which would make the final plan depend
    /// on iteration order.
    #[error("Content of node '{node_id}' changed between iterations")]
    DependencyContentChanged {
        /// The node id whose content diverged.
        node_id: NodeId,
    },
}

fn format_node_ids(node_ids: &[NodeId]) -> String {
    node_ids
        .iter()
        .map(NodeId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_dependencies_enumerates_ids() {
        let err = ResolutionError::UnresolvedDependencies {
            node_ids: vec![NodeId::new("n1").unwrap(), NodeId::new("n2").unwrap()],
        };
        assert_eq!(
            err.to_string(),
            "Unresolved dependencies after resolution: [n1, n2]"
        );
    }

    #[test]
    fn unexpected_failure_preserves_cause() {
        let err = ResolutionError::UnexpectedResolutionFailure {
            creator: CreatorName::new("ci").unwrap(),
            source: CreatorError::Transport {
                reason: "connection refused".into(),
            },
        };
        let source = std::error::Error::source(&err).expect("cause retained");
        assert_eq!(source.to_string(), "transport failure: connection refused");
    }
}
