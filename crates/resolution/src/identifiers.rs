//! Newtype domain identifiers.
//!
//! Every domain concept that has an identity is represented as a distinct newtype
//! wrapping a primitive. This prevents accidentally interchanging — for example —
//! a [`NodeId`] with a [`CreatorName`] even though both are `String` under the
//! hood.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers — UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies a single resolution request (one invocation of
/// `create_execution_plan` or `create_filters`).
///
/// Generated fresh for every inbound request; propagated through spans so all
/// fan-out activity belonging to one request can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolutionRunId(Uuid);

impl ResolutionRunId {
    /// Generates a new random run identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a [`ResolutionRunId`] from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for ResolutionRunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifiers — String-backed
// ---------------------------------------------------------------------------

string_id! {
    /// Identifies one node of the pipeline document.
    ///
    /// Assigned exactly once by the document preprocessor (a deterministic
    /// UUID derived from the node's position in the tree) and never changed
    /// afterwards. Unique within one resolution request.
    NodeId
}

string_id! {
    /// Identifies a creator service participating in resolution.
    ///
    /// Creator names are the keys of both the advertisement table and the
    /// live-client map; only names present in both take part in fan-out.
    CreatorName
}

string_id! {
    /// A category of node types within a creator's advertised support table
    /// (e.g. `"stage"`, `"step"`).
    TypeCategory
}

string_id! {
    /// A concrete node type name a creator claims to understand within a
    /// [`TypeCategory`] (e.g. `"Deployment"`, `"ShellScript"`).
    NodeTypeName
}
