//! Document preprocessing and root extraction.
//!
//! Preprocessing decorates every object node of the raw tree document with a
//! stable node id before any creator sees it. Ids are UUID-v5 values derived
//! from a fixed namespace and the node's JSON-pointer path, so injection is a
//! pure transformation: re-running it on byte-identical input yields
//! byte-identical ids, and retried requests are indistinguishable downstream.
//!
//! Root extraction then locates the single `"pipeline"` subtree resolution
//! starts from. Both steps run before any fan-out call is made.

use resolution::{NodeId, ResolutionError};
use serde_json::Value;
use uuid::Uuid;

/// The field carrying a node's injected id.
pub const NODE_ID_KEY: &str = "__uuid";

/// The well-known top-level key the resolution root lives under.
pub const ROOT_KEY: &str = "pipeline";

// Namespace for path-derived node ids. Fixed forever: changing it would
// change every id of every document.
const NODE_ID_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_29ad_81f5_4f0e_93d2_4bb0_57c8_1a44);

/// Parses the raw document and assigns a stable, unique id to every object
/// node exactly once.
///
/// Nodes that already carry a `__uuid` keep it, which makes the
/// transformation idempotent under re-invocation on its own output as well.
/// Fails with [`ResolutionError::MalformedDocument`] if the input does not
/// parse or its top-level value is not an object.
pub fn inject_node_ids(raw_document: &str) -> Result<Value, ResolutionError> {
    let mut document: Value =
        serde_json::from_str(raw_document).map_err(|err| ResolutionError::MalformedDocument {
            reason: format!("document is not valid JSON: {err}"),
        })?;
    if !document.is_object() {
        return Err(ResolutionError::MalformedDocument {
            reason: "top-level value of the document is not an object".into(),
        });
    }
    inject(&mut document, "");
    Ok(document)
}

fn inject(value: &mut Value, pointer: &str) {
    match value {
        Value::Object(map) => {
            if !map.contains_key(NODE_ID_KEY) {
                let id = Uuid::new_v5(&NODE_ID_NAMESPACE, pointer.as_bytes());
                map.insert(NODE_ID_KEY.to_string(), Value::String(id.to_string()));
            }
            for (key, child) in map.iter_mut() {
                if key.as_str() != NODE_ID_KEY {
                    inject(child, &format!("{pointer}/{}", escape_segment(key)));
                }
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter_mut().enumerate() {
                inject(item, &format!("{pointer}/{index}"));
            }
        }
        _ => {}
    }
}

// RFC 6901 escaping. Without it a key containing '/' would hash to the same
// pointer as a nested path and two distinct nodes would share one id.
fn escape_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Locates the `"pipeline"` subtree that seeds the initial dependency set.
///
/// Expects a document that already went through [`inject_node_ids`]. Fails
/// with [`ResolutionError::MalformedDocument`] if the top level is not an
/// object containing the expected key.
pub fn extract_root(document: &Value) -> Result<(NodeId, Value), ResolutionError> {
    let root = document
        .as_object()
        .and_then(|map| map.get(ROOT_KEY))
        .and_then(Value::as_object)
        .ok_or_else(|| ResolutionError::MalformedDocument {
            reason: "root of the document needs to be an object containing the expected top-level key"
                .into(),
        })?;

    let node_id = root
        .get(NODE_ID_KEY)
        .and_then(Value::as_str)
        .and_then(NodeId::new)
        .ok_or_else(|| ResolutionError::MalformedDocument {
            reason: "pipeline root carries no node id; preprocessing must run first".into(),
        })?;

    Ok((node_id, Value::Object(root.clone())))
}
