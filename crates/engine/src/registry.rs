//! Creator service registry.
//!
//! Built once per resolution request by intersecting the globally advertised
//! "which types does each creator support" table with the map of creators
//! that are actually reachable. Creators advertised but unreachable, or
//! reachable but not advertised, are silently excluded: they simply never
//! receive fan-out calls. That is graceful degradation, not an error — their
//! fragments stay unresolved and the validator reports them at the end.

use std::collections::BTreeMap;
use std::sync::Arc;

use resolution::{CreatorAdvertisement, CreatorClient, CreatorName, SupportedTypes};
use tracing::debug;

/// One registered creator: its advertised support table and the client used
/// to reach it.
#[derive(Clone)]
pub struct CreatorDescriptor {
    /// The creator's name, the key of both source maps.
    pub name: CreatorName,

    /// Supported node type names, keyed by category.
    pub supported_types: SupportedTypes,

    /// The RPC handle used for fan-out calls.
    pub client: Arc<dyn CreatorClient>,
}

impl std::fmt::Debug for CreatorDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreatorDescriptor")
            .field("name", &self.name)
            .field("supported_types", &self.supported_types)
            .finish_non_exhaustive()
    }
}

/// The per-request registry snapshot, keyed by creator name.
pub type CreatorRegistry = BTreeMap<CreatorName, CreatorDescriptor>;

/// Builds the registry for one resolution request.
///
/// Only creators present in *both* inputs are retained.
pub fn build_registry(
    advertisements: &BTreeMap<CreatorName, CreatorAdvertisement>,
    clients: &BTreeMap<CreatorName, Arc<dyn CreatorClient>>,
) -> CreatorRegistry {
    let mut registry = CreatorRegistry::new();
    for (name, advertisement) in advertisements {
        match clients.get(name) {
            Some(client) => {
                registry.insert(
                    name.clone(),
                    CreatorDescriptor {
                        name: name.clone(),
                        supported_types: advertisement.supported_types.clone(),
                        client: Arc::clone(client),
                    },
                );
            }
            None => debug!(creator = %name, "advertised creator has no live client; excluded"),
        }
    }
    for name in clients.keys() {
        if !advertisements.contains_key(name) {
            debug!(creator = %name, "live creator has no advertisement; excluded");
        }
    }
    registry
}
