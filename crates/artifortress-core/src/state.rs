//! Application state: configuration and
//! adapter handles held by reference, never a process-wide mutable
//! singleton. Config loading itself is an out-of-scope external
//! collaborator; this struct only bundles the already-typed knob structs
//! each component crate exposes.

use std::sync::Arc;

use artifortress_auth::FederationConfig;
use artifortress_gc::GcConfig;
use artifortress_metastore::InMemoryMetadataStore;
use artifortress_objectstore::ObjectStore;
use artifortress_policy::PolicyConfig;
use artifortress_upload::UploadConfig;

#[derive(Clone)]
pub struct AppState {
    pub metastore: Arc<InMemoryMetadataStore>,
    pub object_store: Arc<dyn ObjectStore>,
    pub upload: UploadConfig,
    pub policy: PolicyConfig,
    pub gc: GcConfig,
    pub federation: FederationConfig,
}

impl AppState {
    pub fn new(metastore: Arc<InMemoryMetadataStore>, object_store: Arc<dyn ObjectStore>) -> Self {
        Self {
            metastore,
            object_store,
            upload: UploadConfig::default(),
            policy: PolicyConfig::default(),
            gc: GcConfig::default(),
            federation: FederationConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use artifortress_objectstore::InMemoryObjectStore;

    #[test]
    fn new_builds_with_component_defaults() {
        let state = AppState::new(Arc::new(InMemoryMetadataStore::new()), Arc::new(InMemoryObjectStore::new()));
        assert_eq!(state.gc.grace_hours, 24);
        assert!(state.federation.oidc.is_none());
    }
}
