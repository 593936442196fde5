use artifortress_types::{ArtifactEntry, Manifest, Package, PackageVersion, Tombstone, VersionState};

use crate::db::InMemoryMetadataStore;
use crate::error::MetaError;

impl InMemoryMetadataStore {
    /// Upsert-by-identity: returns the existing package if one already
    /// matches `(repo, type, namespace-or-empty, name)`.
    pub fn upsert_package(&self, package: Package) -> Package {
        let key = (
            package.repo_id.clone(),
            package.package_type.clone(),
            package.namespace.clone().unwrap_or_default(),
            package.name.clone(),
        );
        let mut index = self.package_index.lock().unwrap();
        if let Some(existing_id) = index.get(&key) {
            return self.packages.lock().unwrap().get(existing_id).unwrap().clone();
        }
        index.insert(key, package.package_id.clone());
        self.packages
            .lock()
            .unwrap()
            .insert(package.package_id.clone(), package.clone());
        package
    }

    pub fn get_package(&self, package_id: &str) -> Result<Package, MetaError> {
        self.packages
            .lock()
            .unwrap()
            .get(package_id)
            .cloned()
            .ok_or_else(|| MetaError::NotFound(format!("package {package_id}")))
    }

    /// Insert-or-reuse: returns the existing row when a draft already sits
    /// at this coordinate, the freshly inserted row otherwise, and a unique
    /// violation if the existing version is no longer a draft.
    pub fn insert_or_reuse_draft(
        &self,
        version: PackageVersion,
    ) -> Result<PackageVersion, MetaError> {
        let key = (
            version.repo_id.clone(),
            version.package_id.clone(),
            version.version.clone(),
        );
        let mut index = self.version_index.lock().unwrap();
        if let Some(existing_id) = index.get(&key) {
            let versions = self.versions.lock().unwrap();
            let existing = versions.get(existing_id).unwrap().clone();
            if existing.state != VersionState::Draft {
                return Err(MetaError::UniqueViolation {
                    constraint: format!(
                        "version {} already exists in state {:?}",
                        existing.version, existing.state
                    ),
                });
            }
            return Ok(existing);
        }
        index.insert(key, version.version_id.clone());
        self.versions
            .lock()
            .unwrap()
            .insert(version.version_id.clone(), version.clone());
        Ok(version)
    }

    pub fn get_version(&self, version_id: &str) -> Result<PackageVersion, MetaError> {
        self.versions
            .lock()
            .unwrap()
            .get(version_id)
            .cloned()
            .ok_or_else(|| MetaError::NotFound(format!("version {version_id}")))
    }

    pub fn list_versions_for_package(&self, package_id: &str) -> Vec<PackageVersion> {
        self.versions
            .lock()
            .unwrap()
            .values()
            .filter(|v| v.package_id == package_id)
            .cloned()
            .collect()
    }

    pub fn update_version<F>(&self, version_id: &str, mutate: F) -> Result<PackageVersion, MetaError>
    where
        F: FnOnce(&mut PackageVersion),
    {
        let mut versions = self.versions.lock().unwrap();
        let version = versions
            .get_mut(version_id)
            .ok_or_else(|| MetaError::NotFound(format!("version {version_id}")))?;
        mutate(version);
        Ok(version.clone())
    }

    pub fn upsert_artifact_entry(&self, entry: ArtifactEntry) {
        let mut entries = self.entries.lock().unwrap();
        let list = entries.entry(entry.version_id.clone()).or_default();
        if let Some(existing) = list.iter_mut().find(|e| e.relative_path == entry.relative_path) {
            *existing = entry;
        } else {
            list.push(entry);
        }
    }

    pub fn list_artifact_entries(&self, version_id: &str) -> Vec<ArtifactEntry> {
        self.entries.lock().unwrap().get(version_id).cloned().unwrap_or_default()
    }

    pub fn upsert_manifest(&self, manifest: Manifest) {
        self.manifests.lock().unwrap().insert(manifest.version_id.clone(), manifest);
    }

    pub fn get_manifest(&self, version_id: &str) -> Option<Manifest> {
        self.manifests.lock().unwrap().get(version_id).cloned()
    }

    pub fn upsert_tombstone(&self, tombstone: Tombstone) {
        self.tombstones
            .lock()
            .unwrap()
            .insert(tombstone.version_id.clone(), tombstone);
    }

    pub fn get_tombstone(&self, version_id: &str) -> Option<Tombstone> {
        self.tombstones.lock().unwrap().get(version_id).cloned()
    }

    pub fn all_tombstones(&self) -> Vec<Tombstone> {
        self.tombstones.lock().unwrap().values().cloned().collect()
    }

    pub fn delete_version(&self, version_id: &str) {
        if let Some(version) = self.versions.lock().unwrap().remove(version_id) {
            self.version_index.lock().unwrap().remove(&(
                version.repo_id,
                version.package_id,
                version.version,
            ));
        }
        self.entries.lock().unwrap().remove(version_id);
        self.manifests.lock().unwrap().remove(version_id);
        self.tombstones.lock().unwrap().remove(version_id);
    }

    pub fn all_artifact_entries(&self) -> Vec<ArtifactEntry> {
        self.entries.lock().unwrap().values().flatten().cloned().collect()
    }

    pub fn all_manifests(&self) -> Vec<Manifest> {
        self.manifests.lock().unwrap().values().cloned().collect()
    }
}
